//! A hand-written JSON parser. Text is first split into tokens by [`json_lex`], then a
//! recursive descent parser builds a [`Value`] tree from the tokens.
//!
//! ```
//! use json_descent::{from_string, Value};
//!
//! # fn main() {
//!     let mut v = from_string(r#"{"name": "Joe", "age": 42, "scores": [31.4, 29.9], "winner": false}"#).unwrap();
//!     assert_eq!(v["name"], Value::from("Joe"));
//!     assert_eq!(v["scores"][0], Value::from(31.4));
//!     v["winner"] = Value::Bool(true);
//!     assert!(v["winner"].is_bool());
//! # }
//! ```
//!
//! This is not a fully conforming JSON parser. By default string literals are taken
//! verbatim, so a string cannot contain a `"`; use [`ParseOptions::with_string_escapes`]
//! to decode escape sequences. Numbers are lexed greedily from the characters `0-9`, `-`,
//! `.` and `e`, and a lexeme that contains `.` or `e` becomes a float.

mod json_value;
mod parser;

pub use json_lex::{
    LexError, Location, Number, Punctuation, Span, SpannedToken, StringEscapes, Token,
};
pub use json_value::{InnerAsRef, InnerAsRefMut, Map, UnexpectedValue, Value};
pub use parser::*;
