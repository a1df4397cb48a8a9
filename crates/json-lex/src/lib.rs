//! Lexer for JSON text. This crate turns a text buffer into a sequence of tokens of the
//! following kinds: `StringLiteral`, `NumberLiteral`, `BooleanLiteral`, `NullLiteral`
//! and `Punctuation`.
//!
//! Every `SpannedToken` has location information attached to it, saying at which byte
//! offset (and at which line and column) the token began and ended.
//!
//! Whitespace outside of strings separates tokens and is otherwise dropped. By default
//! string literals are taken verbatim, without escape processing; see [`StringEscapes`].
//!
//! ```
//! use json_lex::{lex, Number, Punctuation, Token};
//!
//! # fn main() {
//!     let s = r#"{"key1": 1234, "key2": [true, 0.5], "key3": null }"#;
//!     let tokens: Vec<Token> = lex(s).unwrap().into_iter().map(|t| t.token).collect();
//!     assert_eq!(tokens[0], Token::Punctuation(Punctuation::LeftBrace));
//!     assert_eq!(tokens[1], Token::StringLiteral(String::from("key1")));
//!     assert_eq!(tokens[3], Token::NumberLiteral(Number::Integer(1234)));
//!     assert_eq!(tokens[10], Token::NumberLiteral(Number::Float(0.5)));
//!     assert_eq!(tokens.len(), 17);
//! # }
//! ```

mod lexer;
mod token;

pub use lexer::*;
pub use token::*;
