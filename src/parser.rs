use std::str::FromStr;

use json_lex::{
    lex_to_end, LexError, LexOptions, Location, Punctuation, SpannedToken, StringEscapes, Token,
};
use thiserror::Error;
use tracing::debug;

use crate::json_value::{Map, Value};

/// The nesting depth allowed by [`ParseOptions::default`].
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Per-call settings for [`from_string_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// How many arrays and objects may be nested inside each other. Each level of nesting
    /// costs a few stack frames, so very large values can overflow the stack.
    pub max_depth: usize,
    pub string_escapes: StringEscapes,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            max_depth: DEFAULT_MAX_DEPTH,
            string_escapes: StringEscapes::Verbatim,
        }
    }
}

impl ParseOptions {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_string_escapes(mut self, string_escapes: StringEscapes) -> Self {
        self.string_escapes = string_escapes;
        self
    }

    fn lex_options(&self) -> LexOptions {
        LexOptions::default().with_string_escapes(self.string_escapes)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("Unexpected '{token}' at {location}")]
    UnexpectedToken { token: Token, location: Location },

    #[error("Key of object must be string but found '{found}' at {location}")]
    ExpectedStringKey { found: Token, location: Location },

    #[error("':' is expected after key of object but found '{found}' at {location}")]
    ExpectedColon { found: Token, location: Location },

    #[error("{}", array_separator_message(.found, .location))]
    ExpectedCommaOrClosingBracket { found: Token, location: Location },

    #[error("',' or '}}' is expected for object but found '{found}' at {location}")]
    ExpectedCommaOrClosingBrace { found: Token, location: Location },

    #[error("Unexpected end of input at {location}")]
    UnexpectedEndOfInput { location: Location },

    #[error("Nesting exceeds the maximum depth of {max_depth} at {location}")]
    NestingTooDeep { max_depth: usize, location: Location },
}

fn array_separator_message(found: &Token, location: &Location) -> String {
    if found.is_punctuation(Punctuation::RightBracket) {
        format!("Trailing ',' before ']' at {location}")
    } else {
        format!("',' or ']' is expected for array but found '{found}' at {location}")
    }
}

impl ParseError {
    /// The location of the offending token, or the end of the input.
    pub fn location(&self) -> Location {
        match self {
            ParseError::UnexpectedToken { location, .. }
            | ParseError::ExpectedStringKey { location, .. }
            | ParseError::ExpectedColon { location, .. }
            | ParseError::ExpectedCommaOrClosingBracket { location, .. }
            | ParseError::ExpectedCommaOrClosingBrace { location, .. }
            | ParseError::UnexpectedEndOfInput { location }
            | ParseError::NestingTooDeep { location, .. } => *location,
        }
    }
}

/// Either stage's error, passed through unchanged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl Error {
    pub fn location(&self) -> Location {
        match self {
            Error::Lex(e) => e.location(),
            Error::Parse(e) => e.location(),
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/// A recursive descent parser over a lexed token sequence. It looks at one token at a
/// time and never backtracks.
pub struct Parser<'t> {
    tokens: &'t [SpannedToken],
    pos: usize,
    eof: Location,
    depth: usize,
    max_depth: usize,
}

impl<'t> Parser<'t> {
    /// `eof` is the location reported when the tokens run out.
    pub fn new(tokens: &'t [SpannedToken], eof: Location, max_depth: usize) -> Self {
        Parser {
            tokens,
            pos: 0,
            eof,
            depth: 0,
            max_depth,
        }
    }

    /// Parses one value and requires it to span the whole token sequence.
    pub fn parse(mut self) -> ParseResult<Value> {
        let value = self.parse_value()?;
        if let Some(t) = self.peek() {
            return Err(ParseError::UnexpectedToken {
                token: t.token.clone(),
                location: t.span.start,
            });
        }
        Ok(value)
    }

    fn peek(&self) -> Option<&'t SpannedToken> {
        self.tokens.get(self.pos)
    }

    fn next_token(&mut self) -> ParseResult<&'t SpannedToken> {
        let t = self.peek().ok_or(ParseError::UnexpectedEndOfInput { location: self.eof })?;
        self.pos += 1;
        Ok(t)
    }

    fn eat(&mut self, p: Punctuation) -> bool {
        match self.peek() {
            Some(t) if t.token.is_punctuation(p) => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn enter(&mut self, location: Location) -> ParseResult<()> {
        if self.depth == self.max_depth {
            return Err(ParseError::NestingTooDeep {
                max_depth: self.max_depth,
                location,
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn parse_value(&mut self) -> ParseResult<Value> {
        let t = self.next_token()?;
        match &t.token {
            Token::Punctuation(Punctuation::LeftBracket) => self.parse_array(t.span.start),
            Token::Punctuation(Punctuation::LeftBrace) => self.parse_object(t.span.start),
            Token::StringLiteral(s) => Ok(Value::String(s.clone())),
            Token::NumberLiteral(n) => Ok(Value::Number(*n)),
            Token::BooleanLiteral(b) => Ok(Value::Bool(*b)),
            Token::NullLiteral => Ok(Value::Null),
            Token::Punctuation(_) => Err(ParseError::UnexpectedToken {
                token: t.token.clone(),
                location: t.span.start,
            }),
        }
    }

    // Called with the '[' already consumed.
    fn parse_array(&mut self, open: Location) -> ParseResult<Value> {
        self.enter(open)?;

        let mut array = Vec::new();
        if self.eat(Punctuation::RightBracket) {
            self.leave();
            return Ok(Value::Array(array));
        }

        loop {
            array.push(self.parse_value()?);

            let t = self.next_token()?;
            match t.token {
                Token::Punctuation(Punctuation::Comma) => {
                    if let Some(close) = self
                        .peek()
                        .filter(|t| t.token.is_punctuation(Punctuation::RightBracket))
                    {
                        return Err(ParseError::ExpectedCommaOrClosingBracket {
                            found: close.token.clone(),
                            location: close.span.start,
                        });
                    }
                }
                Token::Punctuation(Punctuation::RightBracket) => break,
                _ => {
                    return Err(ParseError::ExpectedCommaOrClosingBracket {
                        found: t.token.clone(),
                        location: t.span.start,
                    })
                }
            }
        }

        self.leave();
        Ok(Value::Array(array))
    }

    // Called with the '{' already consumed.
    fn parse_object(&mut self, open: Location) -> ParseResult<Value> {
        self.enter(open)?;

        let mut object = Map::default();
        if self.eat(Punctuation::RightBrace) {
            self.leave();
            return Ok(Value::Object(object));
        }

        loop {
            let t = self.next_token()?;
            let key = match &t.token {
                Token::StringLiteral(s) => s.clone(),
                other => {
                    return Err(ParseError::ExpectedStringKey {
                        found: other.clone(),
                        location: t.span.start,
                    })
                }
            };

            let t = self.next_token()?;
            if !t.token.is_punctuation(Punctuation::Colon) {
                return Err(ParseError::ExpectedColon {
                    found: t.token.clone(),
                    location: t.span.start,
                });
            }

            // Last write wins; a repeated key keeps its original position.
            let value = self.parse_value()?;
            object.insert(key, value);

            let t = self.next_token()?;
            match t.token {
                Token::Punctuation(Punctuation::Comma) => {}
                Token::Punctuation(Punctuation::RightBrace) => break,
                _ => {
                    return Err(ParseError::ExpectedCommaOrClosingBrace {
                        found: t.token.clone(),
                        location: t.span.start,
                    })
                }
            }
        }

        self.leave();
        Ok(Value::Object(object))
    }
}

/// Parses a complete token sequence into a single value.
pub fn parse_tokens(
    tokens: &[SpannedToken],
    eof: Location,
    options: &ParseOptions,
) -> ParseResult<Value> {
    Parser::new(tokens, eof, options.max_depth).parse()
}

/// Parses JSON text with the default [`ParseOptions`].
pub fn from_string(text: &str) -> Result<Value, Error> {
    from_string_with(text, &ParseOptions::default())
}

pub fn from_string_with(text: &str, options: &ParseOptions) -> Result<Value, Error> {
    let (tokens, eof) = lex_to_end(text, options.lex_options())?;
    let value = parse_tokens(&tokens, eof, options).map_err(|e| {
        debug!(error = %e, "parsing failed");
        e
    })?;
    debug!(kind = value.kind(), "parsed value");
    Ok(value)
}

impl FromStr for Value {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        from_string(s)
    }
}

#[cfg(test)]
mod test {
    use json_lex::{Number, Span};

    use super::*;

    fn spanned(tokens: Vec<Token>) -> Vec<SpannedToken> {
        tokens
            .into_iter()
            .enumerate()
            .map(|(i, token)| {
                let start = Location {
                    byte_offset: i,
                    line: 1,
                    col: i as u64 + 1,
                };
                let end = Location {
                    byte_offset: i + 1,
                    col: i as u64 + 2,
                    ..start
                };
                SpannedToken {
                    token,
                    span: Span { start, end },
                }
            })
            .collect()
    }

    fn run(input: Vec<Token>) -> ParseResult<Value> {
        let tokens = spanned(input);
        let eof = tokens.last().map(|t| t.span.end).unwrap_or_default();
        parse_tokens(&tokens, eof, &ParseOptions::default())
    }

    fn check(input: Vec<Token>, expected: Value) {
        assert_eq!(run(input).unwrap(), expected);
    }

    fn p(p: Punctuation) -> Token {
        Token::Punctuation(p)
    }

    fn int(i: i64) -> Token {
        Token::NumberLiteral(Number::Integer(i))
    }

    fn string(s: &str) -> Token {
        Token::StringLiteral(s.to_string())
    }

    #[test]
    fn test_scalars() {
        check(vec![Token::NullLiteral], Value::Null);
        check(vec![Token::BooleanLiteral(false)], Value::Bool(false));
        check(vec![int(16)], Value::from(16i64));
        check(vec![string("hello world")], Value::from("hello world"));
    }

    #[test]
    fn test_empty_containers() {
        check(
            vec![p(Punctuation::LeftBracket), p(Punctuation::RightBracket)],
            Value::Array(vec![]),
        );
        check(
            vec![p(Punctuation::LeftBrace), p(Punctuation::RightBrace)],
            Value::Object(Map::default()),
        );
    }

    #[test]
    fn test_nested_array() {
        // [null, [null]]
        let input = vec![
            p(Punctuation::LeftBracket),
            Token::NullLiteral,
            p(Punctuation::Comma),
            p(Punctuation::LeftBracket),
            Token::NullLiteral,
            p(Punctuation::RightBracket),
            p(Punctuation::RightBracket),
        ];
        let expected = Value::Array(vec![Value::Null, Value::Array(vec![Value::Null])]);
        check(input, expected);
    }

    #[test]
    fn test_duplicate_key_keeps_first_position() {
        // {"a": 1, "b": 2, "a": 3}
        let input = vec![
            p(Punctuation::LeftBrace),
            string("a"),
            p(Punctuation::Colon),
            int(1),
            p(Punctuation::Comma),
            string("b"),
            p(Punctuation::Colon),
            int(2),
            p(Punctuation::Comma),
            string("a"),
            p(Punctuation::Colon),
            int(3),
            p(Punctuation::RightBrace),
        ];
        let value = run(input).unwrap();
        let object = value.get::<Map>().unwrap();
        let entries: Vec<(&str, &Value)> = object.iter().map(|(k, v)| (k.as_str(), v)).collect();
        assert_eq!(
            entries,
            [("a", &Value::from(3i64)), ("b", &Value::from(2i64))]
        );
    }

    #[test]
    fn test_stray_punctuation_in_value_position() {
        for stray in [
            Punctuation::Comma,
            Punctuation::Colon,
            Punctuation::RightBracket,
            Punctuation::RightBrace,
        ] {
            assert_eq!(
                run(vec![p(stray)]),
                Err(ParseError::UnexpectedToken {
                    token: p(stray),
                    location: Location::default(),
                })
            );
        }
    }

    #[test]
    fn test_array_missing_comma() {
        let err = run(vec![p(Punctuation::LeftBracket), int(1), int(2)]).unwrap_err();
        assert!(matches!(
            err,
            ParseError::ExpectedCommaOrClosingBracket { found, .. } if found == int(2)
        ));
    }

    #[test]
    fn test_array_trailing_comma() {
        let err = run(vec![
            p(Punctuation::LeftBracket),
            int(1),
            p(Punctuation::Comma),
            p(Punctuation::RightBracket),
        ])
        .unwrap_err();
        assert_eq!(err.location().col, 4);
        assert_eq!(err.to_string(), "Trailing ',' before ']' at line:1, col:4");
    }

    #[test]
    fn test_object_errors() {
        let err = run(vec![p(Punctuation::LeftBrace), int(1)]).unwrap_err();
        assert!(matches!(err, ParseError::ExpectedStringKey { .. }));

        let err = run(vec![p(Punctuation::LeftBrace), string("a"), int(1)]).unwrap_err();
        assert!(matches!(err, ParseError::ExpectedColon { .. }));

        let err = run(vec![
            p(Punctuation::LeftBrace),
            string("a"),
            p(Punctuation::Colon),
            int(1),
            p(Punctuation::RightBracket),
        ])
        .unwrap_err();
        assert!(matches!(err, ParseError::ExpectedCommaOrClosingBrace { .. }));

        // A trailing comma leaves '}' where a key should be.
        let err = run(vec![
            p(Punctuation::LeftBrace),
            string("a"),
            p(Punctuation::Colon),
            int(1),
            p(Punctuation::Comma),
            p(Punctuation::RightBrace),
        ])
        .unwrap_err();
        assert!(matches!(err, ParseError::ExpectedStringKey { .. }));
    }

    #[test]
    fn test_unexpected_end_of_input() {
        let eof = |result: ParseResult<Value>| {
            matches!(result, Err(ParseError::UnexpectedEndOfInput { .. }))
        };
        assert!(eof(run(vec![])));
        assert!(eof(run(vec![p(Punctuation::LeftBracket)])));
        assert!(eof(run(vec![p(Punctuation::LeftBracket), int(1)])));
        assert!(eof(run(vec![p(Punctuation::LeftBrace), string("a")])));
        assert!(eof(run(vec![
            p(Punctuation::LeftBrace),
            string("a"),
            p(Punctuation::Colon)
        ])));
    }

    #[test]
    fn test_trailing_tokens() {
        let err = run(vec![int(1), int(2)]).unwrap_err();
        assert_eq!(
            err,
            ParseError::UnexpectedToken {
                token: int(2),
                location: Location {
                    byte_offset: 1,
                    line: 1,
                    col: 2
                },
            }
        );
        assert_eq!(err.to_string(), "Unexpected '2' at line:1, col:2");
    }

    #[test]
    fn test_max_depth() {
        let nested = |n: usize| {
            let mut v = vec![p(Punctuation::LeftBracket); n];
            v.extend(vec![p(Punctuation::RightBracket); n]);
            spanned(v)
        };
        let options = ParseOptions::default().with_max_depth(3);
        let eof = Location::default();
        assert!(parse_tokens(&nested(3), eof, &options).is_ok());
        assert_eq!(
            parse_tokens(&nested(4), eof, &options),
            Err(ParseError::NestingTooDeep {
                max_depth: 3,
                location: Location {
                    byte_offset: 3,
                    line: 1,
                    col: 4
                },
            })
        );
        // Depth is released when a container closes.
        let siblings = spanned(vec![
            p(Punctuation::LeftBracket),
            p(Punctuation::LeftBracket),
            p(Punctuation::RightBracket),
            p(Punctuation::Comma),
            p(Punctuation::LeftBracket),
            p(Punctuation::RightBracket),
            p(Punctuation::RightBracket),
        ]);
        let options = ParseOptions::default().with_max_depth(2);
        assert!(parse_tokens(&siblings, eof, &options).is_ok());
    }
}
