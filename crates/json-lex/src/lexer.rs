use std::fmt;
use std::iter::FusedIterator;

use thiserror::Error;
use tracing::{debug, trace};

use crate::token::{Number, Punctuation, Token};

// Backspace counts as whitespace here, form feed does not.
const WHITESPACE: [char; 5] = [' ', '\t', '\u{8}', '\n', '\r'];

static KEYWORDS: [(&str, Token); 3] = [
    ("true", Token::BooleanLiteral(true)),
    ("false", Token::BooleanLiteral(false)),
    ("null", Token::NullLiteral),
];

fn is_number_char(c: char) -> bool {
    matches!(c, '0'..='9' | '-' | '.' | 'e')
}

/// Length in bytes of the number lexeme at the start of `s`. A `+` only belongs to the
/// lexeme directly after an `e`.
fn number_lexeme_len(s: &str) -> usize {
    let mut prev = None;
    for (i, c) in s.char_indices() {
        let accepted = match c {
            '+' => prev == Some('e'),
            c => is_number_char(c),
        };
        if !accepted {
            return i;
        }
        prev = Some(c);
    }
    s.len()
}

/// A byte offset and the corresponding line and column number. Lines and columns start
/// at 1; columns are counted in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location {
    pub byte_offset: usize,
    pub line: u64,
    pub col: u64,
}

impl Default for Location {
    fn default() -> Self {
        Location {
            byte_offset: 0,
            line: 1,
            col: 1,
        }
    }
}

impl Location {
    fn advance_by_char(&mut self, c: char) {
        if c == '\n' {
            self.col = 1;
            self.line += 1;
        } else {
            self.col += 1;
        }
        self.byte_offset += c.len_utf8();
    }

    fn advance_by_str(&mut self, s: &str) {
        for c in s.chars() {
            self.advance_by_char(c);
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line:{}, col:{}", self.line, self.col)
    }
}

/// The half-open range of text a token was lexed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: Location,
    pub end: Location,
}

/// A [`Token`] together with the place it was found.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

/// How string literals are read.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringEscapes {
    /// The text between the quotes is taken as-is, backslashes included. The first `"`
    /// after the opening quote ends the string, so strings cannot contain quotes.
    #[default]
    Verbatim,
    /// Backslash escapes are decoded, including `\uXXXX` and UTF-16 surrogate pairs.
    Decode,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LexOptions {
    pub string_escapes: StringEscapes,
}

impl LexOptions {
    pub fn with_string_escapes(mut self, string_escapes: StringEscapes) -> Self {
        self.string_escapes = string_escapes;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("Unterminated string starting at {start}")]
    UnterminatedString { start: Location },

    #[error("Unexpected character {character:?} at {location}")]
    UnexpectedCharacter { character: char, location: Location },

    #[error("Invalid number literal '{lexeme}' at {location}")]
    InvalidNumber { lexeme: String, location: Location },

    #[error("Invalid escape sequence '\\{escape}' at {location}")]
    InvalidEscape { escape: char, location: Location },

    #[error("Invalid unicode escape at {location}: {reason}")]
    InvalidUnicodeEscape {
        reason: &'static str,
        location: Location,
    },
}

impl LexError {
    /// The location in the source text at which the error was detected.
    pub fn location(&self) -> Location {
        match self {
            LexError::UnterminatedString { start } => *start,
            LexError::UnexpectedCharacter { location, .. }
            | LexError::InvalidNumber { location, .. }
            | LexError::InvalidEscape { location, .. }
            | LexError::InvalidUnicodeEscape { location, .. } => *location,
        }
    }
}

/// A type alias for `Result<T, LexError>`.
pub type LexResult<T> = Result<T, LexError>;

/// A pull-based lexer over a text buffer which emits [`SpannedToken`]s.
///
/// At each position the rules are tried in a fixed order: string literal, number
/// literal, boolean literal, null literal, then whitespace and punctuation. The first
/// rule that matches consumes its lexeme.
///
/// Iteration stops after the first error.
pub struct Lexer<'a> {
    text: &'a str,
    location: Location,
    options: LexOptions,
    done: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(text: &'a str) -> Self {
        Self::with_options(text, LexOptions::default())
    }

    pub fn with_options(text: &'a str, options: LexOptions) -> Self {
        Lexer {
            text,
            location: Location::default(),
            options,
            done: false,
        }
    }

    /// The location of the first unconsumed character. Once the lexer is exhausted this
    /// is the end of the input.
    pub fn location(&self) -> Location {
        self.location
    }

    fn rest(&self) -> &'a str {
        &self.text[self.location.byte_offset..]
    }

    fn bump(&mut self, len: usize) -> &'a str {
        let start = self.location.byte_offset;
        let lexeme = &self.text[start..start + len];
        self.location.advance_by_str(lexeme);
        lexeme
    }

    fn consume_char(&mut self) -> Option<char> {
        let c = self.rest().chars().next()?;
        self.location.advance_by_char(c);
        Some(c)
    }

    /// Scans the next token, skipping whitespace. Returns `Ok(None)` at the end of input.
    pub fn next_token(&mut self) -> LexResult<Option<SpannedToken>> {
        loop {
            let start = self.location;
            let Some(c) = self.rest().chars().next() else {
                return Ok(None);
            };

            let token = if let Some(token) = self.scan_string()? {
                token
            } else if let Some(token) = self.scan_number()? {
                token
            } else if let Some(token) = self.scan_keyword() {
                token
            } else if WHITESPACE.contains(&c) {
                self.bump(c.len_utf8());
                continue;
            } else if let Some(p) = Punctuation::from_char(c) {
                self.bump(c.len_utf8());
                Token::Punctuation(p)
            } else {
                return Err(LexError::UnexpectedCharacter {
                    character: c,
                    location: start,
                });
            };

            let span = Span {
                start,
                end: self.location,
            };
            return Ok(Some(SpannedToken { token, span }));
        }
    }

    fn scan_string(&mut self) -> LexResult<Option<Token>> {
        if !self.rest().starts_with('"') {
            return Ok(None);
        }
        let s = match self.options.string_escapes {
            StringEscapes::Verbatim => self.scan_verbatim_string()?,
            StringEscapes::Decode => self.scan_decoded_string()?,
        };
        Ok(Some(Token::StringLiteral(s)))
    }

    fn scan_verbatim_string(&mut self) -> LexResult<String> {
        let start = self.location;
        let body = &self.rest()[1..];
        match body.find('"') {
            Some(end) => {
                let s = body[..end].to_string();
                self.bump(end + 2);
                Ok(s)
            }
            None => Err(LexError::UnterminatedString { start }),
        }
    }

    fn scan_decoded_string(&mut self) -> LexResult<String> {
        let start = self.location;
        self.bump(1);

        let mut s = String::new();
        loop {
            let escape_location = self.location;
            let c = match self.consume_char() {
                Some('"') => return Ok(s),
                Some('\\') => match self.consume_char() {
                    Some('"') => '"',
                    Some('\\') => '\\',
                    Some('/') => '/',
                    Some('b') => '\u{8}',
                    Some('f') => '\u{c}',
                    Some('n') => '\n',
                    Some('r') => '\r',
                    Some('t') => '\t',
                    Some('u') => self.consume_unicode_escape(start, escape_location)?,
                    Some(escape) => {
                        return Err(LexError::InvalidEscape {
                            escape,
                            location: escape_location,
                        })
                    }
                    None => return Err(LexError::UnterminatedString { start }),
                },
                Some(c) => c,
                None => return Err(LexError::UnterminatedString { start }),
            };
            s.push(c);
        }
    }

    fn consume_hex4(&mut self, start: Location, escape_location: Location) -> LexResult<u16> {
        let mut u = 0u16;
        for _ in 0..4 {
            let c = self
                .consume_char()
                .ok_or(LexError::UnterminatedString { start })?;
            let h = c.to_digit(16).ok_or(LexError::InvalidUnicodeEscape {
                reason: "\\u must be followed by four hex digits",
                location: escape_location,
            })?;
            u = u * 0x10 + h as u16;
        }
        Ok(u)
    }

    fn consume_unicode_escape(
        &mut self,
        start: Location,
        escape_location: Location,
    ) -> LexResult<char> {
        let u = self.consume_hex4(start, escape_location)?;
        let code_point = match u {
            0xD800..=0xDBFF => {
                // The second surrogate must directly follow the first one.
                let second_location = self.location;
                if !self.rest().starts_with("\\u") {
                    return Err(LexError::InvalidUnicodeEscape {
                        reason: "high surrogate is not followed by a low surrogate",
                        location: escape_location,
                    });
                }
                self.bump(2);
                let u2 = self.consume_hex4(start, second_location)?;
                if !matches!(u2, 0xDC00..=0xDFFF) {
                    return Err(LexError::InvalidUnicodeEscape {
                        reason: "high surrogate is not followed by a low surrogate",
                        location: second_location,
                    });
                }
                (((u & 0x3ff) as u32) << 10 | (u2 & 0x3ff) as u32) + 0x1_0000
            }
            0xDC00..=0xDFFF => {
                return Err(LexError::InvalidUnicodeEscape {
                    reason: "unpaired low surrogate",
                    location: escape_location,
                });
            }
            _ => u as u32,
        };
        char::from_u32(code_point).ok_or(LexError::InvalidUnicodeEscape {
            reason: "not a unicode scalar value",
            location: escape_location,
        })
    }

    fn scan_number(&mut self) -> LexResult<Option<Token>> {
        let len = number_lexeme_len(self.rest());
        if len == 0 {
            return Ok(None);
        }

        let location = self.location;
        let lexeme = self.bump(len);
        match parse_number(lexeme) {
            Some(n) => Ok(Some(Token::NumberLiteral(n))),
            None => Err(LexError::InvalidNumber {
                lexeme: lexeme.to_string(),
                location,
            }),
        }
    }

    fn scan_keyword(&mut self) -> Option<Token> {
        let rest = self.rest();
        let (word, token) = KEYWORDS.iter().find(|(word, _)| rest.starts_with(word))?;
        self.bump(word.len());
        Some(token.clone())
    }
}

/// Converts a number lexeme. Lexemes containing `.` or `e` are floats, everything else
/// is an integer.
fn parse_number(lexeme: &str) -> Option<Number> {
    if lexeme.contains(|c| c == '.' || c == 'e') {
        lexeme.parse::<f64>().ok().map(Number::Float)
    } else {
        lexeme.parse::<i64>().ok().map(Number::Integer)
    }
}

impl Iterator for Lexer<'_> {
    type Item = LexResult<SpannedToken>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_token() {
            Ok(Some(t)) => {
                trace!(token = %t.token, at = %t.span.start, "lexed token");
                Some(Ok(t))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl FusedIterator for Lexer<'_> {}

/// Lexes the whole text with default options.
pub fn lex(text: &str) -> LexResult<Vec<SpannedToken>> {
    lex_with(text, LexOptions::default())
}

pub fn lex_with(text: &str, options: LexOptions) -> LexResult<Vec<SpannedToken>> {
    lex_to_end(text, options).map(|(tokens, _)| tokens)
}

/// Lexes the whole text and also returns the location just past the last character,
/// which is where an error about missing input should point.
pub fn lex_to_end(text: &str, options: LexOptions) -> LexResult<(Vec<SpannedToken>, Location)> {
    let mut lexer = Lexer::with_options(text, options);
    let tokens = match lexer.by_ref().collect::<LexResult<Vec<_>>>() {
        Ok(tokens) => tokens,
        Err(e) => {
            debug!(error = %e, "lexing failed");
            return Err(e);
        }
    };
    debug!(tokens = tokens.len(), bytes = text.len(), "lexed input");
    Ok((tokens, lexer.location()))
}
