use std::fmt;

/// A JSON number. Whether a literal is an integer or a float is decided once, from the
/// lexeme, when the token is created.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    pub fn is_integer(&self) -> bool {
        matches!(self, Number::Integer(_))
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Number::Float(_))
    }

    /// Returns the integer value, or `None` for floats.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Number::Integer(i) => Some(i),
            Number::Float(_) => None,
        }
    }

    /// Returns the value as a float. Integers are converted, which may lose precision
    /// for magnitudes above 2^53.
    pub fn as_f64(&self) -> f64 {
        match *self {
            Number::Integer(i) => i as f64,
            Number::Float(f) => f,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(i) => write!(f, "{i}"),
            Number::Float(x) => write!(f, "{x:?}"),
        }
    }
}

/// One of the six structural characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Punctuation {
    Comma,
    Colon,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
}

impl Punctuation {
    pub fn from_char(c: char) -> Option<Punctuation> {
        let p = match c {
            ',' => Punctuation::Comma,
            ':' => Punctuation::Colon,
            '[' => Punctuation::LeftBracket,
            ']' => Punctuation::RightBracket,
            '{' => Punctuation::LeftBrace,
            '}' => Punctuation::RightBrace,
            _ => return None,
        };
        Some(p)
    }

    pub fn as_char(&self) -> char {
        match self {
            Punctuation::Comma => ',',
            Punctuation::Colon => ':',
            Punctuation::LeftBracket => '[',
            Punctuation::RightBracket => ']',
            Punctuation::LeftBrace => '{',
            Punctuation::RightBrace => '}',
        }
    }
}

impl fmt::Display for Punctuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A JSON token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    StringLiteral(String),
    NumberLiteral(Number),
    BooleanLiteral(bool),
    NullLiteral,
    Punctuation(Punctuation),
}

impl Token {
    pub fn is_punctuation(&self, p: Punctuation) -> bool {
        matches!(self, Token::Punctuation(q) if *q == p)
    }
}

/// Writes the token the way it is spelled in JSON text. String contents are written
/// between quotes without re-escaping.
impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::StringLiteral(s) => write!(f, "\"{s}\""),
            Token::NumberLiteral(n) => fmt::Display::fmt(n, f),
            Token::BooleanLiteral(b) => write!(f, "{b}"),
            Token::NullLiteral => f.write_str("null"),
            Token::Punctuation(p) => fmt::Display::fmt(p, f),
        }
    }
}

impl From<Punctuation> for Token {
    fn from(p: Punctuation) -> Token {
        Token::Punctuation(p)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_display_uses_json_spelling() {
        let shown: Vec<String> = [
            Token::StringLiteral("a b".to_string()),
            Token::NumberLiteral(Number::Integer(-3)),
            Token::NumberLiteral(Number::Float(0.5)),
            Token::NumberLiteral(Number::Float(1e300)),
            Token::BooleanLiteral(true),
            Token::NullLiteral,
            Punctuation::Comma.into(),
            Punctuation::RightBrace.into(),
        ]
        .iter()
        .map(|t| t.to_string())
        .collect();
        assert_eq!(
            shown,
            ["\"a b\"", "-3", "0.5", "1e300", "true", "null", ",", "}"]
        );
    }
}
