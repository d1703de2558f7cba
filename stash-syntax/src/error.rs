use std::fmt;

/// Value errors raised while interpreting a single filter token.
///
/// Structural problems never produce an error: unbalanced parentheses and
/// stray separators are absorbed by the tokenizer and parser. Only operands
/// that cannot be coerced to their field's type end up here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A whole-number field (`score`, `width`, ...) got a non-integer operand.
    InvalidNumber { field: String, value: String },
    InvalidSize(String),
    UnknownSizeUnit(String),
    InvalidDuration(String),
    InvalidAspectRatio(String),
    InvalidTimestamp(String),
    InvalidDate(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidNumber { field, value } => {
                write!(f, "invalid number in {field}: {value:?}")
            }
            ParseError::InvalidSize(value) => write!(f, "invalid size format: {value:?}"),
            ParseError::UnknownSizeUnit(unit) => write!(f, "unknown size unit: {unit:?}"),
            ParseError::InvalidDuration(value) => write!(f, "invalid duration: {value:?}"),
            ParseError::InvalidAspectRatio(value) => write!(f, "invalid aspect ratio: {value:?}"),
            ParseError::InvalidTimestamp(value) => write!(f, "invalid unix timestamp: {value:?}"),
            ParseError::InvalidDate(value) => write!(f, "invalid date format: {value:?}"),
        }
    }
}

impl std::error::Error for ParseError {}
