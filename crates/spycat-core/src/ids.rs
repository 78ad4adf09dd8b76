use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdParseError {
    #[error("identifier is empty")]
    Empty,
    #[error("identifier must be a non-negative integer, got {0:?}")]
    Invalid(String),
}

/// Parses a path identifier. Signs, whitespace and overflow are rejected.
pub fn parse_id(raw: &str) -> Result<i64, IdParseError> {
    if raw.is_empty() {
        return Err(IdParseError::Empty);
    }
    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(IdParseError::Invalid(raw.to_string()));
    }
    raw.parse::<i64>()
        .map_err(|_| IdParseError::Invalid(raw.to_string()))
}
