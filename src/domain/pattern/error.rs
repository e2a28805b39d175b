//! Errors raised while resolving `{...}` pattern tokens.

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    #[error("unknown pattern token '{0}'")]
    UnknownToken(String),

    #[error("pattern '{0}' resolves outside the vault (absolute path, '..', or '**' is not allowed)")]
    UnsafePattern(String),

    #[error("invalid date/weekday format specifier '{0}'")]
    InvalidFormat(String),

    #[error("directory listing failed: {0}")]
    Lookup(String),
}

impl From<io::Error> for PatternError {
    fn from(value: io::Error) -> Self {
        PatternError::Lookup(value.to_string())
    }
}
