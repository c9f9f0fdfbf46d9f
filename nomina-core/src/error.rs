//! Error types for nomina-core.
//!
//! Resolution itself never fails: bad spans are dropped and weak names are
//! routed to the lowest tier. These errors cover the surfaces around it:
//! configuration, JSON input batches, and misuse of the cluster arena.

use thiserror::Error;

/// Result type for nomina operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for nomina operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration value out of range or inconsistent.
    #[error("Config error: {0}")]
    Config(String),

    /// Parse error.
    #[error("Parse error: {0}")]
    Parse(String),

    /// JSON (de)serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create an invalid input error.
    #[must_use]
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a parse error.
    #[must_use]
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind() {
        let err = Error::config("min_confidence must be within [0, 1]");
        assert_eq!(
            err.to_string(),
            "Config error: min_confidence must be within [0, 1]"
        );
    }

    #[test]
    fn json_errors_convert() {
        let parse: std::result::Result<u32, _> = serde_json::from_str("not json");
        let err: Error = parse.unwrap_err().into();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
