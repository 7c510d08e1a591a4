//! Common error types for bookdupes

use thiserror::Error;

/// Common result type for bookdupes operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the bookdupes crates
#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level HTTP failure (wraps reqwest::Error)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Catalog server answered with a non-success status
    #[error("Catalog API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Response body could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Parse(e.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(format!("Parse TOML failed: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_errors_become_parse_errors() {
        let err: Error = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_toml_errors_become_config_errors() {
        let err: Error = toml::from_str::<toml::Value>("a = ").unwrap_err().into();
        assert!(err.to_string().starts_with("Configuration error: Parse TOML failed"));
    }
}
