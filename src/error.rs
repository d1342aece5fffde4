//! Global error handling for dirdigest
//!
//! Most digest and attachment operations are total and never surface an
//! error. This type covers the edges that can fail: settings I/O, renderer
//! state (de)serialization, output writing and cancellation.

use std::io;
use thiserror::Error;

/// Global error type for dirdigest operations
#[derive(Error, Debug)]
pub enum DigestError {
    /// File system errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON processing errors (settings, renderer state)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed settings document
    #[error("Configuration error: {0}")]
    Config(String),

    /// A build was cancelled through its cancel token
    #[error("Digest build cancelled")]
    Cancelled,

    /// Path not found
    #[error("Path not found: {0}")]
    PathNotFound(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Specialized Result type for dirdigest operations
pub type Result<T> = std::result::Result<T, DigestError>;

/// Creates a DigestError with a formatted message
#[macro_export]
macro_rules! error {
    ($error_type:ident, $($arg:tt)*) => {
        $crate::error::DigestError::$error_type(format!($($arg)*))
    };
}

/// Returns an error result with a formatted message
#[macro_export]
macro_rules! bail {
    ($error_type:ident, $($arg:tt)*) => {
        return Err($crate::error!($error_type, $($arg)*))
    };
}

/// Ensures a condition is true, otherwise returns an error
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $error_type:ident, $($arg:tt)*) => {
        if !($cond) {
            $crate::bail!($error_type, $($arg)*)
        }
    };
}

impl From<DigestError> for io::Error {
    fn from(err: DigestError) -> Self {
        match err {
            DigestError::Io(e) => e,
            DigestError::Cancelled => io::Error::new(io::ErrorKind::Interrupted, err.to_string()),
            DigestError::PathNotFound(_) => io::Error::new(io::ErrorKind::NotFound, err.to_string()),
            other => io::Error::new(io::ErrorKind::Other, other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_positive(n: i64) -> Result<i64> {
        crate::ensure!(n > 0, InvalidArgument, "expected a positive number, got {}", n);
        Ok(n)
    }

    #[test]
    fn test_ensure_macro() {
        assert_eq!(check_positive(3).unwrap(), 3);
        let err = check_positive(-1).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid argument: expected a positive number, got -1"
        );
    }

    #[test]
    fn test_io_conversion_keeps_kind() {
        let err: io::Error = DigestError::Cancelled.into();
        assert_eq!(err.kind(), io::ErrorKind::Interrupted);

        let err: io::Error = DigestError::PathNotFound("/nope".into()).into();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
