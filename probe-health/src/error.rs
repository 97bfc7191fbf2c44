//! Error types for configuration and serving
//!
//! Health queries never surface these: `Check` always answers with a serving
//! status and `Watch` answers with a `tonic::Status`. Errors only come from
//! loading configuration and running the gRPC transport.

use thiserror::Error;

/// Result type alias using the crate's error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while configuring or serving the health endpoint
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// gRPC transport error
    #[error("gRPC transport error: {0}")]
    Transport(Box<tonic::transport::Error>),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Bind address could not be parsed
    #[error("Invalid listen address: {0}")]
    InvalidAddress(String),
}

// Manual From implementations for boxed errors
impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(Box::new(err))
    }
}

impl From<tonic::transport::Error> for Error {
    fn from(err: tonic::transport::Error) -> Self {
        Error::Transport(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_address_display() {
        let err = Error::InvalidAddress("not-a-host:50051".to_string());
        assert_eq!(err.to_string(), "Invalid listen address: not-a-host:50051");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::AddrInUse, "port taken");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("port taken"));
    }

    #[test]
    fn test_figment_error_is_boxed() {
        let err: Error = figment::Error::from("bad value".to_string()).into();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().starts_with("Configuration error"));
    }
}
