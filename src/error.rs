//! Error types for sockchat

use thiserror::Error;

/// Main error type for sockchat
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bind failed: {0}")]
    Bind(String),

    #[error("Connect failed: {0}")]
    Connect(String),
}

/// Result type alias for sockchat
pub type Result<T> = std::result::Result<T, Error>;
