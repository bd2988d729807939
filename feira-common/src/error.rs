//! Shared error type for the feira backend

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by configuration loading and database code
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file unreadable or malformed
    #[error("Configuration error: {0}")]
    Config(String),
}
