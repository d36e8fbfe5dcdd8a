//! Error types for database seeding.

use thiserror::Error;

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;

/// Errors that can occur while seeding the database.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Stack output not found: {0}")]
    MissingOutput(String),

    #[error("Stack output {key} is invalid: {reason}")]
    InvalidOutput { key: String, reason: String },

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
