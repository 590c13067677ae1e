use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LootError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database file not found: {}", .0.display())]
    DatabaseNotFound(PathBuf),

    #[error("No database selected")]
    NoDatabase,

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl LootError {
    /// Map a rusqlite error, pulling constraint violations out into their own variant.
    pub(crate) fn from_sqlite(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, msg)
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                LootError::Constraint(msg.clone().unwrap_or_else(|| e.to_string()))
            }
            _ => LootError::Database(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, LootError>;
