// Coletor Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ColetorError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid import header: expected {expected:?}, got {found:?}")]
    InvalidHeader {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("Room code collision for '{0}'")]
    CodeCollision(String),

    #[error("Room not found: {0}")]
    RoomNotFound(String),

    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for ColetorError {
    fn from(err: anyhow::Error) -> Self {
        ColetorError::Other(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ColetorError>;
