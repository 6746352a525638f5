//! Error taxonomy for the request/response surface

use thiserror::Error;

/// Errors returned by session lifecycle requests
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("Stream not found")]
    NotFound,

    #[error("Invalid password")]
    Unauthorized,

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl RelayError {
    /// HTTP status code reported for this error
    pub fn status(&self) -> u16 {
        match self {
            RelayError::NotFound => 404,
            RelayError::Unauthorized => 401,
            RelayError::InvalidInput(_) => 400,
        }
    }
}

pub type RelayResult<T> = std::result::Result<T, RelayError>;
