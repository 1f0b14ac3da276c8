use hoplink_core::CoreError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ShortenError {
    #[error("alias already taken: {0}")]
    AliasTaken(String),
    #[error("short-code generation exhausted after {attempts} attempts")]
    GenerationExhausted { attempts: u32 },
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("invalid custom alias: {0}")]
    InvalidAlias(String),
    #[error("invalid owner identifier: {0}")]
    InvalidOwner(String),
    #[error("invalid expiry: {0}")]
    InvalidExpiry(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<CoreError> for ShortenError {
    fn from(value: CoreError) -> Self {
        match value {
            CoreError::InvalidShortCode(message) => Self::InvalidAlias(message),
            CoreError::InvalidOwner(message) => Self::InvalidOwner(message),
        }
    }
}
