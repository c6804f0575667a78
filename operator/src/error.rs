use common::crypto::CryptoError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, OperatorError>;

#[derive(Error, Debug)]
pub enum OperatorError {
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Request rejected by monitor (HTTP {0})")]
    Rejected(u16),
    #[error("Crypto error: {0}")]
    CryptoError(#[from] CryptoError),
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<reqwest::Error> for OperatorError {
    fn from(err: reqwest::Error) -> Self {
        OperatorError::NetworkError(err.to_string())
    }
}
