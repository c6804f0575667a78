use actix_web::{ResponseError, HttpResponse};
use thiserror::Error;
use crate::crypto::error::CryptoError;

pub type Result<T> = std::result::Result<T, MonitorError>;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Crypto error: {0}")]
    CryptoError(String),
    #[error("I/O error: {0}")]
    IoError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Authentication failed")]
    AuthenticationError,
    #[error("Scan error: {0}")]
    ScanError(String),
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<std::io::Error> for MonitorError {
    fn from(err: std::io::Error) -> Self {
        MonitorError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for MonitorError {
    fn from(err: serde_json::Error) -> Self {
        MonitorError::SerializationError(err.to_string())
    }
}

impl From<CryptoError> for MonitorError {
    fn from(err: CryptoError) -> Self {
        MonitorError::CryptoError(err.to_string())
    }
}

impl ResponseError for MonitorError {
    fn error_response(&self) -> HttpResponse {
        match self {
            // Rejections carry no hint about which check failed.
            Self::AuthenticationError => HttpResponse::Forbidden().json(Vec::<()>::new()),
            Self::ConfigError(_) |
            Self::ScanError(_) |
            Self::SerializationError(_) => HttpResponse::BadRequest().json(self.to_string()),
            Self::CryptoError(_) |
            Self::IoError(_) |
            Self::InternalError(_) => {
                HttpResponse::InternalServerError().json(self.to_string())
            }
        }
    }
}
