use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Malformed signature: {0}")]
    MalformedSignature(String),

    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    #[error("Signing error: {0}")]
    SigningError(String),
}

impl From<base64::DecodeError> for CryptoError {
    fn from(err: base64::DecodeError) -> Self {
        CryptoError::InvalidEncoding(err.to_string())
    }
}

impl From<der::Error> for CryptoError {
    fn from(err: der::Error) -> Self {
        CryptoError::MalformedSignature(err.to_string())
    }
}
