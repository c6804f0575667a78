//! Diagnostic key generation
//!
//! Produces a secp256k1 key pair and proves it works by signing and verifying
//! a fresh random message. Used for operator onboarding only; nothing here is
//! consulted when authorising a request.

use k256::ecdsa::{SigningKey, VerifyingKey};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use crate::security::random_token;
use super::ecdsa;
use super::error::CryptoError;

/// Base64 transport form of a key pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPair {
    /// 32-byte big-endian private scalar.
    pub private_key: String,
    /// Uncompressed SEC1 public point (65 bytes).
    pub public_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoKeyPair {
    pub private_key: String,
    pub public_key: String,
    pub self_test_verified: bool,
}

pub fn generate_key_pair() -> Result<KeyPair, CryptoError> {
    let signing_key = SigningKey::random(&mut OsRng);
    let verifying_key = VerifyingKey::from(&signing_key);

    Ok(KeyPair {
        private_key: base64::encode(signing_key.to_bytes()),
        public_key: base64::encode(verifying_key.to_encoded_point(false).as_bytes()),
    })
}

/// Derives the base64 SEC1 public key belonging to a base64 private scalar.
pub fn public_key_from_private(private_key_b64: &str) -> Result<String, CryptoError> {
    let bytes = base64::decode(private_key_b64)?;
    let signing_key = SigningKey::from_slice(&bytes)
        .map_err(|_| CryptoError::InvalidPrivateKey("scalar out of range".to_string()))?;

    let point = VerifyingKey::from(&signing_key).to_encoded_point(false);
    Ok(base64::encode(point.as_bytes()))
}

pub fn demo_key_pair() -> Result<DemoKeyPair, CryptoError> {
    let pair = generate_key_pair()?;

    let message = base64::encode(random_token(32));
    let signature = ecdsa::sign(&message, &pair.private_key)?;
    let self_test_verified = ecdsa::verify(&signature, &message, &pair.public_key);

    Ok(DemoKeyPair {
        private_key: pair.private_key,
        public_key: pair.public_key,
        self_test_verified,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_key_matches_private_scalar() {
        let pair = generate_key_pair().unwrap();
        assert_eq!(public_key_from_private(&pair.private_key).unwrap(), pair.public_key);
    }

    #[test]
    fn test_key_encoding_sizes() {
        let pair = generate_key_pair().unwrap();
        assert_eq!(base64::decode(&pair.private_key).unwrap().len(), 32);

        let point = base64::decode(&pair.public_key).unwrap();
        assert_eq!(point.len(), 65);
        assert_eq!(point[0], 0x04);
    }

    #[test]
    fn test_pairs_are_distinct() {
        let a = generate_key_pair().unwrap();
        let b = generate_key_pair().unwrap();
        assert_ne!(a.private_key, b.private_key);
    }

    #[test]
    fn test_demo_self_test_passes() {
        let demo = demo_key_pair().unwrap();
        assert!(demo.self_test_verified);
    }

    #[test]
    fn test_zero_scalar_rejected() {
        let zero = base64::encode([0u8; 32]);
        assert!(public_key_from_private(&zero).is_err());
    }
}
