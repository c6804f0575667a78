//! secp256k1 ECDSA verification and signing
//!
//! Messages are treated as pre-hashed: the decoded message bytes feed the
//! ECDSA equation directly, the way the operator client signs them. Nothing
//! here hashes the message first.

use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use k256::FieldBytes;
use log::debug;
use super::der::{SignatureComponents, SCALAR_SIZE};
use super::error::CryptoError;

/// Verifies a base64 DER signature over a base64 message with a base64 SEC1
/// public key.
///
/// Fails closed: any decoding problem, an off-curve key, a malformed DER
/// sequence or an out-of-range component yields `false`.
pub fn verify(signature_b64: &str, message_b64: &str, public_key_b64: &str) -> bool {
    match try_verify(signature_b64, message_b64, public_key_b64) {
        Ok(valid) => valid,
        Err(e) => {
            debug!("Signature rejected: {}", e);
            false
        }
    }
}

fn try_verify(signature_b64: &str, message_b64: &str, public_key_b64: &str) -> Result<bool, CryptoError> {
    let public_key = base64::decode(public_key_b64)?;
    let message = base64::decode(message_b64)?;
    let signature = base64::decode(signature_b64)?;

    let key = decode_public_key(&public_key)?;
    let signature = decode_signature(&signature)?;

    Ok(key.verify_prehash(&message, &signature).is_ok())
}

/// Decodes a compressed or uncompressed SEC1 point on secp256k1.
pub fn decode_public_key(bytes: &[u8]) -> Result<VerifyingKey, CryptoError> {
    VerifyingKey::from_sec1_bytes(bytes)
        .map_err(|_| CryptoError::InvalidPublicKey("not a point on secp256k1".to_string()))
}

/// Decodes DER into a signature whose components lie in `[1, n-1]`.
///
/// A high S is folded to `n - S`; both satisfy the same verification
/// equation, so signers that skip low-S normalisation still verify.
pub fn decode_signature(der: &[u8]) -> Result<Signature, CryptoError> {
    let components = SignatureComponents::from_der(der)?;

    let signature = Signature::from_scalars(
        FieldBytes::clone_from_slice(&components.r),
        FieldBytes::clone_from_slice(&components.s),
    ).map_err(|_| CryptoError::MalformedSignature("component out of range".to_string()))?;

    Ok(signature.normalize_s().unwrap_or(signature))
}

/// Signs `message` as a pre-hash with a raw 32-byte private scalar and
/// returns the DER encoding.
pub fn sign_prehash(message: &[u8], private_key: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let key = SigningKey::from_slice(private_key)
        .map_err(|_| CryptoError::InvalidPrivateKey("scalar out of range".to_string()))?;

    let signature: Signature = key.sign_prehash(message)
        .map_err(|e| CryptoError::SigningError(e.to_string()))?;

    let (r, s) = signature.split_bytes();
    SignatureComponents { r: scalar_bytes(&r), s: scalar_bytes(&s) }.to_der()
}

fn scalar_bytes(bytes: &FieldBytes) -> [u8; SCALAR_SIZE] {
    let mut out = [0u8; SCALAR_SIZE];
    out.copy_from_slice(bytes.as_slice());
    out
}

/// Signs a base64 message with a base64 private scalar, returning a base64
/// DER signature. This is what the operator sends alongside a challenge.
pub fn sign(message_b64: &str, private_key_b64: &str) -> Result<String, CryptoError> {
    let message = base64::decode(message_b64)?;
    let private_key = base64::decode(private_key_b64)?;

    let der = sign_prehash(&message, &private_key)?;
    Ok(base64::encode(der))
}
