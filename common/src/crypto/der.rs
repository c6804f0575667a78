//! ASN.1 DER codec for ECDSA signatures
//!
//! A signature travels as `SEQUENCE { r INTEGER, s INTEGER }`. Decoding accepts
//! exactly two non-negative, minimally encoded integers that fit in a
//! secp256k1 scalar; anything else is rejected as malformed.

use der::asn1::UintRef;
use der::{Decode, Encode, Sequence};
use super::error::CryptoError;

/// Width of a secp256k1 scalar in bytes.
pub const SCALAR_SIZE: usize = 32;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Sequence)]
struct EcdsaSigValue<'a> {
    r: UintRef<'a>,
    s: UintRef<'a>,
}

/// The two integer components of an ECDSA signature, big-endian and
/// left-padded to the scalar width.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureComponents {
    pub r: [u8; SCALAR_SIZE],
    pub s: [u8; SCALAR_SIZE],
}

impl SignatureComponents {
    /// Decodes a DER `SEQUENCE` of two integers.
    pub fn from_der(bytes: &[u8]) -> Result<Self, CryptoError> {
        let value = EcdsaSigValue::from_der(bytes)?;

        Ok(Self {
            r: pad_scalar(value.r.as_bytes())?,
            s: pad_scalar(value.s.as_bytes())?,
        })
    }

    pub fn to_der(&self) -> Result<Vec<u8>, CryptoError> {
        let value = EcdsaSigValue {
            r: UintRef::new(&self.r)?,
            s: UintRef::new(&self.s)?,
        };

        value.to_der()
            .map_err(|e| CryptoError::SigningError(e.to_string()))
    }
}

fn pad_scalar(bytes: &[u8]) -> Result<[u8; SCALAR_SIZE], CryptoError> {
    if bytes.len() > SCALAR_SIZE {
        return Err(CryptoError::MalformedSignature(format!(
            "integer component is {} bytes, expected at most {}",
            bytes.len(),
            SCALAR_SIZE
        )));
    }

    let mut out = [0u8; SCALAR_SIZE];
    out[SCALAR_SIZE - bytes.len()..].copy_from_slice(bytes);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn components(r: u8, s: u8) -> SignatureComponents {
        let mut out = SignatureComponents { r: [0u8; 32], s: [0u8; 32] };
        out.r[31] = r;
        out.s[31] = s;
        out
    }

    #[test]
    fn test_encode_small_integers() {
        let der = components(1, 2).to_der().unwrap();
        assert_eq!(der, vec![0x30, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01, 0x02]);
    }

    #[test]
    fn test_high_bit_gets_sign_padding() {
        let mut sig = components(0, 1);
        sig.r = [0xff; 32];
        let der = sig.to_der().unwrap();
        // 0x00 prefix keeps r positive.
        assert_eq!(&der[2..5], &[0x02, 0x21, 0x00]);
        assert_eq!(SignatureComponents::from_der(&der).unwrap(), sig);
    }

    #[test]
    fn test_rejects_three_integers() {
        let der = [0x30, 0x09, 0x02, 0x01, 0x01, 0x02, 0x01, 0x02, 0x02, 0x01, 0x03];
        assert!(SignatureComponents::from_der(&der).is_err());
    }

    #[test]
    fn test_rejects_single_integer() {
        let der = [0x30, 0x03, 0x02, 0x01, 0x01];
        assert!(SignatureComponents::from_der(&der).is_err());
    }

    #[test]
    fn test_rejects_non_integer_element() {
        let der = [0x30, 0x06, 0x04, 0x01, 0x01, 0x02, 0x01, 0x02];
        assert!(SignatureComponents::from_der(&der).is_err());
    }

    #[test]
    fn test_rejects_negative_integer() {
        let der = [0x30, 0x06, 0x02, 0x01, 0x81, 0x02, 0x01, 0x02];
        assert!(SignatureComponents::from_der(&der).is_err());
    }

    #[test]
    fn test_rejects_trailing_bytes_and_truncation() {
        let mut der = components(1, 2).to_der().unwrap();
        der.push(0x00);
        assert!(SignatureComponents::from_der(&der).is_err());

        let der = components(1, 2).to_der().unwrap();
        assert!(SignatureComponents::from_der(&der[..der.len() - 1]).is_err());
        assert!(SignatureComponents::from_der(&[]).is_err());
    }

    #[test]
    fn test_rejects_oversized_component() {
        let mut der = vec![0x30, 0x27, 0x02, 0x22, 0x01];
        der.extend_from_slice(&[0u8; 33]);
        der.extend_from_slice(&[0x02, 0x01, 0x01]);
        assert!(SignatureComponents::from_der(&der).is_err());
    }
}
