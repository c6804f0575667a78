//! Authenticode signature extraction
//!
//! Reads the attribute certificate table of a PE image and decodes the
//! PKCS#7 `SignedData` it carries into the signer certificate and whatever
//! other certificates were embedded alongside it.
//!
//! Only the certificates are used. Neither the SignerInfo signature nor the
//! image digest it covers is checked, so a genuine signature block copied
//! onto a modified image still names its publisher. The content hash is what
//! detects modification.

use cms::cert::CertificateChoices;
use cms::content_info::ContentInfo;
use cms::signed_data::{SignedData, SignerIdentifier};
use der::oid::ObjectIdentifier;
use der::{Reader, SliceReader};
use goblin::pe::certificate_table::AttributeCertificateType;
use goblin::pe::PE;
use std::fs;
use std::path::Path;
use x509_cert::Certificate;
use super::SigningError;

const ID_SIGNED_DATA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.7.2");

/// Certificates recovered from an embedded signature.
#[derive(Debug, Clone)]
pub struct EmbeddedSignature {
    pub signer: Certificate,
    pub intermediates: Vec<Certificate>,
}

pub fn extract(path: &Path) -> Result<EmbeddedSignature, SigningError> {
    let bytes = fs::read(path)
        .map_err(|_| SigningError::NotFound(path.display().to_string()))?;
    extract_from_bytes(&bytes)
}

pub fn extract_from_bytes(bytes: &[u8]) -> Result<EmbeddedSignature, SigningError> {
    // Anything that is not a PE image simply carries no signature.
    let pe = PE::parse(bytes).map_err(|_| SigningError::NoSignature)?;

    let attribute = pe.certificates
        .iter()
        .find(|c| c.certificate_type == AttributeCertificateType::PkcsSignedData)
        .ok_or(SigningError::NoSignature)?;

    parse_signed_data(attribute.certificate)
}

/// Decodes a DER `ContentInfo` wrapping `SignedData`. Bytes after the
/// `ContentInfo` (table padding) are ignored.
pub fn parse_signed_data(bytes: &[u8]) -> Result<EmbeddedSignature, SigningError> {
    let mut reader = SliceReader::new(bytes).map_err(malformed)?;
    let info: ContentInfo = reader.decode().map_err(malformed)?;

    if info.content_type != ID_SIGNED_DATA {
        return Err(SigningError::MalformedSignature(format!(
            "unexpected content type {}",
            info.content_type
        )));
    }

    let signed_data: SignedData = info.content.decode_as().map_err(malformed)?;

    let mut certificates: Vec<Certificate> = signed_data.certificates
        .iter()
        .flat_map(|set| set.0.iter())
        .filter_map(|choice| match choice {
            CertificateChoices::Certificate(cert) => Some(cert.clone()),
            _ => None,
        })
        .collect();

    if certificates.is_empty() {
        return Err(SigningError::NoSignature);
    }

    let signer_index = signed_data.signer_infos.0
        .iter()
        .find_map(|info| match &info.sid {
            SignerIdentifier::IssuerAndSerialNumber(id) => certificates.iter().position(|cert| {
                cert.tbs_certificate.issuer == id.issuer
                    && cert.tbs_certificate.serial_number == id.serial_number
            }),
            _ => None,
        })
        .unwrap_or(0);

    let signer = certificates.remove(signer_index);
    Ok(EmbeddedSignature { signer, intermediates: certificates })
}

fn malformed(err: der::Error) -> SigningError {
    SigningError::MalformedSignature(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_pe_has_no_signature() {
        assert!(matches!(
            extract_from_bytes(b"just some text, not an image"),
            Err(SigningError::NoSignature)
        ));
        assert!(matches!(extract_from_bytes(&[]), Err(SigningError::NoSignature)));
    }

    #[test]
    fn test_garbage_signed_data_is_malformed() {
        assert!(matches!(
            parse_signed_data(&[0x30, 0x03, 0x02, 0x01, 0x01]),
            Err(SigningError::MalformedSignature(_))
        ));
        assert!(matches!(parse_signed_data(&[0xff, 0x00]), Err(SigningError::MalformedSignature(_))));
    }

    #[test]
    fn test_missing_file_reported() {
        assert!(matches!(
            extract(Path::new("/definitely/not/here.exe")),
            Err(SigningError::NotFound(_))
        ));
    }
}
