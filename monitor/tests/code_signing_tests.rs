use common::config::RevocationMode;
use common::{FileRecord, MonitorError};
use integrity_monitor::signing::{ChainFault, CodeSigningValidator, SigningError, TrustStore};
use integrity_monitor::IntegrityEngine;
use common::FileEntry;
use der::DecodePem;
use rustls_pki_types::UnixTime;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use webpki::OwnedCertRevocationList;
use x509_cert::Certificate;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

/// 2030-01-01T00:00:00Z, inside every fixture's validity window.
fn in_window() -> UnixTime {
    UnixTime::since_unix_epoch(Duration::from_secs(1_893_456_000))
}

fn trusted_root() -> TrustStore {
    TrustStore::from_pem(&fs::read(fixture("trusted_root.pem")).unwrap()).unwrap()
}

fn validator(trust: TrustStore, mode: RevocationMode) -> CodeSigningValidator {
    CodeSigningValidator::new(trust, vec!["exe".to_string()], mode, Duration::from_secs(2))
}

#[test]
fn test_trusted_chain_populates_publisher() {
    let validator = validator(trusted_root(), RevocationMode::Offline);
    let publisher = validator.inspect_at(&fixture("signed_by_root.exe"), in_window()).unwrap();

    assert!(publisher.subject.contains("CN=Contoso Signing"));
    assert!(publisher.issuer.contains("CN=Integrity Test Root CA"));

    let mut record = FileRecord::for_path("signed_by_root.exe");
    validator.validate_at(&fixture("signed_by_root.exe"), &mut record, in_window());
    assert!(record.publisher_information.as_deref().unwrap().contains("Contoso Signing"));
    assert_eq!(record.valid_from.as_deref(), Some("10-19-2026 15:37"));
    assert_eq!(record.valid_to.as_deref(), Some("05-13-2125 15:37"));
    assert!(record.issued_by.as_deref().unwrap().contains("Integrity Test Root CA"));
    assert!(record.error_message.is_none());
}

#[test]
fn test_self_signed_is_rejected() {
    let validator = validator(trusted_root(), RevocationMode::Offline);
    let err = validator.inspect_at(&fixture("self_signed.exe"), in_window()).unwrap_err();
    assert_eq!(err, SigningError::ChainInvalid(ChainFault::SelfSigned));

    let mut record = FileRecord::for_path("self_signed.exe");
    record.response_hashed = Some("digest".to_string());
    validator.validate_at(&fixture("self_signed.exe"), &mut record, in_window());

    assert!(!record.has_publisher());
    assert!(record.valid_from.is_none() && record.valid_to.is_none() && record.issued_by.is_none());
    assert_eq!(
        record.error_message.as_deref(),
        Some("Certificate chain is not valid: certificate is self-signed")
    );
    assert_eq!(record.response_hashed.as_deref(), Some("digest"));
}

#[test]
fn test_untrusted_root() {
    let validator = validator(TrustStore::empty(), RevocationMode::Offline);
    let err = validator.inspect_at(&fixture("signed_by_root.exe"), in_window()).unwrap_err();
    assert_eq!(err, SigningError::ChainInvalid(ChainFault::UntrustedIssuer));
}

#[test]
fn test_outside_validity_window() {
    let validator = validator(trusted_root(), RevocationMode::Offline);
    let before_issue = UnixTime::since_unix_epoch(Duration::from_secs(1_700_000_000));
    let err = validator.inspect_at(&fixture("signed_by_root.exe"), before_issue).unwrap_err();
    assert_eq!(err, SigningError::ChainInvalid(ChainFault::Expired));
}

#[test]
fn test_unreachable_crl_invalidates_chain() {
    let validator = validator(trusted_root(), RevocationMode::Online);
    let err = validator.inspect_at(&fixture("signed_by_root.exe"), in_window()).unwrap_err();
    assert_eq!(err, SigningError::ChainInvalid(ChainFault::RevocationUnavailable));
}

fn certificate(name: &str) -> Certificate {
    Certificate::from_pem(fs::read(fixture(name)).unwrap()).unwrap()
}

fn crl(name: &str) -> OwnedCertRevocationList {
    OwnedCertRevocationList::from_der(&fs::read(fixture(name)).unwrap()).unwrap()
}

fn revocation_root() -> TrustStore {
    TrustStore::from_pem(&fs::read(fixture("revocation_root.pem")).unwrap()).unwrap()
}

#[test]
fn test_current_crl_without_entry_accepts_chain() {
    let publisher = certificate("revocation_publisher.pem");
    let result = revocation_root().verify(&publisher, &[], Some(vec![crl("revocation_empty.crl")]), in_window());
    assert_eq!(result, Ok(()));
}

#[test]
fn test_crl_listing_signer_is_revoked() {
    let publisher = certificate("revocation_publisher.pem");
    let result = revocation_root().verify(&publisher, &[], Some(vec![crl("revocation_revoked.crl")]), in_window());
    assert_eq!(result, Err(ChainFault::Revoked));

    // Without revocation data the same chain is sound.
    assert_eq!(revocation_root().verify(&publisher, &[], None, in_window()), Ok(()));
}

#[test]
fn test_crl_from_another_issuer_leaves_status_unknown() {
    let publisher = certificate("publisher.pem");
    let result = trusted_root().verify(&publisher, &[], Some(vec![crl("revocation_empty.crl")]), in_window());
    assert_eq!(result, Err(ChainFault::RevocationUnavailable));
}

#[test]
fn test_non_pe_files_have_no_signature() {
    let validator = validator(trusted_root(), RevocationMode::Offline);
    let err = validator.inspect_at(&fixture("trusted_root.pem"), in_window()).unwrap_err();
    assert_eq!(err, SigningError::NoSignature);
}

#[test]
fn test_engine_enriches_only_signed_extensions() {
    let engine = IntegrityEngine::new(
        fixture(""),
        Some(validator(trusted_root(), RevocationMode::Offline)),
    );

    let files = ["signed_by_root.exe", "publisher.pem"]
        .iter()
        .map(|f| FileEntry { filename: f.to_string() })
        .collect::<Vec<_>>();
    let records = engine.hash_named_at(&files, in_window());

    assert!(records[0].is_hashed() && records[0].has_publisher());
    assert!(records[1].is_hashed() && !records[1].has_publisher());
    assert!(records[1].error_message.is_none());
}

#[test]
fn test_modified_image_keeps_publisher_but_changes_hash() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut image = fs::read(fixture("signed_by_root.exe")).unwrap();
    // Inside the DOS stub, outside anything the signature parser reads.
    image[0x50] ^= 0xff;
    fs::write(dir.path().join("signed_by_root.exe"), &image).unwrap();

    let entries = [FileEntry { filename: "signed_by_root.exe".to_string() }];
    let engine = |root: PathBuf| IntegrityEngine::new(root, Some(validator(trusted_root(), RevocationMode::Offline)));
    let original = engine(fixture("")).hash_named_at(&entries, in_window());
    let modified = engine(dir.path().to_path_buf()).hash_named_at(&entries, in_window());

    assert!(original[0].has_publisher() && modified[0].has_publisher());
    assert_eq!(original[0].publisher_information, modified[0].publisher_information);
    assert_ne!(original[0].response_hashed, modified[0].response_hashed);
}

#[test]
fn test_trust_store_rejects_garbage() {
    assert!(TrustStore::from_pem(b"-----BEGIN CERTIFICATE-----\nAAAA\n-----END CERTIFICATE-----\n").is_err());
}

#[test]
fn test_blank_trust_store_is_config_error() {
    let blanks: [&[u8]; 4] = [b"", b"\n", b"\r\n\n", b"  \t\n"];
    for blank in blanks {
        assert!(matches!(TrustStore::from_pem(blank), Err(MonitorError::ConfigError(_))));
    }

    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("roots.pem");
    fs::write(&path, b"\n\n").unwrap();
    assert!(matches!(TrustStore::load(&path), Err(MonitorError::ConfigError(_))));
}
