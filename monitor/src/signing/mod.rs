//! Publisher identity from embedded code signatures
//!
//! The validator pulls the Authenticode signature out of a PE image, checks
//! that the signer chains to a configured root (optionally with CRL-based
//! revocation) and reports who signed it.

use chrono::{DateTime, Utc};
use common::config::{CodeSigningConfig, RevocationMode};
use common::{FileRecord, Result};
use log::debug;
use rustls_pki_types::UnixTime;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use x509_cert::Certificate;
use crate::scanner::format_timestamp;

pub mod authenticode;
pub mod chain;
pub mod revocation;

pub use authenticode::EmbeddedSignature;
pub use chain::TrustStore;
use revocation::CrlFetcher;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainFault {
    #[error("certificate is self-signed")]
    SelfSigned,
    #[error("issuer is not a trusted root")]
    UntrustedIssuer,
    #[error("certificate is outside its validity period")]
    Expired,
    #[error("certificate has been revoked")]
    Revoked,
    #[error("revocation status could not be determined")]
    RevocationUnavailable,
    #[error("{0}")]
    Other(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SigningError {
    #[error("Filename: {0} was not found")]
    NotFound(String),
    #[error("No digital signature found")]
    NoSignature,
    #[error("Digital signature could not be parsed: {0}")]
    MalformedSignature(String),
    #[error("Certificate chain is not valid: {0}")]
    ChainInvalid(ChainFault),
}

impl From<ChainFault> for SigningError {
    fn from(fault: ChainFault) -> Self {
        SigningError::ChainInvalid(fault)
    }
}

/// Identity of a validated signer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publisher {
    pub subject: String,
    pub issuer: String,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
}

impl Publisher {
    fn from_certificate(cert: &Certificate) -> Self {
        let tbs = &cert.tbs_certificate;
        Self {
            subject: tbs.subject.to_string(),
            issuer: tbs.issuer.to_string(),
            valid_from: DateTime::<Utc>::from(tbs.validity.not_before.to_system_time()),
            valid_to: DateTime::<Utc>::from(tbs.validity.not_after.to_system_time()),
        }
    }

    pub fn apply(&self, record: &mut FileRecord) {
        record.publisher_information = Some(self.subject.clone());
        record.valid_from = Some(format_timestamp(self.valid_from));
        record.valid_to = Some(format_timestamp(self.valid_to));
        record.issued_by = Some(self.issuer.clone());
    }
}

pub struct CodeSigningValidator {
    trust: TrustStore,
    extensions: Vec<String>,
    revocation: Option<CrlFetcher>,
}

impl CodeSigningValidator {
    pub fn new(
        trust: TrustStore,
        extensions: Vec<String>,
        mode: RevocationMode,
        timeout: Duration,
    ) -> Self {
        let revocation = match mode {
            RevocationMode::Online => Some(CrlFetcher::new(timeout)),
            RevocationMode::Offline => None,
        };

        Self { trust, extensions, revocation }
    }

    pub fn from_config(config: &CodeSigningConfig) -> Result<Self> {
        let trust = match &config.trust_store {
            Some(path) => TrustStore::load(path)?,
            None => TrustStore::empty(),
        };

        Ok(Self::new(trust, config.extensions.clone(), config.revocation_mode, config.revocation_timeout))
    }

    /// Whether `path` has one of the inspected extensions.
    pub fn applies_to(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }

    pub fn inspect(&self, path: &Path) -> std::result::Result<Publisher, SigningError> {
        self.inspect_at(path, UnixTime::now())
    }

    /// Extracts and validates the signature of `path` as of `time`.
    pub fn inspect_at(&self, path: &Path, time: UnixTime) -> std::result::Result<Publisher, SigningError> {
        let signature = authenticode::extract(path)?;

        self.trust.verify(&signature.signer, &signature.intermediates, None, time)?;

        // Revocation only matters once the path itself is sound; the root is
        // never checked.
        if let Some(fetcher) = &self.revocation {
            let mut subjects: Vec<&Certificate> = vec![&signature.signer];
            subjects.extend(signature.intermediates.iter().filter(|c| !chain::is_self_signed(c)));

            let crls = fetcher.fetch_for(&subjects)?;
            self.trust.verify(&signature.signer, &signature.intermediates, Some(crls), time)?;
        }

        Ok(Publisher::from_certificate(&signature.signer))
    }

    /// Adds publisher fields to `record`, or appends the failure to its
    /// error message. Content-hash fields are left untouched.
    pub fn validate(&self, path: &Path, record: &mut FileRecord) {
        self.validate_at(path, record, UnixTime::now())
    }

    pub fn validate_at(&self, path: &Path, record: &mut FileRecord, time: UnixTime) {
        match self.inspect_at(path, time) {
            Ok(publisher) => publisher.apply(record),
            Err(e) => {
                debug!("Code signing check of {} failed: {}", path.display(), e);
                let message = e.to_string();
                record.error_message = Some(match record.error_message.take() {
                    Some(existing) => format!("{}; {}", existing, message),
                    None => message,
                });
            }
        }
    }
}
