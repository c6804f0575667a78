use der::Encode;
use log::{debug, info};
use rustls_pki_types::{CertificateDer, SignatureVerificationAlgorithm, TrustAnchor, UnixTime};
use std::fs;
use std::path::Path;
use std::time::{Duration, UNIX_EPOCH};
use webpki::{
    CertRevocationList, EndEntityCert, KeyUsage, OwnedCertRevocationList, RevocationCheckDepth,
    RevocationOptionsBuilder, UnknownStatusPolicy,
};
use x509_cert::Certificate;
use common::{MonitorError, Result};
use super::ChainFault;

/// DER value of id-kp-codeSigning (1.3.6.1.5.5.7.3.3).
const CODE_SIGNING_EKU: &[u8] = &[0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x03, 0x03];

static SUPPORTED_ALGORITHMS: &[&dyn SignatureVerificationAlgorithm] = &[
    webpki::ring::ECDSA_P256_SHA256,
    webpki::ring::ECDSA_P256_SHA384,
    webpki::ring::ECDSA_P384_SHA256,
    webpki::ring::ECDSA_P384_SHA384,
    webpki::ring::RSA_PKCS1_2048_8192_SHA256,
    webpki::ring::RSA_PKCS1_2048_8192_SHA384,
    webpki::ring::RSA_PKCS1_2048_8192_SHA512,
    webpki::ring::RSA_PKCS1_3072_8192_SHA384,
    webpki::ring::ED25519,
];

/// Root certificates a publisher chain must terminate in.
#[derive(Debug, Default)]
pub struct TrustStore {
    anchors: Vec<TrustAnchor<'static>>,
}

impl TrustStore {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let pem = fs::read(path).map_err(|e| {
            MonitorError::ConfigError(format!("cannot read trust store {}: {}", path.display(), e))
        })?;
        let store = Self::from_pem(&pem)?;
        info!("Loaded {} trusted root(s) from {}", store.len(), path.display());
        Ok(store)
    }

    /// Parses a PEM bundle. A bundle with no certificates is rejected.
    pub fn from_pem(pem: &[u8]) -> Result<Self> {
        // load_pem_chain underflows on blank input.
        if pem.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(MonitorError::ConfigError("trust store contains no certificates".to_string()));
        }

        let certificates = Certificate::load_pem_chain(pem)
            .map_err(|e| MonitorError::ConfigError(format!("invalid trust store: {}", e)))?;

        let mut anchors = Vec::with_capacity(certificates.len());
        for cert in &certificates {
            let der = cert.to_der()
                .map_err(|e| MonitorError::ConfigError(format!("invalid trust store: {}", e)))?;
            let der = CertificateDer::from(der);
            let anchor = webpki::anchor_from_trusted_cert(&der)
                .map_err(|e| MonitorError::ConfigError(format!("unusable trust anchor: {:?}", e)))?
                .to_owned();
            anchors.push(anchor);
        }

        Ok(Self { anchors })
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Validates the path from `signer` through `intermediates` to a trusted
    /// root at `time`. With `crls` present every non-root certificate must
    /// have a known, unrevoked status.
    pub fn verify(
        &self,
        signer: &Certificate,
        intermediates: &[Certificate],
        crls: Option<Vec<OwnedCertRevocationList>>,
        time: UnixTime,
    ) -> std::result::Result<(), ChainFault> {
        check_validity(signer, time)?;

        let signer_der = CertificateDer::from(encode(signer)?);
        let intermediate_ders = intermediates.iter()
            .map(|cert| encode(cert).map(CertificateDer::from))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let end_entity = EndEntityCert::try_from(&signer_der)
            .map_err(|e| ChainFault::Other(format!("unparseable signer certificate: {}", e)))?;

        let crls: Option<Vec<CertRevocationList<'_>>> = crls.map(|owned| {
            owned.into_iter().map(CertRevocationList::from).collect()
        });
        let crl_refs: Option<Vec<&CertRevocationList<'_>>> = crls.as_ref().map(|c| c.iter().collect());

        let revocation = match &crl_refs {
            Some(refs) => Some(
                RevocationOptionsBuilder::new(refs)
                    .map_err(|_| ChainFault::RevocationUnavailable)?
                    .with_depth(RevocationCheckDepth::Chain)
                    .with_status_policy(UnknownStatusPolicy::Deny)
                    .build(),
            ),
            None => None,
        };

        end_entity
            .verify_for_usage(
                SUPPORTED_ALGORITHMS,
                &self.anchors,
                &intermediate_ders,
                time,
                KeyUsage::required_if_present(CODE_SIGNING_EKU),
                revocation,
                None,
            )
            .map(|_| ())
            .map_err(|e| classify(e, signer))
    }
}

fn encode(cert: &Certificate) -> std::result::Result<Vec<u8>, ChainFault> {
    cert.to_der()
        .map_err(|e| ChainFault::Other(format!("certificate re-encoding failed: {}", e)))
}

fn check_validity(cert: &Certificate, time: UnixTime) -> std::result::Result<(), ChainFault> {
    let validity = &cert.tbs_certificate.validity;
    let now = Duration::from_secs(time.as_secs());

    if now < validity.not_before.to_unix_duration() || now > validity.not_after.to_unix_duration() {
        debug!(
            "{} is valid {:?}..{:?}, checked at {:?}",
            cert.tbs_certificate.subject,
            validity.not_before.to_system_time(),
            validity.not_after.to_system_time(),
            UNIX_EPOCH + now
        );
        return Err(ChainFault::Expired);
    }
    Ok(())
}

fn classify(err: webpki::Error, signer: &Certificate) -> ChainFault {
    match err {
        webpki::Error::CertRevoked => ChainFault::Revoked,
        webpki::Error::UnknownRevocationStatus => ChainFault::RevocationUnavailable,
        // A self-signed signer fails either as an unknown issuer or as a CA
        // presented as an end entity.
        _ if is_self_signed(signer) => ChainFault::SelfSigned,
        webpki::Error::UnknownIssuer => ChainFault::UntrustedIssuer,
        other => ChainFault::Other(other.to_string()),
    }
}

pub fn is_self_signed(cert: &Certificate) -> bool {
    cert.tbs_certificate.subject == cert.tbs_certificate.issuer
}
