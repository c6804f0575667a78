use log::debug;
use std::time::Duration;
use webpki::OwnedCertRevocationList;
use x509_cert::ext::pkix::name::{DistributionPointName, GeneralName};
use x509_cert::ext::pkix::CrlDistributionPoints;
use x509_cert::Certificate;
use super::ChainFault;

/// Downloads CRLs named in certificates' distribution points.
///
/// The blocking HTTP client is built per lookup so it is only ever created
/// and dropped on a blocking thread.
pub struct CrlFetcher {
    timeout: Duration,
}

impl CrlFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Fetches one CRL per certificate. Any certificate without a
    /// reachable, parseable CRL makes the whole lookup fail.
    pub fn fetch_for(&self, certificates: &[&Certificate]) -> Result<Vec<OwnedCertRevocationList>, ChainFault> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.timeout)
            .build()
            .map_err(|e| ChainFault::Other(format!("failed to build CRL client: {}", e)))?;

        let mut crls = Vec::with_capacity(certificates.len());
        for cert in certificates {
            let urls = distribution_points(cert);
            if urls.is_empty() {
                debug!("{} names no CRL distribution point", cert.tbs_certificate.subject);
                return Err(ChainFault::RevocationUnavailable);
            }

            let crl = urls.iter()
                .find_map(|url| fetch(&client, url))
                .ok_or(ChainFault::RevocationUnavailable)?;
            crls.push(crl);
        }

        Ok(crls)
    }
}

fn fetch(client: &reqwest::blocking::Client, url: &str) -> Option<OwnedCertRevocationList> {
    let response = match client.get(url).send().and_then(|r| r.error_for_status()) {
        Ok(response) => response,
        Err(e) => {
            debug!("CRL fetch from {} failed: {}", url, e);
            return None;
        }
    };

    let body = match response.bytes() {
        Ok(body) => body,
        Err(e) => {
            debug!("CRL body from {} unreadable: {}", url, e);
            return None;
        }
    };

    match OwnedCertRevocationList::from_der(&body) {
        Ok(crl) => Some(crl),
        Err(e) => {
            debug!("CRL from {} rejected: {:?}", url, e);
            None
        }
    }
}

/// HTTP(S) URIs from the certificate's CRL distribution points extension.
pub fn distribution_points(cert: &Certificate) -> Vec<String> {
    let points = match cert.tbs_certificate.get::<CrlDistributionPoints>() {
        Ok(Some((_, points))) => points,
        _ => return Vec::new(),
    };

    points.0
        .iter()
        .filter_map(|point| match &point.distribution_point {
            Some(DistributionPointName::FullName(names)) => Some(names),
            _ => None,
        })
        .flatten()
        .filter_map(|name| match name {
            GeneralName::UniformResourceIdentifier(uri) => Some(uri.to_string()),
            _ => None,
        })
        .filter(|uri| uri.starts_with("http://") || uri.starts_with("https://"))
        .collect()
}
