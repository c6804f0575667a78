use common::crypto::ecdsa;
use common::security::ChallengeResponse;
use common::{FileEntry, FileRecord, FileTreeRequest, HashFilesRequest};
use log::{debug, info};
use reqwest::Client;
use std::time::Duration;
use crate::error::{OperatorError, Result};

/// Talks to a monitor on behalf of the holder of the trusted private key.
///
/// The underlying client keeps cookies, so the session the challenge was
/// issued to is the one the signed request is sent from.
pub struct OperatorClient {
    http: Client,
    server_url: String,
    private_key: Option<String>,
}

impl OperatorClient {
    pub fn new(server_url: &str, private_key: Option<String>) -> Result<Self> {
        let http = Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(300))
            .build()?;

        Ok(Self {
            http,
            server_url: server_url.trim_end_matches('/').to_string(),
            private_key,
        })
    }

    pub async fn challenge(&self, path: &str) -> Result<String> {
        let response = self.http
            .get(format!("{}{}", self.server_url, path))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(OperatorError::Rejected(response.status().as_u16()));
        }

        let body: ChallengeResponse = response.json().await?;
        debug!("Received challenge of {} characters", body.challenge.len());
        Ok(body.challenge)
    }

    fn sign(&self, challenge: &str) -> Result<String> {
        let key = self.private_key.as_deref().ok_or_else(|| {
            OperatorError::ConfigError("a private key is required for signed requests".to_string())
        })?;
        Ok(ecdsa::sign(challenge, key)?)
    }

    pub async fn hash_files(&self, files: &[String]) -> Result<Vec<FileRecord>> {
        let challenge = self.challenge("/").await?;
        let request = HashFilesRequest {
            files: files.iter().map(|f| FileEntry { filename: f.clone() }).collect(),
            signature: self.sign(&challenge)?,
            challenge,
        };

        info!("Requesting hashes for {} file(s)", files.len());
        self.submit("/", &request).await
    }

    pub async fn file_tree(&self, pattern: &str) -> Result<Vec<FileRecord>> {
        let challenge = self.challenge("/GetFilesStructure").await?;
        let request = FileTreeRequest {
            search_pattern: pattern.to_string(),
            signature: self.sign(&challenge)?,
            challenge,
        };

        info!("Requesting file tree for pattern {:?}", pattern);
        self.submit("/GetFilesStructure", &request).await
    }

    async fn submit<T: serde::Serialize>(&self, path: &str, body: &T) -> Result<Vec<FileRecord>> {
        let response = self.http
            .post(format!("{}{}", self.server_url, path))
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(OperatorError::Rejected(response.status().as_u16()));
        }

        Ok(response.json().await?)
    }
}
