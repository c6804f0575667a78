use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use crate::error::{MonitorError, Result};
use crate::security::DEFAULT_CHALLENGE_LENGTH;

/// Upper bound on challenges held at once.
pub const DEFAULT_CHALLENGE_CAPACITY: usize = 10_000;

/// Shortest token whose base64 decoding reaches the 16-byte pre-hash minimum.
pub const MIN_CHALLENGE_LENGTH: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevocationMode {
    /// Fetch CRLs for every non-root certificate in the chain.
    Online,
    /// Skip revocation checking.
    Offline,
}

impl FromStr for RevocationMode {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "online" => Ok(RevocationMode::Online),
            "offline" => Ok(RevocationMode::Offline),
            other => Err(MonitorError::ConfigError(format!("unknown revocation mode: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeSigningConfig {
    pub enabled: bool,
    /// Lower-case extensions, without the dot, that are checked for an
    /// embedded signature.
    pub extensions: Vec<String>,
    pub trust_store: Option<PathBuf>,
    pub revocation_mode: RevocationMode,
    pub revocation_timeout: Duration,
}

impl Default for CodeSigningConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            extensions: ["exe", "dll", "sys", "msi", "ocx"]
                .iter()
                .map(|e| e.to_string())
                .collect(),
            trust_store: None,
            revocation_mode: RevocationMode::Online,
            revocation_timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub bind_address: String,
    pub monitor_root: PathBuf,
    /// Base64 SEC1 secp256k1 key the operator signs challenges with.
    pub client_public_key: Option<String>,
    pub challenge_length: usize,
    pub challenge_ttl: Duration,
    pub challenge_capacity: usize,
    pub enable_demo_keys: bool,
    pub code_signing: CodeSigningConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            monitor_root: PathBuf::from(".."),
            client_public_key: None,
            challenge_length: DEFAULT_CHALLENGE_LENGTH,
            challenge_ttl: Duration::from_secs(300),
            challenge_capacity: DEFAULT_CHALLENGE_CAPACITY,
            enable_demo_keys: false,
            code_signing: CodeSigningConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let signing_defaults = CodeSigningConfig::default();

        let code_signing = CodeSigningConfig {
            enabled: parse_or(&lookup, "CODE_SIGNING_ENABLED", signing_defaults.enabled, parse_bool)?,
            extensions: lookup("CODE_SIGNING_EXTENSIONS")
                .map(|v| parse_extensions(&v))
                .unwrap_or(signing_defaults.extensions),
            trust_store: lookup("TRUST_STORE")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            revocation_mode: parse_or(&lookup, "REVOCATION_MODE", signing_defaults.revocation_mode, |v| v.parse())?,
            revocation_timeout: Duration::from_secs(parse_or(
                &lookup,
                "REVOCATION_TIMEOUT_SECS",
                signing_defaults.revocation_timeout.as_secs(),
                parse_number,
            )?),
        };

        let challenge_length = parse_or(&lookup, "CHALLENGE_LENGTH", defaults.challenge_length, parse_number)?;
        // The signed message is the base64 decoding of the token and must be
        // long enough to serve as an ECDSA pre-hash.
        if challenge_length % 4 != 0 || challenge_length < MIN_CHALLENGE_LENGTH {
            return Err(MonitorError::ConfigError(format!(
                "CHALLENGE_LENGTH must be a multiple of 4 and at least {}, got {}",
                MIN_CHALLENGE_LENGTH, challenge_length
            )));
        }

        let challenge_capacity = parse_or(&lookup, "CHALLENGE_CAPACITY", defaults.challenge_capacity, parse_number)?;
        if challenge_capacity == 0 {
            return Err(MonitorError::ConfigError("CHALLENGE_CAPACITY must be positive".to_string()));
        }

        Ok(Self {
            bind_address: lookup("BIND_ADDRESS").unwrap_or(defaults.bind_address),
            monitor_root: lookup("MONITOR_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.monitor_root),
            client_public_key: lookup("CLIENT_PUBLIC_KEY_ECDSA")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            challenge_length,
            challenge_ttl: Duration::from_secs(parse_or(
                &lookup,
                "CHALLENGE_TTL_SECS",
                defaults.challenge_ttl.as_secs(),
                parse_number,
            )?),
            challenge_capacity,
            enable_demo_keys: parse_or(&lookup, "ENABLE_DEMO_KEYS", defaults.enable_demo_keys, parse_bool)?,
            code_signing,
        })
    }
}

fn parse_or<F, T, P>(lookup: &F, key: &str, default: T, parse: P) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    P: Fn(&str) -> Result<T>,
{
    match lookup(key) {
        Some(value) => parse(value.trim())
            .map_err(|e| MonitorError::ConfigError(format!("{}: {}", key, e))),
        None => Ok(default),
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(MonitorError::ConfigError(format!("not a boolean: {}", other))),
    }
}

fn parse_number<T: FromStr>(value: &str) -> Result<T> {
    value.parse()
        .map_err(|_| MonitorError::ConfigError(format!("not a number: {}", value)))
}

fn parse_extensions(value: &str) -> Vec<String> {
    value.split(',')
        .map(|e| e.trim().trim_start_matches('.').to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}
