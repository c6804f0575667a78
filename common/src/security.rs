use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};
use rand::{rngs::OsRng, RngCore};

/// Symbols a challenge token is drawn from.
pub const CHALLENGE_ALPHABET: &[u8; 62] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

pub const DEFAULT_CHALLENGE_LENGTH: usize = 32;

/// A single-use token bound to the session it was issued to.
#[derive(Debug, Clone)]
pub struct Challenge {
    pub value: String,
    pub session_id: String,
    pub issued_at: DateTime<Utc>,
    pub consumed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeResponse {
    pub challenge: String,
}

/// Draws `len` bytes from the OS CSPRNG and maps each onto the alphabet by
/// `byte mod 62`.
pub fn random_token(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);

    bytes.iter()
        .map(|b| CHALLENGE_ALPHABET[*b as usize % CHALLENGE_ALPHABET.len()] as char)
        .collect()
}
