use chrono::{Duration as ChronoDuration, Utc};
use common::config::DEFAULT_CHALLENGE_CAPACITY;
use common::security::{random_token, Challenge};
use log::debug;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use subtle::ConstantTimeEq;

/// Single-use challenges keyed by session id.
///
/// At most `capacity` live challenges are held; issuing past that evicts the
/// oldest.
pub struct ChallengeStore {
    challenges: Mutex<HashMap<String, Challenge>>,
    length: usize,
    ttl: ChronoDuration,
    capacity: usize,
}

impl ChallengeStore {
    pub fn new(length: usize, ttl: Duration) -> Self {
        Self {
            challenges: Mutex::new(HashMap::new()),
            length,
            ttl: ChronoDuration::from_std(ttl).unwrap_or_else(|_| ChronoDuration::seconds(300)),
            capacity: DEFAULT_CHALLENGE_CAPACITY,
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Issues a fresh token for `session_id`, replacing any earlier one.
    pub fn issue(&self, session_id: &str) -> Challenge {
        let challenge = Challenge {
            value: random_token(self.length),
            session_id: session_id.to_string(),
            issued_at: Utc::now(),
            consumed: false,
        };

        let mut challenges = self.challenges.lock();
        let now = Utc::now();
        let ttl = self.ttl;
        challenges.retain(|_, c| !c.consumed && now - c.issued_at < ttl);

        if !challenges.contains_key(session_id) && challenges.len() >= self.capacity {
            let oldest = challenges.iter()
                .min_by_key(|(_, c)| c.issued_at)
                .map(|(id, _)| id.clone());
            if let Some(oldest) = oldest {
                debug!("Challenge store full, evicting session {}", oldest);
                challenges.remove(&oldest);
            }
        }
        challenges.insert(session_id.to_string(), challenge.clone());

        debug!("Issued challenge for session {} ({} outstanding)", session_id, challenges.len());
        challenge
    }

    /// Checks `submitted` against the session's challenge and burns it.
    ///
    /// The check and the mark happen under one lock, so two concurrent
    /// submissions cannot both succeed. The challenge is consumed whether or
    /// not the value matched.
    pub fn consume(&self, session_id: &str, submitted: &str) -> bool {
        let mut challenges = self.challenges.lock();

        let challenge = match challenges.get_mut(session_id) {
            Some(challenge) => challenge,
            None => {
                debug!("No challenge outstanding for session {}", session_id);
                return false;
            }
        };

        if challenge.consumed {
            debug!("Challenge for session {} already consumed", session_id);
            return false;
        }
        challenge.consumed = true;

        if Utc::now() - challenge.issued_at >= self.ttl {
            debug!("Challenge for session {} expired", session_id);
            return false;
        }

        challenge.value.as_bytes().ct_eq(submitted.as_bytes()).into()
    }

    /// Number of challenges that are neither consumed nor expired.
    pub fn outstanding(&self) -> usize {
        let now = Utc::now();
        self.challenges.lock()
            .values()
            .filter(|c| !c.consumed && now - c.issued_at < self.ttl)
            .count()
    }
}

impl Default for ChallengeStore {
    fn default() -> Self {
        Self::new(common::security::DEFAULT_CHALLENGE_LENGTH, Duration::from_secs(300))
    }
}
