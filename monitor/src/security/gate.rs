use common::crypto::ecdsa;
use common::{MonitorError, Result};
use log::warn;
use super::ChallengeStore;

/// Binary access check guarding every privileged request.
///
/// A request passes only if the submitted challenge is the one bound to the
/// session and the signature over it verifies against the configured key.
pub struct AuthGate {
    store: ChallengeStore,
    public_key: Option<String>,
}

impl AuthGate {
    pub fn new(store: ChallengeStore, public_key: Option<String>) -> Self {
        if public_key.is_none() {
            warn!("No client public key configured; every request will be rejected");
        }
        Self { store, public_key }
    }

    pub fn store(&self) -> &ChallengeStore {
        &self.store
    }

    /// Consumes the session's challenge and verifies the signature.
    ///
    /// The challenge is burnt before the signature is looked at, so a
    /// rejected attempt cannot be retried with the same token.
    pub fn authorize(&self, session_id: Option<&str>, challenge: &str, signature: &str) -> Result<()> {
        let session_id = match session_id {
            Some(id) => id,
            None => {
                warn!("Rejected request without a session");
                return Err(MonitorError::AuthenticationError);
            }
        };

        if !self.store.consume(session_id, challenge) {
            warn!("Rejected request for session {}: challenge mismatch or not issued", session_id);
            return Err(MonitorError::AuthenticationError);
        }

        let public_key = match &self.public_key {
            Some(key) => key,
            None => {
                warn!("Rejected request for session {}: no trusted key configured", session_id);
                return Err(MonitorError::AuthenticationError);
            }
        };

        if !ecdsa::verify(signature, challenge, public_key) {
            warn!("Rejected request for session {}: signature invalid", session_id);
            return Err(MonitorError::AuthenticationError);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::crypto::generate_key_pair;

    fn gate() -> (AuthGate, String) {
        let pair = generate_key_pair().unwrap();
        (AuthGate::new(ChallengeStore::default(), Some(pair.public_key)), pair.private_key)
    }

    #[test]
    fn test_signed_challenge_accepted_once() {
        let (gate, private_key) = gate();
        let challenge = gate.store().issue("s1").value;
        let signature = ecdsa::sign(&challenge, &private_key).unwrap();

        assert!(gate.authorize(Some("s1"), &challenge, &signature).is_ok());
        assert!(matches!(
            gate.authorize(Some("s1"), &challenge, &signature),
            Err(MonitorError::AuthenticationError)
        ));
    }

    #[test]
    fn test_bad_signature_burns_challenge() {
        let (gate, private_key) = gate();
        let challenge = gate.store().issue("s1").value;
        let other = generate_key_pair().unwrap();
        let forged = ecdsa::sign(&challenge, &other.private_key).unwrap();

        assert!(gate.authorize(Some("s1"), &challenge, &forged).is_err());

        let genuine = ecdsa::sign(&challenge, &private_key).unwrap();
        assert!(gate.authorize(Some("s1"), &challenge, &genuine).is_err());
    }

    #[test]
    fn test_signature_for_other_challenge_rejected() {
        let (gate, private_key) = gate();
        let challenge = gate.store().issue("s1").value;
        let stale = common::security::random_token(32);
        let signature = ecdsa::sign(&stale, &private_key).unwrap();

        assert!(gate.authorize(Some("s1"), &challenge, &signature).is_err());
    }

    #[test]
    fn test_missing_session_or_key_rejected() {
        let (gate, private_key) = gate();
        let challenge = gate.store().issue("s1").value;
        let signature = ecdsa::sign(&challenge, &private_key).unwrap();
        assert!(gate.authorize(None, &challenge, &signature).is_err());

        let keyless = AuthGate::new(ChallengeStore::default(), None);
        let challenge = keyless.store().issue("s1").value;
        assert!(keyless.authorize(Some("s1"), &challenge, &signature).is_err());
    }
}
