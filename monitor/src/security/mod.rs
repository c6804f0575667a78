mod challenge;
mod gate;

pub use challenge::ChallengeStore;
pub use gate::AuthGate;
