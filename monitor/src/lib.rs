pub mod security;
pub mod scanner;
pub mod signing;
pub mod engine;
pub mod server;

pub use engine::IntegrityEngine;
pub use security::{AuthGate, ChallengeStore};
pub use server::MonitorServer;
