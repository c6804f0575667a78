pub mod error;
pub mod der;
pub mod ecdsa;
pub mod keys;

pub use error::CryptoError;
pub use der::SignatureComponents;
pub use keys::{KeyPair, DemoKeyPair, generate_key_pair, demo_key_pair};
