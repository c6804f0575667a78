pub mod client;
pub mod error;

pub use client::OperatorClient;
pub use error::{OperatorError, Result};
