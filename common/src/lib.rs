pub mod error;
pub mod types;
pub mod config;
pub mod security;
pub mod crypto;
pub mod logging;

pub use error::{MonitorError, Result};
pub use types::*;
pub use config::*;
