//! Filesystem enumeration and content hashing

mod hasher;
mod walker;

pub use hasher::{format_timestamp, FileHasher, TIMESTAMP_FORMAT};
pub use walker::DirectoryWalker;
