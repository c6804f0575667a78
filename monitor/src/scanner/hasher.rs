use chrono::{DateTime, Utc};
use common::FileRecord;
use log::debug;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::time::SystemTime;

/// Timestamp layout used for every date a record carries.
pub const TIMESTAMP_FORMAT: &str = "%m-%d-%Y %H:%M";

const READ_BUFFER_SIZE: usize = 64 * 1024;

pub fn format_timestamp(time: DateTime<Utc>) -> String {
    time.format(TIMESTAMP_FORMAT).to_string()
}

/// Computes content digests and creation times. Never fails; problems end
/// up in the record's error message.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileHasher;

impl FileHasher {
    pub fn new() -> Self {
        Self
    }

    /// Hashes `path`, reporting it in the record as `display_name`.
    pub fn hash(&self, path: &Path, display_name: &str) -> FileRecord {
        let mut record = FileRecord::for_path(display_name);

        if !path.is_file() {
            debug!("{} was not found", path.display());
            record.error_message = Some(format!("Filename: {} was not found", display_name));
            return record;
        }

        match digest_and_created(path) {
            Ok((digest, created)) => {
                record.response_hashed = Some(digest);
                record.creation_date_time = Some(format_timestamp(created));
            }
            Err(e) => {
                debug!("Failed to hash {}: {}", path.display(), e);
                record.error_message = Some(format!("Filename: {} could not be read: {}", display_name, e));
            }
        }

        record
    }
}

fn digest_and_created(path: &Path) -> io::Result<(String, DateTime<Utc>)> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    let metadata = file.metadata()?;
    let created = metadata.created()
        .or_else(|_| metadata.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH);

    Ok((base64::encode(hasher.finalize()), DateTime::<Utc>::from(created)))
}
