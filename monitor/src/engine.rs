//! Hashing pipeline behind the two privileged operations
//!
//! Files are hashed in parallel on the rayon pool; results keep the order in
//! which paths were supplied or discovered.

use common::config::Config;
use common::{FileEntry, FileRecord, Result};
use log::{info, warn};
use rayon::prelude::*;
use rustls_pki_types::UnixTime;
use std::path::{Path, PathBuf};
use crate::scanner::{DirectoryWalker, FileHasher};
use crate::signing::CodeSigningValidator;

pub struct IntegrityEngine {
    root: PathBuf,
    hasher: FileHasher,
    validator: Option<CodeSigningValidator>,
}

impl IntegrityEngine {
    pub fn new(root: impl Into<PathBuf>, validator: Option<CodeSigningValidator>) -> Self {
        Self {
            root: root.into(),
            hasher: FileHasher::new(),
            validator,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let validator = if config.code_signing.enabled {
            Some(CodeSigningValidator::from_config(&config.code_signing)?)
        } else {
            None
        };

        Ok(Self::new(config.monitor_root.clone(), validator))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn code_signing_enabled(&self) -> bool {
        self.validator.is_some()
    }

    /// Hashes each named file. Relative names resolve against the monitored
    /// root. The output matches the input in length and order.
    pub fn hash_named(&self, files: &[FileEntry]) -> Vec<FileRecord> {
        self.hash_named_at(files, UnixTime::now())
    }

    pub fn hash_named_at(&self, files: &[FileEntry], time: UnixTime) -> Vec<FileRecord> {
        let records: Vec<FileRecord> = files
            .par_iter()
            .map(|entry| self.process(&self.resolve(&entry.filename), &entry.filename, time))
            .collect();

        info!(
            "Hashed {} of {} requested file(s)",
            records.iter().filter(|r| r.is_hashed()).count(),
            records.len()
        );
        records
    }

    /// Hashes every file under the root whose name matches `pattern`.
    /// An invalid pattern produces no records.
    pub fn list_and_hash(&self, pattern: &str) -> Vec<FileRecord> {
        self.list_and_hash_at(pattern, UnixTime::now())
    }

    pub fn list_and_hash_at(&self, pattern: &str, time: UnixTime) -> Vec<FileRecord> {
        let walker = match DirectoryWalker::new(&self.root, pattern) {
            Ok(walker) => walker,
            Err(e) => {
                warn!("{}", e);
                return Vec::new();
            }
        };

        let paths: Vec<PathBuf> = walker.collect();
        let records: Vec<FileRecord> = paths
            .par_iter()
            .map(|path| self.process(path, &path.display().to_string(), time))
            .collect();

        info!("Listed {} file(s) matching {:?} under {}", records.len(), pattern, self.root.display());
        records
    }

    fn resolve(&self, name: &str) -> PathBuf {
        let path = Path::new(name);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    fn process(&self, path: &Path, display_name: &str, time: UnixTime) -> FileRecord {
        let mut record = self.hasher.hash(path, display_name);

        if let Some(validator) = &self.validator {
            if record.is_hashed() && validator.applies_to(path) {
                validator.validate_at(path, &mut record, time);
            }
        }

        record
    }
}
