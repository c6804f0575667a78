use globset::{GlobBuilder, GlobMatcher};
use log::debug;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use common::{MonitorError, Result};

/// Depth-first walk over a directory tree yielding files whose name matches
/// a glob. Matching ignores ASCII case, so `*.dll` also finds `App.DLL`.
///
/// Pending directories live on an explicit stack rather than the call stack.
/// Matches in a directory are yielded before its subdirectories are
/// visited. Directories that cannot be read are skipped.
pub struct DirectoryWalker {
    matcher: GlobMatcher,
    pending: Vec<PathBuf>,
    ready: VecDeque<PathBuf>,
}

impl DirectoryWalker {
    pub fn new(root: impl Into<PathBuf>, pattern: &str) -> Result<Self> {
        let matcher = GlobBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| MonitorError::ScanError(format!("invalid search pattern {:?}: {}", pattern, e)))?
            .compile_matcher();

        Ok(Self {
            matcher,
            pending: vec![root.into()],
            ready: VecDeque::new(),
        })
    }

    fn visit(&mut self, dir: &Path) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("Skipping {}: {}", dir.display(), e);
                return;
            }
        };

        let mut subdirs = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping entry in {}: {}", dir.display(), e);
                    continue;
                }
            };

            // Symlinks report their own type here, so linked directories are
            // never pushed.
            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(e) => {
                    debug!("Skipping {}: {}", entry.path().display(), e);
                    continue;
                }
            };

            let path = entry.path();
            if file_type.is_dir() {
                subdirs.push(path);
            } else if self.matcher.is_match(entry.file_name()) && !is_dir_link(&path) {
                self.ready.push_back(path);
            }
        }

        self.pending.extend(subdirs);
    }
}

fn is_dir_link(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false)
}

impl Iterator for DirectoryWalker {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            if let Some(path) = self.ready.pop_front() {
                return Some(path);
            }
            let dir = self.pending.pop()?;
            self.visit(&dir);
        }
    }
}
