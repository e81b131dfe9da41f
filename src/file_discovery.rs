use crate::error::{Result, ZddxError};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default file name matcher: every `*.xml` file, case-sensitive
pub const DEFAULT_PATTERN: &str = r"^.*\.xml$";

/// Lists the device description files of a single directory
#[derive(Debug, Clone)]
pub struct FileDiscovery {
    /// File name pattern a candidate must match
    pattern: Regex,
    /// Sort by file name instead of keeping directory-listing order
    sorted: bool,
}

impl FileDiscovery {
    /// Create a new FileDiscovery instance matching `*.xml`
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(DEFAULT_PATTERN).expect("default pattern is valid"),
            sorted: false,
        }
    }

    /// Replace the file name pattern
    pub fn with_pattern(mut self, pattern: &str) -> Result<Self> {
        self.pattern = Regex::new(pattern).map_err(|e| {
            ZddxError::Config(format!("Invalid file pattern '{}': {}", pattern, e))
        })?;
        Ok(self)
    }

    /// Sort discovered files by name
    pub fn with_sorted(mut self, sorted: bool) -> Self {
        self.sorted = sorted;
        self
    }

    /// Discover matching files among the immediate entries of `dir`.
    ///
    /// Subdirectories are never entered. Without sorting, files come back in
    /// whatever order the filesystem lists them.
    pub fn discover_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let read_dir = fs::read_dir(dir).map_err(|e| ZddxError::FileSystemTraversal {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut files = Vec::new();
        for entry in read_dir {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                    continue;
                }
            };

            let path = entry.path();
            if !self.should_process(&path) {
                continue;
            }

            // Follows symlinks, so a link to a device file is still indexed
            match fs::metadata(&path) {
                Ok(metadata) if metadata.is_file() => files.push(path),
                Ok(_) => debug!("Ignoring non-file entry {}", path.display()),
                Err(e) => warn!("Skipping {}: {}", path.display(), e),
            }
        }

        if self.sorted {
            files.sort();
        }

        debug!("Discovered {} file(s) in {}", files.len(), dir.display());
        Ok(files)
    }

    /// Check if a file name matches the discovery pattern
    pub fn should_process(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .map(|name| self.pattern.is_match(name))
            .unwrap_or(false)
    }
}

impl Default for FileDiscovery {
    fn default() -> Self {
        Self::new()
    }
}
