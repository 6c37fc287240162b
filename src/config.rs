//! Scanner configuration

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::{CONTEXT_RADIUS, DEFAULT_EXTENSION, MAX_FILE_SIZE, MAX_FILES};

/// Where to look and how much work one search may do
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Container whose children are plugin-like roots
    pub plugins_dir:    PathBuf,
    /// Container whose children are theme-like roots
    pub themes_dir:     PathBuf,
    /// The scanner's own install directory, never scanned
    pub self_dir:       Option<PathBuf>,
    /// Source file extension, without the dot
    pub extension:      String,
    /// Files counted before a search stops walking
    pub max_files:      usize,
    /// Files larger than this are skipped
    pub max_file_bytes: u64,
    /// Lines shown on each side of a detail target
    pub context_radius: usize,
}

impl ScanConfig {
    /// Create a configuration with default limits
    #[must_use]
    pub fn new(plugins_dir: impl Into<PathBuf>, themes_dir: impl Into<PathBuf>) -> Self {
        Self {
            plugins_dir:    plugins_dir.into(),
            themes_dir:     themes_dir.into(),
            self_dir:       None,
            extension:      DEFAULT_EXTENSION.to_owned(),
            max_files:      MAX_FILES,
            max_file_bytes: MAX_FILE_SIZE,
            context_radius: CONTEXT_RADIUS,
        }
    }

    /// Exclude the scanner's own install directory from plugin roots
    #[must_use]
    pub fn with_self_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.self_dir = Some(dir.into());
        self
    }

    /// Set the source extension to scan
    #[must_use]
    pub fn with_extension(mut self, extension: &str) -> Self {
        extension.clone_into(&mut self.extension);
        self
    }

    /// Set the per-search file budget
    #[must_use]
    pub fn with_max_files(mut self, max_files: usize) -> Self {
        self.max_files = max_files;
        self
    }

    /// Set the per-file size limit
    #[must_use]
    pub fn with_max_file_bytes(mut self, max_file_bytes: u64) -> Self {
        self.max_file_bytes = max_file_bytes;
        self
    }

    /// Set how many lines surround a detail target
    #[must_use]
    pub fn with_context_radius(mut self, radius: usize) -> Self {
        self.context_radius = radius;
        self
    }

    /// Check the configuration before any scan uses it
    ///
    /// # Errors
    /// Returns `Error::Config` if:
    /// - Either budget is zero
    /// - The extension is empty or contains a dot, separator or glob syntax
    pub fn validate(&self) -> Result<()> {
        if self.max_files == 0 {
            return Err(Error::config("max files must be at least 1"));
        }
        if self.max_file_bytes == 0 {
            return Err(Error::config("max file bytes must be at least 1"));
        }
        if self.extension.is_empty() {
            return Err(Error::config("extension must not be empty"));
        }
        if self.extension.chars().any(|c| !c.is_ascii_alphanumeric() && c != '_' && c != '-') {
            return Err(Error::config(&format!(
                "extension '{}' must be plain alphanumerics without a leading dot",
                self.extension
            )));
        }
        Ok(())
    }

    /// Whether `path` is the scanner's own install directory
    #[must_use]
    pub fn is_self(&self, path: &Path) -> bool {
        self.self_dir.as_deref().is_some_and(|own| same_dir(own, path))
    }
}

/// Compare two directories, resolving links where both exist
fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
