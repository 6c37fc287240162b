//! Directory crawler implementation

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ScanConfig;
use crate::error::{Error, Result};

/// File-count and file-size limits shared by every root of one search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanBudget {
    /// Files counted so far, including skipped oversized ones
    files_scanned:  usize,
    /// Files counted before the crawl stops
    max_files:      usize,
    /// Larger files are counted but not read
    max_file_bytes: u64,
}

impl ScanBudget {
    /// Create a fresh budget
    #[must_use]
    pub const fn new(max_files: usize, max_file_bytes: u64) -> Self {
        Self { files_scanned: 0, max_files, max_file_bytes }
    }

    /// Create a fresh budget from configured limits
    #[must_use]
    pub const fn from_config(config: &ScanConfig) -> Self {
        Self::new(config.max_files, config.max_file_bytes)
    }

    /// Files counted so far
    #[must_use]
    pub const fn files_scanned(&self) -> usize {
        self.files_scanned
    }

    /// Whether no more files may be counted
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.files_scanned >= self.max_files
    }

    /// Whether a file of `size` bytes may be read
    #[must_use]
    pub const fn allows_size(&self, size: u64) -> bool {
        size <= self.max_file_bytes
    }
}

/// A failure recovered during a scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScanIssue {
    /// A directory could not be listed
    DirectoryRead {
        /// Directory that failed
        path:    PathBuf,
        /// Underlying error text
        message: String,
    },
    /// A file could not be inspected or read
    FileRead {
        /// File that failed
        path:    PathBuf,
        /// Underlying error text
        message: String,
    },
}

impl ScanIssue {
    /// Record an unreadable directory
    #[must_use]
    pub fn directory(path: &Path, err: &std::io::Error) -> Self {
        Self::DirectoryRead { path: path.to_path_buf(), message: err.to_string() }
    }

    /// Record an unreadable file
    #[must_use]
    pub fn file(path: &Path, err: &std::io::Error) -> Self {
        Self::FileRead { path: path.to_path_buf(), message: err.to_string() }
    }
}

/// Build a case-insensitive matcher for `*.<extension>`
///
/// # Errors
/// Returns `Error::Pattern` if the extension does not form a valid glob
pub fn extension_matcher(extension: &str) -> Result<GlobMatcher> {
    let glob = GlobBuilder::new(&format!("*.{extension}"))
        .case_insensitive(true)
        .literal_separator(true)
        .build()
        .map_err(|e| Error::pattern(&format!("Invalid extension pattern: {e}")))?;
    Ok(glob.compile_matcher())
}

/// Depth-first crawler over a set of roots, yielding eligible source files
///
/// Entries of each directory are visited in name order so a crawl over an
/// unchanged tree is reproducible. Each yielded or size-skipped file is
/// charged to the shared [`ScanBudget`]; once it is exhausted the crawl ends
/// for every remaining root.
#[derive(Debug)]
pub struct Crawler<'a> {
    /// Directories waiting to be listed, last is next
    queue:     Vec<PathBuf>,
    /// Eligible files of the directory being processed
    pending:   VecDeque<PathBuf>,
    /// Budget shared across roots
    budget:    &'a mut ScanBudget,
    /// Extension filter
    filter:    GlobMatcher,
    /// Failures recovered so far
    issues:    Vec<ScanIssue>,
    /// Directories listed so far
    dir_count: usize,
    /// Set once the budget tripped
    stopped:   bool,
}

impl<'a> Crawler<'a> {
    /// Create a crawler over `roots`, visited in the given order
    ///
    /// # Errors
    /// Returns error if the extension cannot be compiled into a matcher
    pub fn new<I, P>(roots: I, extension: &str, budget: &'a mut ScanBudget) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut queue: Vec<PathBuf> = roots.into_iter().map(|p| p.as_ref().to_path_buf()).collect();
        queue.reverse();

        Ok(Self {
            queue,
            pending: VecDeque::new(),
            budget,
            filter: extension_matcher(extension)?,
            issues: Vec::new(),
            dir_count: 0,
            stopped: false,
        })
    }

    /// Get the current progress of the crawl
    ///
    /// Returns a tuple of:
    /// - Number of files counted so far
    /// - Number of directories listed
    #[must_use = "Progress information should be used for monitoring"]
    pub fn progress(&self) -> (usize, usize) {
        (self.budget.files_scanned, self.dir_count)
    }

    /// Whether the crawl ended because the budget ran out
    #[must_use]
    pub fn budget_exhausted(&self) -> bool {
        self.stopped
    }

    /// Recovered failures so far
    #[must_use]
    pub fn issues(&self) -> &[ScanIssue] {
        &self.issues
    }

    /// Consume the crawler, keeping its recovered failures
    #[must_use]
    pub fn into_issues(self) -> Vec<ScanIssue> {
        self.issues
    }

    /// List one directory, queueing subdirectories and eligible files
    fn process_dir(&mut self, dir: &Path) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "skipping unreadable directory");
                self.issues.push(ScanIssue::directory(dir, &e));
                return;
            },
        };
        self.dir_count += 1;

        let mut listed = Vec::new();
        for entry in entries {
            match entry.and_then(|entry| Ok((entry.path(), entry.file_type()?))) {
                Ok(item) => listed.push(item),
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "skipping vanished entry");
                    self.issues.push(ScanIssue::directory(dir, &e));
                },
            }
        }
        listed.sort_by(|a, b| a.0.cmp(&b.0));

        let mut subdirs = Vec::new();
        for (path, file_type) in listed {
            if file_type.is_dir() {
                subdirs.push(path);
            } else if file_type.is_file() && self.is_eligible(&path) {
                self.pending.push_back(path);
            }
        }

        self.queue.extend(subdirs.into_iter().rev());
    }

    /// Whether the file name carries the target extension
    fn is_eligible(&self, path: &Path) -> bool {
        path.file_name().is_some_and(|name| self.filter.is_match(Path::new(name)))
    }

    /// Charge a file to the budget, returning it if it may be read
    fn admit(&mut self, path: PathBuf) -> Option<PathBuf> {
        self.budget.files_scanned += 1;

        let size = match fs::metadata(&path) {
            Ok(meta) => meta.len(),
            Err(e) => {
                warn!(file = %path.display(), error = %e, "skipping unreadable file");
                self.issues.push(ScanIssue::file(&path, &e));
                return None;
            },
        };
        if !self.budget.allows_size(size) {
            debug!(file = %path.display(), size, "skipping oversized file");
            return None;
        }
        Some(path)
    }
}

impl Iterator for Crawler<'_> {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            if self.stopped {
                return None;
            }

            if let Some(path) = self.pending.pop_front() {
                if self.budget.is_exhausted() {
                    warn!(
                        max_files = self.budget.max_files,
                        "file budget exhausted, stopping crawl"
                    );
                    self.stopped = true;
                    self.pending.clear();
                    self.queue.clear();
                    return None;
                }
                if let Some(path) = self.admit(path) {
                    return Some(path);
                }
                continue;
            }

            let dir = self.queue.pop()?;
            debug!(dir = %dir.display(), "listing directory");
            self.process_dir(&dir);
        }
    }
}
