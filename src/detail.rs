//! Detail resolution for a single match

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::config::ScanConfig;
use crate::error::{Error, Result};
use crate::matcher::classify_line;
use crate::reference::DetailRef;
use crate::types::{HookKind, UNKNOWN_DESCRIPTION};

/// One line of the context window
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextLine {
    /// 1-based line number
    pub number:    usize,
    /// Raw line text
    pub text:      String,
    /// Whether this is the referenced line
    pub is_target: bool,
}

/// Which configured container a file lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileOrigin {
    /// Under the plugin container
    Plugin,
    /// Under the theme container
    Theme,
    /// Anywhere else
    Other,
}

/// Everything the detail view shows for one match
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailView {
    /// File holding the match
    pub file:          PathBuf,
    /// Referenced line
    pub line:          usize,
    /// Path below its container, when it has one
    pub relative_path: Option<PathBuf>,
    /// Container the file lives in
    pub origin:        FileOrigin,
    /// File size in bytes
    pub file_size:     u64,
    /// Lines in the file
    pub total_lines:   usize,
    /// First line of the window
    pub start:         usize,
    /// Last line of the window
    pub end:           usize,
    /// The window itself, empty when the line is past the end of the file
    pub lines:         Vec<ContextLine>,
    /// Loose classification of the referenced line
    pub kind:          Option<HookKind>,
}

impl DetailView {
    /// Label for the classified construct
    #[must_use]
    pub fn label(&self) -> &'static str {
        self.kind.map_or("unknown", HookKind::label)
    }

    /// Description of the classified construct
    #[must_use]
    pub fn description(&self) -> &'static str {
        self.kind.and_then(HookKind::description).unwrap_or(UNKNOWN_DESCRIPTION)
    }
}

/// Line range shown around `line`, clamped to the file
///
/// The range may be empty (`start > end`) when `line` lies past the end.
#[must_use]
pub fn context_window(line: usize, total_lines: usize, radius: usize) -> (usize, usize) {
    let start = line.saturating_sub(radius).max(1);
    let end = line.saturating_add(radius).min(total_lines);
    (start, end)
}

/// Work out which container `file` belongs to
fn origin_of(config: &ScanConfig, file: &Path) -> (FileOrigin, Option<PathBuf>) {
    if let Ok(rel) = file.strip_prefix(&config.plugins_dir) {
        return (FileOrigin::Plugin, Some(rel.to_path_buf()));
    }
    if let Ok(rel) = file.strip_prefix(&config.themes_dir) {
        return (FileOrigin::Theme, Some(rel.to_path_buf()));
    }
    (FileOrigin::Other, None)
}

/// Decode `reference` and read the window around its line
///
/// # Errors
/// Returns error if:
/// - The reference is malformed (`Error::InvalidReference`)
/// - The file is gone or unreadable (`Error::FileNotFound`)
/// - The line is not positive (`Error::InvalidLine`)
/// - Reading the file fails for another reason (`Error::Io`)
pub fn resolve(reference: &str, config: &ScanConfig) -> Result<DetailView> {
    let DetailRef { file, line } = DetailRef::decode(reference)?;

    let bytes = match fs::read(&file) {
        Ok(bytes) => bytes,
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::PermissionDenied) => {
            return Err(Error::FileNotFound(file));
        },
        Err(e) => return Err(e.into()),
    };
    let text = String::from_utf8_lossy(&bytes);
    let all: Vec<&str> = text.lines().collect();
    let total_lines = all.len();

    let (start, end) = context_window(line, total_lines, config.context_radius);
    let lines = (start..=end)
        .map(|number| ContextLine {
            number,
            text: all[number - 1].to_owned(),
            is_target: number == line,
        })
        .collect();

    let kind = all.get(line - 1).and_then(|code| classify_line(code.trim()));
    let (origin, relative_path) = origin_of(config, &file);
    debug!(file = %file.display(), line, start, end, "resolved detail");

    Ok(DetailView {
        file_size: bytes.len() as u64,
        file,
        line,
        relative_path,
        origin,
        total_lines,
        start,
        end,
        lines,
        kind,
    })
}
