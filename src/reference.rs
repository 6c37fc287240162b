//! Opaque listing-to-detail references
//!
//! A reference is the standard base64 encoding of `<file>|<line>`, where
//! `<file>` is the path's raw encoded bytes.

use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::error::{Error, Result};

/// Separator between file and line inside a reference
const SEPARATOR: u8 = b'|';

/// A decoded, validated `(file, line)` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRef {
    /// File holding the match
    pub file: PathBuf,
    /// 1-based line number
    pub line: usize,
}

/// Encode `(file, line)` into an opaque string
#[must_use]
pub fn build_reference(file: &Path, line: usize) -> String {
    let mut raw = file.as_os_str().as_encoded_bytes().to_vec();
    raw.push(SEPARATOR);
    raw.extend_from_slice(line.to_string().as_bytes());
    STANDARD.encode(raw)
}

/// Rebuild a path from the bytes written by [`build_reference`]
#[cfg(unix)]
#[allow(clippy::unnecessary_wraps)]
fn path_from_bytes(bytes: &[u8]) -> Result<PathBuf> {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    Ok(PathBuf::from(OsStr::from_bytes(bytes)))
}

/// Rebuild a path from the bytes written by [`build_reference`]
#[cfg(not(unix))]
fn path_from_bytes(bytes: &[u8]) -> Result<PathBuf> {
    std::str::from_utf8(bytes).map(PathBuf::from).map_err(|_| Error::InvalidReference)
}

impl DetailRef {
    /// Decode and validate a reference
    ///
    /// # Errors
    /// Returns error if:
    /// - The string is not base64 of exactly two `|`-separated parts
    ///   (`Error::InvalidReference`)
    /// - The file is missing, not a regular file, or cannot be opened
    ///   (`Error::FileNotFound`)
    /// - The line is not a positive integer (`Error::InvalidLine`)
    pub fn decode(reference: &str) -> Result<Self> {
        let bytes = STANDARD.decode(reference.trim()).map_err(|_| Error::InvalidReference)?;

        let parts: Vec<&[u8]> = bytes.split(|&b| b == SEPARATOR).collect();
        let [file, line] = parts.as_slice() else {
            return Err(Error::InvalidReference);
        };

        let file = path_from_bytes(file)?;
        if file.as_os_str().is_empty() || !file.is_file() || std::fs::File::open(&file).is_err() {
            return Err(Error::FileNotFound(file));
        }

        let line = std::str::from_utf8(line)
            .ok()
            .and_then(|line| line.trim().parse::<usize>().ok())
            .filter(|&n| n > 0)
            .ok_or(Error::InvalidLine)?;

        Ok(Self { file, line })
    }

    /// Encode back into an opaque string
    #[must_use]
    pub fn encode(&self) -> String {
        build_reference(&self.file, self.line)
    }
}
