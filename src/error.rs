//! Error types for `HookScan`

use std::path::PathBuf;

use arrayvec::ArrayString;
use thiserror::Error;

/// Maximum length of error messages
pub const MAX_ERROR_LENGTH: usize = 256;

/// Custom result type for `HookScan` operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for `HookScan`
///
/// Only failures a caller has to act on live here. Unreadable directories and
/// files met during a scan are recovered and reported as
/// [`ScanIssue`](crate::crawler::ScanIssue) values instead.
#[derive(Debug, Error)]
pub enum Error {
    /// IO operation failed
    #[error("Error: {0}")]
    Io(#[from] std::io::Error),

    /// Detail reference could not be decoded
    #[error("Error: Invalid detail reference")]
    InvalidReference,

    /// Referenced file is missing or unreadable
    #[error("Error: File not found or not accessible: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Referenced line is not a positive integer
    #[error("Error: Invalid line number")]
    InvalidLine,

    /// Configuration was rejected
    #[error("Error: {0}")]
    Config(Box<ArrayString<MAX_ERROR_LENGTH>>),

    /// A search pattern failed to compile
    #[error("Error: {0}")]
    Pattern(Box<ArrayString<MAX_ERROR_LENGTH>>),
}

/// Append as much of `msg` as fits, stopping on a char boundary
fn push_truncated(buf: &mut ArrayString<MAX_ERROR_LENGTH>, msg: &str) {
    for c in msg.chars() {
        if buf.try_push(c).is_err() {
            break;
        }
    }
}

/// Copy `msg` into a fixed buffer
fn bounded(msg: &str) -> Box<ArrayString<MAX_ERROR_LENGTH>> {
    let mut buf = ArrayString::new();
    push_truncated(&mut buf, msg);
    Box::new(buf)
}

impl Error {
    /// Create a new configuration error
    pub fn config(msg: &str) -> Self {
        Self::Config(bounded(msg))
    }

    /// Create a new pattern error
    pub fn pattern(msg: &str) -> Self {
        Self::Pattern(bounded(msg))
    }

    /// Get a user-friendly error message with action items
    #[must_use]
    pub fn user_message(&self) -> ArrayString<MAX_ERROR_LENGTH> {
        let mut msg = ArrayString::new();
        match self {
            Self::Io(e) => {
                push_truncated(
                    &mut msg,
                    &format!("Error: {e}\nTip: Check file permissions and try again"),
                );
            },
            Self::InvalidReference => {
                let _ = msg.try_push_str(
                    "Error: Invalid detail identifier\nTip: Copy the reference from a fresh \
                     search listing",
                );
            },
            Self::FileNotFound(path) => {
                push_truncated(
                    &mut msg,
                    "Error: File not found or not accessible\nTip: The file may have been moved \
                     or deleted since the search, run it again\nPath: ",
                );
                push_truncated(&mut msg, &path.to_string_lossy());
            },
            Self::InvalidLine => {
                let _ = msg.try_push_str(
                    "Error: Invalid line number\nTip: Line numbers start at 1",
                );
            },
            Self::Config(config_msg) => {
                push_truncated(&mut msg, "Error: ");
                push_truncated(&mut msg, config_msg);
                push_truncated(&mut msg, "\nTip: Check the command-line flags and environment");
            },
            Self::Pattern(pattern_msg) => {
                push_truncated(&mut msg, "Error: ");
                push_truncated(&mut msg, pattern_msg);
                push_truncated(&mut msg, "\nTip: Try a shorter hook name");
            },
        }
        msg
    }
}
