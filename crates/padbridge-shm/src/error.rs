//! Error types for the shared-state channel.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while accessing a slot's backing file.
#[derive(Error, Debug)]
pub enum ShmError {
    /// Opening the backing file failed.
    #[error("Failed to open shared file '{}': {source}", path.display())]
    Open {
        /// Backing file path.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// Mapping the backing file into memory failed.
    #[error("Failed to map shared file '{}': {source}", path.display())]
    Map {
        /// Backing file path.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// The descriptor needed for this operation has been closed.
    #[error("Shared file descriptor is closed")]
    Closed,

    /// A positional write transferred fewer bytes than requested.
    #[error("Short write: expected {expected} bytes, wrote {written}")]
    ShortWrite {
        /// Bytes requested.
        expected: usize,
        /// Bytes actually written.
        written: usize,
    },

    /// A buffer was too small to hold a record.
    #[error("Buffer too short for record: need {needed} bytes, got {actual}")]
    TooShort {
        /// Bytes needed.
        needed: usize,
        /// Bytes available.
        actual: usize,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ShmError {
    /// Create an open error for `path`.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Open {
            path: path.into(),
            source,
        }
    }

    /// Whether the error is transient for a polling reader.
    ///
    /// Short writes and plain I/O errors are retried on the next tick; a
    /// closed descriptor or an open failure is not.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Io(_) | Self::ShortWrite { .. })
    }
}

/// Result alias for shared-state operations.
pub type ShmResult<T> = std::result::Result<T, ShmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_error_names_path() {
        let err = ShmError::open(
            "/tmp/gamepad.mem",
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert!(err.to_string().contains("/tmp/gamepad.mem"));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_short_write_is_transient() {
        let err = ShmError::ShortWrite {
            expected: 4,
            written: 2,
        };
        assert!(err.is_transient());
        assert!(err.to_string().contains("expected 4"));
    }
}
