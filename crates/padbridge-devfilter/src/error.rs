//! Error types for the interception filter.

use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Filtered request kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Primitive {
    /// Opening a path.
    Open,
    /// Device-control request on a descriptor.
    Ioctl,
    /// Reading from a descriptor.
    Read,
    /// Listing a directory.
    ReadDir,
}

impl Primitive {
    /// `errno` reported when this request is blocked.
    #[must_use]
    pub const fn blocked_errno(self) -> i32 {
        match self {
            Self::Open | Self::ReadDir => libc::ENOENT,
            Self::Ioctl => libc::ENOTTY,
            Self::Read => libc::EAGAIN,
        }
    }
}

impl std::fmt::Display for Primitive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Open => "open",
            Self::Ioctl => "ioctl",
            Self::Read => "read",
            Self::ReadDir => "read_dir",
        })
    }
}

/// Errors returned through the filter.
#[derive(Error, Debug)]
pub enum FilterError {
    /// The request targets a hidden device node.
    #[error("{primitive} blocked for '{}'", path.display())]
    Blocked {
        /// Request kind.
        primitive: Primitive,
        /// Matched path.
        path: PathBuf,
    },

    /// A path contained an interior NUL byte.
    #[error("Path contains an interior NUL byte: '{}'", .0.display())]
    InvalidPath(PathBuf),

    /// A process-wide filter is already installed.
    #[error("A device filter is already installed")]
    AlreadyInstalled,

    /// The real primitive failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl FilterError {
    /// Create a blocked-request error.
    #[must_use]
    pub fn blocked(primitive: Primitive, path: impl Into<PathBuf>) -> Self {
        Self::Blocked {
            primitive,
            path: path.into(),
        }
    }

    /// `errno` a C caller would observe.
    #[must_use]
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Self::Blocked { primitive, .. } => Some(primitive.blocked_errno()),
            Self::InvalidPath(_) => Some(libc::EINVAL),
            Self::AlreadyInstalled => None,
            Self::Io(e) => e.raw_os_error(),
        }
    }

    /// Whether the request was blocked by a rule.
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked { .. })
    }
}

impl From<FilterError> for io::Error {
    fn from(err: FilterError) -> Self {
        match err {
            FilterError::Io(e) => e,
            other => match other.raw_os_error() {
                Some(errno) => io::Error::from_raw_os_error(errno),
                None => io::Error::other(other),
            },
        }
    }
}

/// Result alias for filtered requests.
pub type FilterResult<T> = std::result::Result<T, FilterError>;
