//! Error types for the bridge.

use std::path::PathBuf;

use padbridge_backend::BackendError;
use padbridge_devfilter::FilterError;
use padbridge_shm::ShmError;
use thiserror::Error;

/// Errors raised by bootstrap and the supervisor.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The backend failed to load or initialise. Fatal: no devices exist.
    #[error("Backend unavailable: {0}")]
    Backend(#[from] BackendError),

    /// The configuration is invalid.
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// A worker thread could not be spawned.
    #[error("Failed to spawn thread '{name}': {source}")]
    Spawn {
        /// Thread name.
        name: String,
        /// OS error.
        #[source]
        source: std::io::Error,
    },

    /// The slot has no attached virtual device.
    #[error("Slot {0} has no attached virtual device")]
    NotAttached(usize),

    /// A worker thread panicked before it was joined.
    #[error("Worker thread '{0}' panicked")]
    WorkerPanicked(String),

    /// Shared file access failed.
    #[error(transparent)]
    Shm(#[from] ShmError),

    /// Installing the device filter failed.
    #[error("Device filter: {0}")]
    Filter(#[from] FilterError),
}

impl BridgeError {
    /// Create a spawn error.
    #[must_use]
    pub fn spawn(name: impl Into<String>, source: std::io::Error) -> Self {
        Self::Spawn {
            name: name.into(),
            source,
        }
    }
}

/// Configuration errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// More players than the bridge supports.
    #[error("Player count {requested} exceeds the maximum of {max}")]
    TooManyPlayers {
        /// Requested count.
        requested: usize,
        /// Supported maximum.
        max: usize,
    },

    /// An interval was zero.
    #[error("{0} must be greater than 0")]
    ZeroInterval(&'static str),

    /// The base path has no file name to derive slot paths from.
    #[error("Base path '{}' has no file name", .0.display())]
    InvalidBasePath(PathBuf),

    /// No backend library was configured.
    #[error("Backend library name is empty")]
    EmptyLibrary,
}

/// Rumble commands rejected at the boundary. No write is performed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RumbleError {
    /// The index is outside the configured slot range.
    #[error("Rumble for slot {index} outside configured range 0..{configured}")]
    OutOfRange {
        /// Requested slot.
        index: usize,
        /// Configured slot count.
        configured: usize,
    },

    /// The slot's write descriptor is closed.
    #[error("Rumble for slot {0} with no open write descriptor")]
    SlotClosed(usize),
}

/// Result alias for bridge operations.
pub type BridgeResult<T> = std::result::Result<T, BridgeError>;

/// Result alias for configuration checks.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
