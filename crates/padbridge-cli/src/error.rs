//! Error types for padctl

use std::path::PathBuf;

use padbridge_shm::ShmError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Player {player} is out of range (1..={max})")]
    PlayerOutOfRange { player: usize, max: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No record in {}: the file is shorter than one record", .0.display())]
    NoData(PathBuf),

    #[error(transparent)]
    Shm(#[from] ShmError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::PlayerOutOfRange { .. } | Self::InvalidInput(_) => 2,
            Self::NoData(_) => 3,
            Self::Shm(ShmError::Open { .. }) => 4,
            Self::Shm(_) | Self::Json(_) => 1,
        }
    }
}
