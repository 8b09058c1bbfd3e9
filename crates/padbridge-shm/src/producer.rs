//! Producer-side view of a backing file.
//!
//! The emulation process maps each backing file read/write and writes input
//! straight into the mapping, then polls the rumble fields the bridge writes
//! back. [`ProducerChannel`] reproduces that side so the channel can be
//! driven without the real producer (operator tooling, tests).

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use memmap2::{MmapMut, MmapOptions};
use tracing::info;

use crate::error::{ShmError, ShmResult};
use crate::record::{
    BACKING_FILE_LEN, GamepadState, INPUT_LEN, RECORD_LEN, RUMBLE_OFFSET, RumbleCommand,
    SharedRecord,
};

/// A read/write mapping of one backing file.
#[derive(Debug)]
pub struct ProducerChannel {
    path: PathBuf,
    map: MmapMut,
}

impl ProducerChannel {
    /// Create (or reuse) the backing file at `path`, size it to
    /// [`BACKING_FILE_LEN`] bytes and map it.
    ///
    /// Missing parent directories are created. Existing contents are kept.
    ///
    /// # Errors
    ///
    /// Returns [`ShmError::Open`] or [`ShmError::Map`] naming the path.
    pub fn create(path: impl AsRef<Path>) -> ShmResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ShmError::open(parent, e))?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| ShmError::open(path, e))?;

        let len = file.metadata().map_err(|e| ShmError::open(path, e))?.len();
        if len < BACKING_FILE_LEN {
            file.set_len(BACKING_FILE_LEN)
                .map_err(|e| ShmError::open(path, e))?;
        }

        let channel = Self::map(path, &file)?;
        info!(path = %path.display(), "Created shared gamepad file");
        Ok(channel)
    }

    /// Map an existing backing file.
    ///
    /// # Errors
    ///
    /// Returns [`ShmError::Open`] if the file is missing or shorter than a
    /// record, or [`ShmError::Map`] if mapping fails.
    pub fn open(path: impl AsRef<Path>) -> ShmResult<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| ShmError::open(path, e))?;

        let len = file.metadata().map_err(|e| ShmError::open(path, e))?.len();
        if len < RECORD_LEN as u64 {
            return Err(ShmError::open(
                path,
                std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    format!("file is {len} bytes, need at least {RECORD_LEN}"),
                ),
            ));
        }

        Self::map(path, &file)
    }

    #[expect(
        unsafe_code,
        reason = "the backing file is shared with another process by contract"
    )]
    fn map(path: &Path, file: &File) -> ShmResult<Self> {
        // SAFETY: the mapping covers only the record region of a file we just
        // validated. The other process writing concurrently can at worst make
        // us observe a torn record, which the reader tolerates.
        let map = unsafe { MmapOptions::new().len(RECORD_LEN).map_mut(file) }.map_err(|e| {
            ShmError::Map {
                path: path.to_path_buf(),
                source: e,
            }
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            map,
        })
    }

    /// Backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the input portion of the record.
    pub fn write_state(&mut self, state: &GamepadState) {
        if let Some(input) = self.map.get_mut(..INPUT_LEN) {
            input.copy_from_slice(&state.to_bytes());
        }
    }

    /// Current rumble command written by the bridge.
    ///
    /// # Errors
    ///
    /// Returns [`ShmError::TooShort`] if the mapping is truncated.
    pub fn read_rumble(&self) -> ShmResult<RumbleCommand> {
        RumbleCommand::from_bytes(self.map.get(RUMBLE_OFFSET..).unwrap_or_default())
    }

    /// Decode the whole record.
    ///
    /// # Errors
    ///
    /// Returns [`ShmError::TooShort`] if the mapping is truncated.
    pub fn read_record(&self) -> ShmResult<SharedRecord> {
        SharedRecord::decode(&self.map)
    }

    /// Flush the mapping to the backing file.
    ///
    /// # Errors
    ///
    /// Returns [`ShmError::Io`] if the flush fails.
    pub fn flush(&self) -> ShmResult<()> {
        self.map.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::SlotChannel;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn test_create_sizes_file() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested/gamepad.mem");
        let _producer = ProducerChannel::create(&path)?;
        assert_eq!(fs::metadata(&path)?.len(), BACKING_FILE_LEN);
        Ok(())
    }

    #[test]
    fn test_open_rejects_truncated_file() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("gamepad.mem");
        fs::write(&path, [0u8; 8])?;
        assert!(matches!(
            ProducerChannel::open(&path),
            Err(ShmError::Open { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_state_reaches_slot_reader() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("gamepad.mem");
        let mut producer = ProducerChannel::create(&path)?;
        let state = GamepadState::default().with_axis(3, -200).with_hat(4);
        producer.write_state(&state);
        producer.flush()?;

        let channel = SlotChannel::open(&path)?;
        let record = channel.read_record()?.ok_or("expected a record")?;
        assert_eq!(record.state, state);
        Ok(())
    }

    #[test]
    fn test_rumble_reaches_producer() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("gamepad.mem");
        let producer = ProducerChannel::create(&path)?;

        let channel = SlotChannel::open(&path)?;
        channel.write_rumble(RumbleCommand::new(500, 60000))?;

        assert_eq!(producer.read_rumble()?, RumbleCommand::new(500, 60000));
        Ok(())
    }
}
