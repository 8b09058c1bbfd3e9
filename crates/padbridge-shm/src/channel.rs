//! Bridge-side access to a slot's backing file.
//!
//! The bridge opens two independent descriptors on the same file: a
//! read-only one for polling the producer's record and a write-only one for
//! feedback. All I/O is positional, so neither descriptor has a cursor to
//! keep in sync.

use std::fs::{File, OpenOptions};
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ShmError, ShmResult};
use crate::record::{
    GamepadState, RECORD_LEN, RUMBLE_LEN, RUMBLE_OFFSET, RumbleCommand, SharedRecord,
};

/// Read and write descriptors onto one slot's backing file.
#[derive(Debug)]
pub struct SlotChannel {
    path: PathBuf,
    reader: Option<File>,
    writer: Option<File>,
}

impl SlotChannel {
    /// Open both descriptors on `path`.
    ///
    /// If either open fails, any descriptor that did open is closed before
    /// returning.
    ///
    /// # Errors
    ///
    /// Returns [`ShmError::Open`] naming the path.
    pub fn open(path: impl AsRef<Path>) -> ShmResult<Self> {
        let path = path.as_ref();
        let reader = OpenOptions::new()
            .read(true)
            .open(path)
            .map_err(|e| ShmError::open(path, e))?;
        let writer = OpenOptions::new()
            .write(true)
            .open(path)
            .map_err(|e| ShmError::open(path, e))?;

        debug!(path = %path.display(), "Opened shared gamepad file");
        Ok(Self {
            path: path.to_path_buf(),
            reader: Some(reader),
            writer: Some(writer),
        })
    }

    /// Backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the read descriptor is open.
    #[must_use]
    pub fn is_readable(&self) -> bool {
        self.reader.is_some()
    }

    /// Whether the write descriptor is open.
    #[must_use]
    pub fn is_writable(&self) -> bool {
        self.writer.is_some()
    }

    /// Read the record at offset 0.
    ///
    /// A short read means the producer has not filled the file yet and is
    /// reported as `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`ShmError::Closed`] if the read descriptor is closed, or
    /// [`ShmError::Io`] if the read itself fails.
    pub fn read_record(&self) -> ShmResult<Option<SharedRecord>> {
        let reader = self.reader.as_ref().ok_or(ShmError::Closed)?;
        let mut buf = [0u8; RECORD_LEN];
        let read = reader.read_at(&mut buf, 0)?;
        if read < RECORD_LEN {
            return Ok(None);
        }
        SharedRecord::decode(&buf).map(Some)
    }

    /// Read only the producer's input.
    ///
    /// # Errors
    ///
    /// As [`read_record`](Self::read_record).
    pub fn read_state(&self) -> ShmResult<Option<GamepadState>> {
        Ok(self.read_record()?.map(|record| record.state))
    }

    /// Write a rumble command at [`RUMBLE_OFFSET`].
    ///
    /// # Errors
    ///
    /// Returns [`ShmError::Closed`] if the write descriptor is closed,
    /// [`ShmError::ShortWrite`] on a partial write, or [`ShmError::Io`].
    pub fn write_rumble(&self, command: RumbleCommand) -> ShmResult<()> {
        let writer = self.writer.as_ref().ok_or(ShmError::Closed)?;
        let written = writer.write_at(&command.to_bytes(), RUMBLE_OFFSET as u64)?;
        if written != RUMBLE_LEN {
            return Err(ShmError::ShortWrite {
                expected: RUMBLE_LEN,
                written,
            });
        }
        Ok(())
    }

    /// Close both descriptors. Further reads and writes return
    /// [`ShmError::Closed`].
    pub fn close(&mut self) {
        self.reader = None;
        self.writer = None;
    }
}
