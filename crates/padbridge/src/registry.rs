//! Per-player slots.
//!
//! A [`Slot`] owns the read/write channel onto one backing file, the virtual
//! device attached for it and the last state published. Each slot has its
//! own lock; slots never contend with each other.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use padbridge_backend::DeviceIndex;
use padbridge_shm::{GamepadState, RumbleCommand, SharedRecord, ShmError, ShmResult, SlotChannel};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::config::BridgeConfig;

/// Slot lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotStatus {
    /// Not set up yet.
    Pending,
    /// Channel open and virtual device attached.
    Active,
    /// Setup failed or the slot was shut down.
    Disabled {
        /// Why the slot was disabled.
        reason: String,
    },
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::Active => f.write_str("active"),
            Self::Disabled { reason } => write!(f, "disabled ({reason})"),
        }
    }
}

/// One player's channel and virtual device binding.
#[derive(Debug)]
pub struct Slot {
    index: usize,
    path: PathBuf,
    channel: Mutex<Option<SlotChannel>>,
    device: RwLock<Option<DeviceIndex>>,
    status: RwLock<SlotStatus>,
    last_state: Mutex<GamepadState>,
}

impl Slot {
    /// A pending slot for `path`.
    #[must_use]
    pub fn new(index: usize, path: impl Into<PathBuf>) -> Self {
        Self {
            index,
            path: path.into(),
            channel: Mutex::new(None),
            device: RwLock::new(None),
            status: RwLock::new(SlotStatus::Pending),
            last_state: Mutex::new(GamepadState::default()),
        }
    }

    /// Player index (0-based).
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open the read and write descriptors.
    ///
    /// # Errors
    ///
    /// Returns [`ShmError::Open`] if either descriptor cannot be opened.
    pub fn open(&self) -> ShmResult<()> {
        let channel = SlotChannel::open(&self.path)?;
        *self.channel.lock() = Some(channel);
        Ok(())
    }

    /// Record the attached device and mark the slot active.
    pub fn activate(&self, device: DeviceIndex) {
        *self.device.write() = Some(device);
        *self.status.write() = SlotStatus::Active;
        debug!(slot = self.index, device = device.0, "Slot active");
    }

    /// Close the descriptors, clear the device and mark the slot disabled.
    pub fn disable(&self, reason: impl Into<String>) {
        let reason = reason.into();
        self.close();
        *self.device.write() = None;
        *self.status.write() = SlotStatus::Disabled {
            reason: reason.clone(),
        };
        error!(slot = self.index, path = %self.path.display(), reason = %reason, "Slot disabled");
    }

    /// Close both descriptors. Reads and rumble writes fail afterwards.
    pub fn close(&self) {
        if let Some(mut channel) = self.channel.lock().take() {
            channel.close();
        }
    }

    /// Attached virtual device.
    #[must_use]
    pub fn device(&self) -> Option<DeviceIndex> {
        *self.device.read()
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> SlotStatus {
        self.status.read().clone()
    }

    /// Whether the slot is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(*self.status.read(), SlotStatus::Active)
    }

    /// Whether the write descriptor is open.
    #[must_use]
    pub fn is_writable(&self) -> bool {
        self.channel
            .lock()
            .as_ref()
            .is_some_and(SlotChannel::is_writable)
    }

    /// Read the current record under the slot lock.
    ///
    /// # Errors
    ///
    /// Returns [`ShmError::Closed`] if the channel is closed, or the read
    /// error.
    pub fn read_record(&self) -> ShmResult<Option<SharedRecord>> {
        self.channel
            .lock()
            .as_ref()
            .ok_or(ShmError::Closed)?
            .read_record()
    }

    /// Write a rumble command under the slot lock.
    ///
    /// # Errors
    ///
    /// Returns [`ShmError::Closed`] if the channel is closed, or the write
    /// error.
    pub fn write_rumble(&self, command: RumbleCommand) -> ShmResult<()> {
        self.channel
            .lock()
            .as_ref()
            .ok_or(ShmError::Closed)?
            .write_rumble(command)
    }

    /// Last state published for this slot.
    #[must_use]
    pub fn last_state(&self) -> GamepadState {
        *self.last_state.lock()
    }

    pub(crate) fn set_last_state(&self, state: GamepadState) {
        *self.last_state.lock() = state;
    }
}

/// All configured slots, indexed by player.
#[derive(Debug)]
pub struct SlotRegistry {
    slots: Vec<Arc<Slot>>,
}

impl SlotRegistry {
    /// One pending slot per configured player.
    #[must_use]
    pub fn new(config: &BridgeConfig) -> Self {
        Self::with_paths((0..config.players).map(|index| config.slot_path(index)))
    }

    /// Pending slots for explicit paths, in player order.
    #[must_use]
    pub fn with_paths(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        let slots = paths
            .into_iter()
            .enumerate()
            .map(|(index, path)| Arc::new(Slot::new(index, path)))
            .collect();
        Self { slots }
    }

    /// Configured slot count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no slot is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot by player index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Arc<Slot>> {
        self.slots.get(index)
    }

    /// Slots in player order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Slot>> {
        self.slots.iter()
    }

    /// Slots currently active.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_active()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use padbridge_test_helpers::prelude::*;

    #[test]
    fn test_registry_derives_paths() {
        let config = BridgeConfig {
            players: 3,
            base_path: PathBuf::from("/tmp/pads/gamepad.mem"),
            ..BridgeConfig::default()
        };
        let registry = SlotRegistry::new(&config);
        let paths: Vec<_> = registry.iter().map(|s| s.path().to_path_buf()).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/tmp/pads/gamepad.mem"),
                PathBuf::from("/tmp/pads/gamepad1.mem"),
                PathBuf::from("/tmp/pads/gamepad2.mem"),
            ]
        );
        assert!(registry.iter().all(|s| s.status() == SlotStatus::Pending));
    }

    #[test]
    fn test_disable_closes_channel() -> TestResult {
        let dir = BackingDir::new()?;
        let path = dir.create_file(dir.base_path())?;
        let slot = Slot::new(0, path);
        slot.open()?;
        slot.activate(DeviceIndex(4));
        assert!(slot.is_writable());

        slot.disable("test");
        assert!(!slot.is_writable());
        assert_eq!(slot.device(), None);
        assert!(matches!(slot.status(), SlotStatus::Disabled { .. }));
        assert!(matches!(slot.read_record(), Err(ShmError::Closed)));
        Ok(())
    }

    #[test]
    fn test_open_missing_file_fails() {
        let slot = Slot::new(1, "/nonexistent/padbridge/gamepad1.mem");
        assert!(matches!(slot.open(), Err(ShmError::Open { .. })));
        assert!(!slot.is_writable());
    }
}
