//! Per-slot poller.
//!
//! Each tick reads the slot's record, compares the input portion with the
//! last published state and pushes one backend call per changed field, then
//! sleeps for the poll interval.

use std::sync::Arc;
use std::time::Duration;

use padbridge_backend::{JoystickBackend, JoystickHandle};
use padbridge_shm::record::FieldChange;
use tracing::{debug, error, info, warn};

use crate::cancel::CancelToken;
use crate::error::{BridgeError, BridgeResult};
use crate::registry::Slot;

/// Result of one poll tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The file held less than a full record.
    NoData,
    /// The input matched the last published state.
    Unchanged,
    /// Changed fields were pushed to the backend.
    Published {
        /// Backend calls issued.
        calls: usize,
    },
    /// Reading the record failed; retried next tick.
    ReadFailed,
}

/// Polls one slot and publishes changes on its virtual device.
pub struct SlotPoller {
    slot: Arc<Slot>,
    backend: Arc<dyn JoystickBackend>,
    joystick: JoystickHandle,
}

impl std::fmt::Debug for SlotPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotPoller")
            .field("slot", &self.slot.index())
            .field("joystick", &self.joystick)
            .finish_non_exhaustive()
    }
}

impl SlotPoller {
    /// Open the backend joystick for `slot`'s attached device.
    ///
    /// # Errors
    ///
    /// [`BridgeError::NotAttached`] if the slot has no device, or the
    /// backend's open error.
    pub fn open(slot: Arc<Slot>, backend: Arc<dyn JoystickBackend>) -> BridgeResult<Self> {
        let device = slot
            .device()
            .ok_or(BridgeError::NotAttached(slot.index()))?;
        let joystick = backend.open_joystick(device)?;
        Ok(Self {
            slot,
            backend,
            joystick,
        })
    }

    /// Slot this poller serves.
    #[must_use]
    pub fn slot(&self) -> &Arc<Slot> {
        &self.slot
    }

    /// Run one tick: read, compare, publish.
    pub fn poll_once(&self) -> PollOutcome {
        let record = match self.slot.read_record() {
            Ok(Some(record)) => record,
            Ok(None) => return PollOutcome::NoData,
            Err(e) => {
                error!(slot = self.slot.index(), error = %e, "Read error");
                return PollOutcome::ReadFailed;
            }
        };

        let current = record.state;
        let changes = current.diff(&self.slot.last_state());
        if changes.is_empty() {
            return PollOutcome::Unchanged;
        }

        for change in &changes {
            self.publish(*change);
        }
        self.slot.set_last_state(current);
        PollOutcome::Published {
            calls: changes.len(),
        }
    }

    fn publish(&self, change: FieldChange) {
        let result = match change {
            FieldChange::Axis { index, value } => self.backend.set_axis(self.joystick, index, value),
            FieldChange::Button { index, value } => {
                self.backend.set_button(self.joystick, index, value)
            }
            FieldChange::Hat { index, value } => self.backend.set_hat(self.joystick, index, value),
        };
        if let Err(e) = result {
            debug!(slot = self.slot.index(), ?change, error = %e, "Publish failed");
        }
    }

    /// Poll every `interval` until `cancel` is set.
    pub fn run(self, cancel: &CancelToken, interval: Duration) {
        info!(slot = self.slot.index(), pid = std::process::id(), "Poller running");
        while !cancel.is_cancelled() {
            self.poll_once();
            self.backend.delay(interval);
        }
        info!(slot = self.slot.index(), "Poller stopped");
    }
}

/// Thread body: open the joystick, then poll until cancelled. An open failure
/// detaches the slot's device, disables the slot and ends this thread only.
pub(crate) fn poller_main(
    slot: Arc<Slot>,
    backend: Arc<dyn JoystickBackend>,
    cancel: &CancelToken,
    interval: Duration,
) {
    match SlotPoller::open(Arc::clone(&slot), Arc::clone(&backend)) {
        Ok(poller) => poller.run(cancel, interval),
        Err(e) => {
            if let Some(device) = slot.device()
                && let Err(detach) = backend.detach_virtual(device)
            {
                warn!(slot = slot.index(), error = %detach, "Failed to detach device");
            }
            slot.disable(format!("cannot open joystick: {e}"));
        }
    }
}
