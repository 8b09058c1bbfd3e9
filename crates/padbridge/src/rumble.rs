//! Rumble feedback into the shared files.

use std::sync::Arc;

use padbridge_backend::{RumbleCallback, RumbleRejected};
use padbridge_shm::{RumbleCommand, ShmError};
use tracing::{debug, error};

use crate::error::RumbleError;
use crate::registry::SlotRegistry;

/// Writes rumble commands from the backend into the target slot's file.
///
/// Runs on whatever thread the backend delivers callbacks on, normally the
/// event pump.
#[derive(Debug, Clone)]
pub struct RumbleBridge {
    registry: Arc<SlotRegistry>,
}

impl RumbleBridge {
    /// Create a bridge over `registry`.
    #[must_use]
    pub fn new(registry: Arc<SlotRegistry>) -> Self {
        Self { registry }
    }

    /// Deliver a command to slot `index`.
    ///
    /// Write failures are logged and reported as delivered; the feedback
    /// channel is best-effort.
    ///
    /// # Errors
    ///
    /// [`RumbleError::OutOfRange`] for an index outside the configured
    /// slots, [`RumbleError::SlotClosed`] if the slot's write descriptor is
    /// closed. Nothing is written in either case.
    pub fn on_rumble(&self, index: usize, low: u16, high: u16) -> Result<(), RumbleError> {
        let slot = self.registry.get(index).ok_or(RumbleError::OutOfRange {
            index,
            configured: self.registry.len(),
        })?;

        match slot.write_rumble(RumbleCommand::new(low, high)) {
            Ok(()) => debug!(slot = index, low, high, "Rumble"),
            Err(ShmError::Closed) => return Err(RumbleError::SlotClosed(index)),
            Err(e) => error!(slot = index, error = %e, "Rumble write failed"),
        }
        Ok(())
    }

    /// Backend callback bound to slot `index`.
    #[must_use]
    pub fn callback_for(&self, index: usize) -> RumbleCallback {
        let bridge = self.clone();
        Box::new(move |low, high| {
            bridge.on_rumble(index, low, high).map_err(|e| {
                debug!(error = %e, "Rumble rejected");
                RumbleRejected
            })
        })
    }
}
