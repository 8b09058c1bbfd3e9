//! The event pump thread.
//!
//! The backend delivers rumble callbacks only while its event loop is
//! serviced, so one thread pumps it for every slot.

use std::sync::Arc;
use std::time::Duration;

use padbridge_backend::{BackendError, JoystickBackend};
use tracing::{error, info};

use crate::cancel::CancelToken;

/// Services the backend's event loop on a fixed interval.
pub struct EventPump {
    backend: Arc<dyn JoystickBackend>,
    interval: Duration,
}

impl std::fmt::Debug for EventPump {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventPump")
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

impl EventPump {
    /// Create a pump.
    #[must_use]
    pub fn new(backend: Arc<dyn JoystickBackend>, interval: Duration) -> Self {
        Self { backend, interval }
    }

    /// Pump once.
    ///
    /// # Errors
    ///
    /// Returns the backend error, which is only ever a missing entry point.
    pub fn pump_once(&self) -> Result<(), BackendError> {
        self.backend.pump_events()
    }

    /// Pump and sleep until `cancel` is set.
    ///
    /// A backend without a pump entry point ends the loop immediately.
    pub fn run(self, cancel: &CancelToken) {
        info!(interval_ms = self.interval.as_millis(), "Event pump running");
        while !cancel.is_cancelled() {
            if let Err(e) = self.pump_once() {
                error!(error = %e, "Event pump cannot run, rumble will not be delivered");
                return;
            }
            self.backend.delay(self.interval);
        }
        info!("Event pump stopped");
    }
}
