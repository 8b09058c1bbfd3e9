//! Bootstrap and supervision.
//!
//! [`Bridge::start`] runs the attach sequence:
//!
//! 1. validate the configuration,
//! 2. initialise the backend's joystick subsystem (fatal on failure),
//! 3. for each slot: open the backing file, attach a virtual gamepad and
//!    start its poller thread,
//! 4. start the event pump thread.
//!
//! A slot that fails step 3 is disabled and the rest carry on.
//! [`attach_process`] wraps the sequence for the process-load entry point:
//! it runs once, reads the environment and never returns an error.

use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle};

use padbridge_backend::{JoystickBackend, Sdl2Backend, VirtualPadDesc};
use padbridge_devfilter::{DeviceFilter, FilterError};
use tracing::{debug, error, info, warn};

use crate::cancel::CancelToken;
use crate::config::BridgeConfig;
use crate::error::{BridgeError, BridgeResult};
use crate::logging;
use crate::poller::poller_main;
use crate::pump::EventPump;
use crate::registry::{Slot, SlotRegistry};
use crate::rumble::RumbleBridge;

const PUMP_THREAD: &str = "padbridge-pump";

fn poller_thread_name(index: usize) -> String {
    format!("padbridge-poll-{index}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkerKind {
    Poller,
    Pump,
}

#[derive(Debug)]
struct Worker {
    name: String,
    kind: WorkerKind,
    cancel: CancelToken,
    handle: JoinHandle<()>,
}

/// Entry point for starting the bridge.
#[derive(Debug)]
pub struct Bridge;

impl Bridge {
    /// Run the attach sequence against `backend`.
    ///
    /// # Errors
    ///
    /// [`BridgeError::Config`] for an invalid configuration and
    /// [`BridgeError::Backend`] if the joystick subsystem cannot start. In
    /// both cases no device is attached and no thread is started. Per-slot
    /// failures are not errors; inspect [`BridgeHandle::registry`].
    pub fn start(
        config: BridgeConfig,
        backend: Arc<dyn JoystickBackend>,
    ) -> BridgeResult<BridgeHandle> {
        config.validate()?;

        if let Err(e) = backend.init_joystick() {
            error!(error = %e, "Joystick subsystem failed to initialise");
            return Err(e.into());
        }
        match backend.version() {
            Ok(version) => info!(%version, "Joystick backend ready"),
            Err(e) => debug!(error = %e, "Backend version unavailable"),
        }

        let registry = Arc::new(SlotRegistry::new(&config));
        let rumble = RumbleBridge::new(Arc::clone(&registry));
        let mut workers = Vec::with_capacity(registry.len().saturating_add(1));

        for slot in registry.iter() {
            if let Some(worker) = attach_slot(slot, &backend, &rumble, &config) {
                workers.push(worker);
            }
        }

        let attached = registry.active_count();
        if attached > 0 || config.pump_without_slots {
            let pump = EventPump::new(Arc::clone(&backend), config.pump_interval);
            let cancel = CancelToken::new();
            let token = cancel.clone();
            match thread::Builder::new()
                .name(PUMP_THREAD.to_string())
                .spawn(move || pump.run(&token))
            {
                Ok(handle) => workers.push(Worker {
                    name: PUMP_THREAD.to_string(),
                    kind: WorkerKind::Pump,
                    cancel,
                    handle,
                }),
                Err(e) => {
                    error!(error = %BridgeError::spawn(PUMP_THREAD, e), "Rumble will not be delivered");
                }
            }
        } else {
            info!("No slot attached, event pump not started");
        }

        info!(
            configured = registry.len(),
            attached,
            players = config.players,
            "Bridge started"
        );

        Ok(BridgeHandle {
            config,
            backend,
            registry,
            workers,
            stopped: false,
        })
    }
}

/// Open, attach and start polling one slot. Failures disable the slot.
fn attach_slot(
    slot: &Arc<Slot>,
    backend: &Arc<dyn JoystickBackend>,
    rumble: &RumbleBridge,
    config: &BridgeConfig,
) -> Option<Worker> {
    let index = slot.index();
    if let Err(e) = slot.open() {
        slot.disable(format!("cannot open backing file: {e}"));
        return None;
    }

    let desc = VirtualPadDesc::gamepad(VirtualPadDesc::player_name(index));
    let device = match backend.attach_virtual(&desc, rumble.callback_for(index)) {
        Ok(device) => device,
        Err(e) => {
            slot.disable(format!("cannot attach virtual device: {e}"));
            return None;
        }
    };
    slot.activate(device);
    info!(slot = index, device = device.0, name = %desc.name, "Virtual gamepad attached");

    let name = poller_thread_name(index);
    let poll_slot = Arc::clone(slot);
    let poll_backend = Arc::clone(backend);
    let cancel = CancelToken::new();
    let token = cancel.clone();
    let interval = config.poll_interval;
    match thread::Builder::new()
        .name(name.clone())
        .spawn(move || poller_main(poll_slot, poll_backend, &token, interval))
    {
        Ok(handle) => Some(Worker {
            name,
            kind: WorkerKind::Poller,
            cancel,
            handle,
        }),
        Err(e) => {
            if let Err(detach) = backend.detach_virtual(device) {
                warn!(slot = index, error = %detach, "Failed to detach device");
            }
            slot.disable(BridgeError::spawn(name, e).to_string());
            None
        }
    }
}

/// Running bridge: owns the worker threads and the attached devices.
///
/// [`shutdown`](Self::shutdown) stops every worker and detaches every
/// device. Dropping the handle does the same only when
/// [`BridgeConfig::shutdown_on_drop`] is set; otherwise the workers keep
/// running for the life of the process.
pub struct BridgeHandle {
    config: BridgeConfig,
    backend: Arc<dyn JoystickBackend>,
    registry: Arc<SlotRegistry>,
    workers: Vec<Worker>,
    stopped: bool,
}

impl std::fmt::Debug for BridgeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeHandle")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("workers", &self.workers)
            .field("stopped", &self.stopped)
            .finish_non_exhaustive()
    }
}

impl BridgeHandle {
    /// Effective configuration.
    #[must_use]
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Slot registry shared with the workers.
    #[must_use]
    pub fn registry(&self) -> &Arc<SlotRegistry> {
        &self.registry
    }

    /// Slots with an attached virtual device.
    #[must_use]
    pub fn attached_count(&self) -> usize {
        self.registry.active_count()
    }

    /// Worker threads started, pollers and pump together.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Poller threads started.
    #[must_use]
    pub fn poller_count(&self) -> usize {
        self.workers
            .iter()
            .filter(|worker| worker.kind == WorkerKind::Poller)
            .count()
    }

    /// Whether the event pump thread was started.
    #[must_use]
    pub fn has_pump(&self) -> bool {
        self.workers
            .iter()
            .any(|worker| worker.kind == WorkerKind::Pump)
    }

    /// Stop every worker, detach every device and close every slot.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::WorkerPanicked`] naming the first worker that
    /// panicked. Devices are detached regardless.
    pub fn shutdown(mut self) -> BridgeResult<()> {
        self.stop()
    }

    /// Let the workers run for the rest of the process and return the
    /// registry.
    #[must_use]
    pub fn detach(mut self) -> Arc<SlotRegistry> {
        self.stopped = true;
        info!(workers = self.workers.len(), "Bridge detached from its handle");
        self.workers.clear();
        Arc::clone(&self.registry)
    }

    fn stop(&mut self) -> BridgeResult<()> {
        if self.stopped {
            return Ok(());
        }
        self.stopped = true;
        for worker in &self.workers {
            worker.cancel.cancel();
        }

        let mut panicked = None;
        for worker in self.workers.drain(..) {
            if worker.handle.join().is_ok() {
                debug!(thread = %worker.name, "Worker stopped cleanly");
            } else {
                error!(thread = %worker.name, "Worker panicked");
                panicked.get_or_insert(worker.name);
            }
        }

        for slot in self.registry.iter() {
            if let Some(device) = slot.device()
                && let Err(e) = self.backend.detach_virtual(device)
            {
                warn!(slot = slot.index(), error = %e, "Failed to detach device");
            }
            slot.close();
        }
        info!("Bridge stopped");

        match panicked {
            Some(name) => Err(BridgeError::WorkerPanicked(name)),
            None => Ok(()),
        }
    }
}

impl Drop for BridgeHandle {
    fn drop(&mut self) {
        if self.stopped || !self.config.shutdown_on_drop {
            return;
        }
        if let Err(e) = self.stop() {
            error!(error = %e, "Bridge shutdown on drop failed");
        }
    }
}

/// Outcome of the one-time process attach.
#[derive(Debug)]
pub enum ProcessAttach {
    /// The bridge is running; the registry is shared with its workers.
    Running(Arc<SlotRegistry>),
    /// Bootstrap failed. The process continues without virtual pads.
    Failed(String),
}

impl ProcessAttach {
    /// Whether the bridge is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running(_))
    }
}

static PROCESS: OnceLock<ProcessAttach> = OnceLock::new();

/// Start the bridge for this process from the environment.
///
/// The first call installs logging and the device filter, loads the joystick
/// library and runs [`Bridge::start`]. Later calls return the first outcome.
pub fn attach_process() -> &'static ProcessAttach {
    attach_process_from(BridgeConfig::from_env())
}

/// [`attach_process`] with an explicit configuration.
///
/// Only the first call in a process uses its `config`; later calls return the
/// first outcome unchanged.
pub fn attach_process_from(config: BridgeConfig) -> &'static ProcessAttach {
    PROCESS.get_or_init(|| {
        logging::init(config.debug);
        info!(pid = std::process::id(), players = config.players, "Attaching bridge");

        match padbridge_devfilter::install(DeviceFilter::new()) {
            Ok(_) => debug!("Device filter installed"),
            Err(FilterError::AlreadyInstalled) => debug!("Device filter already installed"),
            Err(e) => warn!(error = %e, "Device filter not installed"),
        }

        match start_from_config(config) {
            Ok(handle) => ProcessAttach::Running(handle.detach()),
            Err(e) => {
                error!(error = %e, "Bridge not started");
                ProcessAttach::Failed(e.to_string())
            }
        }
    })
}

fn start_from_config(config: BridgeConfig) -> BridgeResult<BridgeHandle> {
    let backend = Sdl2Backend::load(&config.backend_library)?;
    Bridge::start(config, Arc::new(backend))
}

#[cfg(test)]
mod tests {
    use super::*;
    use padbridge_backend::mock::MockBackend;
    use padbridge_test_helpers::prelude::*;

    #[test]
    fn test_thread_names() {
        assert_eq!(poller_thread_name(2), "padbridge-poll-2");
    }

    #[test]
    fn test_invalid_config_starts_nothing() {
        let mock = Arc::new(MockBackend::new());
        let config = BridgeConfig {
            players: 9,
            ..BridgeConfig::default()
        };
        let result = Bridge::start(config, mock.clone());
        assert!(matches!(result, Err(BridgeError::Config(_))));
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_shutdown_detaches_devices() -> TestResult {
        let dir = BackingDir::new()?;
        dir.create_file(dir.base_path())?;
        let mock = Arc::new(MockBackend::new());
        let config = BridgeConfig::builder()
            .base_path(dir.base_path())
            .players(1)
            .build()?;

        let handle = Bridge::start(config, mock.clone())?;
        assert_eq!(mock.attached_devices().len(), 1);
        handle.shutdown()?;
        assert!(mock.attached_devices().is_empty());
        Ok(())
    }

    #[test]
    fn test_drop_with_shutdown_flag_stops_workers() -> TestResult {
        let dir = BackingDir::new()?;
        dir.create_file(dir.base_path())?;
        let mock = Arc::new(MockBackend::new());
        let config = BridgeConfig::builder()
            .base_path(dir.base_path())
            .shutdown_on_drop(true)
            .build()?;

        let handle = Bridge::start(config, mock.clone())?;
        let registry = Arc::clone(handle.registry());
        drop(handle);

        assert!(mock.attached_devices().is_empty());
        assert!(registry.iter().all(|slot| !slot.is_writable()));
        Ok(())
    }
}
