//! In-memory backend for tests.
//!
//! [`MockBackend`] records every capability call, hands out sequential
//! device indices and can be configured to fail initialisation, fail attach
//! for chosen device names, or act as if entry points were missing.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use crate::capability::{
    BackendVersion, DeviceIndex, EntryPoint, JoystickBackend, JoystickHandle, RumbleCallback,
    RumbleRejected, VirtualPadDesc,
};
use crate::error::{BackendError, BackendResult};

/// One recorded capability call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    /// `init_joystick`.
    Init,
    /// Successful `attach_virtual`.
    Attach {
        /// Assigned index.
        device: DeviceIndex,
        /// Descriptor name.
        name: String,
    },
    /// Successful `detach_virtual`.
    Detach {
        /// Device index.
        device: DeviceIndex,
    },
    /// Successful `open_joystick`.
    Open {
        /// Device index.
        device: DeviceIndex,
    },
    /// `set_axis`.
    SetAxis {
        /// Device index.
        device: DeviceIndex,
        /// Axis index.
        axis: u8,
        /// Value.
        value: i16,
    },
    /// `set_button`.
    SetButton {
        /// Device index.
        device: DeviceIndex,
        /// Button index.
        button: u8,
        /// Value.
        value: u8,
    },
    /// `set_hat`.
    SetHat {
        /// Device index.
        device: DeviceIndex,
        /// Hat index.
        hat: u8,
        /// Value.
        value: u8,
    },
}

impl BackendCall {
    /// Whether this call publishes a control value.
    #[must_use]
    pub fn is_publish(&self) -> bool {
        matches!(
            self,
            Self::SetAxis { .. } | Self::SetButton { .. } | Self::SetHat { .. }
        )
    }

    /// Device the call targets, if any.
    #[must_use]
    pub fn device(&self) -> Option<DeviceIndex> {
        match self {
            Self::Init => None,
            Self::Attach { device, .. }
            | Self::Detach { device }
            | Self::Open { device }
            | Self::SetAxis { device, .. }
            | Self::SetButton { device, .. }
            | Self::SetHat { device, .. } => Some(*device),
        }
    }
}

struct MockDevice {
    desc: VirtualPadDesc,
    callback: Arc<RumbleCallback>,
}

#[derive(Default)]
struct MockState {
    next_device: i32,
    devices: HashMap<DeviceIndex, MockDevice>,
    calls: Vec<BackendCall>,
    pending_rumble: VecDeque<(DeviceIndex, u16, u16)>,
    rumble_results: Vec<(DeviceIndex, Result<(), RumbleRejected>)>,
    last_error: Option<String>,
}

/// Recording in-memory backend.
#[derive(Default)]
pub struct MockBackend {
    state: Mutex<MockState>,
    pumps: AtomicU64,
    fail_init: Option<String>,
    fail_attach: HashSet<String>,
    missing: HashSet<EntryPoint>,
    version: BackendVersion,
}

impl std::fmt::Debug for MockBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockBackend")
            .field("attached", &self.state.lock().devices.len())
            .field("pumps", &self.pump_count())
            .finish()
    }
}

impl MockBackend {
    /// A backend where every capability succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self {
            version: BackendVersion {
                major: 2,
                minor: 30,
                patch: 0,
            },
            ..Self::default()
        }
    }

    /// Make `init_joystick` fail with `reason`.
    #[must_use]
    pub fn fail_init(mut self, reason: impl Into<String>) -> Self {
        self.fail_init = Some(reason.into());
        self
    }

    /// Make `attach_virtual` fail for devices named `name`.
    #[must_use]
    pub fn fail_attach_for(mut self, name: impl Into<String>) -> Self {
        self.fail_attach.insert(name.into());
        self
    }

    /// Make `attach_virtual` fail for player slot `index`.
    #[must_use]
    pub fn fail_attach_for_player(self, index: usize) -> Self {
        self.fail_attach_for(VirtualPadDesc::player_name(index))
    }

    /// Behave as if `entry` failed to resolve.
    #[must_use]
    pub fn without_entry_point(mut self, entry: EntryPoint) -> Self {
        self.missing.insert(entry);
        self
    }

    fn require(&self, entry: EntryPoint) -> BackendResult<()> {
        if self.missing.contains(&entry) {
            return Err(BackendError::MissingEntryPoint(entry.symbol()));
        }
        Ok(())
    }

    /// Every recorded call, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<BackendCall> {
        self.state.lock().calls.clone()
    }

    /// Recorded publish calls (`set_axis`, `set_button`, `set_hat`) for one
    /// device.
    #[must_use]
    pub fn publish_calls(&self, device: DeviceIndex) -> Vec<BackendCall> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| call.is_publish() && call.device() == Some(device))
            .cloned()
            .collect()
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Number of `pump_events` calls.
    #[must_use]
    pub fn pump_count(&self) -> u64 {
        self.pumps.load(Ordering::Acquire)
    }

    /// Currently attached devices and their descriptors, ordered by index.
    #[must_use]
    pub fn attached_devices(&self) -> Vec<(DeviceIndex, VirtualPadDesc)> {
        let state = self.state.lock();
        let mut devices: Vec<_> = state
            .devices
            .iter()
            .map(|(index, device)| (*index, device.desc.clone()))
            .collect();
        devices.sort_by_key(|(index, _)| *index);
        devices
    }

    /// Invoke `device`'s rumble callback now, on the calling thread.
    ///
    /// Returns `None` if the device is not attached.
    pub fn trigger_rumble(
        &self,
        device: DeviceIndex,
        low: u16,
        high: u16,
    ) -> Option<Result<(), RumbleRejected>> {
        let callback = Arc::clone(&self.state.lock().devices.get(&device)?.callback);
        Some(callback(low, high))
    }

    /// Queue a rumble command to be delivered from the next `pump_events`
    /// call, the way a real backend delivers feedback.
    pub fn queue_rumble(&self, device: DeviceIndex, low: u16, high: u16) {
        self.state.lock().pending_rumble.push_back((device, low, high));
    }

    /// Results of rumble commands delivered by `pump_events`.
    #[must_use]
    pub fn rumble_results(&self) -> Vec<(DeviceIndex, Result<(), RumbleRejected>)> {
        self.state.lock().rumble_results.clone()
    }

    fn record(&self, call: BackendCall) {
        self.state.lock().calls.push(call);
    }

    fn device_for(&self, joystick: JoystickHandle) -> Option<DeviceIndex> {
        let device = DeviceIndex(i32::try_from(joystick.0).ok()?);
        self.state.lock().devices.contains_key(&device).then_some(device)
    }
}

impl JoystickBackend for MockBackend {
    fn init_joystick(&self) -> BackendResult<()> {
        self.require(EntryPoint::Init)?;
        if let Some(reason) = &self.fail_init {
            self.state.lock().last_error = Some(reason.clone());
            return Err(BackendError::Init(reason.clone()));
        }
        self.record(BackendCall::Init);
        Ok(())
    }

    fn last_error(&self) -> Option<String> {
        if self.missing.contains(&EntryPoint::GetError) {
            return None;
        }
        self.state.lock().last_error.clone()
    }

    fn version(&self) -> BackendResult<BackendVersion> {
        self.require(EntryPoint::GetVersion)?;
        Ok(self.version)
    }

    fn attach_virtual(
        &self,
        desc: &VirtualPadDesc,
        rumble: RumbleCallback,
    ) -> BackendResult<DeviceIndex> {
        self.require(EntryPoint::AttachVirtual)?;
        let mut state = self.state.lock();
        if self.fail_attach.contains(&desc.name) {
            let reason = format!("attach refused for '{}'", desc.name);
            state.last_error = Some(reason.clone());
            return Err(BackendError::attach(&desc.name, reason));
        }

        let device = DeviceIndex(state.next_device);
        state.next_device = state.next_device.saturating_add(1);
        state.devices.insert(
            device,
            MockDevice {
                desc: desc.clone(),
                callback: Arc::new(rumble),
            },
        );
        state.calls.push(BackendCall::Attach {
            device,
            name: desc.name.clone(),
        });
        Ok(device)
    }

    fn detach_virtual(&self, device: DeviceIndex) -> BackendResult<()> {
        self.require(EntryPoint::DetachVirtual)?;
        let mut state = self.state.lock();
        if state.devices.remove(&device).is_none() {
            return Err(BackendError::Detach {
                device: device.0,
                reason: "no such device".to_owned(),
            });
        }
        state.calls.push(BackendCall::Detach { device });
        Ok(())
    }

    fn open_joystick(&self, device: DeviceIndex) -> BackendResult<JoystickHandle> {
        self.require(EntryPoint::JoystickOpen)?;
        let mut state = self.state.lock();
        let handle = usize::try_from(device.0)
            .ok()
            .filter(|_| state.devices.contains_key(&device))
            .ok_or_else(|| BackendError::Open {
                device: device.0,
                reason: "no such device".to_owned(),
            })?;
        state.calls.push(BackendCall::Open { device });
        Ok(JoystickHandle(handle))
    }

    fn set_axis(&self, joystick: JoystickHandle, axis: u8, value: i16) -> BackendResult<()> {
        self.require(EntryPoint::SetVirtualAxis)?;
        let device = self
            .device_for(joystick)
            .ok_or_else(|| BackendError::set_value("axis", axis, "invalid joystick"))?;
        self.record(BackendCall::SetAxis {
            device,
            axis,
            value,
        });
        Ok(())
    }

    fn set_button(&self, joystick: JoystickHandle, button: u8, value: u8) -> BackendResult<()> {
        self.require(EntryPoint::SetVirtualButton)?;
        let device = self
            .device_for(joystick)
            .ok_or_else(|| BackendError::set_value("button", button, "invalid joystick"))?;
        self.record(BackendCall::SetButton {
            device,
            button,
            value,
        });
        Ok(())
    }

    fn set_hat(&self, joystick: JoystickHandle, hat: u8, value: u8) -> BackendResult<()> {
        self.require(EntryPoint::SetVirtualHat)?;
        let device = self
            .device_for(joystick)
            .ok_or_else(|| BackendError::set_value("hat", hat, "invalid joystick"))?;
        self.record(BackendCall::SetHat { device, hat, value });
        Ok(())
    }

    fn pump_events(&self) -> BackendResult<()> {
        self.require(EntryPoint::PumpEvents)?;
        self.pumps.fetch_add(1, Ordering::AcqRel);

        let pending: Vec<_> = self.state.lock().pending_rumble.drain(..).collect();
        for (device, low, high) in pending {
            if let Some(result) = self.trigger_rumble(device, low, high) {
                self.state.lock().rumble_results.push((device, result));
            }
        }
        Ok(())
    }

    fn delay(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
