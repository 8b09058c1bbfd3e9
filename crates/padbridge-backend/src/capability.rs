//! The capability surface the bridge consumes from a virtual joystick
//! backend.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::BackendResult;

/// Axes on every virtual gamepad.
pub const GAMEPAD_AXES: u16 = 6;
/// Buttons on every virtual gamepad.
pub const GAMEPAD_BUTTONS: u16 = 15;
/// Hats on every virtual gamepad.
pub const GAMEPAD_HATS: u16 = 1;

/// Backend-assigned index of an attached virtual device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeviceIndex(pub i32);

impl fmt::Display for DeviceIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque handle to an opened joystick.
///
/// For the SDL backend this carries the address of the `SDL_Joystick`; other
/// backends may use any value that identifies the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JoystickHandle(pub usize);

/// Backend library version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BackendVersion {
    /// Major version.
    pub major: u8,
    /// Minor version.
    pub minor: u8,
    /// Patch level.
    pub patch: u8,
}

impl fmt::Display for BackendVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Description of a virtual device to attach.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualPadDesc {
    /// Device name shown to applications.
    pub name: String,
    /// Number of axes.
    pub axes: u16,
    /// Number of buttons.
    pub buttons: u16,
    /// Number of hats.
    pub hats: u16,
    /// USB vendor id, 0 if unspecified.
    pub vendor_id: u16,
    /// USB product id, 0 if unspecified.
    pub product_id: u16,
}

impl VirtualPadDesc {
    /// A game controller with 6 axes, 15 buttons and 1 hat.
    #[must_use]
    pub fn gamepad(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            axes: GAMEPAD_AXES,
            buttons: GAMEPAD_BUTTONS,
            hats: GAMEPAD_HATS,
            vendor_id: 0,
            product_id: 0,
        }
    }

    /// Device name for player slot `index` (0-based).
    ///
    /// Players 1 and 2 are named `B (Player n)`, the rest `A (Player n)`,
    /// matching the names the producer expects.
    #[must_use]
    pub fn player_name(index: usize) -> String {
        let prefix = if index < 2 { 'B' } else { 'A' };
        format!("{prefix} (Player {})", index.saturating_add(1))
    }
}

/// Returned by a rumble callback that could not deliver the command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RumbleRejected;

impl fmt::Display for RumbleRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("rumble command rejected")
    }
}

impl std::error::Error for RumbleRejected {}

/// Rumble callback bound to one virtual device.
///
/// Called with the low- and high-frequency intensities, possibly from the
/// backend's event-processing thread.
pub type RumbleCallback = Box<dyn Fn(u16, u16) -> Result<(), RumbleRejected> + Send + Sync>;

/// Named backend entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryPoint {
    /// Subsystem initialisation.
    Init,
    /// Last error text.
    GetError,
    /// Open a joystick by device index.
    JoystickOpen,
    /// Attach a virtual device.
    AttachVirtual,
    /// Detach a virtual device.
    DetachVirtual,
    /// Set a virtual axis.
    SetVirtualAxis,
    /// Set a virtual button.
    SetVirtualButton,
    /// Set a virtual hat.
    SetVirtualHat,
    /// Pump pending events.
    PumpEvents,
    /// Sleep.
    Delay,
    /// Library version.
    GetVersion,
}

impl EntryPoint {
    /// Every entry point, in resolution order.
    pub const ALL: [Self; 11] = [
        Self::Init,
        Self::GetError,
        Self::JoystickOpen,
        Self::AttachVirtual,
        Self::DetachVirtual,
        Self::SetVirtualAxis,
        Self::SetVirtualButton,
        Self::SetVirtualHat,
        Self::PumpEvents,
        Self::Delay,
        Self::GetVersion,
    ];

    /// Exported symbol name in the SDL2 library.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Init => "SDL_Init",
            Self::GetError => "SDL_GetError",
            Self::JoystickOpen => "SDL_JoystickOpen",
            Self::AttachVirtual => "SDL_JoystickAttachVirtualEx",
            Self::DetachVirtual => "SDL_JoystickDetachVirtual",
            Self::SetVirtualAxis => "SDL_JoystickSetVirtualAxis",
            Self::SetVirtualButton => "SDL_JoystickSetVirtualButton",
            Self::SetVirtualHat => "SDL_JoystickSetVirtualHat",
            Self::PumpEvents => "SDL_PumpEvents",
            Self::Delay => "SDL_Delay",
            Self::GetVersion => "SDL_GetVersion",
        }
    }
}

/// Virtual joystick capability surface.
///
/// Implementations are shared between the poller threads, the event pump and
/// the bootstrap, so every method takes `&self`.
pub trait JoystickBackend: Send + Sync {
    /// Initialise the joystick subsystem.
    ///
    /// # Errors
    ///
    /// [`BackendError::Init`](crate::BackendError::Init) if initialisation
    /// fails, or `MissingEntryPoint`.
    fn init_joystick(&self) -> BackendResult<()>;

    /// Last error text reported by the backend, if any.
    fn last_error(&self) -> Option<String>;

    /// Backend library version.
    ///
    /// # Errors
    ///
    /// `MissingEntryPoint` if the version query is unavailable.
    fn version(&self) -> BackendResult<BackendVersion>;

    /// Attach a virtual device. `rumble` is kept alive until the device is
    /// detached.
    ///
    /// # Errors
    ///
    /// `Attach`, `InvalidDescriptor` or `MissingEntryPoint`.
    fn attach_virtual(
        &self,
        desc: &VirtualPadDesc,
        rumble: RumbleCallback,
    ) -> BackendResult<DeviceIndex>;

    /// Detach a virtual device and drop its rumble callback.
    ///
    /// # Errors
    ///
    /// `Detach` or `MissingEntryPoint`.
    fn detach_virtual(&self, device: DeviceIndex) -> BackendResult<()>;

    /// Open a joystick handle for an attached device.
    ///
    /// # Errors
    ///
    /// `Open` or `MissingEntryPoint`.
    fn open_joystick(&self, device: DeviceIndex) -> BackendResult<JoystickHandle>;

    /// Set a virtual axis value.
    ///
    /// # Errors
    ///
    /// `SetValue` or `MissingEntryPoint`.
    fn set_axis(&self, joystick: JoystickHandle, axis: u8, value: i16) -> BackendResult<()>;

    /// Set a virtual button value.
    ///
    /// # Errors
    ///
    /// `SetValue` or `MissingEntryPoint`.
    fn set_button(&self, joystick: JoystickHandle, button: u8, value: u8) -> BackendResult<()>;

    /// Set a virtual hat value.
    ///
    /// # Errors
    ///
    /// `SetValue` or `MissingEntryPoint`.
    fn set_hat(&self, joystick: JoystickHandle, hat: u8, value: u8) -> BackendResult<()>;

    /// Service the backend's event loop. Rumble callbacks are delivered from
    /// inside this call.
    ///
    /// # Errors
    ///
    /// `MissingEntryPoint`.
    fn pump_events(&self) -> BackendResult<()>;

    /// Sleep for `duration`.
    fn delay(&self, duration: Duration);
}
