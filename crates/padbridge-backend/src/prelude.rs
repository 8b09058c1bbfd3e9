//! Prelude for padbridge-backend.

pub use crate::capability::{
    BackendVersion, DeviceIndex, EntryPoint, JoystickBackend, JoystickHandle, RumbleCallback,
    RumbleRejected, VirtualPadDesc,
};
pub use crate::error::{BackendError, BackendResult};
pub use crate::sdl::Sdl2Backend;
