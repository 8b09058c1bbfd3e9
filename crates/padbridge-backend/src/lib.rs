//! Virtual joystick backend for padbridge.
//!
//! The bridge never talks to the host input subsystem directly. It goes
//! through [`JoystickBackend`], a capability object produced once at startup
//! and shared by every component that needs it:
//!
//! - [`Sdl2Backend`] binds the SDL2 entry points at runtime with
//!   `libloading`. Missing entry points are logged and reported per call as
//!   [`BackendError::MissingEntryPoint`].
//! - [`mock::MockBackend`] records every call in memory for tests.
//!
//! # Example
//!
//! ```rust
//! use padbridge_backend::prelude::*;
//! use padbridge_backend::mock::MockBackend;
//!
//! let backend = MockBackend::new();
//! backend.init_joystick()?;
//! let device = backend.attach_virtual(
//!     &VirtualPadDesc::gamepad("B (Player 1)"),
//!     Box::new(|_low, _high| Ok(())),
//! )?;
//! let joystick = backend.open_joystick(device)?;
//! backend.set_axis(joystick, 0, 1200)?;
//! # Ok::<(), BackendError>(())
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod capability;
pub mod error;
pub mod mock;
pub mod prelude;
pub mod sdl;

pub use capability::{
    BackendVersion, DeviceIndex, EntryPoint, JoystickBackend, JoystickHandle, RumbleCallback,
    RumbleRejected, VirtualPadDesc,
};
pub use error::{BackendError, BackendResult};
pub use sdl::{DEFAULT_LIBRARY, Sdl2Backend};
