//! Virtual controller bridge.
//!
//! An external emulation process writes one fixed-size gamepad record per
//! player into a backing file. The bridge polls each file, republishes
//! changes on a virtual joystick through a [`JoystickBackend`], writes rumble
//! commands from the backend back into the same file, and hides the real
//! `/dev/input/event*` nodes from the process.
//!
//! # Components
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | Environment-driven [`BridgeConfig`] |
//! | [`registry`] | Per-player [`Slot`]s with their own lock |
//! | [`poller`] | One [`SlotPoller`] thread per attached slot |
//! | [`pump`] | The single [`EventPump`] thread |
//! | [`rumble`] | [`RumbleBridge`], the backend's rumble callback target |
//! | [`bridge`] | Bootstrap and the [`BridgeHandle`] supervisor |
//!
//! # Failure model
//!
//! A backend that cannot load or initialise is fatal: [`Bridge::start`]
//! returns [`BridgeError::Backend`] and no device is created. Every other
//! failure is local to one slot, which is disabled while the rest carry on.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use padbridge::prelude::*;
//! use padbridge_backend::Sdl2Backend;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = BridgeConfig::builder().players(2).build()?;
//! let backend = Arc::new(Sdl2Backend::load(&config.backend_library)?);
//! let handle = Bridge::start(config, backend)?;
//! println!("{} virtual pads attached", handle.attached_count());
//! handle.shutdown()?;
//! # Ok(())
//! # }
//! ```
//!
//! [`JoystickBackend`]: padbridge_backend::JoystickBackend

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod bridge;
pub mod cancel;
pub mod config;
pub mod error;
pub mod logging;
pub mod poller;
pub mod prelude;
pub mod pump;
pub mod registry;
pub mod rumble;

pub use bridge::{Bridge, BridgeHandle, ProcessAttach, attach_process, attach_process_from};
pub use cancel::CancelToken;
pub use config::{BridgeConfig, BridgeConfigBuilder, MAX_PLAYERS};
pub use error::{BridgeError, BridgeResult, ConfigError, RumbleError};
pub use poller::{PollOutcome, SlotPoller};
pub use pump::EventPump;
pub use registry::{Slot, SlotRegistry, SlotStatus};
pub use rumble::RumbleBridge;
