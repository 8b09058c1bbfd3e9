//! Prelude for padbridge.
//!
//! ```rust
//! use padbridge::prelude::*;
//!
//! let config = BridgeConfig::builder().players(3).build();
//! assert!(config.is_ok());
//! ```

pub use crate::bridge::{Bridge, BridgeHandle, ProcessAttach, attach_process, attach_process_from};
pub use crate::cancel::CancelToken;
pub use crate::config::{BridgeConfig, BridgeConfigBuilder, MAX_PLAYERS};
pub use crate::error::{BridgeError, BridgeResult, ConfigError, RumbleError};
pub use crate::poller::{PollOutcome, SlotPoller};
pub use crate::pump::EventPump;
pub use crate::registry::{Slot, SlotRegistry, SlotStatus};
pub use crate::rumble::RumbleBridge;
