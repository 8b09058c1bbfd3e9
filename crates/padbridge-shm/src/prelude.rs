//! Prelude for padbridge-shm.
//!
//! ```rust
//! use padbridge_shm::prelude::*;
//!
//! let state = GamepadState::default().with_button(0, 1);
//! assert_eq!(state.diff(&GamepadState::default()).len(), 1);
//! ```

pub use crate::channel::SlotChannel;
pub use crate::error::{ShmError, ShmResult};
pub use crate::path::{DEFAULT_BASE_PATH, backing_file_path};
pub use crate::producer::ProducerChannel;
pub use crate::record::{FieldChange, GamepadState, RumbleCommand, SharedRecord, hat};
