//! Shared-state channel between an emulation process and the padbridge core.
//!
//! Each player slot owns one small backing file. The producer maps it and
//! writes the current [`GamepadState`] at offset 0; the bridge reads that
//! record and writes force-feedback commands ([`RumbleCommand`]) back at a
//! fixed offset in the same file. No synchronisation metadata lives in the
//! file itself: it is a plain shared buffer, not a ring.
//!
//! ## Layout (little-endian)
//!
//! | Bytes    | Field                                  | Writer   |
//! |----------|----------------------------------------|----------|
//! | `0..12`  | `lx, ly, rx, ry, lt, rt` (`i16` x 6)   | producer |
//! | `12..27` | buttons (`u8` x 15)                    | producer |
//! | `27`     | hat (`u8`)                             | producer |
//! | `28..32` | padding                                | -        |
//! | `32..34` | low-frequency rumble (`u16`)           | bridge   |
//! | `34..36` | high-frequency rumble (`u16`)          | bridge   |
//!
//! The producer sizes the file to [`BACKING_FILE_LEN`] bytes; everything past
//! [`RECORD_LEN`] is reserved.
//!
//! ## Modules
//!
//! - [`record`] - the fixed record and its codec
//! - [`path`] - per-slot backing file naming
//! - [`channel`] - bridge-side descriptor access ([`SlotChannel`])
//! - [`producer`] - producer-side mapped access ([`ProducerChannel`])
//! - [`error`] - error types

#![deny(clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod channel;
pub mod error;
pub mod path;
pub mod prelude;
pub mod producer;
pub mod record;

pub use channel::SlotChannel;
pub use error::{ShmError, ShmResult};
pub use path::{DEFAULT_BASE_PATH, backing_file_path};
pub use producer::ProducerChannel;
pub use record::{
    AXIS_COUNT, BACKING_FILE_LEN, BUTTON_COUNT, GamepadState, INPUT_LEN, RECORD_LEN,
    RUMBLE_LEN, RUMBLE_OFFSET, RumbleCommand, SharedRecord,
};
