//! Shared test utilities for padbridge.
//!
//! # Modules
//!
//! - [`mod@must`] - Unwrap helpers with good error messages and `#[track_caller]`
//! - [`fixtures`] - Temporary backing-file directories
//! - [`wait`] - Bounded polling for conditions set by background threads
//! - [`prelude`] - Convenience re-exports
//!
//! ```toml
//! [dev-dependencies]
//! padbridge-test-helpers = { workspace = true }
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![allow(clippy::unwrap_used, clippy::panic, reason = "test-only crate")]

pub mod fixtures;
pub mod must;
pub mod prelude;
pub mod wait;

pub use must::*;
pub use wait::wait_until;
