//! Hide raw input device nodes from the process.
//!
//! Code that enumerates or reads `/dev/input/event*` directly would see the
//! physical devices next to the virtual ones the bridge creates. This crate
//! is the I/O boundary that code is expected to go through instead:
//!
//! | Request | Path or descriptor under a rule | Anything else |
//! |---------|---------------------------------|---------------|
//! | `open` | fails with `ENOENT` | real `open` |
//! | `ioctl` | fails with `ENOTTY` | real `ioctl` |
//! | `read` | fails with `EAGAIN` | real `read` |
//! | `read_dir` | entry omitted | listed |
//!
//! Descriptors are matched by resolving them back to a path through
//! `/proc/self/fd`. The real primitives are resolved lazily, on the first
//! request that passes through.
//!
//! # Example
//!
//! ```rust,no_run
//! use padbridge_devfilter::prelude::*;
//!
//! let filter = DeviceFilter::new();
//! let err = filter.open("/dev/input/event3", libc::O_RDONLY, 0).err();
//! assert_eq!(err.and_then(|e| e.raw_os_error()), Some(libc::ENOENT));
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod error;
pub mod filter;
pub mod global;
pub mod prelude;
pub mod primitives;
pub mod rule;

pub use error::{FilterError, FilterResult, Primitive};
pub use filter::{DeviceFilter, FilterStats};
pub use global::{install, installed, ioctl, open, read, read_dir};
pub use primitives::{IoPrimitives, LibcPrimitives};
pub use rule::{EVENT_NODE_PREFIX, InterceptionRule, PrefixRule};
