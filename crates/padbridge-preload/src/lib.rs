//! `LD_PRELOAD` entry for the controller bridge.
//!
//! Loading this library into a process does two things:
//!
//! - a load-time constructor runs [`attach`], which installs the device
//!   filter and starts the bridge from the `EVSHIM_*` environment;
//! - the libc entry points `open`, `open64`, `ioctl` and `read` are
//!   interposed, so the process's own code sees the filter's view of
//!   `/dev/input/event*`.
//!
//! ```text
//! LD_PRELOAD=libpadbridge_preload.so EVSHIM_MAX_PLAYERS=2 ./emulator
//! ```
//!
//! Requests that pass the filter go to the next definition in symbol lookup
//! order, found with `dlsym(RTLD_NEXT)` on first use.

#![cfg(any(target_os = "linux", target_os = "android"))]
#![warn(missing_docs, rust_2018_idioms)]

mod hooks;
mod load;
mod next;

pub use hooks::{ioctl, open, open64, read};
pub use load::attach;
pub use next::NextPrimitives;
