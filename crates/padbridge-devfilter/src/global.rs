//! Process-wide filter installation.
//!
//! A filter is installed at most once and is read-only afterwards. The free
//! functions here route through the installed filter, or straight to the
//! libc primitives when none is installed.

use std::ffi::{c_int, c_ulong, c_void};
use std::os::fd::{BorrowedFd, OwnedFd};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing::info;

use crate::error::{FilterError, FilterResult};
use crate::filter::DeviceFilter;
use crate::primitives::{IoPrimitives, LibcPrimitives};

static INSTALLED: OnceLock<DeviceFilter> = OnceLock::new();

/// Install `filter` for the rest of the process lifetime.
///
/// # Errors
///
/// Returns [`FilterError::AlreadyInstalled`] if a filter is already
/// installed; the existing one stays in place.
pub fn install(filter: DeviceFilter) -> FilterResult<&'static DeviceFilter> {
    let mut pending = Some(filter);
    let installed = INSTALLED.get_or_init(|| {
        info!("Input device filter installed");
        pending.take().unwrap_or_default()
    });
    match pending {
        None => Ok(installed),
        Some(_) => Err(FilterError::AlreadyInstalled),
    }
}

/// The installed filter, if any.
#[must_use]
pub fn installed() -> Option<&'static DeviceFilter> {
    INSTALLED.get()
}

/// Open `path` through the installed filter.
///
/// # Errors
///
/// See [`DeviceFilter::open`].
pub fn open(path: impl AsRef<Path>, flags: c_int, mode: libc::mode_t) -> FilterResult<OwnedFd> {
    match installed() {
        Some(filter) => filter.open(path, flags, mode),
        None => Ok(LibcPrimitives.open(path.as_ref(), flags, mode)?),
    }
}

/// Issue a device-control request through the installed filter.
///
/// # Errors
///
/// See [`DeviceFilter::ioctl`].
///
/// # Safety
///
/// `arg` must be valid for whatever `request` reads or writes through it.
#[expect(unsafe_code, reason = "forwards the raw ioctl argument")]
pub unsafe fn ioctl(fd: BorrowedFd<'_>, request: c_ulong, arg: *mut c_void) -> FilterResult<c_int> {
    match installed() {
        // SAFETY: forwarded from this function's contract.
        Some(filter) => unsafe { filter.ioctl(fd, request, arg) },
        // SAFETY: forwarded from this function's contract.
        None => Ok(unsafe { LibcPrimitives.ioctl(fd, request, arg) }?),
    }
}

/// Read from `fd` through the installed filter.
///
/// # Errors
///
/// See [`DeviceFilter::read`].
pub fn read(fd: BorrowedFd<'_>, buf: &mut [u8]) -> FilterResult<usize> {
    match installed() {
        Some(filter) => filter.read(fd, buf),
        None => Ok(LibcPrimitives.read(fd, buf)?),
    }
}

/// List `path` through the installed filter.
///
/// # Errors
///
/// See [`DeviceFilter::read_dir`].
pub fn read_dir(path: impl AsRef<Path>) -> FilterResult<Vec<PathBuf>> {
    match installed() {
        Some(filter) => filter.read_dir(path),
        None => Ok(LibcPrimitives.read_dir(path.as_ref())?),
    }
}
