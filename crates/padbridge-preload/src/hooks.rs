//! Exported libc entry points.
//!
//! Each one screens its path or descriptor with the process filter, then
//! calls the next definition. A refused request sets `errno` to the code the
//! filter reports and returns -1, as the real call would on failure.

#![expect(unsafe_code, reason = "exports and forwards raw libc entry points")]

use std::ffi::{CStr, OsStr, c_char, c_int, c_uint, c_void};
use std::os::fd::BorrowedFd;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::sync::OnceLock;

use padbridge_devfilter::{DeviceFilter, FilterError, Primitive};

use crate::load::preload_filter;
use crate::next::{NextPrimitives, set_errno};

/// The installed filter, or a local one with the same rules until the
/// load-time constructor has installed it.
fn process_filter() -> &'static DeviceFilter {
    static EARLY: OnceLock<DeviceFilter> = OnceLock::new();
    padbridge_devfilter::installed().unwrap_or_else(|| EARLY.get_or_init(preload_filter))
}

fn refused(err: &FilterError) {
    set_errno(err.raw_os_error().unwrap_or(libc::EIO));
}

fn borrow_fd<'a>(fd: c_int) -> Option<BorrowedFd<'a>> {
    // SAFETY: the caller's descriptor stays open for the duration of the
    // intercepted call, which is the only use of the borrow.
    (fd >= 0).then(|| unsafe { BorrowedFd::borrow_raw(fd) })
}

unsafe fn open_with(
    filter: &DeviceFilter,
    next: &NextPrimitives,
    path: *const c_char,
    flags: c_int,
    mode: c_uint,
) -> c_int {
    if !path.is_null() {
        // SAFETY: a non-null path handed to open(2) is NUL-terminated.
        let bytes = unsafe { CStr::from_ptr(path) }.to_bytes();
        if let Err(e) = filter.screen_path(Primitive::Open, Path::new(OsStr::from_bytes(bytes))) {
            refused(&e);
            return -1;
        }
    }
    // SAFETY: forwarded from the caller.
    unsafe { next.open_raw(path, flags, mode) }
}

unsafe fn ioctl_with(
    filter: &DeviceFilter,
    next: &NextPrimitives,
    fd: c_int,
    request: libc::Ioctl,
    arg: *mut c_void,
) -> c_int {
    if let Some(borrowed) = borrow_fd(fd)
        && let Err(e) = filter.screen_fd(Primitive::Ioctl, borrowed)
    {
        refused(&e);
        return -1;
    }
    // SAFETY: forwarded from the caller.
    unsafe { next.ioctl_raw(fd, request, arg) }
}

unsafe fn read_with(
    filter: &DeviceFilter,
    next: &NextPrimitives,
    fd: c_int,
    buf: *mut c_void,
    count: libc::size_t,
) -> libc::ssize_t {
    if let Some(borrowed) = borrow_fd(fd)
        && let Err(e) = filter.screen_fd(Primitive::Read, borrowed)
    {
        refused(&e);
        return -1;
    }
    // SAFETY: forwarded from the caller.
    unsafe { next.read_raw(fd, buf, count) }
}

/// Interposed `open(2)`.
///
/// The creation mode is taken as a fixed third argument. On x86_64 and
/// aarch64 Linux the first variadic integer is passed in the same register.
///
/// # Safety
///
/// Same contract as libc `open`.
#[cfg_attr(not(test), unsafe(no_mangle))]
pub unsafe extern "C" fn open(path: *const c_char, flags: c_int, mode: c_uint) -> c_int {
    // SAFETY: forwarded from this function's contract.
    unsafe { open_with(process_filter(), NextPrimitives::get(), path, flags, mode) }
}

/// Interposed `open64`, served by the next `open`.
///
/// # Safety
///
/// Same contract as libc `open64`.
#[cfg_attr(not(test), unsafe(no_mangle))]
pub unsafe extern "C" fn open64(path: *const c_char, flags: c_int, mode: c_uint) -> c_int {
    // SAFETY: forwarded from this function's contract.
    unsafe { open(path, flags | libc::O_LARGEFILE, mode) }
}

/// Interposed `ioctl(2)`.
///
/// # Safety
///
/// Same contract as libc `ioctl`.
#[cfg_attr(not(test), unsafe(no_mangle))]
pub unsafe extern "C" fn ioctl(fd: c_int, request: libc::Ioctl, arg: *mut c_void) -> c_int {
    // SAFETY: forwarded from this function's contract.
    unsafe { ioctl_with(process_filter(), NextPrimitives::get(), fd, request, arg) }
}

/// Interposed `read(2)`.
///
/// # Safety
///
/// Same contract as libc `read`.
#[cfg_attr(not(test), unsafe(no_mangle))]
pub unsafe extern "C" fn read(fd: c_int, buf: *mut c_void, count: libc::size_t) -> libc::ssize_t {
    // SAFETY: forwarded from this function's contract.
    unsafe { read_with(process_filter(), NextPrimitives::get(), fd, buf, count) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use padbridge_devfilter::PrefixRule;
    use padbridge_test_helpers::prelude::*;
    use std::ffi::CString;
    use std::fs::{self, File};
    use std::io;
    use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

    fn last_errno() -> Option<i32> {
        io::Error::last_os_error().raw_os_error()
    }

    fn c_path(path: &Path) -> Result<CString, std::ffi::NulError> {
        CString::new(path.as_os_str().as_bytes())
    }

    #[test]
    fn test_open_hides_event_nodes() {
        let filter = preload_filter();
        // SAFETY: the path literal is NUL-terminated.
        let fd = unsafe {
            open_with(&filter, NextPrimitives::get(), c"/dev/input/event0".as_ptr(), libc::O_RDONLY, 0)
        };
        assert_eq!(fd, -1);
        assert_eq!(last_errno(), Some(libc::ENOENT));
        assert_eq!(filter.stats().blocked_open, 1);
        assert!(!filter.is_resolved());
    }

    #[test]
    fn test_open_and_read_pass_through() -> TestResult {
        let dir = BackingDir::new()?;
        let path = dir.path().join("gamepad.mem");
        fs::write(&path, b"pad")?;
        let path = c_path(&path)?;
        let filter = preload_filter();
        let next = NextPrimitives::get();

        // SAFETY: path is NUL-terminated.
        let raw = unsafe { open_with(&filter, next, path.as_ptr(), libc::O_RDONLY, 0) };
        assert!(raw >= 0, "open failed: {:?}", last_errno());
        // SAFETY: open returned a fresh descriptor owned by this test.
        let fd = unsafe { OwnedFd::from_raw_fd(raw) };

        let mut buf = [0u8; 8];
        // SAFETY: buf is valid for writes of its length.
        let n = unsafe { read_with(&filter, next, fd.as_raw_fd(), buf.as_mut_ptr().cast(), buf.len()) };
        assert_eq!(n, 3);
        assert_eq!(buf.get(..3), Some(&b"pad"[..]));
        assert_eq!(filter.stats().total_blocked(), 0);
        Ok(())
    }

    #[test]
    fn test_descriptor_hooks_refuse_hidden_nodes() -> TestResult {
        let dir = BackingDir::new()?;
        let node = dir.path().join("event0");
        fs::write(&node, b"raw")?;
        let prefix = fs::canonicalize(dir.path())?.join("event");
        let file = File::open(&node)?;
        let filter = DeviceFilter::empty()
            .with_rule(PrefixRule::new(prefix))
            .with_primitives(|| *NextPrimitives::get());
        let next = NextPrimitives::get();

        let mut buf = [0u8; 4];
        // SAFETY: buf is valid for writes of its length.
        let n = unsafe { read_with(&filter, next, file.as_raw_fd(), buf.as_mut_ptr().cast(), buf.len()) };
        assert_eq!(n, -1);
        assert_eq!(last_errno(), Some(libc::EAGAIN));
        assert_eq!(buf, [0u8; 4]);

        let mut pending: c_int = 0;
        // SAFETY: FIONREAD writes one c_int through the argument.
        let rc = unsafe {
            ioctl_with(&filter, next, file.as_raw_fd(), libc::FIONREAD as libc::Ioctl, (&raw mut pending).cast())
        };
        assert_eq!(rc, -1);
        assert_eq!(last_errno(), Some(libc::ENOTTY));

        let stats = filter.stats();
        assert_eq!((stats.blocked_read, stats.blocked_ioctl), (1, 1));
        Ok(())
    }

    #[test]
    fn test_ioctl_passes_through_for_other_files() -> TestResult {
        let dir = BackingDir::new()?;
        let path = dir.path().join("gamepad.mem");
        fs::write(&path, [0u8; 36])?;
        let file = File::open(&path)?;
        let filter = preload_filter();

        let mut pending: c_int = -1;
        // SAFETY: FIONREAD writes one c_int through the argument.
        let rc = unsafe {
            ioctl_with(
                &filter,
                NextPrimitives::get(),
                file.as_raw_fd(),
                libc::FIONREAD as libc::Ioctl,
                (&raw mut pending).cast(),
            )
        };
        assert_eq!(rc, 0);
        assert_eq!(pending, 36);
        Ok(())
    }

    #[test]
    fn test_invalid_descriptor_reaches_next_read() {
        let filter = preload_filter();
        let mut buf = [0u8; 1];
        // SAFETY: buf is valid for writes of its length.
        let n = unsafe { read_with(&filter, NextPrimitives::get(), -1, buf.as_mut_ptr().cast(), 1) };
        assert_eq!(n, -1);
        assert_eq!(last_errno(), Some(libc::EBADF));
        assert_eq!(filter.stats().blocked_read, 0);
    }
}
