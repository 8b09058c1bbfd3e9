//! The libc definitions this library shadows.

#![expect(unsafe_code, reason = "resolves and calls libc entry points through raw symbols")]

use std::ffi::{CStr, CString, c_char, c_int, c_uint, c_ulong, c_void};
use std::fs;
use std::io;
use std::os::fd::{AsRawFd, BorrowedFd, FromRawFd, OwnedFd};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use padbridge_devfilter::IoPrimitives;
use tracing::warn;

type OpenFn = unsafe extern "C" fn(*const c_char, c_int, ...) -> c_int;
type IoctlFn = unsafe extern "C" fn(c_int, libc::Ioctl, ...) -> c_int;
type ReadFn = unsafe extern "C" fn(c_int, *mut c_void, libc::size_t) -> libc::ssize_t;

/// `open`, `ioctl` and `read` as defined after this library in lookup order.
///
/// A symbol that cannot be found fails every call with `ENOSYS`.
#[derive(Debug, Clone, Copy)]
pub struct NextPrimitives {
    open: Option<OpenFn>,
    ioctl: Option<IoctlFn>,
    read: Option<ReadFn>,
}

fn next_symbol(name: &CStr) -> Option<*mut c_void> {
    // SAFETY: `name` is NUL-terminated and RTLD_NEXT is a valid pseudo-handle.
    let symbol = unsafe { libc::dlsym(libc::RTLD_NEXT, name.as_ptr()) };
    if symbol.is_null() {
        warn!(symbol = %name.to_string_lossy(), "No next definition");
        None
    } else {
        Some(symbol)
    }
}

pub(crate) fn set_errno(code: c_int) {
    #[cfg(target_os = "android")]
    use libc::__errno as errno_location;
    #[cfg(target_os = "linux")]
    use libc::__errno_location as errno_location;

    // SAFETY: returns the calling thread's errno slot.
    let slot = unsafe { errno_location() };
    // SAFETY: the slot is valid and only touched by this thread.
    unsafe { *slot = code };
}

fn missing() -> c_int {
    set_errno(libc::ENOSYS);
    -1
}

fn cvt(rc: c_int) -> io::Result<c_int> {
    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(rc)
    }
}

#[cfg(all(target_os = "linux", target_env = "gnu"))]
fn libc_request(request: c_ulong) -> libc::Ioctl {
    request
}

#[cfg(not(all(target_os = "linux", target_env = "gnu")))]
fn libc_request(request: c_ulong) -> libc::Ioctl {
    // Request numbers are 32-bit.
    u32::try_from(request & 0xFFFF_FFFF)
        .unwrap_or_default()
        .cast_signed()
}

impl NextPrimitives {
    /// Look up the next definitions now.
    #[must_use]
    pub fn resolve() -> Self {
        // SAFETY: each symbol is the libc function of the matching signature.
        let open = next_symbol(c"open").map(|f| unsafe { std::mem::transmute::<*mut c_void, OpenFn>(f) });
        // SAFETY: as above.
        let ioctl = next_symbol(c"ioctl").map(|f| unsafe { std::mem::transmute::<*mut c_void, IoctlFn>(f) });
        // SAFETY: as above.
        let read = next_symbol(c"read").map(|f| unsafe { std::mem::transmute::<*mut c_void, ReadFn>(f) });
        Self { open, ioctl, read }
    }

    /// The process-wide instance, resolved on first use.
    #[must_use]
    pub fn get() -> &'static Self {
        static NEXT: OnceLock<NextPrimitives> = OnceLock::new();
        NEXT.get_or_init(Self::resolve)
    }

    /// Whether every symbol was found.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.open.is_some() && self.ioctl.is_some() && self.read.is_some()
    }

    /// Call the next `open`.
    ///
    /// # Safety
    ///
    /// `path` must be a valid NUL-terminated string.
    pub unsafe fn open_raw(&self, path: *const c_char, flags: c_int, mode: c_uint) -> c_int {
        match self.open {
            // SAFETY: forwarded from this function's contract.
            Some(open) => unsafe { open(path, flags, mode) },
            None => missing(),
        }
    }

    /// Call the next `ioctl`.
    ///
    /// # Safety
    ///
    /// `arg` must be valid for whatever `request` reads or writes through it.
    pub unsafe fn ioctl_raw(&self, fd: c_int, request: libc::Ioctl, arg: *mut c_void) -> c_int {
        match self.ioctl {
            // SAFETY: forwarded from this function's contract.
            Some(ioctl) => unsafe { ioctl(fd, request, arg) },
            None => missing(),
        }
    }

    /// Call the next `read`.
    ///
    /// # Safety
    ///
    /// `buf` must be valid for writes of `count` bytes.
    pub unsafe fn read_raw(&self, fd: c_int, buf: *mut c_void, count: libc::size_t) -> libc::ssize_t {
        match self.read {
            // SAFETY: forwarded from this function's contract.
            Some(read) => unsafe { read(fd, buf, count) },
            None => {
                set_errno(libc::ENOSYS);
                -1
            }
        }
    }
}

impl IoPrimitives for NextPrimitives {
    fn open(&self, path: &Path, flags: c_int, mode: libc::mode_t) -> io::Result<OwnedFd> {
        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        // SAFETY: c_path is NUL-terminated and outlives the call.
        let fd = cvt(unsafe { self.open_raw(c_path.as_ptr(), flags, c_uint::from(mode)) })?;
        // SAFETY: open(2) returned a fresh descriptor that nothing else owns.
        Ok(unsafe { OwnedFd::from_raw_fd(fd) })
    }

    fn resolve_fd_path(&self, fd: BorrowedFd<'_>) -> Option<PathBuf> {
        fs::read_link(format!("/proc/self/fd/{}", fd.as_raw_fd())).ok()
    }

    unsafe fn ioctl(
        &self,
        fd: BorrowedFd<'_>,
        request: c_ulong,
        arg: *mut c_void,
    ) -> io::Result<c_int> {
        // SAFETY: forwarded from the trait contract.
        cvt(unsafe { self.ioctl_raw(fd.as_raw_fd(), libc_request(request), arg) })
    }

    fn read(&self, fd: BorrowedFd<'_>, buf: &mut [u8]) -> io::Result<usize> {
        // SAFETY: buf is valid for writes of buf.len() bytes.
        let n = unsafe { self.read_raw(fd.as_raw_fd(), buf.as_mut_ptr().cast(), buf.len()) };
        if n < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(n.unsigned_abs())
        }
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        fs::read_dir(path)?
            .map(|entry| entry.map(|entry| entry.path()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use padbridge_test_helpers::prelude::*;
    use std::io::Write;
    use std::os::fd::AsFd;

    #[test]
    fn test_next_definitions_resolve() {
        assert!(NextPrimitives::resolve().is_complete());
        assert!(NextPrimitives::get().is_complete());
    }

    #[test]
    fn test_open_and_read_through_next_definitions() -> TestResult {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(b"pad")?;

        let next = NextPrimitives::get();
        let fd = next.open(file.path(), libc::O_RDONLY, 0)?;
        let mut buf = [0u8; 8];
        let n = next.read(fd.as_fd(), &mut buf)?;
        assert_eq!(buf.get(..n), Some(&b"pad"[..]));
        assert_eq!(next.resolve_fd_path(fd.as_fd()), Some(fs::canonicalize(file.path())?));
        Ok(())
    }

    #[test]
    fn test_missing_path_reports_os_error() {
        let err = NextPrimitives::get()
            .open(Path::new("/nonexistent/padbridge/gamepad.mem"), libc::O_RDONLY, 0)
            .err();
        assert_eq!(err.and_then(|e| e.raw_os_error()), Some(libc::ENOENT));
    }

    #[test]
    fn test_unresolved_symbols_fail_with_enosys() {
        let next = NextPrimitives {
            open: None,
            ioctl: None,
            read: None,
        };
        let mut buf = [0u8; 1];
        // SAFETY: buf is valid for one byte; the call never reaches libc.
        let n = unsafe { next.read_raw(0, buf.as_mut_ptr().cast(), 1) };
        assert_eq!(n, -1);
        assert_eq!(io::Error::last_os_error().raw_os_error(), Some(libc::ENOSYS));
        assert!(!next.is_complete());
    }
}
