//! The OS primitives the filter sits in front of.

#![expect(unsafe_code, reason = "thin wrappers over libc file primitives")]

use std::ffi::{CString, c_int, c_ulong, c_void};
use std::fs;
use std::io;
use std::os::fd::{AsRawFd, BorrowedFd, FromRawFd, OwnedFd};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

/// File primitives, real or substituted.
pub trait IoPrimitives: Send + Sync {
    /// Open `path` with `open(2)` flags and creation mode.
    ///
    /// # Errors
    ///
    /// The OS error from `open(2)`.
    fn open(&self, path: &Path, flags: c_int, mode: libc::mode_t) -> io::Result<OwnedFd>;

    /// Path an open descriptor refers to, if it can be determined.
    fn resolve_fd_path(&self, fd: BorrowedFd<'_>) -> Option<PathBuf>;

    /// Issue a device-control request.
    ///
    /// # Errors
    ///
    /// The OS error from `ioctl(2)`.
    ///
    /// # Safety
    ///
    /// `arg` must be valid for whatever `request` reads or writes through it.
    unsafe fn ioctl(
        &self,
        fd: BorrowedFd<'_>,
        request: c_ulong,
        arg: *mut c_void,
    ) -> io::Result<c_int>;

    /// Read from a descriptor into `buf`.
    ///
    /// # Errors
    ///
    /// The OS error from `read(2)`.
    fn read(&self, fd: BorrowedFd<'_>, buf: &mut [u8]) -> io::Result<usize>;

    /// Full paths of the entries in directory `path`.
    ///
    /// # Errors
    ///
    /// The OS error from listing the directory.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;
}

/// The process's real primitives, called through `libc`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LibcPrimitives;

fn cvt(rc: c_int) -> io::Result<c_int> {
    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(rc)
    }
}

impl IoPrimitives for LibcPrimitives {
    fn open(&self, path: &Path, flags: c_int, mode: libc::mode_t) -> io::Result<OwnedFd> {
        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        // SAFETY: c_path is a valid NUL-terminated string for the duration of
        // the call.
        let fd = cvt(unsafe { libc::open(c_path.as_ptr(), flags, libc::c_uint::from(mode)) })?;
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
        // SAFETY: the caller guarantees `arg` matches `request`; `fd` is
        // open for the lifetime of the borrow.
        cvt(unsafe { libc::ioctl(fd.as_raw_fd(), request as _, arg) })
    }

    fn read(&self, fd: BorrowedFd<'_>, buf: &mut [u8]) -> io::Result<usize> {
        // SAFETY: buf is valid for writes of buf.len() bytes and `fd` is open
        // for the lifetime of the borrow.
        let n = unsafe { libc::read(fd.as_raw_fd(), buf.as_mut_ptr().cast(), buf.len()) };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(n.unsigned_abs())
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.path()))
            .collect()
    }
}
