//! The request filter.

use std::ffi::{c_int, c_ulong, c_void};
use std::fmt;
use std::os::fd::{BorrowedFd, OwnedFd};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{FilterError, FilterResult, Primitive};
use crate::primitives::{IoPrimitives, LibcPrimitives};
use crate::rule::{InterceptionRule, PrefixRule};

type PrimitiveFactory = Box<dyn Fn() -> Box<dyn IoPrimitives> + Send + Sync>;

/// Counts of requests the filter refused or hid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterStats {
    /// Blocked `open` requests.
    pub blocked_open: u64,
    /// Blocked `ioctl` requests.
    pub blocked_ioctl: u64,
    /// Blocked `read` requests.
    pub blocked_read: u64,
    /// Directory entries omitted from listings.
    pub hidden_entries: u64,
}

impl FilterStats {
    /// Total refused requests, excluding hidden directory entries.
    #[must_use]
    pub fn total_blocked(&self) -> u64 {
        self.blocked_open
            .saturating_add(self.blocked_ioctl)
            .saturating_add(self.blocked_read)
    }
}

#[derive(Default)]
struct Counters {
    open: AtomicU64,
    ioctl: AtomicU64,
    read: AtomicU64,
    hidden: AtomicU64,
}

impl Counters {
    fn bump(&self, primitive: Primitive) {
        let counter = match primitive {
            Primitive::Open => &self.open,
            Primitive::Ioctl => &self.ioctl,
            Primitive::Read => &self.read,
            Primitive::ReadDir => &self.hidden,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Filters `open`, `ioctl`, `read` and directory listings against a set of
/// [`InterceptionRule`]s.
///
/// Requests that match a rule fail (or, for listings, lose the matching
/// entries) without reaching the real primitive. Everything else is passed
/// through unchanged. The real primitive set is built on first use.
pub struct DeviceFilter {
    rules: Vec<Box<dyn InterceptionRule>>,
    real: OnceLock<Box<dyn IoPrimitives>>,
    factory: PrimitiveFactory,
    counters: Counters,
}

impl fmt::Debug for DeviceFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceFilter")
            .field("rules", &self.rules)
            .field("resolved", &self.is_resolved())
            .field("stats", &self.stats())
            .finish()
    }
}

impl Default for DeviceFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceFilter {
    /// A filter hiding `/dev/input/event*` in front of the libc primitives.
    #[must_use]
    pub fn new() -> Self {
        Self::empty().with_rule(PrefixRule::event_nodes())
    }

    /// A filter with no rules in front of the libc primitives.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            rules: Vec::new(),
            real: OnceLock::new(),
            factory: Box::new(|| Box::new(LibcPrimitives)),
            counters: Counters::default(),
        }
    }

    /// Add a rule.
    #[must_use]
    pub fn with_rule(mut self, rule: impl InterceptionRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Pass requests through to `factory()`'s primitives instead of libc.
    /// The factory still runs lazily, at most once.
    #[must_use]
    pub fn with_primitives<P, F>(mut self, factory: F) -> Self
    where
        P: IoPrimitives + 'static,
        F: Fn() -> P + Send + Sync + 'static,
    {
        self.factory = Box::new(move || Box::new(factory()));
        self
    }

    /// Whether the real primitives have been resolved yet.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.real.get().is_some()
    }

    /// Snapshot of the refusal counters.
    #[must_use]
    pub fn stats(&self) -> FilterStats {
        FilterStats {
            blocked_open: self.counters.open.load(Ordering::Relaxed),
            blocked_ioctl: self.counters.ioctl.load(Ordering::Relaxed),
            blocked_read: self.counters.read.load(Ordering::Relaxed),
            hidden_entries: self.counters.hidden.load(Ordering::Relaxed),
        }
    }

    fn real(&self) -> &dyn IoPrimitives {
        self.real
            .get_or_init(|| {
                debug!("Resolving real I/O primitives");
                (self.factory)()
            })
            .as_ref()
    }

    /// Whether `path` is hidden by any rule.
    #[must_use]
    pub fn is_hidden_path(&self, path: &Path) -> bool {
        self.rules.iter().any(|rule| rule.matches(path))
    }

    /// The hidden path `fd` refers to, if it refers to one.
    #[must_use]
    pub fn hidden_fd_path(&self, fd: BorrowedFd<'_>) -> Option<PathBuf> {
        if self.rules.is_empty() {
            return None;
        }
        self.real()
            .resolve_fd_path(fd)
            .filter(|path| self.is_hidden_path(path))
    }

    fn refuse(&self, primitive: Primitive, path: PathBuf) -> FilterError {
        self.counters.bump(primitive);
        trace!(%primitive, path = %path.display(), "Request hidden");
        FilterError::blocked(primitive, path)
    }

    /// Refuse `primitive` on `path` if it is hidden, without performing it.
    ///
    /// For callers that issue the real request themselves, such as exported
    /// libc entry points working on raw pointers.
    ///
    /// # Errors
    ///
    /// [`FilterError::Blocked`] for hidden paths.
    pub fn screen_path(&self, primitive: Primitive, path: &Path) -> FilterResult<()> {
        if self.is_hidden_path(path) {
            return Err(self.refuse(primitive, path.to_path_buf()));
        }
        Ok(())
    }

    /// Refuse `primitive` on `fd` if it refers to a hidden path, without
    /// performing it.
    ///
    /// # Errors
    ///
    /// [`FilterError::Blocked`] for hidden descriptors.
    pub fn screen_fd(&self, primitive: Primitive, fd: BorrowedFd<'_>) -> FilterResult<()> {
        match self.hidden_fd_path(fd) {
            Some(path) => Err(self.refuse(primitive, path)),
            None => Ok(()),
        }
    }

    /// Open `path`, or fail with `ENOENT` if it is hidden.
    ///
    /// # Errors
    ///
    /// [`FilterError::Blocked`] for hidden paths, [`FilterError::Io`] if the
    /// real `open` fails.
    pub fn open(
        &self,
        path: impl AsRef<Path>,
        flags: c_int,
        mode: libc::mode_t,
    ) -> FilterResult<OwnedFd> {
        let path = path.as_ref();
        self.screen_path(Primitive::Open, path)?;
        Ok(self.real().open(path, flags, mode)?)
    }

    /// Issue a device-control request, or fail with `ENOTTY` if `fd` refers
    /// to a hidden path.
    ///
    /// # Errors
    ///
    /// [`FilterError::Blocked`] for hidden descriptors, [`FilterError::Io`]
    /// if the real `ioctl` fails.
    ///
    /// # Safety
    ///
    /// `arg` must be valid for whatever `request` reads or writes through it.
    #[expect(unsafe_code, reason = "forwards the raw ioctl argument")]
    pub unsafe fn ioctl(
        &self,
        fd: BorrowedFd<'_>,
        request: c_ulong,
        arg: *mut c_void,
    ) -> FilterResult<c_int> {
        self.screen_fd(Primitive::Ioctl, fd)?;
        // SAFETY: forwarded from this function's contract.
        Ok(unsafe { self.real().ioctl(fd, request, arg) }?)
    }

    /// Read from `fd`, or fail with `EAGAIN` if it refers to a hidden path.
    ///
    /// # Errors
    ///
    /// [`FilterError::Blocked`] for hidden descriptors, [`FilterError::Io`]
    /// if the real `read` fails.
    pub fn read(&self, fd: BorrowedFd<'_>, buf: &mut [u8]) -> FilterResult<usize> {
        self.screen_fd(Primitive::Read, fd)?;
        Ok(self.real().read(fd, buf)?)
    }

    /// List `path`, omitting hidden entries.
    ///
    /// # Errors
    ///
    /// [`FilterError::Blocked`] if `path` itself is hidden,
    /// [`FilterError::Io`] if listing fails.
    pub fn read_dir(&self, path: impl AsRef<Path>) -> FilterResult<Vec<PathBuf>> {
        let path = path.as_ref();
        self.screen_path(Primitive::ReadDir, path)?;
        let mut entries = self.real().read_dir(path)?;
        entries.retain(|entry| {
            let hidden = self.is_hidden_path(entry);
            if hidden {
                self.counters.bump(Primitive::ReadDir);
            }
            !hidden
        });
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::os::fd::AsFd;
    use std::sync::Arc;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    /// Counts pass-through calls and serves a fixed directory listing.
    #[derive(Clone, Default)]
    struct CountingPrimitives {
        calls: Arc<AtomicU64>,
        listing: Vec<PathBuf>,
    }

    impl IoPrimitives for CountingPrimitives {
        fn open(&self, path: &Path, flags: c_int, mode: libc::mode_t) -> io::Result<OwnedFd> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            LibcPrimitives.open(path, flags, mode)
        }

        fn resolve_fd_path(&self, fd: BorrowedFd<'_>) -> Option<PathBuf> {
            LibcPrimitives.resolve_fd_path(fd)
        }

        #[expect(unsafe_code, reason = "test double forwarding the raw argument")]
        unsafe fn ioctl(
            &self,
            fd: BorrowedFd<'_>,
            request: c_ulong,
            arg: *mut c_void,
        ) -> io::Result<c_int> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            // SAFETY: forwarded from the caller.
            unsafe { LibcPrimitives.ioctl(fd, request, arg) }
        }

        fn read(&self, fd: BorrowedFd<'_>, buf: &mut [u8]) -> io::Result<usize> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            LibcPrimitives.read(fd, buf)
        }

        fn read_dir(&self, _path: &Path) -> io::Result<Vec<PathBuf>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.listing.clone())
        }
    }

    #[test]
    fn test_hidden_open_never_resolves_real_primitives() {
        let filter = DeviceFilter::new();
        let err = filter.open("/dev/input/event0", libc::O_RDONLY, 0).err();
        assert_eq!(
            err.and_then(|e| e.raw_os_error()),
            Some(libc::ENOENT)
        );
        assert!(!filter.is_resolved());
        assert_eq!(filter.stats().blocked_open, 1);
    }

    #[test]
    fn test_other_paths_pass_through() -> TestResult {
        let file = tempfile::NamedTempFile::new()?;
        let prims = CountingPrimitives::default();
        let calls = Arc::clone(&prims.calls);
        let filter = DeviceFilter::new().with_primitives(move || prims.clone());

        let _fd = filter.open(file.path(), libc::O_RDONLY, 0)?;
        assert!(filter.is_resolved());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(filter.stats().total_blocked(), 0);
        Ok(())
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_descriptor_rules_block_read_and_ioctl() -> TestResult {
        let dir = tempfile::tempdir()?;
        let node = dir.path().join("event0");
        std::fs::write(&node, b"raw")?;
        let prefix = std::fs::canonicalize(dir.path())?.join("event");

        // Open before the rule exists, as a descriptor inherited from
        // elsewhere in the process would be.
        let fd = LibcPrimitives.open(&node, libc::O_RDONLY, 0)?;
        let filter = DeviceFilter::empty().with_rule(PrefixRule::new(prefix));

        let mut buf = [0u8; 4];
        let read = filter.read(fd.as_fd(), &mut buf).err();
        assert_eq!(read.and_then(|e| e.raw_os_error()), Some(libc::EAGAIN));

        let mut arg: c_int = 0;
        // SAFETY: FIONREAD writes one c_int through `arg`.
        #[expect(unsafe_code, reason = "exercising the raw ioctl entry point")]
        let ioctl = unsafe {
            filter.ioctl(
                fd.as_fd(),
                libc::FIONREAD as c_ulong,
                (&raw mut arg).cast(),
            )
        }
        .err();
        assert_eq!(ioctl.and_then(|e| e.raw_os_error()), Some(libc::ENOTTY));

        let stats = filter.stats();
        assert_eq!((stats.blocked_read, stats.blocked_ioctl), (1, 1));
        Ok(())
    }

    #[test]
    fn test_listing_omits_hidden_entries() -> TestResult {
        let prims = CountingPrimitives {
            listing: vec![
                PathBuf::from("/dev/input/event0"),
                PathBuf::from("/dev/input/event1"),
                PathBuf::from("/dev/input/js0"),
            ],
            ..CountingPrimitives::default()
        };
        let filter = DeviceFilter::new().with_primitives(move || prims.clone());
        let entries = filter.read_dir("/dev/input")?;
        assert_eq!(entries, vec![PathBuf::from("/dev/input/js0")]);
        assert_eq!(filter.stats().hidden_entries, 2);
        Ok(())
    }

    #[test]
    fn test_screening_counts_without_calling_through() -> TestResult {
        let file = tempfile::NamedTempFile::new()?;
        let prims = CountingPrimitives::default();
        let calls = Arc::clone(&prims.calls);
        let filter = DeviceFilter::new().with_primitives(move || prims.clone());

        let hidden = filter
            .screen_path(Primitive::Open, Path::new("/dev/input/event4"))
            .err();
        assert_eq!(hidden.and_then(|e| e.raw_os_error()), Some(libc::ENOENT));
        filter.screen_path(Primitive::Open, file.path())?;
        filter.screen_fd(Primitive::Read, file.as_file().as_fd())?;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(filter.stats().blocked_open, 1);
        Ok(())
    }

    #[test]
    fn test_empty_filter_hides_nothing() {
        let filter = DeviceFilter::empty();
        assert!(!filter.is_hidden_path(Path::new("/dev/input/event0")));
    }
}
