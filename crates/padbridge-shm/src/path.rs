//! Backing file naming.
//!
//! Slot 0 uses the base path as-is. Slot `i >= 1` appends the decimal index
//! to the file stem, before the extension: `gamepad.mem`, `gamepad1.mem`,
//! `gamepad2.mem`, ...

use std::path::{Path, PathBuf};

/// Default base path shared with the producer.
pub const DEFAULT_BASE_PATH: &str = "/data/data/app.gamenative/files/imagefs/tmp/gamepad.mem";

/// Derive the backing file path for slot `index` from `base`.
///
/// Indices of 10 and above get a multi-digit suffix (`gamepad10.mem`), which
/// keeps every slot's path distinct.
#[must_use]
pub fn backing_file_path(base: &Path, index: usize) -> PathBuf {
    if index == 0 {
        return base.to_path_buf();
    }

    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match base.extension() {
        Some(ext) => format!("{stem}{index}.{}", ext.to_string_lossy()),
        None => format!("{stem}{index}"),
    };
    base.with_file_name(file_name)
}
