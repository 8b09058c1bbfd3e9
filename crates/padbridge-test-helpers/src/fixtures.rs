//! Temporary directories holding backing files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Size given to fixture backing files, matching what the producer creates.
pub const FIXTURE_FILE_LEN: usize = 64;

/// A temporary directory that backing files are created in.
///
/// The directory and everything in it is removed on drop.
#[derive(Debug)]
pub struct BackingDir {
    dir: TempDir,
}

impl BackingDir {
    /// Create an empty directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary directory cannot be created.
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    /// Directory path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Base backing file path (`<dir>/gamepad.mem`). Not created.
    #[must_use]
    pub fn base_path(&self) -> PathBuf {
        self.dir.path().join("gamepad.mem")
    }

    /// Create a zero-filled backing file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn create_file(&self, path: impl AsRef<Path>) -> io::Result<PathBuf> {
        let path = path.as_ref().to_path_buf();
        fs::write(&path, [0u8; FIXTURE_FILE_LEN])?;
        Ok(path)
    }

    /// Create zero-filled backing files for every path in `paths`.
    ///
    /// # Errors
    ///
    /// Returns the first write error.
    pub fn create_files<I, P>(&self, paths: I) -> io::Result<Vec<PathBuf>>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        paths.into_iter().map(|p| self.create_file(p)).collect()
    }

    /// Read back the raw bytes of a backing file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn read_bytes(&self, path: impl AsRef<Path>) -> io::Result<Vec<u8>> {
        fs::read(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_file_is_zeroed() -> Result<(), Box<dyn std::error::Error>> {
        let dir = BackingDir::new()?;
        let path = dir.create_file(dir.base_path())?;
        let bytes = dir.read_bytes(&path)?;
        assert_eq!(bytes.len(), FIXTURE_FILE_LEN);
        assert!(bytes.iter().all(|b| *b == 0));
        Ok(())
    }
}
