//! The file-system collaborator.
//!
//! The graph codec and resolver only ever read a whole file or write a
//! whole file, so the boundary is two methods. Tests swap in their own
//! implementation to simulate failures without touching disk.

use std::io;
use std::path::Path;

/// Whole-file reads and writes.
pub trait FileSystem {
    /// Read the entire contents of `path`.
    ///
    /// # Errors
    ///
    /// Any I/O error from the underlying store.
    fn read_bytes(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Replace the contents of `path` with `bytes`.
    ///
    /// # Errors
    ///
    /// Any I/O error from the underlying store.
    fn write_bytes(&self, path: &Path, bytes: &[u8]) -> io::Result<()>;
}

/// [`FileSystem`] backed by `std::fs`.
///
/// Writes create missing parent directories.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn read_bytes(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn write_bytes(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, bytes)
    }
}
