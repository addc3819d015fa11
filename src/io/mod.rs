//! Filesystem and random-access seams.
//!
//! The archive builder never touches `std::fs` directly: it is handed a
//! [`FileSystem`] that can list directories, read files and persist the
//! finished archive. Listings report each child's own kind, so callers
//! can tell regular files from links. The reader side works over any
//! [`ReadAt`] source.

mod local;
#[cfg(any(test, feature = "testing"))]
mod memory;

pub use local::{LocalFileReader, LocalFs};
#[cfg(any(test, feature = "testing"))]
pub use memory::MemoryFs;

use anyhow::Result;
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};

/// Trait for random access reading from a data source
#[async_trait]
pub trait ReadAt: Send + Sync {
    /// Read data at the specified offset into the buffer
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Get the total size of the data source
    fn size(&self) -> u64;
}

/// What a directory listing says a child is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    /// Symbolic links, sockets, fifos and devices.
    Other,
}

/// One child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub path: PathBuf,
    pub kind: EntryKind,
}

/// Filesystem primitives consumed by the packager.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// List the direct children of `path`, in no particular order.
    async fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    /// Read the full contents of the file at `path`.
    async fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Persist `data` at `path`, creating parent directories as needed.
    ///
    /// Readers of `path` see either the previous content or all of `data`,
    /// never a partial file.
    async fn write_atomic(&self, path: &Path, data: &[u8]) -> io::Result<()>;
}

#[async_trait]
impl ReadAt for Vec<u8> {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let start = usize::try_from(offset)?.min(self.len());
        let n = buf.len().min(self.len() - start);
        buf[..n].copy_from_slice(&self[start..start + n]);
        Ok(n)
    }

    fn size(&self) -> u64 {
        self.len() as u64
    }
}
