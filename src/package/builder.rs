//! The two entry points of the packager: build the bytes, then write them.

use std::path::Path;

use tracing::debug;

use crate::error::{PackError, Result};
use crate::io::FileSystem;
use crate::zip::{Entry, assemble};

use super::collector::collect;
use super::filter::ExclusionRules;

/// Size of a built archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveStats {
    pub entries: usize,
    pub bytes: usize,
}

/// Package `source_dir` into an in-memory archive whose entries all start
/// with `root_name/`.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use skillpack::{LocalFs, build_archive, write_archive};
///
/// # async fn run() -> skillpack::Result<()> {
/// let bytes = build_archive(&LocalFs, Path::new("skills/pdf"), "pdf").await?;
/// write_archive(&LocalFs, &bytes, Path::new("dist/pdf.skill")).await?;
/// # Ok(())
/// # }
/// ```
pub async fn build_archive<F>(fs: &F, source_dir: &Path, root_name: &str) -> Result<Vec<u8>>
where
    F: FileSystem + ?Sized,
{
    let (bytes, _) = build_archive_with_stats(fs, source_dir, root_name).await?;
    Ok(bytes)
}

/// Like [`build_archive`], also reporting how many entries were stored.
pub async fn build_archive_with_stats<F>(
    fs: &F,
    source_dir: &Path,
    root_name: &str,
) -> Result<(Vec<u8>, ArchiveStats)>
where
    F: FileSystem + ?Sized,
{
    let files = collect(fs, source_dir, root_name, &ExclusionRules::default()).await?;

    let mut entries = Vec::with_capacity(files.len());
    for file in files {
        let data = fs
            .read(&file.source)
            .await
            .map_err(|e| PackError::source_not_found(&file.source, e))?;
        debug!(name = %file.archive_name, size = data.len(), "adding entry");
        entries.push(Entry::new(file.archive_name, data));
    }

    let bytes = assemble(&entries)?;
    let stats = ArchiveStats {
        entries: entries.len(),
        bytes: bytes.len(),
    };
    Ok((bytes, stats))
}

/// Atomically persist a finished archive at `destination`.
pub async fn write_archive<F>(fs: &F, bytes: &[u8], destination: &Path) -> Result<()>
where
    F: FileSystem + ?Sized,
{
    fs.write_atomic(destination, bytes)
        .await
        .map_err(|source| PackError::WriteFailure {
            path: destination.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryFs;

    #[tokio::test]
    async fn empty_directory_builds_empty_archive() {
        let fs = MemoryFs::new();
        fs.add_dir("skills/empty");

        let (bytes, stats) = build_archive_with_stats(&fs, Path::new("skills/empty"), "empty")
            .await
            .unwrap();
        assert_eq!(stats, ArchiveStats { entries: 0, bytes: 22 });
        assert_eq!(&bytes[..4], b"PK\x05\x06");
    }

    #[tokio::test]
    async fn names_are_prefixed_with_root() {
        let fs = MemoryFs::new();
        fs.add_file("skills/pdf/SKILL.md", "# PDF");

        let bytes = build_archive(&fs, Path::new("skills/pdf"), "pdf-tools").await.unwrap();
        let name = b"pdf-tools/SKILL.md";
        assert_eq!(&bytes[30..30 + name.len()], name);
    }

    #[tokio::test]
    async fn write_failure_is_reported() {
        let fs = MemoryFs::new().read_only();
        let err = write_archive(&fs, b"PK", Path::new("dist/a.skill"))
            .await
            .unwrap_err();
        assert!(matches!(err, PackError::WriteFailure { .. }));
    }

    #[tokio::test]
    async fn write_goes_to_destination() {
        let fs = MemoryFs::new();
        write_archive(&fs, b"archive", Path::new("dist/a.skill"))
            .await
            .unwrap();
        assert_eq!(fs.file("dist/a.skill").unwrap(), b"archive");
    }
}
