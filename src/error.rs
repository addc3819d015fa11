//! Error types for archive construction.
//!
//! Every variant is scoped to a single archive build. The batch packager
//! records the error for the failing target and carries on with the rest.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Which fixed-width field of the ZIP format overflowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    /// More than 65535 entries in one archive.
    EntryCount,
    /// Entry name longer than 65535 bytes.
    NameLength,
    /// Entry data longer than 4 GiB.
    EntrySize,
    /// Local header offset or central directory offset past 4 GiB.
    Offset,
    /// Central directory larger than 4 GiB.
    CentralDirectorySize,
}

impl std::fmt::Display for Limit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Limit::EntryCount => "entry count",
            Limit::NameLength => "entry name length",
            Limit::EntrySize => "entry size",
            Limit::Offset => "archive offset",
            Limit::CentralDirectorySize => "central directory size",
        };
        f.write_str(name)
    }
}

/// The error type for packaging operations.
#[derive(Debug, Error)]
pub enum PackError {
    /// Source directory or file is missing or unreadable.
    #[error("source not found: {}: {source}", .path.display())]
    SourceNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A value does not fit the 16/32-bit fields of a non-ZIP64 archive.
    #[error("archive limit exceeded: {limit} is {value}, maximum is {max}")]
    ArchiveLimitExceeded { limit: Limit, value: u64, max: u64 },

    /// Destination could not be written.
    #[error("failed to write {}: {source}", .path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Skill directory has no SKILL.md at its root.
    #[error("no SKILL.md found in {}", .path.display())]
    MissingManifest { path: PathBuf },

    /// The requested skill does not exist in the skills directory.
    #[error("skill not found: {name}")]
    SkillNotFound { name: String },

    /// The task building this archive panicked or was cancelled.
    #[error("packaging task failed: {0}")]
    TaskFailed(String),
}

impl PackError {
    pub(crate) fn source_not_found(path: impl Into<PathBuf>, source: io::Error) -> Self {
        PackError::SourceNotFound {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn limit(limit: Limit, value: u64, max: u64) -> Self {
        PackError::ArchiveLimitExceeded { limit, value, max }
    }
}

pub type Result<T, E = PackError> = std::result::Result<T, E>;
