//! Turning directories into archives.
//!
//! [`filter`] decides what is left out, [`collector`] walks a source tree,
//! [`builder`] reads and assembles the files and writes the result, and
//! [`batch`] does all of that for every skill in a skills directory.

pub mod batch;
pub mod builder;
pub mod collector;
pub mod filter;

pub use batch::{
    BatchSummary, PackageReport, PackageTarget, PackagedArchive, discover, package_all,
    package_one, select,
};
pub use builder::{ArchiveStats, build_archive, build_archive_with_stats, write_archive};
pub use collector::{CollectedFile, collect};
pub use filter::{ExclusionRules, should_exclude};
