//! # skillpack
//!
//! Packages skill directories into deterministic, uncompressed ZIP archives
//! (`.skill` files) that any standard ZIP reader can extract.
//!
//! ## Features
//!
//! - Store-only ZIP writer with fixed timestamps: the same tree always
//!   produces the same bytes
//! - Exclusion of caches, VCS metadata, tests and evals
//! - Concurrent packaging of every skill in a directory, one failure never
//!   stopping the others
//! - Atomic writes: a reader never sees a half-written archive
//! - Read-back listing and CRC verification
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use skillpack::{LocalFs, ZipExtractor, build_archive};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let bytes = build_archive(&LocalFs, Path::new("skills/pdf"), "pdf").await?;
//!
//!     let extractor = ZipExtractor::new(Arc::new(bytes));
//!     for file in extractor.list_files().await? {
//!         println!("{}", file.file_name);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod error;
pub mod io;
pub mod package;
pub mod zip;

pub use cli::Cli;
pub use error::{Limit, PackError, Result};
pub use io::{FileSystem, LocalFileReader, LocalFs, ReadAt};
#[cfg(any(test, feature = "testing"))]
pub use io::MemoryFs;
pub use package::{build_archive, write_archive};
pub use zip::{ZipExtractor, ZipFileEntry};
