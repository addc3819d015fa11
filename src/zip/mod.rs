//! Store-only ZIP writing and reading.
//!
//! ## Architecture
//!
//! - [`crc`]: CRC-32 checksum stored in every header
//! - [`structures`]: the fixed-layout records (local header, central
//!   directory header, end of central directory)
//! - [`encoder`]: header records for a single entry
//! - `writer`: folds entries into a complete archive
//! - `parser` and `extractor`: read an archive back, for listing and
//!   verification
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers, each followed by that file's data
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! ## Limitations
//!
//! - Entries are always STORED; no compression
//! - Timestamps, flags and attributes are always zero
//! - No ZIP64, so at most 65535 entries and 4 GiB
//! - No encryption, no multi-disk archives

pub mod crc;
pub mod encoder;
mod extractor;
mod parser;
pub mod structures;
mod writer;

pub use crc::{Crc32, crc32};
pub use encoder::{EncodedEntry, encode_entry};
pub use extractor::ZipExtractor;
pub use parser::ZipParser;
pub use structures::*;
pub use writer::{Entry, assemble};
