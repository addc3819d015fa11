//! Archive assembly.
//!
//! Entries are folded one at a time into an assembly state that owns the
//! growing body and central directory. Each entry's central header records
//! the body length at the moment it was appended, so the order of entries
//! fixes every offset in the archive.

use tracing::trace;

use crate::error::{Limit, PackError, Result};

use super::encoder::encode_entry;
use super::structures::EndOfCentralDirectory;

/// One file to be stored in the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// `/`-separated path inside the archive, starting with the root name.
    pub archive_name: String,
    pub data: Vec<u8>,
}

impl Entry {
    pub fn new(archive_name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            archive_name: archive_name.into(),
            data: data.into(),
        }
    }
}

#[derive(Debug, Default)]
struct AssemblyState {
    body: Vec<u8>,
    central_directory: Vec<u8>,
    /// Start of the next local header; equals `body.len()`.
    offset: u64,
    count: usize,
}

impl AssemblyState {
    fn push(mut self, entry: &Entry) -> Result<Self> {
        if self.count >= u16::MAX as usize {
            return Err(PackError::limit(
                Limit::EntryCount,
                self.count as u64 + 1,
                u16::MAX as u64,
            ));
        }

        let encoded = encode_entry(&entry.archive_name, &entry.data, self.offset)?;
        trace!(
            name = %entry.archive_name,
            offset = self.offset,
            size = entry.data.len(),
            "encoded entry"
        );

        self.body.extend_from_slice(&encoded.local_header);
        self.body.extend_from_slice(&entry.data);
        self.central_directory
            .extend_from_slice(&encoded.central_header);
        self.offset += encoded.record_size;
        self.count += 1;
        Ok(self)
    }

    fn finish(self) -> Result<Vec<u8>> {
        let cd_offset = u32::try_from(self.offset)
            .map_err(|_| PackError::limit(Limit::Offset, self.offset, u32::MAX as u64))?;
        let cd_len = self.central_directory.len() as u64;
        let cd_size = u32::try_from(cd_len).map_err(|_| {
            PackError::limit(Limit::CentralDirectorySize, cd_len, u32::MAX as u64)
        })?;
        // push() refuses the 65536th entry
        let count = self.count as u16;

        let eocd = EndOfCentralDirectory::new(count, cd_size, cd_offset);

        let mut archive = self.body;
        archive.reserve(self.central_directory.len() + EndOfCentralDirectory::SIZE);
        archive.extend_from_slice(&self.central_directory);
        archive.extend_from_slice(&eocd.to_bytes());
        Ok(archive)
    }
}

/// Assemble a complete stored-only ZIP archive from `entries`, in order.
///
/// The result is a pure function of the entry names, bytes and order:
/// timestamps are zero and no attributes are recorded.
pub fn assemble<'a, I>(entries: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = &'a Entry>,
{
    entries
        .into_iter()
        .try_fold(AssemblyState::default(), AssemblyState::push)?
        .finish()
}
