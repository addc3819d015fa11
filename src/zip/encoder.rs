//! Per-entry header encoding.

use crate::error::{Limit, PackError, Result};

use super::crc::crc32;
use super::structures::{CentralDirectoryHeader, LocalFileHeader};

/// Header records for one stored entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedEntry {
    /// Local file header, to be written right before the data.
    pub local_header: Vec<u8>,
    /// Central directory header pointing back at `local_header`.
    pub central_header: Vec<u8>,
    /// Bytes the entry occupies in the body: local header plus data.
    pub record_size: u64,
}

/// Encode the headers of `data` stored under `archive_name`, whose local
/// header will start at `offset` from the beginning of the archive.
///
/// # Errors
///
/// [`PackError::ArchiveLimitExceeded`] if the name is longer than 65535
/// bytes, the data is larger than 4 GiB, or `offset` is past 4 GiB.
pub fn encode_entry(archive_name: &str, data: &[u8], offset: u64) -> Result<EncodedEntry> {
    let name = archive_name.as_bytes();
    if u16::try_from(name.len()).is_err() {
        return Err(PackError::limit(
            Limit::NameLength,
            name.len() as u64,
            u16::MAX as u64,
        ));
    }
    let size = u32::try_from(data.len())
        .map_err(|_| PackError::limit(Limit::EntrySize, data.len() as u64, u32::MAX as u64))?;
    let local_header_offset = u32::try_from(offset)
        .map_err(|_| PackError::limit(Limit::Offset, offset, u32::MAX as u64))?;

    let crc32 = crc32(data);

    let local = LocalFileHeader {
        crc32,
        size,
        file_name: name.to_vec(),
    };
    let central = CentralDirectoryHeader {
        crc32,
        size,
        local_header_offset,
        file_name: name.to_vec(),
    };

    Ok(EncodedEntry {
        record_size: (local.encoded_len() + data.len()) as u64,
        local_header: local.to_bytes(),
        central_header: central.to_bytes(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::{ByteOrder, LittleEndian};

    #[test]
    fn headers_agree_on_crc_and_sizes() {
        let encoded = encode_entry("pkg/SKILL.md", b"123456789", 0).unwrap();
        let local = &encoded.local_header;
        let central = &encoded.central_header;

        assert_eq!(LittleEndian::read_u32(&local[14..18]), 0xCBF4_3926);
        assert_eq!(LittleEndian::read_u32(&central[16..20]), 0xCBF4_3926);
        assert_eq!(LittleEndian::read_u32(&local[18..22]), 9);
        assert_eq!(LittleEndian::read_u32(&central[24..28]), 9);
        assert_eq!(encoded.record_size, 30 + 12 + 9);
    }

    #[test]
    fn offset_lands_in_central_header() {
        let encoded = encode_entry("pkg/a", b"", 4242).unwrap();
        assert_eq!(LittleEndian::read_u32(&encoded.central_header[42..46]), 4242);
        assert_eq!(encoded.record_size, 35);
    }

    #[test]
    fn name_is_raw_utf8() {
        let encoded = encode_entry("pkg/naïve.md", b"x", 0).unwrap();
        assert_eq!(LittleEndian::read_u16(&encoded.local_header[26..28]), 13);
        assert_eq!(&encoded.local_header[30..], "pkg/naïve.md".as_bytes());
    }

    #[test]
    fn oversized_name_is_rejected() {
        let name = "a".repeat(u16::MAX as usize + 1);
        let err = encode_entry(&name, b"", 0).unwrap_err();
        assert!(matches!(
            err,
            PackError::ArchiveLimitExceeded {
                limit: Limit::NameLength,
                value: 65536,
                ..
            }
        ));
    }

    #[test]
    fn offset_past_four_gib_is_rejected() {
        let err = encode_entry("pkg/a", b"", u32::MAX as u64 + 1).unwrap_err();
        assert!(matches!(
            err,
            PackError::ArchiveLimitExceeded {
                limit: Limit::Offset,
                ..
            }
        ));
    }
}
