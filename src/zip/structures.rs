use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use std::io::Cursor;

use anyhow::{Result, bail};

/// "Version needed to extract" / "version made by": 2.0, plain stored files.
pub const VERSION: u16 = 20;

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            _ => CompressionMethod::Unknown(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Unknown(v) => *v,
        }
    }
}

/// Local File Header (LFH) - 30 bytes + name
///
/// Written inline right before the entry's data. Time, date, flags and the
/// extra field are always zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFileHeader {
    pub crc32: u32,
    pub size: u32,
    pub file_name: Vec<u8>,
}

impl LocalFileHeader {
    pub const SIGNATURE: u32 = 0x0403_4b50;
    pub const SIZE: usize = 30;

    /// Serialized length including the name.
    pub fn encoded_len(&self) -> usize {
        Self::SIZE + self.file_name.len()
    }

    /// Serialize the header.
    ///
    /// The caller guarantees the name fits in 16 bits.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0u8; self.encoded_len()];
        LittleEndian::write_u32(&mut buf[0..4], Self::SIGNATURE);
        LittleEndian::write_u16(&mut buf[4..6], VERSION);
        LittleEndian::write_u16(&mut buf[6..8], 0); // flags
        LittleEndian::write_u16(&mut buf[8..10], CompressionMethod::Stored.as_u16());
        LittleEndian::write_u16(&mut buf[10..12], 0); // mod time
        LittleEndian::write_u16(&mut buf[12..14], 0); // mod date
        LittleEndian::write_u32(&mut buf[14..18], self.crc32);
        LittleEndian::write_u32(&mut buf[18..22], self.size); // compressed
        LittleEndian::write_u32(&mut buf[22..26], self.size); // uncompressed
        LittleEndian::write_u16(&mut buf[26..28], self.file_name.len() as u16);
        LittleEndian::write_u16(&mut buf[28..30], 0); // extra field length
        buf[Self::SIZE..].copy_from_slice(&self.file_name);
        buf
    }
}

/// Central Directory File Header (CDFH) - 46 bytes + name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CentralDirectoryHeader {
    pub crc32: u32,
    pub size: u32,
    pub local_header_offset: u32,
    pub file_name: Vec<u8>,
}

impl CentralDirectoryHeader {
    pub const SIGNATURE: u32 = 0x0201_4b50;
    pub const SIZE: usize = 46;

    pub fn encoded_len(&self) -> usize {
        Self::SIZE + self.file_name.len()
    }

    /// Serialize the header.
    ///
    /// The caller guarantees the name fits in 16 bits.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0u8; self.encoded_len()];
        LittleEndian::write_u32(&mut buf[0..4], Self::SIGNATURE);
        LittleEndian::write_u16(&mut buf[4..6], VERSION); // made by
        LittleEndian::write_u16(&mut buf[6..8], VERSION); // needed
        LittleEndian::write_u16(&mut buf[8..10], 0);
        LittleEndian::write_u16(&mut buf[10..12], CompressionMethod::Stored.as_u16());
        LittleEndian::write_u16(&mut buf[12..14], 0);
        LittleEndian::write_u16(&mut buf[14..16], 0);
        LittleEndian::write_u32(&mut buf[16..20], self.crc32);
        LittleEndian::write_u32(&mut buf[20..24], self.size);
        LittleEndian::write_u32(&mut buf[24..28], self.size);
        LittleEndian::write_u16(&mut buf[28..30], self.file_name.len() as u16);
        // Extra, comment, disk start, internal and external attributes: 30..42
        LittleEndian::write_u32(&mut buf[42..46], self.local_header_offset);
        buf[Self::SIZE..].copy_from_slice(&self.file_name);
        buf
    }
}

/// End of Central Directory (EOCD) - 22 bytes minimum
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndOfCentralDirectory {
    pub disk_number: u16,
    pub disk_with_cd: u16,
    pub disk_entries: u16,
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
    pub comment_len: u16,
}

impl EndOfCentralDirectory {
    pub const SIGNATURE: u32 = 0x0605_4b50;
    pub const SIZE: usize = 22;

    /// Single-disk trailer without a comment.
    pub fn new(entries: u16, cd_size: u32, cd_offset: u32) -> Self {
        Self {
            disk_number: 0,
            disk_with_cd: 0,
            disk_entries: entries,
            total_entries: entries,
            cd_size,
            cd_offset,
            comment_len: 0,
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        LittleEndian::write_u32(&mut buf[0..4], Self::SIGNATURE);
        LittleEndian::write_u16(&mut buf[4..6], self.disk_number);
        LittleEndian::write_u16(&mut buf[6..8], self.disk_with_cd);
        LittleEndian::write_u16(&mut buf[8..10], self.disk_entries);
        LittleEndian::write_u16(&mut buf[10..12], self.total_entries);
        LittleEndian::write_u32(&mut buf[12..16], self.cd_size);
        LittleEndian::write_u32(&mut buf[16..20], self.cd_offset);
        LittleEndian::write_u16(&mut buf[20..22], self.comment_len);
        buf
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            bail!("Invalid End of Central Directory");
        }

        let mut cursor = Cursor::new(data);

        // Verify signature
        if cursor.read_u32::<LittleEndian>()? != Self::SIGNATURE {
            bail!("Invalid End of Central Directory");
        }

        Ok(Self {
            disk_number: cursor.read_u16::<LittleEndian>()?,
            disk_with_cd: cursor.read_u16::<LittleEndian>()?,
            disk_entries: cursor.read_u16::<LittleEndian>()?,
            total_entries: cursor.read_u16::<LittleEndian>()?,
            cd_size: cursor.read_u32::<LittleEndian>()?,
            cd_offset: cursor.read_u32::<LittleEndian>()?,
            comment_len: cursor.read_u16::<LittleEndian>()?,
        })
    }

    /// Whether any field holds its all-ones value.
    ///
    /// These double as ZIP64 sentinels, but 65535 entries is also a valid
    /// literal count; only a ZIP64 locator in front of the record decides.
    pub fn has_zip64_sentinels(&self) -> bool {
        self.disk_entries == 0xFFFF
            || self.total_entries == 0xFFFF
            || self.cd_size == 0xFFFFFFFF
            || self.cd_offset == 0xFFFFFFFF
    }
}

/// ZIP64 End of Central Directory Locator - 20 bytes, placed right before
/// the EOCD when the archive uses ZIP64. Only its signature is checked.
pub struct Zip64EocdLocator;

impl Zip64EocdLocator {
    pub const SIGNATURE: u32 = 0x0706_4b50;
    pub const SIZE: usize = 20;
}

/// Parsed ZIP file entry information
#[derive(Debug, Clone)]
pub struct ZipFileEntry {
    pub file_name: String,
    pub compression_method: CompressionMethod,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub crc32: u32,
    pub lfh_offset: u64,
    pub is_directory: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_header_layout() {
        let header = LocalFileHeader {
            crc32: 0xCBF4_3926,
            size: 9,
            file_name: b"pkg/a".to_vec(),
        };
        let bytes = header.to_bytes();

        assert_eq!(bytes.len(), 35);
        assert_eq!(&bytes[0..4], b"PK\x03\x04");
        assert_eq!(&bytes[4..6], &[20, 0]);
        assert_eq!(&bytes[14..18], &[0x26, 0x39, 0xF4, 0xCB]);
        assert_eq!(&bytes[18..22], &[9, 0, 0, 0]);
        assert_eq!(&bytes[22..26], &[9, 0, 0, 0]);
        assert_eq!(&bytes[26..28], &[5, 0]);
        assert_eq!(&bytes[28..30], &[0, 0]);
        assert_eq!(&bytes[30..], b"pkg/a");
    }

    #[test]
    fn central_header_layout() {
        let header = CentralDirectoryHeader {
            crc32: 1,
            size: 2,
            local_header_offset: 0x0102_0304,
            file_name: b"pkg/b".to_vec(),
        };
        let bytes = header.to_bytes();

        assert_eq!(bytes.len(), 51);
        assert_eq!(&bytes[0..4], b"PK\x01\x02");
        assert_eq!(&bytes[4..8], &[20, 0, 20, 0]);
        assert_eq!(&bytes[8..16], &[0; 8]);
        assert_eq!(&bytes[28..30], &[5, 0]);
        assert_eq!(&bytes[30..42], &[0; 12]);
        assert_eq!(&bytes[42..46], &[4, 3, 2, 1]);
        assert_eq!(&bytes[46..], b"pkg/b");
    }

    #[test]
    fn eocd_reads_back() {
        let eocd = EndOfCentralDirectory::new(3, 150, 1000);
        let bytes = eocd.to_bytes();
        assert_eq!(&bytes[0..4], b"PK\x05\x06");
        assert_eq!(EndOfCentralDirectory::from_bytes(&bytes).unwrap(), eocd);
        assert!(!eocd.has_zip64_sentinels());
        assert!(EndOfCentralDirectory::new(0xFFFF, 0, 0).has_zip64_sentinels());
    }

    #[test]
    fn eocd_rejects_bad_signature() {
        let mut bytes = EndOfCentralDirectory::new(0, 0, 0).to_bytes();
        bytes[0] = b'X';
        assert!(EndOfCentralDirectory::from_bytes(&bytes).is_err());
        assert!(EndOfCentralDirectory::from_bytes(&bytes[..10]).is_err());
    }
}
