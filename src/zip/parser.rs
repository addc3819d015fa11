//! Low-level ZIP archive parser.
//!
//! This module reads back archives from any source that implements the
//! [`ReadAt`] trait. It understands the single-disk, non-ZIP64 subset that
//! the writer produces, plus archive comments and extra fields written by
//! other tools.
//!
//! ## Parsing Strategy
//!
//! ZIP files are designed to be read from the end:
//! 1. Find the End of Central Directory (EOCD) at the file's end
//! 2. Read the Central Directory to get metadata for all files
//! 3. For extraction, read each file's Local File Header and data

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};
use std::sync::Arc;

use crate::io::ReadAt;
use anyhow::{Context, Result, bail};

use super::structures::*;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
///
/// This limits the search area when looking for EOCD with a comment.
const MAX_COMMENT_SIZE: u64 = 65535;

/// Low-level ZIP file parser.
///
/// Generic over the reader type so the same code reads archives on disk
/// and archives still held in memory.
///
/// ## Example
///
/// ```ignore
/// let parser = ZipParser::new(reader);
/// let entries = parser.list_files().await?;
/// for entry in entries {
///     let offset = parser.get_data_offset(&entry).await?;
///     // Read file data from offset...
/// }
/// ```
pub struct ZipParser<R: ReadAt> {
    /// The underlying data source
    reader: Arc<R>,
    /// Total size of the archive in bytes
    size: u64,
}

impl<R: ReadAt> ZipParser<R> {
    pub fn new(reader: Arc<R>) -> Self {
        let size = reader.size();
        Self { reader, size }
    }

    /// Find and parse the End of Central Directory record.
    ///
    /// Handles both the simple case (no comment) and archives with
    /// comments by searching backwards for the signature.
    ///
    /// # Returns
    ///
    /// A tuple of (EOCD record, offset of EOCD in file).
    ///
    /// # Errors
    ///
    /// Returns an error if no valid EOCD can be found, indicating
    /// the file is not a valid ZIP archive.
    pub async fn find_eocd(&self) -> Result<(EndOfCentralDirectory, u64)> {
        let eocd_size = EndOfCentralDirectory::SIZE as u64;
        let signature = EndOfCentralDirectory::SIGNATURE.to_le_bytes();

        // Fast path: no comment, the EOCD is the last 22 bytes.
        if self.size >= eocd_size {
            let offset = self.size - eocd_size;
            let mut buf = vec![0u8; EndOfCentralDirectory::SIZE];
            self.read_exact_at(offset, &mut buf).await?;

            if buf[0..4] == signature && &buf[20..22] == b"\x00\x00" {
                let eocd = EndOfCentralDirectory::from_bytes(&buf)?;
                return Ok((eocd, offset));
            }
        } else {
            bail!("Not a valid ZIP file");
        }

        // EOCD not at expected location - search backwards, it may be
        // followed by a comment.
        let search_size = (MAX_COMMENT_SIZE + eocd_size).min(self.size);
        let search_start = self.size - search_size;

        let mut buf = vec![0u8; search_size as usize];
        self.read_exact_at(search_start, &mut buf).await?;

        for i in (0..=buf.len() - EndOfCentralDirectory::SIZE).rev() {
            if buf[i..i + 4] == signature {
                // The comment length field must account for every trailing byte.
                let comment_len = u16::from_le_bytes([buf[i + 20], buf[i + 21]]) as usize;

                if comment_len == buf.len() - i - EndOfCentralDirectory::SIZE {
                    let eocd = EndOfCentralDirectory::from_bytes(
                        &buf[i..i + EndOfCentralDirectory::SIZE],
                    )?;
                    return Ok((eocd, search_start + i as u64));
                }
            }
        }

        bail!("Not a valid ZIP file")
    }

    /// List all files in the ZIP archive.
    ///
    /// Reads the EOCD first, then fetches and parses the entire Central
    /// Directory in one read.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive is invalid, spans disks or needs
    /// ZIP64, or cannot be read.
    pub async fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        let (eocd, eocd_offset) = self.find_eocd().await?;

        if eocd.has_zip64_sentinels() && self.has_zip64_locator(eocd_offset).await? {
            bail!("ZIP64 archives are not supported");
        }
        if eocd.disk_number != 0 || eocd.disk_with_cd != 0 {
            bail!("Multi-disk archives are not supported");
        }

        let cd_offset = eocd.cd_offset as u64;
        let cd_size = eocd.cd_size as u64;
        if cd_offset + cd_size > eocd_offset {
            bail!("Central Directory overlaps End of Central Directory");
        }

        let mut cd_data = vec![0u8; cd_size as usize];
        self.read_exact_at(cd_offset, &mut cd_data).await?;

        let mut entries = Vec::with_capacity(eocd.total_entries as usize);
        let mut cursor = Cursor::new(cd_data.as_slice());

        for index in 0..eocd.total_entries {
            let entry = parse_cdfh(&mut cursor)
                .with_context(|| format!("Central Directory entry {}", index))?;
            entries.push(entry);
        }

        if cursor.position() != cd_size {
            bail!(
                "Central Directory size mismatch: EOCD says {} bytes, entries use {}",
                cd_size,
                cursor.position()
            );
        }

        Ok(entries)
    }

    /// Whether a ZIP64 locator sits directly in front of the EOCD.
    ///
    /// Without one, all-ones fields in the EOCD are literal values.
    async fn has_zip64_locator(&self, eocd_offset: u64) -> Result<bool> {
        let locator_size = Zip64EocdLocator::SIZE as u64;
        if eocd_offset < locator_size {
            return Ok(false);
        }

        let mut buf = [0u8; 4];
        self.read_exact_at(eocd_offset - locator_size, &mut buf).await?;
        Ok(u32::from_le_bytes(buf) == Zip64EocdLocator::SIGNATURE)
    }

    /// Total size of the archive in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Get the actual data offset for a file entry.
    ///
    /// The Local File Header (LFH) has variable-length fields (filename,
    /// extra field) that may differ from the Central Directory entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the LFH is invalid.
    pub async fn get_data_offset(&self, entry: &ZipFileEntry) -> Result<u64> {
        let mut lfh_buf = vec![0u8; LocalFileHeader::SIZE];
        self.read_exact_at(entry.lfh_offset, &mut lfh_buf).await?;

        let mut cursor = Cursor::new(&lfh_buf);
        if cursor.read_u32::<LittleEndian>()? != LocalFileHeader::SIGNATURE {
            bail!("Invalid Local File Header for {}", entry.file_name);
        }

        cursor.set_position(26); // Offset to filename length field
        let file_name_length = cursor.read_u16::<LittleEndian>()? as u64;
        let extra_field_length = cursor.read_u16::<LittleEndian>()? as u64;

        // Data starts after: LFH (30 bytes) + filename + extra field
        Ok(entry.lfh_offset + LocalFileHeader::SIZE as u64 + file_name_length + extra_field_length)
    }

    /// Read exactly `buf.len()` bytes at `offset`.
    pub async fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self
                .reader
                .read_at(offset + filled as u64, &mut buf[filled..])
                .await?;
            if n == 0 {
                bail!(
                    "Unexpected end of archive reading {} bytes at offset {}",
                    buf.len(),
                    offset
                );
            }
            filled += n;
        }
        Ok(())
    }
}

/// Parse a Central Directory File Header from a cursor.
fn parse_cdfh(cursor: &mut Cursor<&[u8]>) -> Result<ZipFileEntry> {
    if cursor.read_u32::<LittleEndian>()? != CentralDirectoryHeader::SIGNATURE {
        bail!("Invalid Central Directory File Header");
    }

    let _version_made_by = cursor.read_u16::<LittleEndian>()?;
    let _version_needed = cursor.read_u16::<LittleEndian>()?;
    let _flags = cursor.read_u16::<LittleEndian>()?;
    let compression_method = cursor.read_u16::<LittleEndian>()?;
    let _last_mod_time = cursor.read_u16::<LittleEndian>()?;
    let _last_mod_date = cursor.read_u16::<LittleEndian>()?;
    let crc32 = cursor.read_u32::<LittleEndian>()?;
    let compressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let uncompressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let file_name_length = cursor.read_u16::<LittleEndian>()?;
    let extra_field_length = cursor.read_u16::<LittleEndian>()?;
    let file_comment_length = cursor.read_u16::<LittleEndian>()?;
    let _disk_number_start = cursor.read_u16::<LittleEndian>()?;
    let _internal_attrs = cursor.read_u16::<LittleEndian>()?;
    let _external_attrs = cursor.read_u32::<LittleEndian>()?;
    let lfh_offset = cursor.read_u32::<LittleEndian>()? as u64;

    let mut file_name_bytes = vec![0u8; file_name_length as usize];
    cursor.read_exact(&mut file_name_bytes)?;
    // Use lossy conversion to handle non-UTF8 filenames gracefully
    let file_name = String::from_utf8_lossy(&file_name_bytes).to_string();

    // Directory entries end with '/'
    let is_directory = file_name.ends_with('/');

    // Skip extra field and comment; nothing we write puts data there.
    let skip = extra_field_length as u64 + file_comment_length as u64;
    let end = cursor.position() + skip;
    if end > cursor.get_ref().len() as u64 {
        bail!("Central Directory entry {} is truncated", file_name);
    }
    cursor.set_position(end);

    Ok(ZipFileEntry {
        file_name,
        compression_method: CompressionMethod::from_u16(compression_method),
        compressed_size,
        uncompressed_size,
        crc32,
        lfh_offset,
        is_directory,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zip::{Entry, assemble};

    fn parser_for(bytes: Vec<u8>) -> ZipParser<Vec<u8>> {
        ZipParser::new(Arc::new(bytes))
    }

    #[tokio::test]
    async fn lists_assembled_entries() {
        let archive = assemble(&[
            Entry::new("pkg/SKILL.md", "hello"),
            Entry::new("pkg/dir/", Vec::<u8>::new()),
        ])
        .unwrap();

        let entries = parser_for(archive).list_files().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].file_name, "pkg/SKILL.md");
        assert_eq!(entries[0].uncompressed_size, 5);
        assert_eq!(entries[0].compression_method, CompressionMethod::Stored);
        assert_eq!(entries[0].lfh_offset, 0);
        assert!(entries[1].is_directory);
    }

    #[tokio::test]
    async fn finds_eocd_behind_a_comment() {
        let mut archive = assemble(&[Entry::new("pkg/a", "a")]).unwrap();
        let comment = b"built elsewhere";
        let len = archive.len();
        archive[len - 2..].copy_from_slice(&(comment.len() as u16).to_le_bytes());
        archive.extend_from_slice(comment);

        let parser = parser_for(archive);
        let (eocd, offset) = parser.find_eocd().await.unwrap();
        assert_eq!(eocd.comment_len as usize, comment.len());
        assert_eq!(offset, (len - EndOfCentralDirectory::SIZE) as u64);
        assert_eq!(parser.list_files().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn data_offset_skips_header_and_name() {
        let archive = assemble(&[Entry::new("pkg/a", "xyz")]).unwrap();
        let parser = parser_for(archive);
        let entries = parser.list_files().await.unwrap();
        assert_eq!(parser.get_data_offset(&entries[0]).await.unwrap(), 35);
    }

    #[tokio::test]
    async fn full_entry_count_is_not_zip64() {
        let entries: Vec<Entry> = (0..u16::MAX as u32)
            .map(|i| Entry::new(format!("p/{i}"), Vec::<u8>::new()))
            .collect();
        let archive = assemble(&entries).unwrap();

        let parser = parser_for(archive);
        let (eocd, _) = parser.find_eocd().await.unwrap();
        assert_eq!(eocd.total_entries, 0xFFFF);

        let listed = parser.list_files().await.unwrap();
        assert_eq!(listed.len(), 65535);
        assert_eq!(listed[0].file_name, "p/0");
        assert_eq!(listed[65534].file_name, "p/65534");
    }

    #[tokio::test]
    async fn zip64_locator_is_rejected() {
        let archive = assemble(&[Entry::new("pkg/a", "a")]).unwrap();
        let (records, eocd) = archive.split_at(archive.len() - EndOfCentralDirectory::SIZE);
        let mut eocd = EndOfCentralDirectory::from_bytes(eocd).unwrap();
        eocd.disk_entries = 0xFFFF;
        eocd.total_entries = 0xFFFF;

        let mut locator = [0u8; Zip64EocdLocator::SIZE];
        locator[..4].copy_from_slice(&Zip64EocdLocator::SIGNATURE.to_le_bytes());

        let mut zip64 = records.to_vec();
        zip64.extend_from_slice(&locator);
        zip64.extend_from_slice(&eocd.to_bytes());

        let err = parser_for(zip64).list_files().await.unwrap_err();
        assert_eq!(err.to_string(), "ZIP64 archives are not supported");
    }

    #[tokio::test]
    async fn rejects_non_zip_data() {
        assert!(parser_for(b"definitely not a zip archive".to_vec()).find_eocd().await.is_err());
        assert!(parser_for(b"PK".to_vec()).find_eocd().await.is_err());
    }
}
