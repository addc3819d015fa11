use std::sync::Arc;

use crate::io::ReadAt;
use anyhow::{Result, bail};

use super::crc::crc32;
use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipFileEntry};

/// ZIP file extractor
pub struct ZipExtractor<R: ReadAt> {
    parser: ZipParser<R>,
}

impl<R: ReadAt> ZipExtractor<R> {
    pub fn new(reader: Arc<R>) -> Self {
        Self {
            parser: ZipParser::new(reader),
        }
    }

    /// List all files in the archive
    pub async fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        self.parser.list_files().await
    }

    /// Extract file data to memory, checking size and CRC-32.
    pub async fn extract_to_memory(&self, entry: &ZipFileEntry) -> Result<Vec<u8>> {
        if entry.compression_method != CompressionMethod::Stored {
            bail!(
                "Unsupported compression method: {} (only STORED/uncompressed is supported)",
                entry.compression_method.as_u16()
            );
        }
        if entry.compressed_size != entry.uncompressed_size {
            bail!(
                "Stored entry {} has compressed size {} but uncompressed size {}",
                entry.file_name,
                entry.compressed_size,
                entry.uncompressed_size
            );
        }

        let data_offset = self.parser.get_data_offset(entry).await?;
        let in_bounds = data_offset
            .checked_add(entry.uncompressed_size)
            .is_some_and(|end| end <= self.parser.size());
        if !in_bounds {
            bail!(
                "Entry {} ({} bytes at offset {}) extends past the end of the archive",
                entry.file_name,
                entry.uncompressed_size,
                data_offset
            );
        }

        let mut buf = vec![0u8; entry.uncompressed_size as usize];
        self.parser.read_exact_at(data_offset, &mut buf).await?;

        let actual = crc32(&buf);
        if actual != entry.crc32 {
            bail!(
                "CRC mismatch for {}: expected {:08x}, computed {:08x}",
                entry.file_name,
                entry.crc32,
                actual
            );
        }

        Ok(buf)
    }

    /// Extract every entry into memory, in central directory order.
    pub async fn extract_all(&self) -> Result<Vec<(String, Vec<u8>)>> {
        let entries = self.list_files().await?;
        let mut files = Vec::with_capacity(entries.len());
        for entry in &entries {
            let data = self.extract_to_memory(entry).await?;
            files.push((entry.file_name.clone(), data));
        }
        Ok(files)
    }
}
