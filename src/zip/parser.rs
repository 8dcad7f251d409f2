//! Low-level ZIP archive parser.
//!
//! This module handles the binary parsing of ZIP file structures,
//! reading from any source that implements the [`ReadAt`] trait.
//!
//! ## Parsing Strategy
//!
//! ZIP files are designed to be read from the end:
//! 1. Find the End of Central Directory (EOCD) at the file's end
//! 2. If ZIP64, read the ZIP64 EOCD for large file support
//! 3. Read the Central Directory to get metadata for all files
//! 4. For extraction, read each file's Local File Header and data
//!
//! Entries are returned in central-directory order. Callers rely on
//! that order for progress reporting, so nothing here sorts.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};
use std::sync::Arc;

use crate::error::ArchiveError;
use crate::io::ReadAt;

use super::structures::*;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
///
/// This limits the search area when looking for EOCD with a comment.
const MAX_COMMENT_SIZE: u64 = 65535;

/// Low-level ZIP file parser.
///
/// Generic over the reader so the same code serves in-memory buffers
/// and test sources that delay or fail reads.
pub struct ZipParser<R: ReadAt> {
    reader: Arc<R>,
    size: u64,
}

impl<R: ReadAt> ZipParser<R> {
    /// Create a parser over `reader`. The source size is read once here.
    ///
    /// # Arguments
    ///
    /// * `reader` - Any data source implementing [`ReadAt`]
    pub fn new(reader: Arc<R>) -> Self {
        let size = reader.size();
        Self { reader, size }
    }

    /// Find and parse the End of Central Directory record.
    ///
    /// Tries the no-comment layout first, then searches backwards
    /// through the maximum comment window.
    ///
    /// # Returns
    ///
    /// A tuple of (EOCD record, offset of EOCD in file).
    ///
    /// # Errors
    ///
    /// [`ArchiveError::Format`] if no valid EOCD can be found.
    pub async fn find_eocd(&self) -> Result<(EndOfCentralDirectory, u64), ArchiveError> {
        let eocd_size = EndOfCentralDirectory::SIZE as u64;
        if self.size < eocd_size {
            return Err(ArchiveError::Format(format!(
                "{} bytes is too short for a ZIP archive",
                self.size
            )));
        }

        let offset = self.size - eocd_size;
        let mut buf = vec![0u8; EndOfCentralDirectory::SIZE];
        self.reader.read_exact_at(offset, &mut buf).await?;

        if &buf[0..4] == EndOfCentralDirectory::SIGNATURE && &buf[20..22] == b"\x00\x00" {
            let eocd = EndOfCentralDirectory::from_bytes(&buf)?;
            return Ok((eocd, offset));
        }

        let search_size = (MAX_COMMENT_SIZE + eocd_size).min(self.size);
        let search_start = self.size - search_size;

        let mut buf = vec![0u8; search_size as usize];
        self.reader.read_exact_at(search_start, &mut buf).await?;

        for i in (0..=buf.len() - EndOfCentralDirectory::SIZE).rev() {
            if &buf[i..i + 4] != EndOfCentralDirectory::SIGNATURE {
                continue;
            }

            // The comment must run exactly to the end of the file
            let comment_len = u16::from_le_bytes([buf[i + 20], buf[i + 21]]) as usize;
            if comment_len == buf.len() - i - EndOfCentralDirectory::SIZE {
                let eocd =
                    EndOfCentralDirectory::from_bytes(&buf[i..i + EndOfCentralDirectory::SIZE])?;
                return Ok((eocd, search_start + i as u64));
            }
        }

        Err(ArchiveError::Format(
            "end of central directory not found".to_string(),
        ))
    }

    /// Read the ZIP64 End of Central Directory record.
    ///
    /// Called when the regular EOCD has saturated fields; the locator
    /// sits immediately before the regular EOCD.
    pub async fn read_zip64_eocd(&self, eocd_offset: u64) -> Result<Zip64EOCD, ArchiveError> {
        let locator_offset = eocd_offset
            .checked_sub(Zip64EOCDLocator::SIZE as u64)
            .ok_or_else(|| ArchiveError::Format("missing ZIP64 locator".to_string()))?;
        let mut locator_buf = vec![0u8; Zip64EOCDLocator::SIZE];
        self.reader
            .read_exact_at(locator_offset, &mut locator_buf)
            .await?;

        let locator = Zip64EOCDLocator::from_bytes(&locator_buf)?;

        let mut eocd64_buf = vec![0u8; Zip64EOCD::MIN_SIZE];
        self.reader
            .read_exact_at(locator.eocd64_offset, &mut eocd64_buf)
            .await?;

        Zip64EOCD::from_bytes(&eocd64_buf)
    }

    /// List all entries in the archive, in central-directory order.
    ///
    /// # Errors
    ///
    /// [`ArchiveError::Format`] if the EOCD or any central directory
    /// header is invalid, or the directory lies outside the source.
    pub async fn list_files(&self) -> Result<Vec<ZipFileEntry>, ArchiveError> {
        let (eocd, eocd_offset) = self.find_eocd().await?;

        let (cd_offset, cd_size, total_entries) = if eocd.is_zip64() {
            let eocd64 = self.read_zip64_eocd(eocd_offset).await?;
            (eocd64.cd_offset, eocd64.cd_size, eocd64.total_entries)
        } else {
            (
                eocd.cd_offset as u64,
                eocd.cd_size as u64,
                eocd.total_entries as u64,
            )
        };

        if cd_offset.saturating_add(cd_size) > self.size {
            return Err(ArchiveError::Format(format!(
                "central directory ({cd_size} bytes at {cd_offset}) exceeds archive size {}",
                self.size
            )));
        }
        if total_entries.saturating_mul(CDFH_MIN_SIZE as u64) > cd_size {
            return Err(ArchiveError::Format(format!(
                "{total_entries} entries cannot fit in a {cd_size} byte central directory"
            )));
        }

        // Read the entire Central Directory in one request
        let mut cd_data = vec![0u8; cd_size as usize];
        self.reader.read_exact_at(cd_offset, &mut cd_data).await?;

        let mut entries = Vec::with_capacity(total_entries as usize);
        let mut cursor = Cursor::new(cd_data.as_slice());

        for _ in 0..total_entries {
            entries.push(Self::parse_cdfh(&mut cursor)?);
        }

        Ok(entries)
    }

    /// Parse a Central Directory File Header from a cursor.
    fn parse_cdfh(cursor: &mut Cursor<&[u8]>) -> Result<ZipFileEntry, ArchiveError> {
        let mut sig = [0u8; 4];
        cursor.read_exact(&mut sig)?;
        if sig != CDFH_SIGNATURE {
            return Err(ArchiveError::Format(
                "invalid central directory file header".to_string(),
            ));
        }

        let _version_made_by = cursor.read_u16::<LittleEndian>()?;
        let _version_needed = cursor.read_u16::<LittleEndian>()?;
        let flags = cursor.read_u16::<LittleEndian>()?;
        let compression_method = cursor.read_u16::<LittleEndian>()?;
        let last_mod_time = cursor.read_u16::<LittleEndian>()?;
        let last_mod_date = cursor.read_u16::<LittleEndian>()?;
        let crc32 = cursor.read_u32::<LittleEndian>()?;
        let mut compressed_size = cursor.read_u32::<LittleEndian>()? as u64;
        let mut uncompressed_size = cursor.read_u32::<LittleEndian>()? as u64;
        let file_name_length = cursor.read_u16::<LittleEndian>()?;
        let extra_field_length = cursor.read_u16::<LittleEndian>()?;
        let file_comment_length = cursor.read_u16::<LittleEndian>()?;
        let _disk_number_start = cursor.read_u16::<LittleEndian>()?;
        let _internal_attrs = cursor.read_u16::<LittleEndian>()?;
        let _external_attrs = cursor.read_u32::<LittleEndian>()?;
        let mut lfh_offset = cursor.read_u32::<LittleEndian>()? as u64;

        let mut file_name_bytes = vec![0u8; file_name_length as usize];
        cursor.read_exact(&mut file_name_bytes)?;
        // Non-UTF8 names are kept lossily; they only need to be displayable
        let file_name = String::from_utf8_lossy(&file_name_bytes).into_owned();

        let is_directory = file_name.ends_with('/');

        // ZIP64 sizes and offsets live in extra field 0x0001, present only
        // for header fields saturated at 0xFFFFFFFF
        let extra_field_end = cursor.position() + extra_field_length as u64;

        while cursor.position() + 4 <= extra_field_end {
            let header_id = cursor.read_u16::<LittleEndian>()?;
            let field_size = cursor.read_u16::<LittleEndian>()?;
            let field_end = cursor.position() + field_size as u64;

            if header_id == 0x0001 {
                if uncompressed_size == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                    uncompressed_size = cursor.read_u64::<LittleEndian>()?;
                }
                if compressed_size == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                    compressed_size = cursor.read_u64::<LittleEndian>()?;
                }
                if lfh_offset == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                    lfh_offset = cursor.read_u64::<LittleEndian>()?;
                }
            }

            cursor.set_position(field_end);
        }

        cursor.set_position(extra_field_end + file_comment_length as u64);

        Ok(ZipFileEntry {
            file_name,
            compression_method: CompressionMethod::from_u16(compression_method),
            compressed_size,
            uncompressed_size,
            crc32,
            lfh_offset,
            last_mod_time,
            last_mod_date,
            is_directory,
            is_encrypted: flags & FLAG_ENCRYPTED != 0,
        })
    }

    /// Get the actual data offset for a file entry.
    ///
    /// The Local File Header's name and extra field may differ in length
    /// from the central directory copy, so the LFH is read to find where
    /// the entry data begins.
    pub async fn get_data_offset(&self, entry: &ZipFileEntry) -> Result<u64, ArchiveError> {
        let mut lfh_buf = vec![0u8; LFH_SIZE];
        self.reader
            .read_exact_at(entry.lfh_offset, &mut lfh_buf)
            .await?;

        if &lfh_buf[0..4] != LFH_SIGNATURE {
            return Err(ArchiveError::Format(format!(
                "invalid local file header for {}",
                entry.file_name
            )));
        }

        let mut cursor = Cursor::new(&lfh_buf);
        cursor.set_position(26); // Offset to filename length field

        let file_name_length = cursor.read_u16::<LittleEndian>()? as u64;
        let extra_field_length = cursor.read_u16::<LittleEndian>()? as u64;

        Ok(entry.lfh_offset + LFH_SIZE as u64 + file_name_length + extra_field_length)
    }

    /// Read an entry's raw (still compressed) bytes.
    pub async fn read_raw(&self, entry: &ZipFileEntry) -> Result<Vec<u8>, ArchiveError> {
        let data_offset = self.get_data_offset(entry).await?;
        if data_offset.saturating_add(entry.compressed_size) > self.size {
            return Err(ArchiveError::Format(format!(
                "data for {} runs past the end of the archive",
                entry.file_name
            )));
        }

        let mut buf = vec![0u8; entry.compressed_size as usize];
        self.reader.read_exact_at(data_offset, &mut buf).await?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryReader;
    use byteorder::WriteBytesExt;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn archive_with_comment(comment: &str) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        writer.add_directory("feeds/", options).unwrap();
        writer.start_file("feeds/z.xml", options).unwrap();
        writer.write_all(b"<alert/>").unwrap();
        writer.start_file("a.xml", options).unwrap();
        writer.write_all(b"<alert/>").unwrap();
        writer.set_comment(comment);
        writer.finish().unwrap().into_inner()
    }

    /// STORED archive whose central directory saturates every 32-bit field
    /// and points through the ZIP64 extra field, locator and record.
    fn zip64_archive(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut out = Vec::new();
        let mut central = Vec::new();

        for (name, data) in entries {
            let mut crc = flate2::Crc::new();
            crc.update(data.as_bytes());
            let offset = out.len() as u64;
            let size = data.len() as u64;

            out.extend_from_slice(LFH_SIGNATURE);
            out.write_u16::<LittleEndian>(45).unwrap(); // version needed
            out.write_u16::<LittleEndian>(0).unwrap(); // flags
            out.write_u16::<LittleEndian>(0).unwrap(); // stored
            out.write_u16::<LittleEndian>(0).unwrap(); // time
            out.write_u16::<LittleEndian>(0x21).unwrap(); // 1980-01-01
            out.write_u32::<LittleEndian>(crc.sum()).unwrap();
            out.write_u32::<LittleEndian>(size as u32).unwrap();
            out.write_u32::<LittleEndian>(size as u32).unwrap();
            out.write_u16::<LittleEndian>(name.len() as u16).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap(); // extra length
            out.extend_from_slice(name.as_bytes());
            out.extend_from_slice(data.as_bytes());

            central.extend_from_slice(CDFH_SIGNATURE);
            central.write_u16::<LittleEndian>(45).unwrap(); // version made by
            central.write_u16::<LittleEndian>(45).unwrap(); // version needed
            central.write_u16::<LittleEndian>(0).unwrap();
            central.write_u16::<LittleEndian>(0).unwrap();
            central.write_u16::<LittleEndian>(0).unwrap();
            central.write_u16::<LittleEndian>(0x21).unwrap();
            central.write_u32::<LittleEndian>(crc.sum()).unwrap();
            central.write_u32::<LittleEndian>(0xFFFFFFFF).unwrap();
            central.write_u32::<LittleEndian>(0xFFFFFFFF).unwrap();
            central.write_u16::<LittleEndian>(name.len() as u16).unwrap();
            central.write_u16::<LittleEndian>(28).unwrap(); // extra length
            central.write_u16::<LittleEndian>(0).unwrap(); // comment length
            central.write_u16::<LittleEndian>(0).unwrap(); // disk start
            central.write_u16::<LittleEndian>(0).unwrap(); // internal attrs
            central.write_u32::<LittleEndian>(0).unwrap(); // external attrs
            central.write_u32::<LittleEndian>(0xFFFFFFFF).unwrap();
            central.extend_from_slice(name.as_bytes());
            central.write_u16::<LittleEndian>(0x0001).unwrap();
            central.write_u16::<LittleEndian>(24).unwrap();
            central.write_u64::<LittleEndian>(size).unwrap(); // uncompressed
            central.write_u64::<LittleEndian>(size).unwrap(); // compressed
            central.write_u64::<LittleEndian>(offset).unwrap();
        }

        let cd_offset = out.len() as u64;
        let cd_size = central.len() as u64;
        out.extend_from_slice(&central);

        let eocd64_offset = out.len() as u64;
        out.extend_from_slice(Zip64EOCD::SIGNATURE);
        out.write_u64::<LittleEndian>(44).unwrap(); // remaining record size
        out.write_u16::<LittleEndian>(45).unwrap();
        out.write_u16::<LittleEndian>(45).unwrap();
        out.write_u32::<LittleEndian>(0).unwrap(); // this disk
        out.write_u32::<LittleEndian>(0).unwrap(); // disk with the directory
        out.write_u64::<LittleEndian>(entries.len() as u64).unwrap();
        out.write_u64::<LittleEndian>(entries.len() as u64).unwrap();
        out.write_u64::<LittleEndian>(cd_size).unwrap();
        out.write_u64::<LittleEndian>(cd_offset).unwrap();

        out.extend_from_slice(Zip64EOCDLocator::SIGNATURE);
        out.write_u32::<LittleEndian>(0).unwrap();
        out.write_u64::<LittleEndian>(eocd64_offset).unwrap();
        out.write_u32::<LittleEndian>(1).unwrap(); // total disks

        out.extend_from_slice(EndOfCentralDirectory::SIGNATURE);
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(0xFFFF).unwrap();
        out.write_u16::<LittleEndian>(0xFFFF).unwrap();
        out.write_u32::<LittleEndian>(0xFFFFFFFF).unwrap();
        out.write_u32::<LittleEndian>(0xFFFFFFFF).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap(); // comment length
        out
    }

    #[tokio::test]
    async fn test_zip64_directory_and_extra_fields() {
        let data = zip64_archive(&[("b.xml", "<alert>b</alert>"), ("a.xml", "<alert/>")]);
        let parser = ZipParser::new(Arc::new(MemoryReader::new(data)));

        let (eocd, _) = parser.find_eocd().await.unwrap();
        assert!(eocd.is_zip64());

        let entries = parser.list_files().await.unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.file_name.as_str()).collect();
        assert_eq!(names, ["b.xml", "a.xml"]);
        assert_eq!(entries[0].uncompressed_size, 16);
        assert_eq!(entries[0].compressed_size, 16);
        assert_eq!(entries[0].lfh_offset, 0);
        assert_eq!(entries[1].uncompressed_size, 8);
        assert_eq!(entries[1].lfh_offset, 30 + 5 + 16);

        assert_eq!(parser.read_raw(&entries[1]).await.unwrap(), b"<alert/>");
    }

    #[tokio::test]
    async fn test_list_files_keeps_directory_order() {
        let parser = ZipParser::new(Arc::new(MemoryReader::new(archive_with_comment(""))));
        let entries = parser.list_files().await.unwrap();

        let names: Vec<_> = entries.iter().map(|e| e.file_name.as_str()).collect();
        assert_eq!(names, ["feeds/", "feeds/z.xml", "a.xml"]);
        assert!(entries[0].is_directory);
        assert!(!entries[1].is_directory);
        assert_eq!(entries[2].uncompressed_size, 8);
    }

    #[tokio::test]
    async fn test_find_eocd_behind_comment() {
        let data = archive_with_comment("exported by the alert feed mirror");
        let parser = ZipParser::new(Arc::new(MemoryReader::new(data)));

        assert_eq!(parser.list_files().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_rejects_non_archive() {
        let parser = ZipParser::new(Arc::new(MemoryReader::new(
            b"<alert>definitely not a zip file, just some markup</alert>".to_vec(),
        )));
        assert!(matches!(
            parser.list_files().await,
            Err(ArchiveError::Format(_))
        ));

        let parser = ZipParser::new(Arc::new(MemoryReader::new(b"PK".to_vec())));
        assert!(matches!(
            parser.list_files().await,
            Err(ArchiveError::Format(_))
        ));
    }

    #[tokio::test]
    async fn test_read_raw_stored_entry() {
        let parser = ZipParser::new(Arc::new(MemoryReader::new(archive_with_comment(""))));
        let entries = parser.list_files().await.unwrap();

        let raw = parser.read_raw(&entries[2]).await.unwrap();
        assert_eq!(raw, b"<alert/>");
    }
}
