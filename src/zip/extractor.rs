use flate2::Crc;
use flate2::read::DeflateDecoder;
use std::io::Read;
use std::sync::Arc;

use crate::config::PipelineConfig;
use crate::error::{DocumentError, PipelineError};
use crate::io::{MemoryReader, ReadAt};

use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipFileEntry};

/// A document extracted from the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDocument {
    /// Entry name as stored in the archive
    pub name: String,
    /// Decoded document text
    pub text: String,
}

/// The document-bearing entries of an archive, in archive order.
///
/// Opening performs the counting pass: the central directory is read and
/// filtered once, so [`len`](Self::len) is known before any entry is
/// decoded.
pub struct DocumentArchive<R: ReadAt> {
    parser: ZipParser<R>,
    documents: Vec<ZipFileEntry>,
    max_document_size: u64,
}

impl<R: ReadAt> DocumentArchive<R> {
    /// Read the central directory and keep the document entries.
    ///
    /// # Errors
    ///
    /// [`PipelineError::ArchiveFormat`] for an unreadable archive and
    /// [`PipelineError::EmptyArchive`] when no entry has the document
    /// extension.
    pub async fn open(reader: Arc<R>, config: &PipelineConfig) -> Result<Self, PipelineError> {
        let parser = ZipParser::new(reader);
        let documents: Vec<_> = parser
            .list_files()
            .await?
            .into_iter()
            .filter(|e| !e.is_directory && config.is_document_name(&e.file_name))
            .collect();

        if documents.is_empty() {
            return Err(PipelineError::EmptyArchive {
                extension: config.document_extension.clone(),
            });
        }

        Ok(Self {
            parser,
            documents,
            max_document_size: config.max_document_size,
        })
    }

    /// Number of document entries
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether no document entries were found. Always false after a
    /// successful [`open`](Self::open).
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Document entries in central-directory order
    pub fn entries(&self) -> &[ZipFileEntry] {
        &self.documents
    }

    /// Decode one entry to text.
    ///
    /// Failures here belong to the entry, not the archive.
    ///
    /// # Arguments
    ///
    /// * `entry` - One of [`entries`](Self::entries)
    ///
    /// # Errors
    ///
    /// [`DocumentError::Encrypted`], [`DocumentError::UnsupportedCompression`],
    /// [`DocumentError::TooLarge`], [`DocumentError::Checksum`] or
    /// [`DocumentError::Decode`] for unreadable entry data.
    pub async fn read_document(&self, entry: &ZipFileEntry) -> Result<String, DocumentError> {
        if entry.is_encrypted {
            return Err(DocumentError::Encrypted);
        }
        if entry.uncompressed_size > self.max_document_size {
            return Err(DocumentError::TooLarge {
                size: entry.uncompressed_size,
                max: self.max_document_size,
            });
        }

        let raw = self.parser.read_raw(entry).await?;
        let data = match entry.compression_method {
            CompressionMethod::Stored => {
                // The stored length is what gets returned, not the declared size
                if raw.len() as u64 > self.max_document_size {
                    return Err(DocumentError::TooLarge {
                        size: raw.len() as u64,
                        max: self.max_document_size,
                    });
                }
                raw
            }
            CompressionMethod::Deflate => self.inflate(&raw)?,
            CompressionMethod::Unknown(method) => {
                return Err(DocumentError::UnsupportedCompression(method));
            }
        };

        let mut crc = Crc::new();
        crc.update(&data);
        if crc.sum() != entry.crc32 {
            return Err(DocumentError::Checksum {
                expected: entry.crc32,
                actual: crc.sum(),
            });
        }

        Ok(decode_text(&entry.file_name, data))
    }

    fn inflate(&self, raw: &[u8]) -> Result<Vec<u8>, DocumentError> {
        // Never inflate more than the cap, whatever the header claims
        let mut data = Vec::new();
        DeflateDecoder::new(raw)
            .take(self.max_document_size + 1)
            .read_to_end(&mut data)
            .map_err(|e| DocumentError::Decode(e.to_string()))?;

        if data.len() as u64 > self.max_document_size {
            return Err(DocumentError::TooLarge {
                size: data.len() as u64,
                max: self.max_document_size,
            });
        }
        Ok(data)
    }
}

fn decode_text(name: &str, mut data: Vec<u8>) -> String {
    if data.starts_with(b"\xEF\xBB\xBF") {
        data.drain(..3);
    }

    match String::from_utf8(data) {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!(entry = name, "document is not valid UTF-8, decoding lossily");
            String::from_utf8_lossy(err.as_bytes()).into_owned()
        }
    }
}

/// Extract every document of an in-memory archive, in archive order.
///
/// Entries that cannot be decoded are logged and skipped; the pipeline
/// uses [`DocumentArchive`] directly to record those failures.
///
/// # Errors
///
/// Only archive-level conditions: [`PipelineError::ArchiveFormat`] and
/// [`PipelineError::EmptyArchive`].
pub async fn extract(
    buffer: Vec<u8>,
    config: &PipelineConfig,
) -> Result<Vec<ExtractedDocument>, PipelineError> {
    let archive = DocumentArchive::open(Arc::new(MemoryReader::new(buffer)), config).await?;

    let mut documents = Vec::with_capacity(archive.len());
    for entry in archive.entries() {
        let text = match archive.read_document(entry).await {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(entry = %entry.file_name, "skipping document: {err}");
                continue;
            }
        };
        documents.push(ExtractedDocument {
            name: entry.file_name.clone(),
            text,
        });
    }

    Ok(documents)
}
