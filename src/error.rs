//! Error types for archive ingestion.
//!
//! Archive-level failures ([`ArchiveError`], [`PipelineError`]) abort a run.
//! [`DocumentError`] describes a single entry that could not contribute
//! features; the pipeline records it and moves on.

use thiserror::Error;

/// Failures reading the ZIP container itself
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// The buffer does not contain a readable ZIP structure
    #[error("not a valid ZIP archive: {0}")]
    Format(String),

    /// The underlying source could not be read
    #[error("failed to read archive: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures confined to one document inside the archive
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The entry uses a compression method other than STORED or DEFLATE
    #[error("unsupported compression method {0}")]
    UnsupportedCompression(u16),

    /// The entry is encrypted
    #[error("entry is encrypted")]
    Encrypted,

    /// The entry is larger than the configured cap
    #[error("entry is too large ({size} bytes, max {max} bytes)")]
    TooLarge {
        /// Declared or actual size, whichever tripped the cap
        size: u64,
        /// Configured limit
        max: u64,
    },

    /// Decoded bytes do not match the CRC-32 stored in the archive
    #[error("CRC mismatch (expected {expected:08x}, got {actual:08x})")]
    Checksum { expected: u32, actual: u32 },

    /// The entry data could not be read or inflated
    #[error("failed to decode entry: {0}")]
    Decode(String),

    /// The document is not well-formed markup
    #[error("malformed markup: {0}")]
    Markup(#[from] quick_xml::Error),

    /// Input ended while an element was still open
    #[error("unterminated element <{0}>")]
    Unterminated(String),

    /// No alert element anywhere in the document
    #[error("no alert element found")]
    MissingAlert,
}

impl From<ArchiveError> for DocumentError {
    fn from(err: ArchiveError) -> Self {
        DocumentError::Decode(err.to_string())
    }
}

/// Errors surfaced to the caller of a pipeline run
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The buffer is not a readable archive
    #[error("invalid archive: {0}")]
    ArchiveFormat(#[from] ArchiveError),

    /// The archive holds no entries with the document extension
    #[error("archive contains no .{extension} documents")]
    EmptyArchive { extension: String },

    /// Every document was processed but none carried usable geographic data
    #[error("archive had {documents} document(s) but none contained usable geographic data")]
    NoFeatures { documents: usize },

    /// A run transition was requested from the wrong state
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },
}
