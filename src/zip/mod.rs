//! ZIP archive reading and document extraction.
//!
//! ## Architecture
//!
//! - [`structures`]: ZIP format records (EOCD, ZIP64 records, file entries)
//! - [`parser`]: low-level parsing of those records from a [`ReadAt`](crate::io::ReadAt) source
//! - [`extractor`]: document filtering, counting and decoding on top of the parser
//!
//! The EOCD is read first (from the end of the buffer), then the Central
//! Directory, which gives the full, ordered entry list before any entry
//! data is touched.
//!
//! ## Supported Features
//!
//! - Standard ZIP format (PKZIP APPNOTE 6.3.x compatible)
//! - ZIP64 extensions
//! - STORED and DEFLATE compression methods, with CRC-32 verification
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support
//! - No BZIP2, LZMA, or other compression methods

mod extractor;
mod parser;
mod structures;

pub use extractor::{DocumentArchive, ExtractedDocument, extract};
pub use parser::ZipParser;
pub use structures::*;
