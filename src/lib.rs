//! # capzip
//!
//! Turns a ZIP archive of CAP (Common Alerting Protocol) alert documents
//! into one ordered GeoJSON feature collection.
//!
//! The pipeline reads the archive's central directory, keeps the `.xml`
//! entries in archive order, parses each alert's info and area blocks, and
//! converts CAP `lat,lon` polygon strings into closed `[lon, lat]` rings.
//! A broken document is logged and skipped; only archive-level problems
//! fail a run.
//!
//! ## Features
//!
//! - ZIP and ZIP64 archives, STORED and DEFLATE entries, CRC-32 checked
//! - `cap:`-prefixed and bare element names
//! - Polygon, MultiPolygon and metadata-only features
//! - Per-document progress with a total known up front
//!
//! ## Example
//!
//! ```no_run
//! use capzip::{Pipeline, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let buffer = std::fs::read("alerts.zip")?;
//!
//!     let pipeline = Pipeline::new(PipelineConfig::default());
//!     let result = pipeline
//!         .run_bytes(buffer, |processed, total| eprintln!("{processed}/{total}"))
//!         .await?;
//!
//!     println!("{} features", result.features.len());
//!     Ok(())
//! }
//! ```

pub mod cap;
pub mod cli;
pub mod config;
pub mod error;
pub mod feature;
pub mod io;
pub mod pipeline;
pub mod zip;

#[cfg(test)]
pub(crate) mod test_support;

pub use cli::Cli;
pub use config::PipelineConfig;
pub use error::{ArchiveError, DocumentError, PipelineError};
pub use feature::{Feature, FeatureCollection, Geometry};
pub use io::{MemoryReader, ReadAt};
pub use pipeline::{ArchiveSession, BatchResult, Delivery, LayerSink, Pipeline};
pub use crate::zip::{DocumentArchive, ZipFileEntry, extract};
