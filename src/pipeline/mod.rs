//! Drives extraction and parsing across a whole archive.
//!
//! Entries are processed strictly one after another, in archive order, so
//! progress and feature order are reproducible for a given archive.

mod run;
mod session;

pub use run::{BatchResult, DocumentFailure, PipelineRun, PipelineState, Progress};
pub use session::{ArchiveSession, Delivery, LayerSink};

use std::sync::Arc;

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::io::{MemoryReader, ReadAt};

/// Archive-to-features pipeline
///
/// Holds only configuration; every call to [`run`](Self::run) starts from
/// an empty accumulator.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline.
    ///
    /// # Arguments
    ///
    /// * `config` - Document extension and size cap applied to every run
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Process every document in the archive behind `reader`.
    ///
    /// `on_progress(processed, total)` fires exactly once per document,
    /// after that document's features (if any) have been accumulated.
    ///
    /// # Errors
    ///
    /// Only archive-level conditions: [`PipelineError::ArchiveFormat`],
    /// [`PipelineError::EmptyArchive`] (both before any progress) and
    /// [`PipelineError::NoFeatures`].
    pub async fn run<R, F>(
        &self,
        reader: Arc<R>,
        mut on_progress: F,
    ) -> Result<BatchResult, PipelineError>
    where
        R: ReadAt,
        F: FnMut(usize, usize),
    {
        let mut run = PipelineRun::new(self.config.clone());
        let total = run.open(reader).await?;
        tracing::info!(documents = total, "processing alert archive");

        while let Some(progress) = run.step().await? {
            on_progress(progress.processed, progress.total);
        }

        let result = run.finish()?;
        tracing::info!(
            features = result.features.len(),
            skipped = result.failures.len(),
            "alert archive processed"
        );
        Ok(result)
    }

    /// [`run`](Self::run) over an in-memory archive. The buffer is dropped
    /// when the run ends.
    pub async fn run_bytes<F>(
        &self,
        buffer: Vec<u8>,
        on_progress: F,
    ) -> Result<BatchResult, PipelineError>
    where
        F: FnMut(usize, usize),
    {
        self.run(Arc::new(MemoryReader::new(buffer)), on_progress).await
    }
}
