//! One pipeline invocation as an explicit state machine.
//!
//! ```text
//! Idle --open--> Counting --> Processing{0,n} --step--> ... --step--> Processing{n,n}
//!                   |                                                    |
//!                   +--> Failed                              finish --> Completed | Failed
//! ```

use std::sync::Arc;

use crate::cap::try_parse_document;
use crate::config::PipelineConfig;
use crate::error::{DocumentError, PipelineError};
use crate::feature::Feature;
use crate::io::ReadAt;
use crate::zip::DocumentArchive;

/// Where a run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Counting,
    Processing { processed: usize, total: usize },
    Completed,
    Failed,
}

impl PipelineState {
    fn label(self) -> &'static str {
        match self {
            PipelineState::Idle => "idle",
            PipelineState::Counting => "counting",
            PipelineState::Processing { .. } => "processing",
            PipelineState::Completed => "completed",
            PipelineState::Failed => "failed",
        }
    }
}

/// Progress after one entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub processed: usize,
    pub total: usize,
}

/// A document that contributed no features because it failed
#[derive(Debug)]
pub struct DocumentFailure {
    /// Entry name in the archive
    pub entry: String,
    pub error: DocumentError,
}

/// Outcome of a completed run
#[derive(Debug)]
pub struct BatchResult {
    /// Features in document order, then info/area order within a document
    pub features: Vec<Feature>,
    pub processed: usize,
    pub total: usize,
    /// Documents that were skipped, in processing order
    pub failures: Vec<DocumentFailure>,
}

/// State of a single invocation. Create a fresh one per archive.
pub struct PipelineRun<R: ReadAt> {
    config: PipelineConfig,
    state: PipelineState,
    archive: Option<DocumentArchive<R>>,
    features: Vec<Feature>,
    failures: Vec<DocumentFailure>,
}

impl<R: ReadAt> PipelineRun<R> {
    /// A run in the `Idle` state
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            state: PipelineState::Idle,
            archive: None,
            features: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Count the archive's documents. Returns the total.
    ///
    /// # Errors
    ///
    /// Archive-level errors move the run to `Failed`.
    pub async fn open(&mut self, reader: Arc<R>) -> Result<usize, PipelineError> {
        if self.state != PipelineState::Idle {
            return Err(self.invalid("open"));
        }
        self.state = PipelineState::Counting;

        match DocumentArchive::open(reader, &self.config).await {
            Ok(archive) => {
                let total = archive.len();
                tracing::debug!(total, "counted archive documents");
                self.archive = Some(archive);
                self.state = PipelineState::Processing { processed: 0, total };
                Ok(total)
            }
            Err(err) => {
                self.state = PipelineState::Failed;
                Err(err)
            }
        }
    }

    /// Decode and parse the next entry.
    ///
    /// Returns `None` once every entry has been processed. Entry failures
    /// are recorded and still count as processed.
    pub async fn step(&mut self) -> Result<Option<Progress>, PipelineError> {
        let PipelineState::Processing { processed, total } = self.state else {
            return Err(self.invalid("step"));
        };
        if processed == total {
            return Ok(None);
        }

        let Some(archive) = self.archive.as_ref() else {
            return Err(self.invalid("step"));
        };
        let entry = &archive.entries()[processed];

        let outcome = match archive.read_document(entry).await {
            Ok(text) => try_parse_document(&text),
            Err(err) => Err(err),
        };

        match outcome {
            Ok(features) => {
                tracing::debug!(entry = %entry.file_name, features = features.len(), "parsed document");
                self.features.extend(features);
            }
            Err(error) => {
                tracing::warn!(entry = %entry.file_name, %error, "skipping document");
                self.failures.push(DocumentFailure {
                    entry: entry.file_name.clone(),
                    error,
                });
            }
        }

        let processed = processed + 1;
        self.state = PipelineState::Processing { processed, total };
        Ok(Some(Progress { processed, total }))
    }

    /// Close the run and hand back its features.
    ///
    /// # Errors
    ///
    /// [`PipelineError::NoFeatures`] when documents were processed but none
    /// produced a feature.
    pub fn finish(&mut self) -> Result<BatchResult, PipelineError> {
        let PipelineState::Processing { processed, total } = self.state else {
            return Err(self.invalid("finish"));
        };
        if processed < total {
            return Err(self.invalid("finish"));
        }

        // Release the archive, and with it the caller's buffer
        self.archive = None;

        if self.features.is_empty() && total > 0 {
            self.state = PipelineState::Failed;
            return Err(PipelineError::NoFeatures { documents: total });
        }

        self.state = PipelineState::Completed;
        Ok(BatchResult {
            features: std::mem::take(&mut self.features),
            processed,
            total,
            failures: std::mem::take(&mut self.failures),
        })
    }

    fn invalid(&self, action: &'static str) -> PipelineError {
        PipelineError::InvalidTransition {
            action,
            state: self.state.label(),
        }
    }
}
