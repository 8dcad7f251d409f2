//! Caller boundary that lets the newest archive load win.
//!
//! Each [`ArchiveSession::load`] takes a ticket. Progress and results are
//! forwarded to the sink only while that ticket is still the newest; an
//! older load that finishes late is dropped on the floor.
//!
//! The ticket is compared while the sink lock is held, so once a newer
//! load has taken its ticket no older output can reach the sink.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::PipelineError;
use crate::io::ReadAt;

use super::{BatchResult, Pipeline};

/// Consumer of pipeline output, typically a map layer
pub trait LayerSink: Send {
    fn progress(&mut self, processed: usize, total: usize);

    /// Replace whatever layer was shown before with `result`
    fn replace(&mut self, result: BatchResult);

    fn fail(&mut self, error: PipelineError);
}

/// What happened to a load's output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The sink received the result
    Delivered,
    /// The sink received the error
    Failed,
    /// A newer load started; nothing was delivered at the end
    Superseded,
}

/// Runs archive loads against one sink, letting the newest load win.
///
/// Shared by reference between concurrent callers; every [`load`](Self::load)
/// supersedes the loads started before it.
pub struct ArchiveSession<S: LayerSink> {
    pipeline: Pipeline,
    generation: AtomicU64,
    sink: Mutex<S>,
}

impl<S: LayerSink> ArchiveSession<S> {
    /// Create a session that delivers `pipeline` output to `sink`.
    pub fn new(pipeline: Pipeline, sink: S) -> Self {
        Self {
            pipeline,
            generation: AtomicU64::new(0),
            sink: Mutex::new(sink),
        }
    }

    /// Run the pipeline and deliver to the sink unless superseded.
    pub async fn load<R: ReadAt>(&self, reader: Arc<R>) -> Delivery {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let outcome = self
            .pipeline
            .run(reader, |processed, total| {
                self.deliver_if_current(ticket, |sink| sink.progress(processed, total));
            })
            .await;

        let delivery = self.deliver_if_current(ticket, |sink| match outcome {
            Ok(result) => {
                sink.replace(result);
                Delivery::Delivered
            }
            Err(error) => {
                sink.fail(error);
                Delivery::Failed
            }
        });

        delivery.unwrap_or_else(|| {
            tracing::debug!(ticket, "discarding superseded archive load");
            Delivery::Superseded
        })
    }

    /// Access the sink, e.g. to read what it currently shows.
    pub fn with_sink<T>(&self, f: impl FnOnce(&mut S) -> T) -> T {
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut sink)
    }

    /// Consume the session and hand back its sink.
    pub fn into_sink(self) -> S {
        self.sink.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` on the sink only if `ticket` is still the newest.
    ///
    /// The check happens under the sink lock; a load that takes a newer
    /// ticket while this one waits for the lock wins.
    fn deliver_if_current<T>(&self, ticket: u64, f: impl FnOnce(&mut S) -> T) -> Option<T> {
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.is_current(ticket) {
            return None;
        }
        Some(f(&mut sink))
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket
    }
}
