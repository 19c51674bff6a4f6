//! Correction queue
//!
//! Eagle's import API cannot set an item's creation time or folder
//! atomically, so the engine queues [`CorrectionTask`]s and a single
//! background [`CorrectionWorker`] patches the on-disk metadata records in
//! enqueue order. The queue is bounded: a full queue suspends the engine.
//!
//! Failed patches are logged and dropped. The engine re-queues an
//! equivalent task on its next cycle while the item is still unorganized.

pub mod metadata;

pub use metadata::{EagleMetadataStore, MetadataStore};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use ieas_common::time::epoch_seconds;
use ieas_common::{Error, Result};
use tokio::sync::mpsc;

use crate::catalog::LibraryCatalog;

/// Deferred metadata patch for one library item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectionTask {
    /// Library item whose record is patched
    pub item_id: String,
    /// Default (year) folder the item is moved into
    pub folder_id: String,
    /// Server-recorded creation time
    pub timestamp: DateTime<Utc>,
}

/// Producer half of the correction queue
#[derive(Debug, Clone)]
pub struct CorrectionSender {
    tx: mpsc::Sender<CorrectionTask>,
}

impl CorrectionSender {
    /// Queue a task, waiting while the queue is full
    pub async fn enqueue(&self, task: CorrectionTask) -> Result<()> {
        self.tx
            .send(task)
            .await
            .map_err(|_| Error::Internal("correction worker has stopped".to_string()))
    }

    /// Free slots remaining
    pub fn available(&self) -> usize {
        self.tx.capacity()
    }

    /// Total queue capacity
    pub fn max_capacity(&self) -> usize {
        self.tx.max_capacity()
    }
}

/// Create a bounded correction queue
pub fn correction_channel(capacity: usize) -> (CorrectionSender, mpsc::Receiver<CorrectionTask>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (CorrectionSender { tx }, rx)
}

/// Result of applying one task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectionOutcome {
    Patched,
    /// No metadata record on disk; task dropped
    Missing,
    /// Patch raised an error; task dropped
    Failed,
}

/// Running totals reported when the worker stops
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CorrectionStats {
    pub patched: usize,
    pub missing: usize,
    pub failed: usize,
}

impl CorrectionStats {
    fn record(&mut self, outcome: CorrectionOutcome) {
        match outcome {
            CorrectionOutcome::Patched => self.patched += 1,
            CorrectionOutcome::Missing => self.missing += 1,
            CorrectionOutcome::Failed => self.failed += 1,
        }
    }
}

/// Single consumer of the correction queue
pub struct CorrectionWorker<M: MetadataStore> {
    store: Arc<M>,
    rx: mpsc::Receiver<CorrectionTask>,
}

impl CorrectionWorker<EagleMetadataStore> {
    /// Resolve the library root once and build a worker for it
    pub async fn start<L>(library: &L, rx: mpsc::Receiver<CorrectionTask>) -> Result<Self>
    where
        L: LibraryCatalog + ?Sized,
    {
        let root = library.library_path().await?;
        tracing::info!(root = %root.display(), "Correction worker resolved library root");
        Ok(Self::new(EagleMetadataStore::new(root), rx))
    }
}

impl<M: MetadataStore> CorrectionWorker<M> {
    pub fn new(store: M, rx: mpsc::Receiver<CorrectionTask>) -> Self {
        Self {
            store: Arc::new(store),
            rx,
        }
    }

    /// Apply tasks until every sender is dropped
    pub async fn run(mut self) -> CorrectionStats {
        let mut stats = CorrectionStats::default();

        while let Some(task) = self.rx.recv().await {
            let outcome = self.apply(task).await;
            stats.record(outcome);
        }

        tracing::info!(
            patched = stats.patched,
            missing = stats.missing,
            failed = stats.failed,
            "Correction queue closed"
        );
        stats
    }

    /// Patch one record, never failing the loop
    pub async fn apply(&self, task: CorrectionTask) -> CorrectionOutcome {
        let path = self.store.locate(&task.item_id);

        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::warn!(
                item_id = %task.item_id,
                path = %path.display(),
                "Metadata record does not exist"
            );
            return CorrectionOutcome::Missing;
        }

        let store = Arc::clone(&self.store);
        let folder_id = task.folder_id.clone();
        let seconds = epoch_seconds(&task.timestamp);
        let patch_path = path.clone();

        let result =
            tokio::task::spawn_blocking(move || store.patch(&patch_path, &folder_id, seconds))
                .await
                .map_err(|e| Error::Internal(format!("metadata patch task failed: {}", e)))
                .and_then(|r| r);

        match result {
            Ok(()) => {
                tracing::info!(
                    item_id = %task.item_id,
                    folder_id = %task.folder_id,
                    timestamp = %task.timestamp,
                    "Corrected item datetime and folder"
                );
                CorrectionOutcome::Patched
            }
            Err(e) => {
                tracing::error!(
                    item_id = %task.item_id,
                    path = %path.display(),
                    error = %e,
                    "Failed to correct metadata record"
                );
                CorrectionOutcome::Failed
            }
        }
    }
}
