pub mod batch;
pub mod worker;

use std::sync::Arc;

use serde::Serialize;
use tictactoe::Outcome;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::config::PipelineConfig;
use crate::persistence::MatchRepository;
use worker::WorkerReport;

#[derive(Debug, thiserror::Error)]
pub enum WriterError {
    #[error("job queue is closed")]
    QueueClosed,
    #[error("batch worker {worker_id} panicked")]
    WorkerPanicked { worker_id: usize },
}

/// Totals across every worker of one writer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WriterReport {
    pub flushed_batches: u64,
    pub flushed_rows: u64,
    /// Batches whose insert failed and were dropped.
    pub failed_batches: u64,
    /// Rows that never reached storage because their batch failed.
    pub lost_rows: u64,
}

impl WriterReport {
    fn absorb(&mut self, worker: WorkerReport) {
        self.flushed_batches += worker.flushed_batches;
        self.flushed_rows += worker.flushed_rows;
        self.failed_batches += worker.failed_batches;
        self.lost_rows += worker.lost_rows;
    }
}

/// Pool of batch workers draining one bounded job queue into a
/// [`MatchRepository`].
///
/// The queue holds one full batch per worker. Senders wait while it is full,
/// which is what keeps the producer from running ahead of storage.
pub struct BatchWriter {
    job_tx: mpsc::Sender<Outcome>,
    workers: Vec<JoinHandle<WorkerReport>>,
}

impl BatchWriter {
    /// Spawn `config.worker_count()` workers on the current runtime.
    pub fn start<R: MatchRepository + 'static>(repo: Arc<R>, config: &PipelineConfig) -> Self {
        let (job_tx, job_rx) = mpsc::channel::<Outcome>(config.queue_capacity());

        // Wrap the receiver so multiple workers can share it.
        let shared_rx = Arc::new(Mutex::new(job_rx));

        let workers = (0..config.worker_count())
            .map(|worker_id| {
                tokio::spawn(worker::run_batch_worker(
                    worker_id,
                    shared_rx.clone(),
                    repo.clone(),
                    config.batch_size(),
                    config.flush_interval(),
                ))
            })
            .collect();

        tracing::info!(
            worker_count = config.worker_count(),
            batch_size = config.batch_size(),
            flush_interval_ms = config.flush_interval().as_millis() as u64,
            queue_capacity = config.queue_capacity(),
            "Batch writer started"
        );

        Self { job_tx, workers }
    }

    /// A handle for producers outside the async context; use
    /// `blocking_send` from a blocking thread. Every clone must be dropped
    /// before [`BatchWriter::wait`] can return.
    pub fn sender(&self) -> mpsc::Sender<Outcome> {
        self.job_tx.clone()
    }

    /// Queue one job, waiting while the queue is full.
    pub async fn submit(&self, job: Outcome) -> Result<(), WriterError> {
        self.job_tx
            .send(job)
            .await
            .map_err(|_| WriterError::QueueClosed)
    }

    /// Close the queue and wait for every worker to flush its last batch
    /// and exit.
    pub async fn wait(self) -> Result<WriterReport, WriterError> {
        let Self { job_tx, workers } = self;
        drop(job_tx);

        let mut report = WriterReport::default();
        let mut panicked = None;
        for (worker_id, handle) in workers.into_iter().enumerate() {
            match handle.await {
                Ok(worker_report) => report.absorb(worker_report),
                Err(e) => {
                    tracing::error!(worker_id, "Batch worker failed: {}", e);
                    panicked.get_or_insert(worker_id);
                }
            }
        }

        if let Some(worker_id) = panicked {
            return Err(WriterError::WorkerPanicked { worker_id });
        }

        if report.failed_batches > 0 {
            tracing::warn!(
                failed_batches = report.failed_batches,
                lost_rows = report.lost_rows,
                "Some batches were dropped"
            );
        }
        tracing::info!(
            flushed_batches = report.flushed_batches,
            flushed_rows = report.flushed_rows,
            "Batch writer drained"
        );
        Ok(report)
    }
}
