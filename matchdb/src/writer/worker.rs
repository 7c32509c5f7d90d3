use std::sync::Arc;
use std::time::Duration;

use tictactoe::Outcome;
use tokio::sync::{mpsc, Mutex};
use tokio::time::{self, Instant};

use crate::persistence::MatchRepository;

use super::batch::{Batch, BatchEvent};

/// Per-worker flush accounting, returned when the worker exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub flushed_batches: u64,
    pub flushed_rows: u64,
    pub failed_batches: u64,
    pub lost_rows: u64,
}

/// A long-lived worker task. Pulls jobs from the shared queue into a private
/// batch and writes the batch when it fills up, when the idle timer fires,
/// or when the queue closes.
pub async fn run_batch_worker<R: MatchRepository>(
    worker_id: usize,
    job_rx: Arc<Mutex<mpsc::Receiver<Outcome>>>,
    repo: Arc<R>,
    batch_size: usize,
    flush_interval: Duration,
) -> WorkerReport {
    tracing::debug!(worker_id, batch_size, "Batch worker started");

    let mut batch = Batch::new(batch_size);
    let mut report = WorkerReport::default();

    let idle = time::sleep(flush_interval);
    tokio::pin!(idle);

    loop {
        let event = tokio::select! {
            biased;

            job = next_job(&job_rx) => match job {
                Some(job) => BatchEvent::Job(job),
                None => BatchEvent::Closed,
            },
            () = &mut idle => BatchEvent::IdleTimeout,
        };

        let step = batch.handle(event);
        if let Some(rows) = step.flush {
            flush(worker_id, repo.as_ref(), &rows, &mut report).await;
        }
        if step.reset_timer {
            idle.as_mut().reset(Instant::now() + flush_interval);
        }
        if step.finished {
            break;
        }
    }

    tracing::debug!(
        worker_id,
        flushed_batches = report.flushed_batches,
        flushed_rows = report.flushed_rows,
        "Job channel closed, worker exiting"
    );
    report
}

/// Wait for the next job. Only one worker holds the receiver at a time, so
/// each job is delivered exactly once. Dropping this future mid-wait (when
/// the idle timer wins) releases the lock without losing a job.
async fn next_job(job_rx: &Mutex<mpsc::Receiver<Outcome>>) -> Option<Outcome> {
    job_rx.lock().await.recv().await
}

/// Write one batch. A failed batch is logged, counted and dropped; the
/// worker carries on with the next one.
async fn flush<R: MatchRepository>(
    worker_id: usize,
    repo: &R,
    rows: &[Outcome],
    report: &mut WorkerReport,
) {
    let batch_len = rows.len() as u64;
    match repo.insert_batch(rows).await {
        Ok(()) => {
            report.flushed_batches += 1;
            report.flushed_rows += batch_len;
            tracing::trace!(worker_id, batch_len, "Batch flushed");
        }
        Err(e) => {
            report.failed_batches += 1;
            report.lost_rows += batch_len;
            tracing::error!(
                worker_id,
                batch_len,
                first_id = ?rows.first().map(|r| r.sequence_id),
                last_id = ?rows.last().map(|r| r.sequence_id),
                "Batch insert failed, dropping batch: {}",
                e
            );
        }
    }
}
