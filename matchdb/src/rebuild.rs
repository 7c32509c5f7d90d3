//! Full rebuild of the match database.
//!
//! One rebuild clears the table, starts a [`BatchWriter`], walks the game
//! tree on a blocking thread pushing every outcome into the writer's queue,
//! and waits for the writer to drain.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tictactoe::Enumerator;

use crate::config::PipelineConfig;
use crate::persistence::{MatchRepository, PersistenceError};
use crate::writer::{BatchWriter, WriterError, WriterReport};

#[derive(Debug, thiserror::Error)]
pub enum RebuildError {
    #[error("failed to clear match table: {0}")]
    Truncate(#[source] PersistenceError),
    #[error("enumeration task failed: {0}")]
    Producer(#[from] tokio::task::JoinError),
    #[error("job queue closed before enumeration finished")]
    QueueClosed,
    #[error(transparent)]
    Writer(#[from] WriterError),
}

/// Result of a completed rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebuildReport {
    /// Outcomes produced by the enumeration.
    pub outcome_count: u64,
    pub elapsed: Duration,
    pub writer: WriterReport,
}

impl RebuildReport {
    /// Whether every produced outcome reached storage.
    pub fn is_complete(&self) -> bool {
        self.writer.lost_rows == 0 && self.writer.flushed_rows == self.outcome_count
    }
}

pub struct RebuildCoordinator<R> {
    repo: Arc<R>,
    config: PipelineConfig,
}

impl<R: MatchRepository + 'static> RebuildCoordinator<R> {
    pub fn new(repo: Arc<R>, config: PipelineConfig) -> Self {
        Self { repo, config }
    }

    /// Regenerate every stored match.
    ///
    /// A failed truncate aborts before anything is written. Failed batch
    /// inserts do not abort the rebuild; they show up in the report's
    /// writer totals instead.
    #[tracing::instrument(skip_all)]
    pub async fn rebuild(&self) -> Result<RebuildReport, RebuildError> {
        let started = Instant::now();

        self.repo.truncate().await.map_err(|e| {
            tracing::error!("Truncate failed, aborting rebuild: {}", e);
            RebuildError::Truncate(e)
        })?;

        let writer = BatchWriter::start(self.repo.clone(), &self.config);
        let job_tx = writer.sender();

        // The walk is plain synchronous recursion; `blocking_send` parks it
        // whenever the queue is full.
        let produced = tokio::task::spawn_blocking(move || {
            Enumerator::new().run(|outcome| job_tx.blocking_send(outcome))
        })
        .await;

        // Drain whatever was queued even if the producer stopped early. A dead
        // worker pool closes the queue under the producer, so the writer's
        // error is the cause of a failed send and is reported first.
        let writer = writer.wait().await?;

        let outcome_count = match produced {
            Ok(Ok(count)) => count,
            Ok(Err(_)) => return Err(RebuildError::QueueClosed),
            Err(e) => return Err(RebuildError::Producer(e)),
        };

        let report = RebuildReport {
            outcome_count,
            elapsed: started.elapsed(),
            writer,
        };
        tracing::info!(
            outcome_count,
            flushed_rows = writer.flushed_rows,
            lost_rows = writer.lost_rows,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Rebuild complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::memory::MemoryMatchRepository;
    use crate::persistence::sqlite::{Database, SqliteMatchRepository};
    use crate::persistence::MatchSummary;
    use tictactoe::{Outcome, Winner, DRAWS, O_WINS, TOTAL_OUTCOMES, X_WINS};

    const EXPECTED: MatchSummary = MatchSummary {
        total: TOTAL_OUTCOMES,
        x_wins: X_WINS,
        o_wins: O_WINS,
        draws: DRAWS,
    };

    fn config(workers: usize, batch: usize) -> PipelineConfig {
        PipelineConfig::new(workers, batch, Duration::from_millis(10)).unwrap()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_rebuild_stores_every_outcome_once() {
        let repo = Arc::new(MemoryMatchRepository::new());
        repo.seed(&[Outcome {
            sequence_id: 999_999,
            moves_code: 1,
            winner: Winner::X,
        }]);

        let report = RebuildCoordinator::new(repo.clone(), config(4, 256))
            .rebuild()
            .await
            .unwrap();

        assert_eq!(report.outcome_count, TOTAL_OUTCOMES);
        assert!(report.is_complete());
        assert_eq!(repo.truncations(), 1);
        assert_eq!(repo.summary().await.unwrap(), EXPECTED);

        let rows = repo.rows();
        assert_eq!(rows.first().map(|r| r.sequence_id), Some(1));
        assert_eq!(rows.last().map(|r| r.sequence_id), Some(TOTAL_OUTCOMES));
        assert_eq!(repo.load_by_id(999_999).await.unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_rebuild_is_independent_of_pool_shape() {
        for (workers, batch) in [(1, 1_000), (7, 33)] {
            let repo = Arc::new(MemoryMatchRepository::new());
            let report = RebuildCoordinator::new(repo.clone(), config(workers, batch))
                .rebuild()
                .await
                .unwrap();
            assert_eq!(report.outcome_count, TOTAL_OUTCOMES, "{workers}x{batch}");
            assert_eq!(repo.summary().await.unwrap(), EXPECTED, "{workers}x{batch}");
        }
    }

    #[tokio::test]
    async fn test_repeated_rebuilds_restart_numbering() {
        let repo = Arc::new(MemoryMatchRepository::new());
        let coordinator = RebuildCoordinator::new(repo.clone(), config(2, 500));

        let first = coordinator.rebuild().await.unwrap();
        let second = coordinator.rebuild().await.unwrap();

        assert_eq!(first.outcome_count, second.outcome_count);
        assert_eq!(repo.truncations(), 2);
        assert_eq!(repo.rows().len() as u64, TOTAL_OUTCOMES);
        assert_eq!(repo.load_by_code(1_234_567).await.unwrap().map(|o| o.sequence_id), Some(1));
    }

    #[tokio::test]
    async fn test_truncate_failure_aborts_before_writing() {
        let repo = Arc::new(MemoryMatchRepository::new());
        repo.fail_truncate();

        let err = RebuildCoordinator::new(repo.clone(), config(2, 10))
            .rebuild()
            .await
            .unwrap_err();

        assert!(matches!(err, RebuildError::Truncate(_)));
        assert!(repo.flushes().is_empty());
    }

    #[tokio::test]
    async fn test_panicked_writer_is_reported_as_cause() {
        let repo = Arc::new(MemoryMatchRepository::new());
        repo.panic_on_insert();

        let err = RebuildCoordinator::new(repo.clone(), config(1, 1))
            .rebuild()
            .await
            .unwrap_err();

        assert!(
            matches!(
                err,
                RebuildError::Writer(WriterError::WorkerPanicked { worker_id: 0 })
            ),
            "got {err:?}"
        );
        assert!(repo.rows().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_failed_batches_are_reported_not_fatal() {
        let repo = Arc::new(MemoryMatchRepository::new());
        repo.fail_batches_containing(1);

        let report = RebuildCoordinator::new(repo.clone(), config(3, 100))
            .rebuild()
            .await
            .unwrap();

        assert_eq!(report.outcome_count, TOTAL_OUTCOMES);
        assert!(!report.is_complete());
        assert_eq!(report.writer.failed_batches, 1);
        assert!(report.writer.lost_rows >= 1);
        assert_eq!(
            report.writer.flushed_rows + report.writer.lost_rows,
            TOTAL_OUTCOMES
        );
        assert_eq!(repo.rows().len() as u64, report.writer.flushed_rows);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_rebuild_into_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = config(4, 500);
        let db = Database::open(&dir.path().join("matches.db"), pipeline.connection_count())
            .await
            .unwrap();
        let repo = Arc::new(SqliteMatchRepository::new(db.pool().clone()));
        repo.insert_batch(&[Outcome {
            sequence_id: 1,
            moves_code: 9,
            winner: Winner::O,
        }])
        .await
        .unwrap();

        let report = RebuildCoordinator::new(repo.clone(), pipeline)
            .rebuild()
            .await
            .unwrap();

        assert!(report.is_complete());
        assert_eq!(repo.summary().await.unwrap(), EXPECTED);

        let first = repo.load_by_id(1).await.unwrap().unwrap();
        assert_eq!(first.moves_code, 1_234_567);
        assert_eq!(first.winner, Winner::X);

        let o_row = repo.load_by_code(519_372).await.unwrap().unwrap();
        assert_eq!(o_row.winner, Winner::O);
        assert_eq!(repo.load_by_code(5193).await.unwrap(), None);
        assert_eq!(repo.load_by_code(9).await.unwrap(), None);
    }
}
