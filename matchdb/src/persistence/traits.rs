//! Async repository trait for stored matches.
//!
//! Methods return `impl Future + Send` rather than using `async fn` so that
//! the futures are guaranteed `Send`, which `tokio::spawn` requires of the
//! batch writer's worker tasks.

use super::{MatchSummary, PersistenceError};
use std::future::Future;
use tictactoe::Outcome;

/// Repository for enumerated matches.
///
/// Implementations must tolerate concurrent `insert_batch` calls from
/// several workers, and `truncate` must be all-or-nothing.
pub trait MatchRepository: Send + Sync {
    /// Remove every stored match and restart the id sequence at 1.
    fn truncate(&self) -> impl Future<Output = Result<(), PersistenceError>> + Send;

    /// Insert `rows` in one write. Each row's `sequence_id` is stored verbatim
    /// as its id.
    fn insert_batch(
        &self,
        rows: &[Outcome],
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send;

    fn summary(&self) -> impl Future<Output = Result<MatchSummary, PersistenceError>> + Send;

    fn load_by_id(
        &self,
        id: u64,
    ) -> impl Future<Output = Result<Option<Outcome>, PersistenceError>> + Send;

    fn load_by_code(
        &self,
        moves_code: u32,
    ) -> impl Future<Output = Result<Option<Outcome>, PersistenceError>> + Send;
}
