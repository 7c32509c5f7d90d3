//! Storage for enumerated matches.
//!
//! [`MatchRepository`] is the seam between the rebuild pipeline and the
//! relational store; [`sqlite`] holds the production implementation.

pub mod sqlite;
pub mod traits;

#[cfg(test)]
pub mod memory;

pub use traits::MatchRepository;

use serde::Serialize;

/// Errors from the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("migration failed: {0}")]
    Migration(String),
    #[error("corrupt match row {id}: {reason}")]
    Corrupt { id: i64, reason: String },
}

/// Counts of stored matches by result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MatchSummary {
    pub total: u64,
    pub x_wins: u64,
    pub o_wins: u64,
    pub draws: u64,
}
