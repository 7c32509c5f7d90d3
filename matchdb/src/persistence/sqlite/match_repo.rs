//! SQLite-backed repository for enumerated matches.

use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tictactoe::{Outcome, Winner};

use super::helpers::{decode_winner, encode_winner, MatchRow};
use crate::persistence::traits::MatchRepository;
use crate::persistence::{MatchSummary, PersistenceError};

/// Rows per INSERT statement: three binds per row stays under SQLite's
/// historical 999-parameter limit.
const MAX_ROWS_PER_STATEMENT: usize = 300;

/// SQLite implementation of [`MatchRepository`].
pub struct SqliteMatchRepository {
    pool: SqlitePool,
}

impl SqliteMatchRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl MatchRepository for SqliteMatchRepository {
    async fn truncate(&self) -> Result<(), PersistenceError> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM matches")
            .execute(&mut *tx)
            .await?
            .rows_affected();

        // AUTOINCREMENT keeps its high-water mark here; dropping the entry
        // restarts the sequence at 1.
        sqlx::query("DELETE FROM sqlite_sequence WHERE name = 'matches'")
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(deleted, "Cleared match table");
        Ok(())
    }

    async fn insert_batch(&self, rows: &[Outcome]) -> Result<(), PersistenceError> {
        if rows.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        for chunk in rows.chunks(MAX_ROWS_PER_STATEMENT) {
            let mut builder: QueryBuilder<Sqlite> =
                QueryBuilder::new("INSERT INTO matches (id, moves_code, winner) ");
            builder.push_values(chunk, |mut b, row| {
                b.push_bind(row.sequence_id as i64)
                    .push_bind(i64::from(row.moves_code))
                    .push_bind(encode_winner(row.winner));
            });
            builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn summary(&self) -> Result<MatchSummary, PersistenceError> {
        let counts: Vec<(String, i64)> =
            sqlx::query_as("SELECT winner, COUNT(*) FROM matches GROUP BY winner")
                .fetch_all(&self.pool)
                .await?;

        let mut summary = MatchSummary::default();
        for (winner, count) in counts {
            let count = count as u64;
            summary.total += count;
            match decode_winner(&winner) {
                Ok(Winner::X) => summary.x_wins += count,
                Ok(Winner::O) => summary.o_wins += count,
                Ok(Winner::Draw) => summary.draws += count,
                Err(reason) => {
                    tracing::warn!(winner = %winner, count, "Unknown winner in match table: {}", reason)
                }
            }
        }
        Ok(summary)
    }

    async fn load_by_id(&self, id: u64) -> Result<Option<Outcome>, PersistenceError> {
        let row: Option<MatchRow> =
            sqlx::query_as("SELECT id, moves_code, winner FROM matches WHERE id = ?")
                .bind(id as i64)
                .fetch_optional(&self.pool)
                .await?;
        row.map(Outcome::try_from).transpose()
    }

    async fn load_by_code(&self, moves_code: u32) -> Result<Option<Outcome>, PersistenceError> {
        let row: Option<MatchRow> =
            sqlx::query_as("SELECT id, moves_code, winner FROM matches WHERE moves_code = ?")
                .bind(i64::from(moves_code))
                .fetch_optional(&self.pool)
                .await?;
        row.map(Outcome::try_from).transpose()
    }
}
