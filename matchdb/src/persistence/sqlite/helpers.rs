//! Shared encode/decode helpers for SQLite ↔ domain type conversions.

use tictactoe::{Outcome, Winner};

use crate::persistence::PersistenceError;

/// Row type for match queries, mapped via `sqlx::FromRow`.
#[derive(Debug, sqlx::FromRow)]
pub struct MatchRow {
    pub id: i64,
    pub moves_code: i64,
    pub winner: String,
}

impl TryFrom<MatchRow> for Outcome {
    type Error = PersistenceError;

    fn try_from(row: MatchRow) -> Result<Self, Self::Error> {
        let corrupt = |reason: String| PersistenceError::Corrupt { id: row.id, reason };
        let sequence_id = u64::try_from(row.id).map_err(|_| corrupt("negative id".to_string()))?;
        let moves_code = u32::try_from(row.moves_code)
            .map_err(|_| corrupt(format!("moves code {} out of range", row.moves_code)))?;
        let winner = decode_winner(&row.winner).map_err(corrupt)?;
        Ok(Outcome {
            sequence_id,
            moves_code,
            winner,
        })
    }
}

/// Encode a `Winner` to the string used in the SQLite CHECK.
pub fn encode_winner(winner: Winner) -> &'static str {
    winner.as_str()
}

/// Decode a winner column value.
pub fn decode_winner(s: &str) -> Result<Winner, String> {
    s.parse()
}
