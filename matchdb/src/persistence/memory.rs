//! In-memory [`MatchRepository`] used by the writer and rebuild tests.
//!
//! Records every flush so tests can assert on batch boundaries, and can be
//! told to reject batches containing particular ids or to panic on insert.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use tictactoe::{Outcome, Winner};

use super::{MatchRepository, MatchSummary, PersistenceError};

#[derive(Default)]
struct State {
    rows: BTreeMap<u64, Outcome>,
    flushes: Vec<Vec<u64>>,
    failing_ids: HashSet<u64>,
    fail_truncate: bool,
    panic_on_insert: bool,
    truncations: usize,
}

#[derive(Default)]
pub struct MemoryMatchRepository {
    state: Mutex<State>,
}

impl MemoryMatchRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject any batch that contains `id`.
    pub fn fail_batches_containing(&self, id: u64) {
        self.state.lock().unwrap().failing_ids.insert(id);
    }

    pub fn fail_truncate(&self) {
        self.state.lock().unwrap().fail_truncate = true;
    }

    /// Make every `insert_batch` panic, taking down the calling worker.
    pub fn panic_on_insert(&self) {
        self.state.lock().unwrap().panic_on_insert = true;
    }

    /// Ids of every successful flush, in the order the flushes happened.
    pub fn flushes(&self) -> Vec<Vec<u64>> {
        self.state.lock().unwrap().flushes.clone()
    }

    pub fn rows(&self) -> Vec<Outcome> {
        self.state.lock().unwrap().rows.values().copied().collect()
    }

    pub fn truncations(&self) -> usize {
        self.state.lock().unwrap().truncations
    }

    pub fn seed(&self, rows: &[Outcome]) {
        let mut state = self.state.lock().unwrap();
        for row in rows {
            state.rows.insert(row.sequence_id, *row);
        }
    }
}

fn write_failure(reason: &str, id: u64) -> PersistenceError {
    std::io::Error::other(format!("{reason} (id {id})")).into()
}

impl MatchRepository for MemoryMatchRepository {
    async fn truncate(&self) -> Result<(), PersistenceError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_truncate {
            return Err(std::io::Error::other("injected truncate failure").into());
        }
        state.rows.clear();
        state.truncations += 1;
        Ok(())
    }

    async fn insert_batch(&self, rows: &[Outcome]) -> Result<(), PersistenceError> {
        // Checked without holding the guard so the panic does not poison it.
        if self.state.lock().unwrap().panic_on_insert {
            panic!("injected insert panic");
        }

        let mut state = self.state.lock().unwrap();
        if let Some(row) = rows.iter().find(|r| state.failing_ids.contains(&r.sequence_id)) {
            return Err(write_failure("injected insert failure", row.sequence_id));
        }
        if let Some(row) = rows.iter().find(|r| state.rows.contains_key(&r.sequence_id)) {
            return Err(write_failure("duplicate id", row.sequence_id));
        }
        for row in rows {
            state.rows.insert(row.sequence_id, *row);
        }
        state.flushes.push(rows.iter().map(|r| r.sequence_id).collect());
        Ok(())
    }

    async fn summary(&self) -> Result<MatchSummary, PersistenceError> {
        let state = self.state.lock().unwrap();
        let mut summary = MatchSummary::default();
        for row in state.rows.values() {
            summary.total += 1;
            match row.winner {
                Winner::X => summary.x_wins += 1,
                Winner::O => summary.o_wins += 1,
                Winner::Draw => summary.draws += 1,
            }
        }
        Ok(summary)
    }

    async fn load_by_id(&self, id: u64) -> Result<Option<Outcome>, PersistenceError> {
        Ok(self.state.lock().unwrap().rows.get(&id).copied())
    }

    async fn load_by_code(&self, moves_code: u32) -> Result<Option<Outcome>, PersistenceError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .rows
            .values()
            .find(|r| r.moves_code == moves_code)
            .copied())
    }
}
