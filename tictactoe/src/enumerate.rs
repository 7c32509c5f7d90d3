//! Exhaustive enumeration of every finished tic-tac-toe game.
//!
//! The search is a depth-first backtracking walk over legal move sequences.
//! Candidate cells are tried in ascending order at every depth, which makes
//! the order of emitted outcomes (and so their sequence ids) deterministic.
//! A single board and path are reused for the whole walk; each candidate is
//! undone before its next sibling is tried.

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::moves::MoveSequence;
use crate::types::{Cell, Mark, Winner};

/// One finished game: a win or a draw, identified by its move sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Outcome {
    /// 1-based discovery order.
    pub sequence_id: u64,
    /// Decimal encoding of the move sequence, see [`MoveSequence::moves_code`].
    pub moves_code: u32,
    pub winner: Winner,
}

impl Outcome {
    /// Decode the move sequence this outcome was built from.
    pub fn moves(&self) -> Result<MoveSequence, crate::MovesCodeError> {
        MoveSequence::from_moves_code(self.moves_code)
    }
}

/// Set of cells still open at the current depth, bit `n - 1` for cell `n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Available(u16);

impl Available {
    const ALL: Available = Available(0b1_1111_1111);

    fn without(self, cell: Cell) -> Self {
        Self(self.0 & !(1 << cell.index()))
    }

    /// Open cells in ascending order.
    fn cells(self) -> impl Iterator<Item = Cell> {
        Cell::ALL
            .into_iter()
            .filter(move |c| self.0 & (1 << c.index()) != 0)
    }
}

/// Backtracking search producing one [`Outcome`] per terminal leaf.
///
/// Each instance owns its own id counter, so a fresh enumerator always
/// numbers outcomes from 1.
#[derive(Debug, Default)]
pub struct Enumerator {
    board: Board,
    path: MoveSequence,
    emitted: u64,
}

impl Enumerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk the whole game tree from the empty board, handing every outcome
    /// to `emit` in sequence-id order.
    ///
    /// `emit` may block. If it returns an error the walk stops and the error
    /// is returned. On success, returns the number of outcomes emitted.
    pub fn run<E, F>(mut self, mut emit: F) -> Result<u64, E>
    where
        F: FnMut(Outcome) -> Result<(), E>,
    {
        self.search(Available::ALL, Mark::X, &mut emit)?;
        Ok(self.emitted)
    }

    fn search<E, F>(&mut self, available: Available, turn: Mark, emit: &mut F) -> Result<(), E>
    where
        F: FnMut(Outcome) -> Result<(), E>,
    {
        if self.path.len() == 9 {
            debug_assert!(self.board.is_full());
            return self.emit(Winner::Draw, emit);
        }

        for cell in available.cells() {
            self.board.place(cell, turn);
            self.path.push(cell);

            let result = match self.board.evaluate(cell) {
                Some(mark) => self.emit(Winner::from(mark), emit),
                None => self.search(available.without(cell), turn.opponent(), emit),
            };

            self.path.pop();
            self.board.clear(cell);
            result?;
        }
        Ok(())
    }

    fn emit<E, F>(&mut self, winner: Winner, emit: &mut F) -> Result<(), E>
    where
        F: FnMut(Outcome) -> Result<(), E>,
    {
        self.emitted += 1;
        emit(Outcome {
            sequence_id: self.emitted,
            moves_code: self.path.moves_code(),
            winner,
        })
    }
}

/// Enumerate every outcome into a vector.
pub fn all_outcomes() -> Vec<Outcome> {
    let mut outcomes = Vec::new();
    let result: Result<u64, std::convert::Infallible> = Enumerator::new().run(|o| {
        outcomes.push(o);
        Ok(())
    });
    match result {
        Ok(_) => outcomes,
        Err(never) => match never {},
    }
}
