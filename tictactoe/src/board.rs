use std::fmt;

use crate::moves::MoveSequence;
use crate::types::{Cell, Mark};

/// The eight winning lines as zero-based board indices.
const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// Indices into [`LINES`] for every line passing through each cell.
/// Corners sit on three lines, edges on two, the centre on four.
const LINES_THROUGH: [&[usize]; 9] = [
    &[0, 3, 6],
    &[0, 4],
    &[0, 5, 7],
    &[1, 3],
    &[1, 4, 6, 7],
    &[1, 5],
    &[2, 3, 7],
    &[2, 4],
    &[2, 5, 6],
];

/// A 3x3 board. Each cell is empty or holds a mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Board {
    cells: [Option<Mark>; 9],
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, cell: Cell) -> Option<Mark> {
        self.cells[cell.index()]
    }

    pub fn place(&mut self, cell: Cell, mark: Mark) {
        debug_assert!(self.cells[cell.index()].is_none(), "cell {} already taken", cell);
        self.cells[cell.index()] = Some(mark);
    }

    pub fn clear(&mut self, cell: Cell) {
        self.cells[cell.index()] = None;
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// Decide whether the mark on `last_played` completes a line.
    ///
    /// Only the lines through `last_played` are inspected: a line can only
    /// have just been completed by the most recent move, so callers must not
    /// pass a board that was already won before that move.
    pub fn evaluate(&self, last_played: Cell) -> Option<Mark> {
        let mark = self.cells[last_played.index()];
        debug_assert!(mark.is_some(), "evaluated empty cell {}", last_played);
        let mark = mark?;

        LINES_THROUGH[last_played.index()]
            .iter()
            .map(|&line| LINES[line])
            .any(|line| line.iter().all(|&i| self.cells[i] == Some(mark)))
            .then_some(mark)
    }

    /// Every completed line on the board with the mark that owns it.
    pub fn completed_lines(&self) -> Vec<(Mark, [Cell; 3])> {
        LINES
            .iter()
            .filter_map(|line| {
                let mark = self.cells[line[0]]?;
                line.iter()
                    .all(|&i| self.cells[i] == Some(mark))
                    .then(|| (mark, line.map(|i| Cell::ALL[i])))
            })
            .collect()
    }

    /// Replay a move sequence from the empty board, X first.
    pub fn replay(moves: &MoveSequence) -> Self {
        let mut board = Self::new();
        let mut turn = Mark::X;
        for &cell in moves.iter() {
            board.place(cell, turn);
            turn = turn.opponent();
        }
        board
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row, chunk) in self.cells.chunks(3).enumerate() {
            if row > 0 {
                writeln!(f, "---+---+---")?;
            }
            let cells: Vec<String> = chunk
                .iter()
                .enumerate()
                .map(|(col, c)| match c {
                    Some(mark) => format!(" {} ", mark.as_char()),
                    None => format!(" {} ", row * 3 + col + 1),
                })
                .collect();
            writeln!(f, "{}", cells.join("|"))?;
        }
        Ok(())
    }
}
