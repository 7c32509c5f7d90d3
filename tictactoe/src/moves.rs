//! Move sequences and their decimal "moves code" encoding.
//!
//! A moves code is the sequence's cell numbers written one after another as
//! a decimal number: `[1, 5, 9]` is `159`. Cells are 1-9, so a code never has
//! a zero digit and its digit count equals the sequence length.

use smallvec::SmallVec;
use std::fmt;

use crate::types::Cell;

/// Errors from decoding a moves code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MovesCodeError {
    #[error("moves code must be positive")]
    Empty,
    #[error("moves code {0} contains a zero digit")]
    ZeroDigit(u32),
    #[error("moves code {code} repeats cell {cell}")]
    RepeatedCell { code: u32, cell: u8 },
    #[error("moves code {0} has more than nine moves")]
    TooLong(u32),
}

/// Cells in play order, X first. At most nine, no repeats.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MoveSequence {
    cells: SmallVec<[Cell; 9]>,
}

impl MoveSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub fn last(&self) -> Option<Cell> {
        self.cells.last().copied()
    }

    pub fn contains(&self, cell: Cell) -> bool {
        self.cells.contains(&cell)
    }

    pub fn push(&mut self, cell: Cell) {
        debug_assert!(self.cells.len() < 9, "move sequence overflow");
        debug_assert!(!self.contains(cell), "cell {} played twice", cell);
        self.cells.push(cell);
    }

    pub fn pop(&mut self) -> Option<Cell> {
        self.cells.pop()
    }

    /// The sequence without its final move.
    pub fn prefix(&self) -> MoveSequence {
        let mut cells = self.cells.clone();
        cells.pop();
        Self { cells }
    }

    /// Encode as a decimal moves code. The empty sequence encodes to 0.
    pub fn moves_code(&self) -> u32 {
        self.cells
            .iter()
            .fold(0, |code, cell| code * 10 + u32::from(cell.number()))
    }

    /// Decode a moves code back into the move sequence it was built from.
    pub fn from_moves_code(code: u32) -> Result<Self, MovesCodeError> {
        if code == 0 {
            return Err(MovesCodeError::Empty);
        }

        let mut digits: SmallVec<[u8; 10]> = SmallVec::new();
        let mut rest = code;
        while rest > 0 {
            digits.push((rest % 10) as u8);
            rest /= 10;
        }
        if digits.len() > 9 {
            return Err(MovesCodeError::TooLong(code));
        }

        let mut seq = Self::new();
        for &digit in digits.iter().rev() {
            let cell = Cell::new(digit).ok_or(MovesCodeError::ZeroDigit(code))?;
            if seq.contains(cell) {
                return Err(MovesCodeError::RepeatedCell { code, cell: digit });
            }
            seq.cells.push(cell);
        }
        Ok(seq)
    }
}

impl fmt::Display for MoveSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<String> = self.cells.iter().map(Cell::to_string).collect();
        write!(f, "[{}]", cells.join(", "))
    }
}

impl FromIterator<Cell> for MoveSequence {
    fn from_iter<I: IntoIterator<Item = Cell>>(iter: I) -> Self {
        let mut seq = Self::new();
        for cell in iter {
            seq.push(cell);
        }
        seq
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn seq(cells: &[u8]) -> MoveSequence {
        cells.iter().map(|&n| Cell::new(n).unwrap()).collect()
    }

    #[test]
    fn encodes_digits_in_play_order() {
        assert_eq!(seq(&[1, 5, 9]).moves_code(), 159);
        assert_eq!(seq(&[5, 1, 9, 3]).moves_code(), 5193);
        assert_eq!(seq(&[9, 8, 7, 6, 5, 4, 3, 2, 1]).moves_code(), 987_654_321);
    }

    #[test]
    fn decode_rejects_invalid_codes() {
        assert_eq!(MoveSequence::from_moves_code(0), Err(MovesCodeError::Empty));
        assert_eq!(
            MoveSequence::from_moves_code(105),
            Err(MovesCodeError::ZeroDigit(105))
        );
        assert_eq!(
            MoveSequence::from_moves_code(1551),
            Err(MovesCodeError::RepeatedCell { code: 1551, cell: 5 })
        );
        assert_eq!(
            MoveSequence::from_moves_code(1_234_567_891),
            Err(MovesCodeError::TooLong(1_234_567_891))
        );
    }

    #[test]
    fn prefix_drops_last_move() {
        let s = seq(&[5, 1, 9]);
        assert_eq!(s.prefix(), seq(&[5, 1]));
        assert_eq!(s.last().map(Cell::number), Some(9));
    }

    #[test]
    fn display_lists_cells() {
        assert_eq!(seq(&[1, 5, 9]).to_string(), "[1, 5, 9]");
    }

    proptest! {
        #[test]
        fn moves_code_roundtrip(
            cells in Just((1u8..=9).collect::<Vec<_>>()).prop_shuffle(),
            len in 1usize..=9,
        ) {
            let original = seq(&cells[..len]);
            let code = original.moves_code();
            prop_assert_eq!(code.to_string().len(), len);
            let decoded = MoveSequence::from_moves_code(code).unwrap();
            prop_assert_eq!(decoded, original);
        }
    }
}
