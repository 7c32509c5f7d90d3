//! Pure tic-tac-toe logic: board evaluation, move-sequence encoding and the
//! exhaustive game-tree enumeration that feeds the match database.

pub mod board;
pub mod enumerate;
pub mod moves;
pub mod types;

pub use board::Board;
pub use enumerate::{all_outcomes, Enumerator, Outcome};
pub use moves::{MoveSequence, MovesCodeError};
pub use types::{Cell, Mark, Winner};

/// Number of distinct finished games on a 3x3 board.
pub const TOTAL_OUTCOMES: u64 = 255_168;
/// Games won by X.
pub const X_WINS: u64 = 131_184;
/// Games won by O.
pub const O_WINS: u64 = 77_904;
/// Games ending with a full board and no line.
pub const DRAWS: u64 = 46_080;
