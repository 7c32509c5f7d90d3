//! Builds and queries a database of every finished tic-tac-toe game.
//!
//! The rebuild pipeline is [`rebuild::RebuildCoordinator`]: it clears the
//! store, walks the game tree from [`tictactoe`], and streams every outcome
//! through a [`writer::BatchWriter`] into a [`persistence::MatchRepository`].

pub mod config;
pub mod persistence;
pub mod rebuild;
pub mod writer;
