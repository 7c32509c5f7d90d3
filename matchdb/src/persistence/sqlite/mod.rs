//! SQLite-backed match storage.
//!
//! ## Database setup
//!
//! [`Database`] wraps a `sqlx::SqlitePool` configured with:
//! - **WAL mode** so lookups can run while a rebuild is writing.
//! - **Embedded migrations**: `sqlx::migrate!` runs `migrations/001_matches.sql`
//!   when [`Database::open`] is called. The schema is idempotent.
//!
//! ## Repository
//!
//! [`SqliteMatchRepository`] holds a clone of the pool and implements
//! [`crate::persistence::MatchRepository`]. The `winner` column is `TEXT`
//! constrained to `X`, `O` or `D` and round-tripped through [`helpers`].

mod database;
pub(crate) mod helpers;
mod match_repo;

pub use database::Database;
pub use match_repo::SqliteMatchRepository;
