//! matchdb: builds and queries a database of every finished tic-tac-toe game.
//!
//! - `matchdb rebuild` clears the `matches` table and regenerates it from a
//!   full walk of the game tree, written through the batch writer.
//! - `matchdb info` prints how many stored games each side won.
//! - `matchdb show --id N` / `--code N` prints one stored game and its board.
//!
//! Tunables come from the environment (see `matchdb::config`); a `.env` file
//! in the working directory is loaded first.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tictactoe::{Board, Outcome};

use matchdb::config;
use matchdb::persistence::sqlite::{Database, SqliteMatchRepository};
use matchdb::persistence::MatchRepository;
use matchdb::rebuild::{RebuildCoordinator, RebuildReport};

#[derive(Parser)]
#[command(name = "matchdb", about = "Database of every finished tic-tac-toe game")]
struct Cli {
    /// SQLite database file. Defaults to `matches.db` in the data directory.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clear the database and regenerate every finished game.
    Rebuild {
        /// Number of concurrent batch writers.
        #[arg(long)]
        workers: Option<usize>,
        /// Rows per insert.
        #[arg(long)]
        batch_size: Option<usize>,
        /// Idle time after which a partial batch is written.
        #[arg(long)]
        flush_interval_ms: Option<u64>,
        #[arg(long)]
        json: bool,
    },
    /// Show how many stored games ended in each result.
    Info {
        #[arg(long)]
        json: bool,
    },
    /// Show one stored game.
    Show {
        /// Look up by sequence id.
        #[arg(long, conflicts_with = "code", required_unless_present = "code")]
        id: Option<u64>,
        /// Look up by moves code, e.g. 519372.
        #[arg(long)]
        code: Option<u32>,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct RebuildOutput {
    outcome_count: u64,
    elapsed_seconds: f64,
    flushed_rows: u64,
    failed_batches: u64,
    lost_rows: u64,
}

impl From<&RebuildReport> for RebuildOutput {
    fn from(report: &RebuildReport) -> Self {
        Self {
            outcome_count: report.outcome_count,
            elapsed_seconds: report.elapsed.as_secs_f64(),
            flushed_rows: report.writer.flushed_rows,
            failed_batches: report.writer.failed_batches,
            lost_rows: report.writer.lost_rows,
        }
    }
}

#[derive(Serialize)]
struct MatchView {
    #[serde(flatten)]
    outcome: Outcome,
    moves: Vec<u8>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();

    // Initialize tracing with span durations
    use tracing_subscriber::fmt::format::FmtSpan;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = dotenv {
        if !e.not_found() {
            tracing::warn!("Failed to load .env: {}", e);
        }
    }

    let cli = Cli::parse();
    let db_path = cli.db.unwrap_or_else(config::get_database_path);
    tracing::info!("Using database: {}", db_path.display());

    match cli.command {
        Commands::Rebuild {
            workers,
            batch_size,
            flush_interval_ms,
            json,
        } => {
            let pipeline = config::PipelineConfig::from_env()?.with_overrides(
                workers,
                batch_size,
                flush_interval_ms,
            )?;
            let repo = open_repository(&db_path, pipeline.connection_count()).await?;
            let report = RebuildCoordinator::new(repo, pipeline).rebuild().await?;
            print_rebuild(&report, json)?;
            if !report.is_complete() {
                anyhow::bail!(
                    "rebuild incomplete: {} rows in {} failed batches were not stored",
                    report.writer.lost_rows,
                    report.writer.failed_batches
                );
            }
        }
        Commands::Info { json } => {
            let repo = open_repository(&db_path, 1).await?;
            let summary = repo.summary().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("total matches: {}", summary.total);
                println!("X wins:        {}", summary.x_wins);
                println!("O wins:        {}", summary.o_wins);
                println!("draws:         {}", summary.draws);
            }
        }
        Commands::Show { id, code, json } => {
            let repo = open_repository(&db_path, 1).await?;
            let found = match (id, code) {
                (Some(id), _) => repo.load_by_id(id).await?,
                (None, Some(code)) => repo.load_by_code(code).await?,
                (None, None) => anyhow::bail!("pass --id or --code"),
            };
            let Some(outcome) = found else {
                anyhow::bail!("match not found");
            };
            print_match(&outcome, json)?;
        }
    }

    Ok(())
}

async fn open_repository(
    db_path: &Path,
    max_connections: u32,
) -> anyhow::Result<Arc<SqliteMatchRepository>> {
    let db = Database::open(db_path, max_connections)
        .await
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    Ok(Arc::new(SqliteMatchRepository::new(db.pool().clone())))
}

fn print_rebuild(report: &RebuildReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&RebuildOutput::from(report))?
        );
    } else {
        println!(
            "Generated {} matches in {:.2?}",
            report.outcome_count, report.elapsed
        );
        if report.writer.lost_rows > 0 {
            eprintln!(
                "warning: {} batches failed, {} matches were not stored",
                report.writer.failed_batches, report.writer.lost_rows
            );
        }
    }
    Ok(())
}

fn print_match(outcome: &Outcome, json: bool) -> anyhow::Result<()> {
    let moves = outcome
        .moves()
        .with_context(|| format!("stored match {} has a bad moves code", outcome.sequence_id))?;

    if json {
        let view = MatchView {
            outcome: *outcome,
            moves: moves.iter().map(|c| c.number()).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        println!("match #{}", outcome.sequence_id);
        println!("moves:  {} ({})", moves, outcome.moves_code);
        println!("winner: {}", outcome.winner);
        println!();
        print!("{}", Board::replay(&moves));
    }
    Ok(())
}
