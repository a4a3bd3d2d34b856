//! CLI definitions for twarcdb.
//!
//! Uses clap for argument parsing with derive macros.

use crate::extract::TaskType;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// twarcdb - Load twarc JSONL archives into SQLite
#[derive(Parser, Debug)]
#[command(name = "twarcdb")]
#[command(version)]
#[command(about = "Normalize twarc JSONL archives of Twitter API v2 responses into SQLite")]
#[command(long_about = r#"
twarcdb - Flatten twarc-collected Twitter API v2 responses into a
relational SQLite schema for SQL querying.

Features:
  - Tweets, authors, and per-occurrence entity tables (hashtags,
    cashtags, urls, mentions, annotations)
  - Referenced-tweet mapping tables with a derived tweet_type
    classification (original/quote/retweet/reply and combinations)
  - Chunked ingestion with idempotent re-runs (duplicates are skipped)

Quick start:
  1. Collect data: twarc2 search "rust lang" archive.jsonl
  2. Load it: twarcdb ingest ./ archive.jsonl
  3. Query: sqlite3 twarcdb.db 'SELECT count(*) FROM tweet'
"#)]
pub struct Cli {
    /// Path to the database file
    #[arg(long, env = "TWARCDB_DB", global = true)]
    pub db: Option<PathBuf>,

    /// Be verbose (show debug info)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Be quiet (suppress non-error output)
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest a twarc JSONL file into the database
    Ingest(IngestArgs),

    /// Show per-table row counts
    Stats(StatsArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Folder containing the source file
    pub folder_path: PathBuf,

    /// Name of the JSONL file inside the folder
    pub file_name: String,

    /// The twarc task that produced the file
    #[arg(long, short = 't', value_enum, default_value_t = TaskType::Search)]
    pub task: TaskType,

    /// Path to a configuration file (overrides the user config)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Source lines per batch
    #[arg(long, short = 'b')]
    pub batch_size: Option<usize>,

    /// Validate raw objects against the expected field sets
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Also list tables with zero rows
    #[arg(long)]
    pub all: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
