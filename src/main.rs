//! twarcdb - twarc archive to SQLite loader
//!
//! Main entry point for the twarcdb command-line tool.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use twarcdb::config::Config;
use twarcdb::schema::TABLE_PRIORITY;
use twarcdb::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with_target(false)
        .without_time()
        .init();

    match &cli.command {
        Commands::Ingest(args) => cmd_ingest(&cli, args),
        Commands::Stats(args) => cmd_stats(&cli, args),
        Commands::Completions(args) => cmd_completions(args.clone()),
    }
}

fn resolve_db_path(cli: &Cli, config: &Config) -> PathBuf {
    cli.db.clone().unwrap_or_else(|| config.db_path())
}

fn cmd_ingest(cli: &Cli, args: &cli::IngestArgs) -> Result<()> {
    let config = args
        .config
        .as_ref()
        .map_or_else(Config::load, Config::load_with_file);
    if !config.output.colors {
        colored::control::set_override(false);
    }
    let quiet = cli.quiet || config.output.quiet;

    let source_path = args.folder_path.join(&args.file_name);
    if !source_path.is_file() {
        anyhow::bail!("Source file does not exist: {}", source_path.display());
    }

    let db_path = resolve_db_path(cli, &config);
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !quiet {
        println!("{}", "Ingesting twarc archive...".bold().cyan());
        println!("  Source: {}", source_path.display());
        println!("  Database: {}", db_path.display());
        println!("  Task: {}", args.task);
        println!();
    }

    let mut storage = Storage::open(&db_path)
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;

    let opts = IngestOptions {
        batch_size: args.batch_size.unwrap_or(config.ingest.batch_size),
        task: args.task,
        strict: args.strict || config.ingest.strict,
    };

    let pb = if quiet {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} [{elapsed_precise}]")
                .expect("static template"),
        );
        pb.set_message("Processing batches...");
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    };

    let report = ingest_file(&source_path, &mut storage, &opts)
        .with_context(|| format!("Failed to ingest {}", source_path.display()))?;

    if let Some(pb) = &pb {
        pb.finish_and_clear();
    }

    if !quiet {
        let inserted = &report.inserted;
        println!(
            "  {} {} lines in {} batches",
            "✓".green(),
            format_number(report.lines as i64),
            format_number(report.batches as i64)
        );
        println!("  {} {} authors", "✓".green(), format_number(inserted.authors as i64));
        println!("  {} {} tweets", "✓".green(), format_number(inserted.tweets as i64));
        println!(
            "  {} {} reference mappings (quoted {}, retweeted {}, replied_to {})",
            "✓".green(),
            format_number((inserted.quoted + inserted.retweeted + inserted.replied_to) as i64),
            inserted.quoted,
            inserted.retweeted,
            inserted.replied_to
        );
        println!(
            "  {} {} entity mappings (hashtags {}, cashtags {}, urls {}, mentions {}, annotations {})",
            "✓".green(),
            format_number(
                (inserted.hashtags
                    + inserted.cashtags
                    + inserted.urls
                    + inserted.mentions
                    + inserted.annotations) as i64
            ),
            inserted.hashtags,
            inserted.cashtags,
            inserted.urls,
            inserted.mentions,
            inserted.annotations
        );
        if report.media_seen + report.places_seen + report.polls_seen + report.errors_seen > 0 {
            println!(
                "  {} skipped kinds without a pipeline: {} media, {} places, {} polls, {} errors",
                "-".yellow(),
                report.media_seen,
                report.places_seen,
                report.polls_seen,
                report.errors_seen
            );
        }
        println!();
        println!("{}", "Done.".bold().green());
    }

    Ok(())
}

fn cmd_stats(cli: &Cli, args: &cli::StatsArgs) -> Result<()> {
    let config = Config::load();
    let db_path = resolve_db_path(cli, &config);
    if !db_path.exists() {
        return Err(TwarcDbError::DatabaseNotFound { path: db_path }.into());
    }

    let storage = Storage::open(&db_path)?;

    println!("{}", "Table row counts".bold().cyan());
    for table in TABLE_PRIORITY {
        let count = storage.table_count(table)?;
        if count == 0 && !args.all {
            continue;
        }
        println!("  {table:<28} {}", format_number(count));
    }

    Ok(())
}

fn cmd_completions(args: cli::CompletionsArgs) -> Result<()> {
    let mut cmd = Cli::command();
    generate(args.shell, &mut cmd, "twarcdb", &mut io::stdout());
    Ok(())
}
