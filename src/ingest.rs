//! Chunked ingestion driver.
//!
//! Reads a twarc JSONL source in fixed-size line batches, runs each batch
//! through extraction and assembly, and hands the resulting table batches
//! to storage. Batches are processed strictly in source order; the only
//! state carried across batches is the running report.

use crate::assemble::{tweet_object_to_table, user_object_to_table};
use crate::error::{Result, TwarcDbError};
use crate::extract::{TaskType, extract_objects};
use crate::model::{Envelope, ObjectBatches, TableBatches};
use crate::storage::{Storage, StoreCounts};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

/// Default number of source lines per batch.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Knobs for one ingestion run.
#[derive(Debug, Clone, Copy)]
pub struct IngestOptions {
    /// Source lines per batch.
    pub batch_size: usize,
    /// Extraction rules to apply.
    pub task: TaskType,
    /// Validate raw object batches against the registry's field sets.
    pub strict: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            task: TaskType::Search,
            strict: false,
        }
    }
}

/// Outcome of one ingestion run.
#[derive(Debug, Clone, Copy, Default)]
pub struct IngestReport {
    /// Non-empty source lines decoded.
    pub lines: usize,
    /// Batches handed to storage.
    pub batches: usize,
    /// Rows inserted per table (conflict-skipped duplicates excluded).
    pub inserted: StoreCounts,
    /// Objects seen for kinds the pipeline does not normalize yet.
    pub media_seen: usize,
    pub places_seen: usize,
    pub polls_seen: usize,
    pub errors_seen: usize,
}

/// Ingest one twarc JSONL file into storage.
///
/// # Errors
///
/// Fails when the source file is missing or unreadable, when a line cannot
/// be decoded as a twarc envelope (the line number is reported), or when a
/// batch fails assembly or storage. A mid-run failure leaves earlier
/// batches committed; re-running from the start is safe because storage
/// skips duplicate rows.
pub fn ingest_file(path: &Path, storage: &mut Storage, opts: &IngestOptions) -> Result<IngestReport> {
    if !path.is_file() {
        return Err(TwarcDbError::SourceNotFound {
            path: path.to_path_buf(),
        });
    }
    info!(path = %path.display(), task = %opts.task, "ingesting source file");

    let reader = BufReader::new(File::open(path)?);
    let mut report = IngestReport::default();
    let mut batch: Vec<Envelope> = Vec::with_capacity(opts.batch_size.max(1));

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let envelope: Envelope =
            serde_json::from_str(&line).map_err(|e| TwarcDbError::RecordDecode {
                line: idx + 1,
                reason: e.to_string(),
            })?;
        report.lines += 1;
        batch.push(envelope);

        if batch.len() >= opts.batch_size.max(1) {
            process_batch(std::mem::take(&mut batch), storage, opts, &mut report)?;
        }
    }

    if !batch.is_empty() {
        process_batch(batch, storage, opts, &mut report)?;
    }

    info!(
        lines = report.lines,
        batches = report.batches,
        rows = report.inserted.total(),
        "ingestion complete"
    );
    Ok(report)
}

fn process_batch(
    envelopes: Vec<Envelope>,
    storage: &mut Storage,
    opts: &IngestOptions,
    report: &mut IngestReport,
) -> Result<()> {
    let mut objects = ObjectBatches::default();
    extract_objects(opts.task, envelopes, &mut objects);

    report.media_seen += objects.media.len();
    report.places_seen += objects.places.len();
    report.polls_seen += objects.polls.len();
    report.errors_seen += objects.errors.len();
    if objects.media.len() + objects.places.len() + objects.polls.len() > 0 {
        debug!(
            media = objects.media.len(),
            places = objects.places.len(),
            polls = objects.polls.len(),
            "skipping object kinds without a normalization pipeline"
        );
    }

    let mut tables = TableBatches::default();
    user_object_to_table(objects.users, &mut tables, opts.strict)?;
    tweet_object_to_table(objects.tweets, &mut tables, opts.strict)?;

    let counts = storage.store_batches(&tables)?;
    report.batches += 1;
    report.inserted.merge(&counts);
    info!(
        batch = report.batches,
        tweets = counts.tweets,
        authors = counts.authors,
        rows = counts.total(),
        "uploaded batch"
    );

    Ok(())
}
