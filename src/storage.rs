//! `SQLite` storage for normalized twarc tables.
//!
//! Thin boundary around the relational store: schema DDL, conflict-skip
//! inserts, and row counts. All transformation logic lives upstream in the
//! pipeline; this layer only writes the typed batches it is handed, in
//! registry priority order so parent rows land before rows that reference
//! them.

use crate::error::{Result, TwarcDbError};
use crate::model::{TableBatches, TweetRow};
use crate::schema::{self, TABLE_PRIORITY};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use std::path::Path;
use tracing::{debug, info};

const SCHEMA_VERSION: i32 = 1;

fn parse_rfc3339_opt(value: Option<String>) -> Option<DateTime<Utc>> {
    value
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Rows actually inserted per table by one storage hand-off. Duplicates
/// skipped by conflict-skip semantics are not counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCounts {
    pub authors: usize,
    pub tweets: usize,
    pub quoted: usize,
    pub retweeted: usize,
    pub replied_to: usize,
    pub hashtags: usize,
    pub cashtags: usize,
    pub urls: usize,
    pub mentions: usize,
    pub annotations: usize,
}

impl StoreCounts {
    /// Total rows inserted across all tables.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.authors
            + self.tweets
            + self.quoted
            + self.retweeted
            + self.replied_to
            + self.hashtags
            + self.cashtags
            + self.urls
            + self.mentions
            + self.annotations
    }

    /// Accumulate another hand-off's counts into this one.
    pub fn merge(&mut self, other: &Self) {
        self.authors += other.authors;
        self.tweets += other.tweets;
        self.quoted += other.quoted;
        self.retweeted += other.retweeted;
        self.replied_to += other.replied_to;
        self.hashtags += other.hashtags;
        self.cashtags += other.cashtags;
        self.urls += other.urls;
        self.mentions += other.mentions;
        self.annotations += other.annotations;
    }
}

/// `SQLite` storage manager
pub struct Storage {
    conn: Connection,
}

impl Storage {
    /// Open or create the database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(db_path.as_ref())?;

        // Set pragmas for performance and integrity
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA cache_size = -64000;
            PRAGMA temp_store = MEMORY;
            ",
        )?;

        let storage = Self { conn };
        storage.migrate()?;
        Ok(storage)
    }

    /// Open an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be initialized.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
            ",
        )?;
        let storage = Self { conn };
        storage.migrate()?;
        Ok(storage)
    }

    /// Get a reference to the underlying database connection.
    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }

    fn migrate(&self) -> Result<()> {
        let current_version = self.get_schema_version();

        if current_version < SCHEMA_VERSION {
            info!(
                "Migrating database from version {} to {}",
                current_version, SCHEMA_VERSION
            );
            self.create_schema()?;
            self.set_schema_version(SCHEMA_VERSION)?;
        }

        Ok(())
    }

    fn get_schema_version(&self) -> i32 {
        let result: std::result::Result<i32, _> = self.conn.query_row(
            "SELECT value FROM meta WHERE key = 'schema_version'",
            [],
            |row| {
                let value: String = row.get(0)?;
                Ok(value.parse().unwrap_or(0))
            },
        );

        // Treat a missing meta table as version 0.
        result.unwrap_or_default()
    }

    fn set_schema_version(&self, version: i32) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO meta (key, value) VALUES ('schema_version', ?)",
            params![version.to_string()],
        )?;
        Ok(())
    }

    fn create_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            -- Metadata table
            CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            -- Authors (parent of tweets)
            CREATE TABLE IF NOT EXISTS author (
                id TEXT PRIMARY KEY,
                name TEXT,
                username TEXT,
                created_at TEXT,
                description TEXT,
                location TEXT,
                profile_image_url TEXT,
                url TEXT,
                protected INTEGER,
                verified INTEGER,
                followers_count INTEGER DEFAULT 0,
                following_count INTEGER DEFAULT 0,
                tweet_count INTEGER DEFAULT 0,
                listed_count INTEGER DEFAULT 0
            );

            -- Tweets
            CREATE TABLE IF NOT EXISTS tweet (
                id TEXT PRIMARY KEY,
                author_id TEXT NOT NULL REFERENCES author(id),
                created_at TEXT,
                text TEXT,
                conversation_id TEXT,
                lang TEXT,
                possibly_sensitive INTEGER,
                reply_settings TEXT,
                in_reply_to_user_id TEXT,
                tweet_type INTEGER NOT NULL DEFAULT 0,
                retweet_count INTEGER DEFAULT 0,
                reply_count INTEGER DEFAULT 0,
                like_count INTEGER DEFAULT 0,
                quote_count INTEGER DEFAULT 0,
                impression_count INTEGER DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS idx_tweet_author ON tweet(author_id);
            CREATE INDEX IF NOT EXISTS idx_tweet_conversation ON tweet(conversation_id);
            CREATE INDEX IF NOT EXISTS idx_tweet_type ON tweet(tweet_type);

            -- Reference mappings. "tweet_id" is the referenced tweet and is
            -- deliberately unconstrained: quoted or replied-to tweets may be
            -- deleted and never appear in the tweet table.
            CREATE TABLE IF NOT EXISTS quoted_tweet_mapping (
                tweet_id TEXT NOT NULL,
                id TEXT NOT NULL REFERENCES tweet(id),
                PRIMARY KEY (id, tweet_id)
            );

            CREATE TABLE IF NOT EXISTS retweeted_tweet_mapping (
                tweet_id TEXT NOT NULL,
                id TEXT NOT NULL REFERENCES tweet(id),
                PRIMARY KEY (id, tweet_id)
            );

            CREATE TABLE IF NOT EXISTS replied_to_tweet_mapping (
                id TEXT NOT NULL REFERENCES tweet(id),
                tweet_id TEXT NOT NULL,
                in_reply_to_user_id TEXT,
                PRIMARY KEY (id, tweet_id)
            );

            -- Entity mappings, one row per occurrence. The span uniqueness
            -- keeps re-ingestion idempotent under INSERT OR IGNORE.
            CREATE TABLE IF NOT EXISTS hashtags_tweet_mapping (
                tweet_id TEXT NOT NULL REFERENCES tweet(id),
                start INTEGER NOT NULL DEFAULT 0,
                "end" INTEGER NOT NULL DEFAULT 0,
                tag TEXT,
                UNIQUE (tweet_id, start, "end")
            );

            CREATE TABLE IF NOT EXISTS cashtags_tweet_mapping (
                tweet_id TEXT NOT NULL REFERENCES tweet(id),
                start INTEGER NOT NULL DEFAULT 0,
                "end" INTEGER NOT NULL DEFAULT 0,
                tag TEXT,
                UNIQUE (tweet_id, start, "end")
            );

            CREATE TABLE IF NOT EXISTS urls_tweet_mapping (
                tweet_id TEXT NOT NULL REFERENCES tweet(id),
                start INTEGER NOT NULL DEFAULT 0,
                "end" INTEGER NOT NULL DEFAULT 0,
                url TEXT,
                expanded_url TEXT,
                display_url TEXT,
                UNIQUE (tweet_id, start, "end")
            );

            -- author_id is the mentioned user and may never appear in the
            -- author table (suspended or deleted accounts); no FK.
            CREATE TABLE IF NOT EXISTS mentions_tweet_mapping (
                tweet_id TEXT NOT NULL REFERENCES tweet(id),
                start INTEGER NOT NULL DEFAULT 0,
                "end" INTEGER NOT NULL DEFAULT 0,
                username TEXT,
                author_id TEXT,
                UNIQUE (tweet_id, start, "end")
            );

            CREATE TABLE IF NOT EXISTS annotations_tweet_mapping (
                tweet_id TEXT NOT NULL REFERENCES tweet(id),
                start INTEGER NOT NULL DEFAULT 0,
                "end" INTEGER NOT NULL DEFAULT 0,
                probability REAL,
                type TEXT,
                normalized_text TEXT,
                UNIQUE (tweet_id, start, "end", type)
            );

            -- Placeholder tables reserved in the upload priority order;
            -- not populated by the current pipeline.
            CREATE TABLE IF NOT EXISTS media (
                media_key TEXT PRIMARY KEY,
                type TEXT,
                url TEXT,
                preview_image_url TEXT,
                duration_ms INTEGER,
                height INTEGER,
                width INTEGER,
                alt_text TEXT
            );

            CREATE TABLE IF NOT EXISTS places (
                id TEXT PRIMARY KEY,
                full_name TEXT,
                name TEXT,
                country TEXT,
                country_code TEXT,
                place_type TEXT
            );

            CREATE TABLE IF NOT EXISTS polls (
                id TEXT PRIMARY KEY,
                duration_minutes INTEGER,
                end_datetime TEXT,
                voting_status TEXT
            );

            CREATE TABLE IF NOT EXISTS errors (
                value TEXT,
                detail TEXT,
                title TEXT,
                resource_type TEXT,
                parameter TEXT,
                resource_id TEXT,
                type TEXT
            );
            "#,
        )?;

        Ok(())
    }

    /// Write one assembled batch, tables in registry priority order, inside
    /// a single transaction. Duplicate rows are skipped, not errors, so
    /// re-running ingestion over already-loaded data is safe.
    ///
    /// # Errors
    ///
    /// Returns an error if any insert fails (including foreign-key
    /// violations from a tweet whose author is absent).
    pub fn store_batches(&mut self, batches: &TableBatches) -> Result<StoreCounts> {
        let mut counts = StoreCounts::default();
        if batches.is_empty() {
            return Ok(counts);
        }

        let tx = self.conn.transaction()?;

        {
            let mut stmt = tx.prepare_cached(&insert_sql("author")?)?;
            for row in &batches.authors {
                counts.authors += stmt.execute(params![
                    row.id,
                    row.name,
                    row.username,
                    row.created_at.map(|dt| dt.to_rfc3339()),
                    row.description,
                    row.location,
                    row.profile_image_url,
                    row.url,
                    row.protected.map(i32::from),
                    row.verified.map(i32::from),
                    row.followers_count,
                    row.following_count,
                    row.tweet_count,
                    row.listed_count,
                ])?;
            }

            let mut stmt = tx.prepare_cached(&insert_sql("tweet")?)?;
            for row in &batches.tweets {
                counts.tweets += stmt.execute(params![
                    row.id,
                    row.author_id,
                    row.created_at.map(|dt| dt.to_rfc3339()),
                    row.text,
                    row.conversation_id,
                    row.lang,
                    row.possibly_sensitive.map(i32::from),
                    row.reply_settings,
                    row.in_reply_to_user_id,
                    row.tweet_type,
                    row.retweet_count,
                    row.reply_count,
                    row.like_count,
                    row.quote_count,
                    row.impression_count,
                ])?;
            }

            let mut stmt = tx.prepare_cached(&insert_sql("quoted_tweet_mapping")?)?;
            for row in &batches.quoted {
                counts.quoted += stmt.execute(params![row.tweet_id, row.id])?;
            }

            let mut stmt = tx.prepare_cached(&insert_sql("retweeted_tweet_mapping")?)?;
            for row in &batches.retweeted {
                counts.retweeted += stmt.execute(params![row.tweet_id, row.id])?;
            }

            let mut stmt = tx.prepare_cached(&insert_sql("replied_to_tweet_mapping")?)?;
            for row in &batches.replied_to {
                counts.replied_to +=
                    stmt.execute(params![row.id, row.tweet_id, row.in_reply_to_user_id])?;
            }

            let mut stmt = tx.prepare_cached(&insert_sql("hashtags_tweet_mapping")?)?;
            for row in &batches.hashtags {
                counts.hashtags +=
                    stmt.execute(params![row.tweet_id, row.start, row.end, row.tag])?;
            }

            let mut stmt = tx.prepare_cached(&insert_sql("cashtags_tweet_mapping")?)?;
            for row in &batches.cashtags {
                counts.cashtags +=
                    stmt.execute(params![row.tweet_id, row.start, row.end, row.tag])?;
            }

            let mut stmt = tx.prepare_cached(&insert_sql("urls_tweet_mapping")?)?;
            for row in &batches.urls {
                counts.urls += stmt.execute(params![
                    row.tweet_id,
                    row.start,
                    row.end,
                    row.url,
                    row.expanded_url,
                    row.display_url,
                ])?;
            }

            let mut stmt = tx.prepare_cached(&insert_sql("mentions_tweet_mapping")?)?;
            for row in &batches.mentions {
                counts.mentions += stmt.execute(params![
                    row.tweet_id,
                    row.start,
                    row.end,
                    row.username,
                    row.author_id,
                ])?;
            }

            let mut stmt = tx.prepare_cached(&insert_sql("annotations_tweet_mapping")?)?;
            for row in &batches.annotations {
                counts.annotations += stmt.execute(params![
                    row.tweet_id,
                    row.start,
                    row.end,
                    row.probability,
                    row.annotation_type,
                    row.normalized_text,
                ])?;
            }
        }

        tx.commit()?;
        debug!(rows = counts.total(), "stored batch");
        Ok(counts)
    }

    /// Row count of one known table.
    ///
    /// # Errors
    ///
    /// Returns [`TwarcDbError::UnknownTable`] for names outside the
    /// registry's priority list.
    pub fn table_count(&self, table: &str) -> Result<i64> {
        if !TABLE_PRIORITY.contains(&table) {
            return Err(TwarcDbError::UnknownTable {
                table: table.to_string(),
            });
        }
        let count =
            self.conn
                .query_row(&format!("SELECT COUNT(*) FROM \"{table}\""), [], |row| {
                    row.get(0)
                })?;
        Ok(count)
    }

    /// Fetch a single tweet row by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_tweet(&self, id: &str) -> Result<Option<TweetRow>> {
        let result = self.conn.query_row(
            "SELECT id, author_id, created_at, text, conversation_id, lang,
                    possibly_sensitive, reply_settings, in_reply_to_user_id,
                    tweet_type, retweet_count, reply_count, like_count,
                    quote_count, impression_count
             FROM tweet WHERE id = ?",
            params![id],
            |row| {
                Ok(TweetRow {
                    id: row.get(0)?,
                    author_id: row.get(1)?,
                    created_at: parse_rfc3339_opt(row.get(2)?),
                    text: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                    conversation_id: row.get(4)?,
                    lang: row.get(5)?,
                    possibly_sensitive: row.get::<_, Option<i32>>(6)?.map(|v| v != 0),
                    reply_settings: row.get(7)?,
                    in_reply_to_user_id: row.get(8)?,
                    tweet_type: row.get(9)?,
                    retweet_count: row.get(10)?,
                    reply_count: row.get(11)?,
                    like_count: row.get(12)?,
                    quote_count: row.get(13)?,
                    impression_count: row.get(14)?,
                })
            },
        );

        match result {
            Ok(tweet) => Ok(Some(tweet)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Conflict-skip INSERT statement for a registry table, columns in the
/// registry's declared order. Identifiers are quoted ("end" is a keyword).
fn insert_sql(table: &str) -> Result<String> {
    let columns = schema::table_columns(table).ok_or_else(|| TwarcDbError::UnknownTable {
        table: table.to_string(),
    })?;
    let column_list: Vec<String> = columns.iter().map(|c| format!("\"{c}\"")).collect();
    let placeholders: Vec<&str> = columns.iter().map(|_| "?").collect();
    Ok(format!(
        "INSERT OR IGNORE INTO \"{table}\" ({}) VALUES ({})",
        column_list.join(", "),
        placeholders.join(", ")
    ))
}
