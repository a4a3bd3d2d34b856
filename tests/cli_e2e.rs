//! End-to-end CLI tests for twarcdb.
//!
//! These tests run the actual twarcdb binary and verify:
//! - Command-line interface behavior
//! - Output format and content
//! - Error handling and messages

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// One search-page line with a retweet and its author.
const SAMPLE_LINE: &str = r#"{"data": [{"id": "1", "author_id": "100", "text": "RT the classics", "referenced_tweets": [{"id": "2", "type": "retweeted"}], "entities": null, "public_metrics": {"retweet_count": 5, "reply_count": 0, "like_count": 0, "quote_count": 0, "impression_count": 10}}], "includes": {"users": [{"id": "100", "name": "Ada", "username": "ada", "public_metrics": {"followers_count": 1, "following_count": 2, "tweet_count": 3, "listed_count": 0}}]}}"#;

fn twarcdb_cmd() -> Command {
    Command::cargo_bin("twarcdb").expect("binary builds")
}

/// Create a source folder containing one JSONL archive.
fn create_archive(lines: &[&str]) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("temp dir");
    let content = lines.join("\n");
    fs::write(dir.path().join("archive.jsonl"), content).expect("write archive");
    let folder = dir.path().to_path_buf();
    (dir, folder)
}

#[test]
fn test_cli_help() {
    twarcdb_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Normalize twarc JSONL archives"))
        .stdout(predicate::str::contains("ingest"))
        .stdout(predicate::str::contains("stats"));
}

#[test]
fn test_cli_version() {
    twarcdb_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("twarcdb"));
}

#[test]
fn test_ingest_missing_source_fails() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("twarcdb.db");

    twarcdb_cmd()
        .args(["--db", db_path.to_str().unwrap(), "ingest"])
        .arg(dir.path())
        .arg("missing.jsonl")
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_ingest_and_stats_round_trip() {
    let (dir, folder) = create_archive(&[SAMPLE_LINE]);
    let db_path = dir.path().join("twarcdb.db");

    twarcdb_cmd()
        .args(["--db", db_path.to_str().unwrap(), "ingest"])
        .arg(&folder)
        .arg("archive.jsonl")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 tweets"));

    twarcdb_cmd()
        .args(["--db", db_path.to_str().unwrap(), "stats"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tweet"))
        .stdout(predicate::str::contains("retweeted_tweet_mapping"));
}

#[test]
fn test_ingest_is_rerunnable() {
    let (dir, folder) = create_archive(&[SAMPLE_LINE]);
    let db_path = dir.path().join("twarcdb.db");

    for _ in 0..2 {
        twarcdb_cmd()
            .args(["--db", db_path.to_str().unwrap(), "--quiet", "ingest"])
            .arg(&folder)
            .arg("archive.jsonl")
            .assert()
            .success();
    }

    twarcdb_cmd()
        .args(["--db", db_path.to_str().unwrap(), "stats", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("author"));
}

#[test]
fn test_ingest_rejects_malformed_line() {
    let (dir, folder) = create_archive(&[SAMPLE_LINE, "{broken"]);
    let db_path = dir.path().join("twarcdb.db");

    twarcdb_cmd()
        .args(["--db", db_path.to_str().unwrap(), "ingest"])
        .arg(&folder)
        .arg("archive.jsonl")
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 2"));
}

#[test]
fn test_stats_without_database_fails() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("nope.db");

    twarcdb_cmd()
        .args(["--db", db_path.to_str().unwrap(), "stats"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No database found"));
}

#[test]
fn test_completions_generate() {
    twarcdb_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("twarcdb"));
}
