//! One-time ingestion of the meteorite CSV into the record store.
//!
//! # Responsibility
//! - Parse the CSV resource and bulk-insert it in one transaction.
//! - Gate loading on an empty store, atomically with respect to other
//!   processes sharing the same database file.
//! - Apply the configured failure policy (best-effort or fail-fast).
//!
//! # Invariants
//! - Loading never runs against a store that already holds records.
//! - A failed load leaves the store exactly as it was before the attempt.

use crate::db::DbError;
use crate::repo::meteorite_repo::{MeteoriteRepository, RepoError, SqliteMeteoriteRepository};
use log::{error, info};
use rusqlite::{Connection, TransactionBehavior};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;

mod csv_source;

pub use csv_source::{parse_meteorites, parse_row, CsvSource, ParsedBatch, BUNDLED_CSV_NAME};

pub type LoadResult<T> = Result<T, LoadError>;

#[derive(Debug)]
pub enum LoadError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Csv(csv::Error),
    Repo(RepoError),
}

impl Display for LoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read `{}`: {source}", path.display())
            }
            Self::Csv(err) => write!(f, "malformed csv: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Csv(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<csv::Error> for LoadError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

impl From<RepoError> for LoadError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for LoadError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(RepoError::Db(DbError::Sqlite(value)))
    }
}

/// What to do when the startup load fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadPolicy {
    /// Log the failure and keep running with the data already stored.
    #[default]
    BestEffort,
    /// Propagate the failure to the caller.
    FailFast,
}

impl LoadPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BestEffort => "best_effort",
            Self::FailFast => "fail_fast",
        }
    }
}

impl FromStr for LoadPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "best_effort" => Ok(Self::BestEffort),
            "fail_fast" => Ok(Self::FailFast),
            other => Err(format!(
                "unsupported load policy `{other}`; expected best_effort|fail_fast"
            )),
        }
    }
}

/// Counts from a completed load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadReport {
    pub inserted: usize,
    pub skipped_rows: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The store already held `existing` records; nothing was read.
    Skipped { existing: u64 },
    Loaded(LoadReport),
    /// The load failed and the failure was swallowed by [`LoadPolicy::BestEffort`].
    Aborted,
}

/// Parses `source` and inserts every record through `repo` in one batch.
pub fn load_into<R: MeteoriteRepository>(repo: &R, source: &CsvSource) -> LoadResult<LoadReport> {
    let text = source.read()?;
    let batch = parse_meteorites(&text)?;
    let inserted = repo.insert_all(&batch.records)?;
    Ok(LoadReport {
        inserted,
        skipped_rows: batch.skipped_rows,
    })
}

/// Loads `source` iff the store is empty.
///
/// The emptiness check and the insert share one IMMEDIATE transaction, so a
/// second process starting against the same file waits for the first one and
/// then observes a populated store.
pub fn load_if_empty(conn: &mut Connection, source: &CsvSource) -> LoadResult<LoadOutcome> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let outcome = {
        let repo = SqliteMeteoriteRepository::new(&tx);
        let existing = repo.count()?;
        if existing > 0 {
            LoadOutcome::Skipped { existing }
        } else {
            LoadOutcome::Loaded(load_into(&repo, source)?)
        }
    };
    tx.commit()?;
    Ok(outcome)
}

/// Startup entry point: [`load_if_empty`] plus logging and failure policy.
///
/// # Errors
/// - Only under [`LoadPolicy::FailFast`]; best-effort failures are logged and
///   reported as [`LoadOutcome::Aborted`].
pub fn run_startup_load(
    conn: &mut Connection,
    source: &CsvSource,
    policy: LoadPolicy,
) -> LoadResult<LoadOutcome> {
    let started_at = Instant::now();
    info!(
        "event=csv_load module=loader status=start source={} policy={}",
        source,
        policy.as_str()
    );

    match load_if_empty(conn, source) {
        Ok(outcome) => {
            match outcome {
                LoadOutcome::Skipped { existing } => info!(
                    "event=csv_load module=loader status=skipped existing={} duration_ms={}",
                    existing,
                    started_at.elapsed().as_millis()
                ),
                LoadOutcome::Loaded(report) => info!(
                    "event=csv_load module=loader status=ok inserted={} skipped_rows={} duration_ms={}",
                    report.inserted,
                    report.skipped_rows,
                    started_at.elapsed().as_millis()
                ),
                LoadOutcome::Aborted => {}
            }
            Ok(outcome)
        }
        Err(err) => {
            error!(
                "event=csv_load module=loader status=error policy={} duration_ms={} error={}",
                policy.as_str(),
                started_at.elapsed().as_millis(),
                err
            );
            match policy {
                LoadPolicy::BestEffort => Ok(LoadOutcome::Aborted),
                LoadPolicy::FailFast => Err(err),
            }
        }
    }
}
