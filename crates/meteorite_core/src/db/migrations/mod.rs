//! Schema migrations for the meteorite store.
//!
//! # Responsibility
//! - Bring a fresh or older database file up to the schema this build expects.
//!
//! # Invariants
//! - Steps are ordered by version; the applied version lives in `PRAGMA user_version`.
//! - A database newer than this build is rejected untouched.
//! - All pending steps commit together or not at all.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::{Connection, TransactionBehavior};

struct SchemaStep {
    version: u32,
    label: &'static str,
    ddl: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[SchemaStep {
    version: 1,
    label: "meteorites_table",
    ddl: include_str!("0001_meteorites.sql"),
}];

/// Schema version this build writes.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |step| step.version)
}

/// Schema version recorded in the opened database.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?)
}

/// Runs every step newer than the recorded schema version.
///
/// The version is re-read under the write lock, so processes opening the
/// same file concurrently apply each step exactly once.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let to = latest_version();
    if check_supported(schema_version(conn)?, to)? == to {
        return Ok(());
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let from = check_supported(schema_version(&tx)?, to)?;
    for step in SCHEMA_STEPS.iter().filter(|step| step.version > from) {
        tx.execute_batch(step.ddl)?;
        tx.pragma_update(None, "user_version", step.version)?;
        info!(
            "event=db_migrate module=db status=ok version={} step={}",
            step.version, step.label
        );
    }
    tx.commit()?;
    Ok(())
}

fn check_supported(db_version: u32, latest_supported: u32) -> DbResult<u32> {
    if db_version > latest_supported {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        });
    }
    Ok(db_version)
}
