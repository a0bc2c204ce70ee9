//! Ordered schema steps for the ledger store.
//!
//! # Invariants
//! - `MIGRATIONS` is sorted by strictly increasing `version`, starting at 1.
//! - Pending steps run inside one transaction. A failing step leaves both
//!   the tables and `PRAGMA user_version` as they were.

use crate::db::{DbError, DbResult};
use log::{debug, info};
use rusqlite::Connection;

/// One schema step, identified by the `user_version` it leaves behind.
#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "ledger_tables",
        sql: include_str!("0001_ledger_tables.sql"),
    },
    Migration {
        version: 2,
        name: "nul_free_descriptions",
        sql: include_str!("0002_nul_free_descriptions.sql"),
    },
];

/// Schema version this build migrates to.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Version currently recorded in `PRAGMA user_version`.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

/// Versions `apply_migrations` would run, in order.
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the store is newer than this build.
pub fn pending_versions(conn: &Connection) -> DbResult<Vec<u32>> {
    let current = supported_schema_version(conn)?;
    Ok(pending_after(current)
        .map(|migration| migration.version)
        .collect())
}

/// Brings the schema up to `latest_version()` and returns how many steps ran.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<usize> {
    let current = supported_schema_version(conn)?;
    let steps: Vec<Migration> = pending_after(current).copied().collect();
    if steps.is_empty() {
        return Ok(0);
    }

    let tx = conn.transaction()?;
    for &Migration { version, name, sql } in &steps {
        if let Err(source) = tx.execute_batch(sql) {
            return Err(DbError::Migration {
                version,
                name,
                source,
            });
        }
        tx.pragma_update(None, "user_version", version)?;
        debug!("event=db_migrate_step module=db status=ok version={version} name={name}");
    }
    tx.commit()?;

    let latest = latest_version();
    let applied = steps.len();
    info!("event=db_migrate module=db status=ok from={current} to={latest} steps={applied}");
    Ok(applied)
}

fn supported_schema_version(conn: &Connection) -> DbResult<u32> {
    let current = schema_version(conn)?;
    let latest = latest_version();
    if current > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current,
            latest_supported: latest,
        });
    }
    Ok(current)
}

fn pending_after(current: u32) -> impl Iterator<Item = &'static Migration> {
    MIGRATIONS
        .iter()
        .filter(move |migration| migration.version > current)
}
