//! Catalog schema bootstrap and verification.
//!
//! # Responsibility
//! - Create `albums` and `photos` on a fresh engine.
//! - Verify that a restored snapshot carries exactly the expected schema.
//!
//! # Invariants
//! - Creation uses `CREATE TABLE IF NOT EXISTS` and is safe to re-run.
//! - The applied version is mirrored to `PRAGMA user_version`.

use crate::db::{DbError, DbResult};
use rusqlite::Connection;

/// Schema version stamped into every snapshot.
pub const SCHEMA_VERSION: u32 = 1;

const SCHEMA_SQL: &str = include_str!("0001_catalog.sql");

const REQUIRED_TABLES: &[&str] = &["albums", "photos"];

/// Applies the catalog schema.
///
/// Re-running on an engine already at [`SCHEMA_VERSION`] is a no-op.
pub fn apply_schema(conn: &mut Connection) -> DbResult<()> {
    let current = current_user_version(conn)?;
    if current != 0 && current != SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            snapshot_version: current,
            expected: SCHEMA_VERSION,
        });
    }

    let tx = conn.transaction()?;
    tx.execute_batch(SCHEMA_SQL)?;
    tx.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION};"))?;
    tx.commit()?;
    Ok(())
}

/// Checks that a restored engine matches the expected schema.
///
/// # Errors
/// - `UnsupportedSchemaVersion` when `user_version` differs.
/// - `MissingRequiredTable` when `albums` or `photos` is absent.
pub fn verify_schema(conn: &Connection) -> DbResult<()> {
    let version = current_user_version(conn)?;
    if version != SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            snapshot_version: version,
            expected: SCHEMA_VERSION,
        });
    }

    for table in REQUIRED_TABLES {
        if !table_exists(conn, table)? {
            return Err(DbError::MissingRequiredTable(*table));
        }
    }
    Ok(())
}

/// Reads `PRAGMA user_version`.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

fn table_exists(conn: &Connection, table: &str) -> DbResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
