//! In-memory SQLite engine holding the photo catalog.
//!
//! # Responsibility
//! - Create a fresh engine with the catalog schema applied.
//! - Export the full engine to a SQLite file image and restore from one.
//! - Run parameterized statements and return rows as ordered field maps.
//!
//! # Invariants
//! - Returned engines have `foreign_keys=ON` and a verified schema.
//! - Export followed by restore is lossless.
//! - Snapshots are produced and consumed in memory; no file is staged.

use super::schema::{apply_schema, verify_schema};
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::serialize::OwnedData;
use rusqlite::types::Value;
use rusqlite::{ffi, params_from_iter, Connection, DatabaseName, Transaction};
use std::ptr::NonNull;
use std::time::Instant;

const SQLITE_HEADER: &[u8] = b"SQLite format 3\0";
const SQLITE_HEADER_LEN: usize = 100;

/// One result row: column names paired with values, in select order.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogRow {
    fields: Vec<(String, Value)>,
}

impl CatalogRow {
    /// Returns the value of column `name`, if selected.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value)
    }

    /// Column/value pairs in select order.
    pub fn columns(&self) -> &[(String, Value)] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// The relational engine behind the catalog.
pub struct PhotoCatalog {
    conn: Connection,
}

impl PhotoCatalog {
    /// Creates an empty engine with the catalog schema applied.
    ///
    /// # Side effects
    /// - Emits `catalog_init` logging events.
    pub fn new_empty() -> DbResult<Self> {
        let started_at = Instant::now();
        let mut conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        if let Err(err) = apply_schema(&mut conn) {
            error!(
                "event=catalog_init module=db status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err);
        }
        info!(
            "event=catalog_init module=db status=ok duration_ms={}",
            started_at.elapsed().as_millis()
        );
        Ok(Self { conn })
    }

    /// Rebuilds an engine from a snapshot produced by [`Self::export_state`].
    ///
    /// # Errors
    /// - `InvalidSnapshot` when `snapshot` is not a SQLite database image.
    /// - `UnsupportedSchemaVersion` / `MissingRequiredTable` when the image
    ///   does not carry the expected schema.
    pub fn load_from_state(snapshot: &[u8]) -> DbResult<Self> {
        let started_at = Instant::now();
        match restore_connection(snapshot) {
            Ok(conn) => {
                info!(
                    "event=catalog_load module=db status=ok bytes={} duration_ms={}",
                    snapshot.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(Self { conn })
            }
            Err(err) => {
                error!(
                    "event=catalog_load module=db status=error bytes={} duration_ms={} error={}",
                    snapshot.len(),
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Exports the whole engine as a SQLite database file image.
    pub fn export_state(&self) -> DbResult<Vec<u8>> {
        let image = self.conn.serialize(DatabaseName::Main)?;
        Ok(image.to_vec())
    }

    /// Runs one parameterized statement and collects every result row.
    ///
    /// Commands (`INSERT`, `UPDATE`, ...) return an empty row list.
    pub fn execute(&self, sql: &str, params: &[Value]) -> DbResult<Vec<CatalogRow>> {
        let mut stmt = self.conn.prepare(sql)?;
        let columns = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();

        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        let mut result = Vec::new();
        while let Some(row) = rows.next()? {
            let mut fields = Vec::with_capacity(columns.len());
            for (index, column) in columns.iter().enumerate() {
                fields.push((column.clone(), row.get::<_, Value>(index)?));
            }
            result.push(CatalogRow { fields });
        }
        Ok(result)
    }

    /// Returns whether `sql` leaves the engine unchanged.
    pub fn is_read_only(&self, sql: &str) -> DbResult<bool> {
        Ok(self.conn.prepare(sql)?.readonly())
    }

    /// Borrows the underlying connection for typed repository queries.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Starts a transaction; dropping it without commit rolls back.
    pub fn transaction(&mut self) -> DbResult<Transaction<'_>> {
        Ok(self.conn.transaction()?)
    }
}

fn restore_connection(snapshot: &[u8]) -> DbResult<Connection> {
    if snapshot.len() < SQLITE_HEADER_LEN || !snapshot.starts_with(SQLITE_HEADER) {
        return Err(DbError::InvalidSnapshot(format!(
            "expected a SQLite database image, got {} bytes",
            snapshot.len()
        )));
    }

    let mut conn = Connection::open_in_memory()?;
    conn.deserialize(DatabaseName::Main, copy_to_sqlite_heap(snapshot)?, false)?;

    // The image is only parsed on first access; engine errors past this
    // point mean the body is damaged.
    verify_schema(&conn)
        .and_then(|()| Ok(conn.execute_batch("PRAGMA foreign_keys = ON;")?))
        .map_err(|err| match err {
            DbError::Sqlite(inner) => DbError::InvalidSnapshot(inner.to_string()),
            other => other,
        })?;
    Ok(conn)
}

/// Copies `bytes` into a buffer owned by SQLite's allocator, which
/// `deserialize` takes over and frees with the connection.
fn copy_to_sqlite_heap(bytes: &[u8]) -> DbResult<OwnedData> {
    // SAFETY: sqlite3_malloc64 returns null or a block of at least
    // `bytes.len()` bytes.
    let raw = unsafe { ffi::sqlite3_malloc64(bytes.len() as u64) }.cast::<u8>();
    let ptr = NonNull::new(raw).ok_or_else(|| {
        DbError::Sqlite(rusqlite::Error::SqliteFailure(
            ffi::Error::new(ffi::SQLITE_NOMEM),
            Some("cannot allocate snapshot buffer".to_string()),
        ))
    })?;
    // SAFETY: `ptr` is a fresh, non-overlapping allocation of `bytes.len()`
    // bytes from sqlite3_malloc64, as `OwnedData` requires.
    unsafe {
        std::ptr::copy_nonoverlapping(bytes.as_ptr(), ptr.as_ptr(), bytes.len());
        Ok(OwnedData::from_raw_nonnull(ptr, bytes.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::PhotoCatalog;
    use crate::db::DbError;
    use rusqlite::types::Value;

    #[test]
    fn execute_preserves_column_order() {
        let catalog = PhotoCatalog::new_empty().unwrap();
        catalog
            .execute(
                "INSERT INTO albums (id, title, position) VALUES (?1, ?2, ?3);",
                &[
                    Value::Text("2024-01-01".to_string()),
                    Value::Text("New Year".to_string()),
                    Value::Integer(1),
                ],
            )
            .unwrap();

        let rows = catalog
            .execute("SELECT position, title, id FROM albums;", &[])
            .unwrap();
        assert_eq!(rows.len(), 1);
        let names = rows[0]
            .columns()
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["position", "title", "id"]);
        assert_eq!(rows[0].get("title"), Some(&Value::Text("New Year".into())));
        assert_eq!(rows[0].get("missing"), None);
    }

    #[test]
    fn short_blob_is_not_a_snapshot() {
        let err = PhotoCatalog::load_from_state(&[0]).err().unwrap();
        assert!(matches!(err, DbError::InvalidSnapshot(_)));
    }

    #[test]
    fn read_only_detection_distinguishes_queries_from_commands() {
        let catalog = PhotoCatalog::new_empty().unwrap();
        assert!(catalog.is_read_only("SELECT id FROM albums;").unwrap());
        assert!(!catalog
            .is_read_only("UPDATE albums SET position = 1;")
            .unwrap());
    }
}
