//! Relational catalog engine and snapshot codec.
//!
//! # Responsibility
//! - Own the in-memory SQLite engine holding `albums` and `photos`.
//! - Serialize the whole engine to a snapshot blob and rebuild it from one.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - Snapshots of any other schema version are rejected; there is no
//!   migration path.
//! - Application data is never read or written before the schema is ready.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod catalog;
pub mod schema;

pub use catalog::{CatalogRow, PhotoCatalog};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// Blob is not a SQLite database image.
    InvalidSnapshot(String),
    UnsupportedSchemaVersion {
        snapshot_version: u32,
        expected: u32,
    },
    MissingRequiredTable(&'static str),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::InvalidSnapshot(message) => write!(f, "invalid catalog snapshot: {message}"),
            Self::UnsupportedSchemaVersion {
                snapshot_version,
                expected,
            } => write!(
                f,
                "catalog snapshot schema version {snapshot_version} does not match expected {expected}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "catalog snapshot is missing table `{table}`")
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::InvalidSnapshot(_) => None,
            Self::UnsupportedSchemaVersion { .. } => None,
            Self::MissingRequiredTable(_) => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
