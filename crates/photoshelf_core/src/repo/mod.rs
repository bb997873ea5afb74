//! Repository layer over the catalog engine.
//!
//! # Responsibility
//! - Keep SQL for `albums` and `photos` inside one persistence boundary.
//! - Translate engine failures into semantic errors (`DuplicatePhoto`).
//!
//! # Invariants
//! - All statements are parameterized; caller text is never spliced into SQL.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod album_repo;
pub mod photo_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for catalog persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Insert rejected by the photo id uniqueness constraint.
    DuplicatePhoto(String),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::DuplicatePhoto(id) => write!(f, "photo already exists: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted catalog data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::DuplicatePhoto(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
