//! Catalog use-case services.
//!
//! # Responsibility
//! - Compose repository calls with the snapshot-on-every-mutation policy.
//! - Keep UI callers decoupled from SQL and storage details.
//!
//! # Invariants
//! - Every successful mutation is followed by a full snapshot save.
//! - Mutations are serialized through one writer lock.

use crate::db::DbError;
use crate::model::photo::PhotoValidationError;
use crate::repo::RepoError;
use crate::store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod catalog_service;
pub mod import_service;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Why an album order was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlbumOrderError {
    /// Id listed more than once.
    Duplicate(String),
    /// Id does not name an existing album.
    Unknown(String),
    /// Existing album left out of the order.
    Missing(String),
}

impl Display for AlbumOrderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Duplicate(id) => write!(f, "album `{id}` listed more than once"),
            Self::Unknown(id) => write!(f, "album `{id}` does not exist"),
            Self::Missing(id) => write!(f, "album `{id}` missing from order"),
        }
    }
}

/// Service error for catalog use-cases.
#[derive(Debug)]
pub enum ServiceError {
    Validation(PhotoValidationError),
    /// Photo id already present; catalog unchanged.
    DuplicatePhoto(String),
    /// Reorder input is not a permutation of the current album ids.
    InvalidAlbumOrder(AlbumOrderError),
    Repo(RepoError),
    /// Engine or snapshot failure, including schema mismatch at startup.
    Db(DbError),
    /// Blob or snapshot store failure.
    Store(StoreError),
    /// Writer lock poisoned by a panic in another caller.
    Unavailable,
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::DuplicatePhoto(id) => write!(f, "photo already exists: {id}"),
            Self::InvalidAlbumOrder(err) => write!(f, "invalid album order: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Unavailable => write!(f, "catalog unavailable: writer lock poisoned"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PhotoValidationError> for ServiceError {
    fn from(value: PhotoValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::DuplicatePhoto(id) => Self::DuplicatePhoto(id),
            RepoError::Db(err) => Self::Db(err),
            other => Self::Repo(other),
        }
    }
}

impl From<DbError> for ServiceError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for ServiceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}
