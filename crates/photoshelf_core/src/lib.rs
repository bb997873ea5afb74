//! Core catalog logic for PhotoShelf.
//! This crate owns album/photo invariants and the local persistence policy.

pub mod classify;
pub mod config;
pub mod db;
pub mod logging;
pub mod media;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use classify::{categorize, Classifier, ClassifierError, ImageLabeler, Prediction};
pub use config::{clear_library, open_library, open_library_at, LibraryConfig, LocalLibrary};
pub use db::{CatalogRow, DbError, PhotoCatalog};
pub use logging::{default_log_level, init_library_logging, init_logging, logging_status};
pub use model::album::{Album, AlbumWithPhotos, CategorizedPhoto, CategoryGroup};
pub use model::photo::{Photo, PhotoCategory, PhotoValidationError};
pub use repo::RepoError;
pub use service::catalog_service::CatalogService;
pub use service::import_service::{album_key_for, ImportReport, ImportService, IncomingImage};
pub use service::{AlbumOrderError, ServiceError, ServiceResult};
pub use store::{
    BlobStore, FsBlobStore, FsSnapshotStore, MemoryBlobStore, MemorySnapshotStore, SnapshotStore,
    StoreError,
};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
