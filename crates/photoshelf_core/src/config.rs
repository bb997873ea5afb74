//! Library location and store wiring.
//!
//! # Responsibility
//! - Describe where a library keeps its image blobs and catalog snapshot.
//! - Open a file-backed `CatalogService` from that description.
//! - Wipe a library back to an empty catalog.
//!
//! # Invariants
//! - Image blobs and the snapshot live in separate single-component
//!   directories directly under `root`.

use crate::service::catalog_service::CatalogService;
use crate::service::ServiceResult;
use crate::store::{remove_store_dir, FsBlobStore, FsSnapshotStore, StoreError};
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

pub const DEFAULT_IMAGES_DIR: &str = "images";
pub const DEFAULT_CATALOG_DIR: &str = "catalog";

/// Catalog service backed by local directories.
pub type LocalLibrary = CatalogService<FsBlobStore, FsSnapshotStore>;

/// On-disk layout of one photo library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryConfig {
    pub root: PathBuf,
    #[serde(default = "default_images_dir")]
    pub images_dir: String,
    #[serde(default = "default_catalog_dir")]
    pub catalog_dir: String,
}

impl LibraryConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            images_dir: default_images_dir(),
            catalog_dir: default_catalog_dir(),
        }
    }

    pub fn with_images_dir(mut self, dir: impl Into<String>) -> Self {
        self.images_dir = dir.into();
        self
    }

    pub fn with_catalog_dir(mut self, dir: impl Into<String>) -> Self {
        self.catalog_dir = dir.into();
        self
    }

    pub fn images_path(&self) -> PathBuf {
        self.root.join(&self.images_dir)
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.root.join(&self.catalog_dir)
    }

    /// Checks that both store directories are plain, distinct names.
    ///
    /// # Errors
    /// - `InvalidLayout` for empty, `.`/`..`, nested or absolute names, or
    ///   when images and catalog share a directory.
    pub fn validate(&self) -> Result<(), StoreError> {
        for (label, dir) in [("images", &self.images_dir), ("catalog", &self.catalog_dir)] {
            let mut components = Path::new(dir).components();
            let single_normal = matches!(
                (components.next(), components.next()),
                (Some(Component::Normal(_)), None)
            );
            if !single_normal {
                return Err(StoreError::InvalidLayout(format!(
                    "{label} directory `{dir}` must be a single name under the library root"
                )));
            }
        }
        if self.images_dir == self.catalog_dir {
            return Err(StoreError::InvalidLayout(format!(
                "images and catalog share directory `{}`",
                self.images_dir
            )));
        }
        Ok(())
    }
}

/// Opens (or creates) the library described by `config`.
pub fn open_library(config: &LibraryConfig) -> ServiceResult<LocalLibrary> {
    config.validate()?;
    let blobs = FsBlobStore::open(config.images_path())?;
    let snapshots = FsSnapshotStore::open(config.catalog_path())?;
    CatalogService::open(blobs, snapshots)
}

/// Deletes every image and the catalog snapshot, then opens the library
/// with a freshly persisted empty catalog.
///
/// Handles opened earlier still hold the old catalog in memory and would
/// write it back on their next mutation; drop them first. The library root
/// and anything else in it (such as logs) are left alone.
pub fn clear_library(config: &LibraryConfig) -> ServiceResult<LocalLibrary> {
    config.validate()?;
    for dir in [config.images_path(), config.catalog_path()] {
        if let Err(err) = remove_store_dir(&dir) {
            error!(
                "event=library_clear module=config status=error error={}",
                err
            );
            return Err(err.into());
        }
    }
    info!("event=library_clear module=config status=ok");
    open_library(config)
}

/// Shorthand for [`open_library`] with the default layout.
pub fn open_library_at(root: impl AsRef<Path>) -> ServiceResult<LocalLibrary> {
    open_library(&LibraryConfig::new(root.as_ref()))
}

fn default_images_dir() -> String {
    DEFAULT_IMAGES_DIR.to_string()
}

fn default_catalog_dir() -> String {
    DEFAULT_CATALOG_DIR.to_string()
}
