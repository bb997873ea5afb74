//! Album domain model.
//!
//! # Responsibility
//! - Describe one named, ordered grouping of photos.
//! - Provide the read models used by the gallery views.
//!
//! # Invariants
//! - `id` doubles as the display title for implicitly created albums.
//! - `position` values are unique and dense; they need not start at 0.

use crate::model::photo::{Photo, PhotoCategory};
use serde::{Deserialize, Serialize};

/// Stable album identifier: a `YYYY-MM-DD` date key or an explicit title.
pub type AlbumId = String;

/// Album row as stored in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub id: AlbumId,
    /// Display name.
    pub title: String,
    /// Display order, ascending.
    pub position: i64,
}

impl Album {
    /// Creates an album whose title mirrors its id.
    pub fn implicit(id: impl Into<AlbumId>, position: i64) -> Self {
        let id = id.into();
        Self {
            title: id.clone(),
            id,
            position,
        }
    }
}

/// Album annotated with its photos, ordered by `created_at` ascending.
///
/// This is the read path that drives gallery rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumWithPhotos {
    #[serde(flatten)]
    pub album: Album,
    pub photos: Vec<Photo>,
}

/// Photo projected into the category gallery, tagged with its album title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorizedPhoto {
    #[serde(flatten)]
    pub photo: Photo,
    pub album_title: String,
}

/// One non-empty section of the category gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryGroup {
    pub category: PhotoCategory,
    pub photos: Vec<CategorizedPhoto>,
}
