//! Photo domain model.
//!
//! # Responsibility
//! - Define photo metadata rows and their semantic category tag.
//! - Validate caller-supplied rows before they reach SQL.
//!
//! # Invariants
//! - `id` and `album` must be non-blank.
//! - `category` is assigned at insert time and never changes afterwards.
//!
//! # See also
//! - crate::classify for how categories are derived from image bytes.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Opaque, globally unique photo identifier. Also the image blob key.
pub type PhotoId = String;

/// Semantic category assigned by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhotoCategory {
    People,
    Animals,
    Plants,
    /// Fallback for unmatched or failed classification.
    Other,
}

impl PhotoCategory {
    /// All categories in gallery display order.
    pub const ALL: [PhotoCategory; 4] = [
        PhotoCategory::People,
        PhotoCategory::Animals,
        PhotoCategory::Plants,
        PhotoCategory::Other,
    ];

    /// Stable storage/label form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::People => "people",
            Self::Animals => "animals",
            Self::Plants => "plants",
            Self::Other => "other",
        }
    }

    /// Parses the storage form; returns `None` for unknown labels.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "people" => Some(Self::People),
            "animals" => Some(Self::Animals),
            "plants" => Some(Self::Plants),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

impl Display for PhotoCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Photo metadata row. Image bytes live in the blob store under `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub id: PhotoId,
    /// Original filename, display-only.
    pub name: String,
    /// Owning album id.
    pub album: String,
    /// Unix epoch milliseconds. Within-album ordering key.
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<PhotoCategory>,
}

impl Photo {
    pub fn new(
        id: impl Into<PhotoId>,
        name: impl Into<String>,
        album: impl Into<String>,
        created_at: i64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            album: album.into(),
            created_at,
            category: None,
        }
    }

    /// Returns a copy tagged with `category`.
    pub fn with_category(mut self, category: PhotoCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Validates identity fields before persistence.
    ///
    /// # Errors
    /// - `EmptyId` when `id` is blank.
    /// - `EmptyAlbum` when `album` is blank.
    pub fn validate(&self) -> Result<(), PhotoValidationError> {
        if self.id.trim().is_empty() {
            return Err(PhotoValidationError::EmptyId);
        }
        validate_album_id(&self.album)
    }
}

/// Validates an album id used for ensure-or-create.
pub fn validate_album_id(album_id: &str) -> Result<(), PhotoValidationError> {
    if album_id.trim().is_empty() {
        return Err(PhotoValidationError::EmptyAlbum);
    }
    Ok(())
}

/// Validation failures for photo and album identity fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoValidationError {
    EmptyId,
    EmptyAlbum,
}

impl Display for PhotoValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "photo id must not be blank"),
            Self::EmptyAlbum => write!(f, "album id must not be blank"),
        }
    }
}

impl Error for PhotoValidationError {}
