//! Image import use-case service.
//!
//! # Responsibility
//! - Turn user-supplied image files into catalog photos plus image blobs.
//! - Derive the album date key and the semantic category for each file.
//!
//! # Invariants
//! - Non-image files are skipped, never inserted.
//! - The blob is stored before the photo row, so a listed photo always has
//!   bytes behind it.
//! - Classification failures never block an import.

use crate::classify::Classifier;
use crate::media::sniff_image_mime;
use crate::model::photo::Photo;
use crate::service::catalog_service::CatalogService;
use crate::service::ServiceResult;
use crate::store::{BlobStore, SnapshotStore};
use chrono::{Local, TimeZone, Utc};
use log::{info, warn};
use std::fmt::Display;
use uuid::Uuid;

/// One file handed over by the UI for import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingImage {
    /// Original filename.
    pub name: String,
    pub bytes: Vec<u8>,
    /// File modification time, Unix epoch milliseconds.
    pub last_modified_ms: i64,
    /// Declared MIME type, when the host knows it.
    pub mime_type: Option<String>,
}

/// Outcome of one import batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Inserted photos, in input order.
    pub imported: Vec<Photo>,
    /// Names of skipped files.
    pub skipped: Vec<String>,
}

/// Import facade combining the catalog with the classifier.
pub struct ImportService<'svc, B: BlobStore, S: SnapshotStore> {
    catalog: &'svc CatalogService<B, S>,
    classifier: &'svc Classifier,
}

impl<'svc, B: BlobStore, S: SnapshotStore> ImportService<'svc, B, S> {
    pub fn new(catalog: &'svc CatalogService<B, S>, classifier: &'svc Classifier) -> Self {
        Self {
            catalog,
            classifier,
        }
    }

    /// Imports files stamped with the current time, keyed by local dates.
    pub fn import(&self, files: &[IncomingImage]) -> ServiceResult<ImportReport> {
        self.import_at(files, Utc::now().timestamp_millis(), &Local)
    }

    /// Imports files with an explicit import time and album time zone.
    ///
    /// Stops at the first storage or catalog failure; files before it stay
    /// imported.
    pub fn import_at<Tz>(
        &self,
        files: &[IncomingImage],
        now_ms: i64,
        tz: &Tz,
    ) -> ServiceResult<ImportReport>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let mut report = ImportReport::default();

        for file in files {
            if !is_image(file) {
                info!("event=import_skip module=import reason=not_image");
                report.skipped.push(file.name.clone());
                continue;
            }

            let Some(album) =
                album_key_for(file.last_modified_ms, tz).or_else(|| album_key_for(now_ms, tz))
            else {
                warn!("event=import_skip module=import reason=invalid_timestamp");
                report.skipped.push(file.name.clone());
                continue;
            };

            let id = new_photo_id();
            let category = self.classifier.classify(&file.bytes);
            let photo = Photo::new(id, file.name.clone(), album, now_ms).with_category(category);

            self.catalog.store_image_blob(&photo.id, &file.bytes)?;
            self.catalog.add_photo(&photo)?;
            report.imported.push(photo);
        }

        info!(
            "event=import module=import status=ok imported={} skipped={}",
            report.imported.len(),
            report.skipped.len()
        );
        Ok(report)
    }
}

/// Formats `timestamp_ms` as a `YYYY-MM-DD` album key in `tz`.
///
/// Returns `None` for timestamps outside the representable range.
pub fn album_key_for<Tz>(timestamp_ms: i64, tz: &Tz) -> Option<String>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    tz.timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|moment| moment.format("%Y-%m-%d").to_string())
}

/// Generates an opaque random photo id.
pub fn new_photo_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn is_image(file: &IncomingImage) -> bool {
    match file.mime_type.as_deref() {
        Some(mime) => mime.starts_with("image/"),
        None => sniff_image_mime(&file.bytes).is_some(),
    }
}

#[cfg(test)]
mod tests {
    use super::{album_key_for, is_image, new_photo_id, IncomingImage};
    use chrono::{FixedOffset, Utc};

    fn file(mime_type: Option<&str>, bytes: &[u8]) -> IncomingImage {
        IncomingImage {
            name: "a.png".to_string(),
            bytes: bytes.to_vec(),
            last_modified_ms: 0,
            mime_type: mime_type.map(str::to_string),
        }
    }

    #[test]
    fn album_key_uses_the_given_time_zone() {
        // 2024-01-01T23:30:00Z
        let ts = 1_704_151_800_000;
        assert_eq!(album_key_for(ts, &Utc).as_deref(), Some("2024-01-01"));
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!(album_key_for(ts, &plus_two).as_deref(), Some("2024-01-02"));
    }

    #[test]
    fn out_of_range_timestamp_has_no_album_key() {
        assert_eq!(album_key_for(i64::MAX, &Utc), None);
    }

    #[test]
    fn declared_mime_wins_over_sniffing() {
        assert!(is_image(&file(Some("image/heic"), b"ftypheic")));
        assert!(!is_image(&file(Some("text/plain"), b"\x89PNG\r\n\x1a\n")));
        assert!(is_image(&file(None, b"\x89PNG\r\n\x1a\n")));
        assert!(!is_image(&file(None, b"hello")));
    }

    #[test]
    fn photo_ids_are_unique_hex() {
        let first = new_photo_id();
        let second = new_photo_id();
        assert_eq!(first.len(), 32);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(first, second);
    }
}
