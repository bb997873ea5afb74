//! Catalog use-case service.
//!
//! # Responsibility
//! - Own the one in-memory catalog engine for the lifetime of a library.
//! - Provide ensure-album, add-photo, reorder and gallery read APIs.
//! - Persist a full snapshot after every mutation.
//!
//! # Invariants
//! - Photos are only inserted after their album exists, in one transaction.
//! - A mutation and its snapshot save happen under one writer lock, so two
//!   saves never interleave.
//! - Image bytes go straight to the blob store and never into the catalog.

use crate::db::{CatalogRow, PhotoCatalog};
use crate::media;
use crate::model::album::{Album, AlbumWithPhotos, CategorizedPhoto, CategoryGroup};
use crate::model::photo::{validate_album_id, Photo, PhotoCategory};
use crate::repo::album_repo::SqliteAlbumRepository;
use crate::repo::photo_repo::SqlitePhotoRepository;
use crate::repo::RepoResult;
use crate::service::{AlbumOrderError, ServiceError, ServiceResult};
use crate::store::{BlobStore, SnapshotStore};
use log::{debug, error, info, warn};
use rusqlite::types::Value;
use rusqlite::Connection;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

/// Catalog facade over the engine, the blob store and the snapshot store.
pub struct CatalogService<B: BlobStore, S: SnapshotStore> {
    catalog: Mutex<PhotoCatalog>,
    blobs: B,
    snapshots: S,
}

impl<B: BlobStore, S: SnapshotStore> CatalogService<B, S> {
    /// Loads the last snapshot, or initializes and persists an empty schema.
    ///
    /// # Errors
    /// - `Store` when the snapshot cannot be read or the first save fails.
    /// - `Db` when the stored snapshot is invalid or has another schema
    ///   version. Startup must abort; there is no migration path.
    pub fn open(blobs: B, snapshots: S) -> ServiceResult<Self> {
        let started_at = Instant::now();
        info!("event=catalog_open module=service status=start");

        match load_or_initialize(&snapshots) {
            Ok((catalog, restored)) => {
                info!(
                    "event=catalog_open module=service status=ok restored={} duration_ms={}",
                    restored,
                    started_at.elapsed().as_millis()
                );
                Ok(Self {
                    catalog: Mutex::new(catalog),
                    blobs,
                    snapshots,
                })
            }
            Err(err) => {
                error!(
                    "event=catalog_open module=service status=error duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Persists a final snapshot and hands the stores back.
    pub fn close(self) -> ServiceResult<(B, S)> {
        {
            let catalog = self.lock()?;
            self.persist_locked(&catalog, "close")?;
        }
        info!("event=catalog_close module=service status=ok");
        Ok((self.blobs, self.snapshots))
    }

    /// Returns the album, creating it at the end of the order when absent.
    ///
    /// Idempotent: an existing album is returned unchanged and nothing is
    /// persisted.
    pub fn ensure_album_exists(&self, album_id: &str) -> ServiceResult<Album> {
        validate_album_id(album_id)?;
        let catalog = self.lock()?;
        let (album, created) = ensure_album_row(catalog.connection(), album_id)?;
        if created {
            info!(
                "event=album_create module=service status=ok album={} position={}",
                album.id, album.position
            );
            self.persist_locked(&catalog, "album_create")?;
        }
        Ok(album)
    }

    /// Inserts one photo, creating its album first when needed.
    ///
    /// # Errors
    /// - `Validation` for blank ids.
    /// - `DuplicatePhoto` when the id exists; the catalog is left unchanged.
    pub fn add_photo(&self, photo: &Photo) -> ServiceResult<()> {
        photo.validate()?;
        let mut catalog = self.lock()?;

        if let Err(err) = insert_photo_with_album(&mut catalog, photo) {
            warn!(
                "event=photo_add module=service status=error photo={} album={} error={}",
                photo.id, photo.album, err
            );
            return Err(err);
        }

        info!(
            "event=photo_add module=service status=ok photo={} album={} category={}",
            photo.id,
            photo.album,
            photo.category.map_or("none", PhotoCategory::as_str)
        );
        self.persist_locked(&catalog, "photo_add")
    }

    /// Lists albums by position, each with its photos by `created_at`.
    pub fn list_albums(&self) -> ServiceResult<Vec<AlbumWithPhotos>> {
        let catalog = self.lock()?;
        Ok(list_albums_with_photos(catalog.connection())?)
    }

    /// Groups every photo by category for the category gallery.
    ///
    /// Groups follow `people, animals, plants, other`; empty groups are
    /// omitted and uncategorized photos count as `other`.
    pub fn list_by_category(&self) -> ServiceResult<Vec<CategoryGroup>> {
        let albums = self.list_albums()?;
        let mut groups = PhotoCategory::ALL
            .iter()
            .map(|category| CategoryGroup {
                category: *category,
                photos: Vec::new(),
            })
            .collect::<Vec<_>>();

        for entry in albums {
            for photo in entry.photos {
                let category = photo.category.unwrap_or(PhotoCategory::Other);
                if let Some(group) = groups.iter_mut().find(|group| group.category == category) {
                    group.photos.push(CategorizedPhoto {
                        photo,
                        album_title: entry.album.title.clone(),
                    });
                }
            }
        }

        groups.retain(|group| !group.photos.is_empty());
        Ok(groups)
    }

    /// Rewrites album positions to the 1-based index in `ordered_ids`.
    ///
    /// # Errors
    /// - `InvalidAlbumOrder` unless `ordered_ids` is an exact permutation of
    ///   the current album ids. Nothing is changed in that case.
    pub fn set_album_order<T: AsRef<str>>(&self, ordered_ids: &[T]) -> ServiceResult<()> {
        let mut catalog = self.lock()?;
        let current = SqliteAlbumRepository::new(catalog.connection()).list_album_ids()?;
        if let Err(reason) = check_permutation(&current, ordered_ids) {
            warn!(
                "event=album_reorder module=service status=error error={}",
                reason
            );
            return Err(ServiceError::InvalidAlbumOrder(reason));
        }

        {
            let tx = catalog.transaction()?;
            let albums = SqliteAlbumRepository::new(&tx);
            for (index, id) in ordered_ids.iter().enumerate() {
                albums.set_position(id.as_ref(), index as i64 + 1)?;
            }
            tx.commit()?;
        }

        info!(
            "event=album_reorder module=service status=ok albums={}",
            ordered_ids.len()
        );
        self.persist_locked(&catalog, "album_reorder")
    }

    /// Runs a parameterized statement against the catalog.
    ///
    /// Statements that modify the catalog are followed by a snapshot save.
    pub fn run_query(&self, sql: &str, params: &[Value]) -> ServiceResult<Vec<CatalogRow>> {
        let catalog = self.lock()?;
        let read_only = catalog.is_read_only(sql)?;
        let rows = catalog.execute(sql, params)?;
        if !read_only {
            self.persist_locked(&catalog, "run_query")?;
        }
        Ok(rows)
    }

    pub fn get_photo(&self, photo_id: &str) -> ServiceResult<Option<Photo>> {
        let catalog = self.lock()?;
        Ok(SqlitePhotoRepository::new(catalog.connection()).get_photo(photo_id)?)
    }

    pub fn count_photos(&self) -> ServiceResult<usize> {
        let catalog = self.lock()?;
        Ok(SqlitePhotoRepository::new(catalog.connection()).count_photos()?)
    }

    pub fn count_albums(&self) -> ServiceResult<usize> {
        let catalog = self.lock()?;
        Ok(SqliteAlbumRepository::new(catalog.connection()).count_albums()?)
    }

    /// Current snapshot bytes, without saving them.
    pub fn export_snapshot(&self) -> ServiceResult<Vec<u8>> {
        let catalog = self.lock()?;
        Ok(catalog.export_state()?)
    }

    /// Saves a full snapshot now.
    pub fn persist(&self) -> ServiceResult<()> {
        let catalog = self.lock()?;
        self.persist_locked(&catalog, "explicit")
    }

    /// Stores raw image bytes under the photo id.
    pub fn store_image_blob(&self, photo_id: &str, blob: &[u8]) -> ServiceResult<()> {
        self.blobs.put(photo_id, blob)?;
        Ok(())
    }

    /// Raw image bytes, or `None` when no image is stored for the id.
    pub fn get_image_blob(&self, photo_id: &str) -> ServiceResult<Option<Vec<u8>>> {
        Ok(self.blobs.get(photo_id)?)
    }

    /// A `data:` URL for the photo's image, or `None` so callers can render
    /// a placeholder.
    pub fn get_image_blob_url(&self, photo_id: &str) -> ServiceResult<Option<String>> {
        Ok(self
            .get_image_blob(photo_id)?
            .map(|blob| media::data_url(&blob)))
    }

    pub fn blob_store(&self) -> &B {
        &self.blobs
    }

    pub fn snapshot_store(&self) -> &S {
        &self.snapshots
    }

    fn lock(&self) -> ServiceResult<MutexGuard<'_, PhotoCatalog>> {
        self.catalog.lock().map_err(|_| ServiceError::Unavailable)
    }

    fn persist_locked(&self, catalog: &PhotoCatalog, reason: &'static str) -> ServiceResult<()> {
        let started_at = Instant::now();
        let snapshot = catalog.export_state()?;
        match self.snapshots.save(&snapshot) {
            Ok(()) => {
                debug!(
                    "event=snapshot_persist module=service status=ok reason={} bytes={} duration_ms={}",
                    reason,
                    snapshot.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=snapshot_persist module=service status=error reason={} duration_ms={} error={}",
                    reason,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err.into())
            }
        }
    }
}

fn load_or_initialize<S: SnapshotStore>(snapshots: &S) -> ServiceResult<(PhotoCatalog, bool)> {
    if let Some(snapshot) = snapshots.load()? {
        return Ok((PhotoCatalog::load_from_state(&snapshot)?, true));
    }

    let catalog = PhotoCatalog::new_empty()?;
    snapshots.save(&catalog.export_state()?)?;
    Ok((catalog, false))
}

fn ensure_album_row(conn: &Connection, album_id: &str) -> RepoResult<(Album, bool)> {
    let albums = SqliteAlbumRepository::new(conn);
    if let Some(existing) = albums.get_album(album_id)? {
        return Ok((existing, false));
    }

    let album = Album::implicit(album_id, albums.next_position()?);
    albums.insert_album(&album)?;
    Ok((album, true))
}

fn insert_photo_with_album(catalog: &mut PhotoCatalog, photo: &Photo) -> ServiceResult<()> {
    let tx = catalog.transaction()?;
    ensure_album_row(&tx, &photo.album)?;
    SqlitePhotoRepository::new(&tx).insert_photo(photo)?;
    tx.commit()?;
    Ok(())
}

fn list_albums_with_photos(conn: &Connection) -> RepoResult<Vec<AlbumWithPhotos>> {
    let photos = SqlitePhotoRepository::new(conn);
    SqliteAlbumRepository::new(conn)
        .list_albums()?
        .into_iter()
        .map(|album| -> RepoResult<AlbumWithPhotos> {
            let album_photos = photos.list_photos_in_album(&album.id)?;
            Ok(AlbumWithPhotos {
                album,
                photos: album_photos,
            })
        })
        .collect()
}

fn check_permutation<T: AsRef<str>>(
    current: &[String],
    ordered_ids: &[T],
) -> Result<(), AlbumOrderError> {
    let known = current.iter().map(String::as_str).collect::<HashSet<_>>();
    let mut seen = HashSet::with_capacity(ordered_ids.len());

    for id in ordered_ids {
        let id = id.as_ref();
        if !seen.insert(id) {
            return Err(AlbumOrderError::Duplicate(id.to_string()));
        }
        if !known.contains(id) {
            return Err(AlbumOrderError::Unknown(id.to_string()));
        }
    }

    match current.iter().find(|id| !seen.contains(id.as_str())) {
        Some(missing) => Err(AlbumOrderError::Missing(missing.clone())),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::check_permutation;
    use crate::service::AlbumOrderError;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn permutation_check_accepts_reordering() {
        let current = ids(&["a", "b", "c"]);
        assert!(check_permutation(&current, &["c", "a", "b"]).is_ok());
        assert!(check_permutation::<&str>(&[], &[]).is_ok());
    }

    #[test]
    fn permutation_check_names_the_offending_id() {
        let current = ids(&["a", "b"]);
        assert_eq!(
            check_permutation(&current, &["a", "a"]),
            Err(AlbumOrderError::Duplicate("a".to_string()))
        );
        assert_eq!(
            check_permutation(&current, &["a", "z"]),
            Err(AlbumOrderError::Unknown("z".to_string()))
        );
        assert_eq!(
            check_permutation(&current, &["b"]),
            Err(AlbumOrderError::Missing("a".to_string()))
        );
    }
}
