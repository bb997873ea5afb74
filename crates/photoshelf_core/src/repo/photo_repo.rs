//! Photo persistence.
//!
//! # Invariants
//! - Album listing order is `created_at ASC`, ties broken by insertion order.
//! - Duplicate ids surface as `RepoError::DuplicatePhoto`.

use crate::model::photo::{Photo, PhotoCategory};
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, ErrorCode, Row};

const PHOTO_SELECT_SQL: &str = "SELECT id, name, album, created_at, category FROM photos";

/// SQLite-backed photo repository.
pub struct SqlitePhotoRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePhotoRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Inserts one photo row. The owning album must already exist.
    pub fn insert_photo(&self, photo: &Photo) -> RepoResult<()> {
        let inserted = self.conn.execute(
            "INSERT INTO photos (id, name, album, created_at, category)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                photo.id,
                photo.name,
                photo.album,
                photo.created_at,
                photo.category.map(PhotoCategory::as_str),
            ],
        );

        match inserted {
            Ok(_) => Ok(()),
            Err(err) if is_primary_key_violation(&err) => {
                Err(RepoError::DuplicatePhoto(photo.id.clone()))
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn get_photo(&self, id: &str) -> RepoResult<Option<Photo>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PHOTO_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_photo_row(row)?));
        }
        Ok(None)
    }

    pub fn list_photos_in_album(&self, album_id: &str) -> RepoResult<Vec<Photo>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PHOTO_SELECT_SQL} WHERE album = ?1 ORDER BY created_at ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([album_id])?;
        let mut photos = Vec::new();
        while let Some(row) = rows.next()? {
            photos.push(parse_photo_row(row)?);
        }
        Ok(photos)
    }

    pub fn count_photos(&self) -> RepoResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM photos;", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn parse_photo_row(row: &Row<'_>) -> RepoResult<Photo> {
    let category = match row.get::<_, Option<String>>("category")? {
        Some(value) => Some(PhotoCategory::parse(&value).ok_or_else(|| {
            RepoError::InvalidData(format!("invalid category `{value}` in photos.category"))
        })?),
        None => None,
    };

    Ok(Photo {
        id: row.get("id")?,
        name: row.get("name")?,
        album: row.get("album")?,
        created_at: row.get("created_at")?,
        category,
    })
}

fn is_primary_key_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation
                && failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}
