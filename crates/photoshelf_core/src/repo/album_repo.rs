//! Album persistence.
//!
//! # Invariants
//! - Listing is deterministic: `position ASC, id ASC`.
//! - New albums are appended after the current maximum position.

use crate::model::album::Album;
use crate::repo::RepoResult;
use rusqlite::{params, Connection, OptionalExtension, Row};

const ALBUM_SELECT_SQL: &str = "SELECT id, title, position FROM albums";

/// SQLite-backed album repository.
pub struct SqliteAlbumRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAlbumRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn get_album(&self, id: &str) -> RepoResult<Option<Album>> {
        let album = self
            .conn
            .query_row(
                &format!("{ALBUM_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_album_row,
            )
            .optional()?;
        Ok(album)
    }

    /// Returns `max(position) + 1`, or `1` for an empty catalog.
    pub fn next_position(&self) -> RepoResult<i64> {
        let next = self.conn.query_row(
            "SELECT COALESCE(MAX(position), 0) + 1 FROM albums;",
            [],
            |row| row.get(0),
        )?;
        Ok(next)
    }

    pub fn insert_album(&self, album: &Album) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO albums (id, title, position) VALUES (?1, ?2, ?3);",
            params![album.id, album.title, album.position],
        )?;
        Ok(())
    }

    pub fn list_albums(&self) -> RepoResult<Vec<Album>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ALBUM_SELECT_SQL} ORDER BY position ASC, id ASC;"))?;
        let albums = stmt
            .query_map([], parse_album_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(albums)
    }

    pub fn list_album_ids(&self) -> RepoResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM albums ORDER BY position ASC, id ASC;")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    pub fn set_position(&self, id: &str, position: i64) -> RepoResult<()> {
        self.conn.execute(
            "UPDATE albums SET position = ?2 WHERE id = ?1;",
            params![id, position],
        )?;
        Ok(())
    }

    pub fn count_albums(&self) -> RepoResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM albums;", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn parse_album_row(row: &Row<'_>) -> rusqlite::Result<Album> {
    Ok(Album {
        id: row.get("id")?,
        title: row.get("title")?,
        position: row.get("position")?,
    })
}
