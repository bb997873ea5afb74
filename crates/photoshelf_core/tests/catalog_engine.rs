use photoshelf_core::db::schema::{current_user_version, SCHEMA_VERSION};
use photoshelf_core::db::{DbError, PhotoCatalog};
use rusqlite::types::Value;
use rusqlite::Connection;

#[test]
fn new_empty_catalog_has_schema_and_no_rows() {
    let catalog = PhotoCatalog::new_empty().unwrap();

    assert_eq!(
        current_user_version(catalog.connection()).unwrap(),
        SCHEMA_VERSION
    );
    assert_table_exists(catalog.connection(), "albums");
    assert_table_exists(catalog.connection(), "photos");
    assert!(catalog.execute("SELECT * FROM albums;", &[]).unwrap().is_empty());
    assert!(catalog.execute("SELECT * FROM photos;", &[]).unwrap().is_empty());
}

#[test]
fn export_then_load_preserves_rows() {
    let catalog = PhotoCatalog::new_empty().unwrap();
    insert_album(&catalog, "2024-01-01", 1);
    catalog
        .execute(
            "INSERT INTO photos (id, name, album, created_at, category)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            &[
                text("p1"),
                text("beach.jpg"),
                text("2024-01-01"),
                Value::Integer(1_000),
                text("animals"),
            ],
        )
        .unwrap();

    let snapshot = catalog.export_state().unwrap();
    assert!(snapshot.starts_with(b"SQLite format 3\0"));

    let restored = PhotoCatalog::load_from_state(&snapshot).unwrap();
    let rows = restored
        .execute(
            "SELECT id, name, album, created_at, category FROM photos;",
            &[],
        )
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("name"), Some(&text("beach.jpg")));
    assert_eq!(rows[0].get("created_at"), Some(&Value::Integer(1_000)));
    assert_eq!(rows[0].get("category"), Some(&text("animals")));

    let albums = restored
        .execute("SELECT id, title, position FROM albums;", &[])
        .unwrap();
    assert_eq!(albums.len(), 1);
    assert_eq!(albums[0].get("position"), Some(&Value::Integer(1)));
}

#[test]
fn restored_catalog_enforces_album_reference() {
    let snapshot = PhotoCatalog::new_empty().unwrap().export_state().unwrap();
    let restored = PhotoCatalog::load_from_state(&snapshot).unwrap();

    let result = restored.execute(
        "INSERT INTO photos (id, name, album, created_at) VALUES ('p1', 'a.jpg', 'nowhere', 0);",
        &[],
    );
    assert!(matches!(result, Err(DbError::Sqlite(_))));
}

#[test]
fn garbage_bytes_are_rejected_as_invalid_snapshot() {
    let mut garbage = vec![0xAB_u8; 4096];
    garbage[..4].copy_from_slice(b"JUNK");

    for blob in [Vec::new(), b"not sqlite".to_vec(), garbage] {
        match PhotoCatalog::load_from_state(&blob) {
            Err(DbError::InvalidSnapshot(_)) => {}
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("blob of {} bytes should not load", blob.len()),
        }
    }
}

#[test]
fn damaged_snapshot_body_is_rejected_as_invalid_snapshot() {
    let mut snapshot = PhotoCatalog::new_empty().unwrap().export_state().unwrap();
    // Keep the 100-byte file header, trash every page body.
    for byte in snapshot.iter_mut().skip(100) {
        *byte = 0xFF;
    }

    match PhotoCatalog::load_from_state(&snapshot) {
        Err(DbError::InvalidSnapshot(_)) => {}
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("damaged snapshot should not load"),
    }
}

#[test]
fn restored_catalog_grows_and_exports_again() {
    let snapshot = PhotoCatalog::new_empty().unwrap().export_state().unwrap();
    let restored = PhotoCatalog::load_from_state(&snapshot).unwrap();

    for n in 0..500 {
        insert_album(&restored, &format!("album-{n:04}-{}", "x".repeat(64)), n);
    }
    let grown = restored.export_state().unwrap();
    assert!(grown.len() > snapshot.len());

    let reloaded = PhotoCatalog::load_from_state(&grown).unwrap();
    let count = reloaded
        .execute("SELECT COUNT(*) AS n FROM albums;", &[])
        .unwrap();
    assert_eq!(count[0].get("n"), Some(&Value::Integer(500)));
}

#[test]
fn snapshot_with_other_schema_version_is_rejected() {
    let snapshot = raw_snapshot(
        "CREATE TABLE albums (id TEXT PRIMARY KEY, title TEXT, position INTEGER);
         CREATE TABLE photos (id TEXT PRIMARY KEY);
         PRAGMA user_version = 7;",
    );

    match PhotoCatalog::load_from_state(&snapshot) {
        Err(DbError::UnsupportedSchemaVersion {
            snapshot_version,
            expected,
        }) => {
            assert_eq!(snapshot_version, 7);
            assert_eq!(expected, SCHEMA_VERSION);
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("snapshot with user_version 7 should not load"),
    }
}

#[test]
fn snapshot_missing_photos_table_is_rejected() {
    let snapshot = raw_snapshot(
        "CREATE TABLE albums (id TEXT PRIMARY KEY, title TEXT, position INTEGER);
         PRAGMA user_version = 1;",
    );

    match PhotoCatalog::load_from_state(&snapshot) {
        Err(DbError::MissingRequiredTable(table)) => assert_eq!(table, "photos"),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("snapshot without photos table should not load"),
    }
}

#[test]
fn commands_return_no_rows_and_are_not_read_only() {
    let catalog = PhotoCatalog::new_empty().unwrap();
    let sql = "INSERT INTO albums (id, title, position) VALUES (?1, ?1, ?2);";

    assert!(!catalog.is_read_only(sql).unwrap());
    let rows = catalog
        .execute(sql, &[text("2024-02-02"), Value::Integer(1)])
        .unwrap();
    assert!(rows.is_empty());

    let count = catalog
        .execute("SELECT COUNT(*) AS n FROM albums WHERE id = ?1;", &[text("2024-02-02")])
        .unwrap();
    assert_eq!(count[0].get("n"), Some(&Value::Integer(1)));
}

#[test]
fn dropped_transaction_rolls_back() {
    let mut catalog = PhotoCatalog::new_empty().unwrap();
    {
        let tx = catalog.transaction().unwrap();
        tx.execute(
            "INSERT INTO albums (id, title, position) VALUES ('x', 'x', 1);",
            [],
        )
        .unwrap();
    }

    assert!(catalog.execute("SELECT id FROM albums;", &[]).unwrap().is_empty());
}

fn raw_snapshot(sql: &str) -> Vec<u8> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("raw.sqlite3");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(sql).unwrap();
    drop(conn);
    std::fs::read(&path).unwrap()
}

fn insert_album(catalog: &PhotoCatalog, id: &str, position: i64) {
    catalog
        .execute(
            "INSERT INTO albums (id, title, position) VALUES (?1, ?1, ?2);",
            &[text(id), Value::Integer(position)],
        )
        .unwrap();
}

fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1);",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "missing table {table_name}");
}
