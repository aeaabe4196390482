mod schema;
mod versioned_schema;

pub use schema::*;
pub use versioned_schema::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema, BASE_DB_VERSION,
    DEFAULT_TIMESTAMP,
};

use anyhow::{bail, Context, Result};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};
use tracing::info;

/// The connection shared by every store backed by the party database.
pub type SharedConnection = Arc<Mutex<Connection>>;

/// Opens the party database at `db_path`, creating it with the latest schema
/// if it does not exist, validating it and migrating it forward otherwise.
pub fn open_database<T: AsRef<Path>>(db_path: T) -> Result<SharedConnection> {
    let db_path = db_path.as_ref();
    let conn = if db_path.exists() {
        Connection::open_with_flags(
            db_path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Failed to open database {:?}", db_path))?
    } else {
        info!("Creating new database at {:?}", db_path);
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to create database {:?}", db_path))?;
        VERSIONED_SCHEMAS
            .last()
            .context("No schema defined")?
            .create(&conn)?;
        conn
    };

    // Foreign keys enforcement is per connection, not persisted in the file.
    conn.execute("PRAGMA foreign_keys = ON;", [])?;

    let db_version = conn
        .query_row("PRAGMA user_version;", [], |row| row.get::<usize, i64>(0))
        .context("Failed to read database version")?
        - BASE_DB_VERSION as i64;

    if db_version < 0 {
        bail!(
            "Database version {} is too old, does not contain base db version {}",
            db_version,
            BASE_DB_VERSION
        );
    }
    if db_version >= VERSIONED_SCHEMAS.len() as i64 {
        bail!("Database version {} is too new", db_version);
    }
    let version = db_version as usize;

    VERSIONED_SCHEMAS
        .get(version)
        .context("Failed to get schema")?
        .validate(&conn)
        .with_context(|| format!("Schema validation failed for version {}", version))?;

    migrate_if_needed(&conn, version)?;

    Ok(Arc::new(Mutex::new(conn)))
}

fn migrate_if_needed(conn: &Connection, version: usize) -> Result<()> {
    let mut latest = version;
    for schema in VERSIONED_SCHEMAS.iter().skip(version + 1) {
        info!("Migrating db from version {} to {}", latest, schema.version);
        if let Some(migration_fn) = schema.migration {
            migration_fn(conn)?;
        }
        latest = schema.version;
    }
    if latest != version {
        conn.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + latest),
            [],
        )?;
    }
    Ok(())
}

pub fn system_time_from_column(value: i64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(value.max(0) as u64)
}

pub fn system_time_to_column(time: &SystemTime) -> i64 {
    time.duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Row ids are signed 64 bit integers, larger ids can never match a row.
pub fn is_storable_id(id: usize) -> bool {
    i64::try_from(id).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::params;
    use tempfile::TempDir;

    fn table_exists(conn: &Connection, name: &str) -> bool {
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
            params![name],
            |row| row.get::<_, i64>(0),
        )
        .unwrap()
            == 1
    }

    #[test]
    fn creates_latest_schema() {
        let temp_dir = TempDir::new().unwrap();
        let conn = open_database(temp_dir.path().join("party.db")).unwrap();
        let conn = conn.lock().unwrap();

        let version: i64 = conn
            .query_row("PRAGMA user_version;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(
            version as usize,
            BASE_DB_VERSION + VERSIONED_SCHEMAS.len() - 1
        );
        assert!(table_exists(&conn, "requested_artist"));
        assert!(table_exists(&conn, "hotel_room_reservation"));
    }

    #[test]
    fn reopens_existing_database() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("party.db");
        {
            let conn = open_database(&db_path).unwrap();
            conn.lock()
                .unwrap()
                .execute("INSERT INTO party (name) VALUES ('smiths')", [])
                .unwrap();
        }

        let conn = open_database(&db_path).unwrap();
        let count: i64 = conn
            .lock()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM party", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn migrates_v0_to_v1() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("party.db");

        {
            let conn = Connection::open(&db_path).unwrap();
            VERSIONED_SCHEMAS[0].create(&conn).unwrap();
            conn.execute("INSERT INTO party (name) VALUES ('smiths')", [])
                .unwrap();
            conn.execute(
                "INSERT INTO user (handle, party_id) VALUES ('alice', 1)",
                [],
            )
            .unwrap();
            conn.execute(
                "INSERT INTO requested_artist (name, url) VALUES ('Band', 'band-url')",
                [],
            )
            .unwrap();
            conn.execute(
                "INSERT INTO user_requested_artist (user_id, artist_id) VALUES (1, 1)",
                [],
            )
            .unwrap();
            assert!(!table_exists(&conn, "hotel_room"));
        }

        let conn = open_database(&db_path).unwrap();
        let conn = conn.lock().unwrap();

        let version: i64 = conn
            .query_row("PRAGMA user_version;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version as usize, BASE_DB_VERSION + 1);
        assert!(table_exists(&conn, "hotel_room"));
        assert!(table_exists(&conn, "hotel_room_reservation"));

        let associations: i64 = conn
            .query_row("SELECT COUNT(*) FROM user_requested_artist", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(associations, 1);
        VERSIONED_SCHEMAS[1].validate(&conn).unwrap();
    }

    #[test]
    fn rejects_foreign_database() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("other.db");
        {
            let conn = Connection::open(&db_path).unwrap();
            conn.execute("CREATE TABLE whatever (id INTEGER)", []).unwrap();
        }

        assert!(open_database(&db_path).is_err());
    }

    #[test]
    fn converts_timestamps() {
        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        assert_eq!(system_time_to_column(&now), 1_700_000_000);
        assert_eq!(system_time_from_column(1_700_000_000), now);
    }

    #[test]
    fn checks_storable_ids() {
        assert!(is_storable_id(1));
        assert!(is_storable_id(i64::MAX as usize));
        assert!(!is_storable_id(usize::MAX));
    }
}
