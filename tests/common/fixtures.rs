//! Test fixture creation
//!
//! Builds a temporary party database with users, credentials and hotel rooms.

use super::constants::*;
use anyhow::Result;
use std::collections::HashMap;
use std::path::PathBuf;
use tempfile::TempDir;
use wedding_party_server::hotel::{HotelRoomManager, SqliteHotelRoomStore};
use wedding_party_server::open_database;
use wedding_party_server::user::{SqliteUserStore, UserManager};

pub struct TestDatabase {
    pub dir: TempDir,
    pub db_path: PathBuf,
    /// Hotel room ids by room name
    pub room_ids: HashMap<&'static str, usize>,
}

/// Creates a database with two parties, their members and hotel rooms.
pub fn create_test_db() -> Result<TestDatabase> {
    let dir = TempDir::new()?;
    let db_path = dir.path().join("party.db");
    let conn = open_database(&db_path)?;

    let user_manager = UserManager::new(Box::new(SqliteUserStore::new(conn.clone())));
    let hotel_room_manager = HotelRoomManager::new(Box::new(SqliteHotelRoomStore::new(conn)));

    let party_1 = user_manager.add_party(PARTY_1_NAME)?;
    let party_2 = user_manager.add_party(PARTY_2_NAME)?;

    for (handle, password, party_id) in [
        (TEST_USER, TEST_PASS, party_1),
        (SECOND_USER, SECOND_PASS, party_1),
        (OTHER_PARTY_USER, OTHER_PARTY_PASS, party_2),
    ] {
        user_manager.add_user(handle, party_id)?;
        user_manager.create_password_credentials(handle, password)?;
    }

    let mut room_ids = HashMap::new();
    room_ids.insert(
        DOUBLE_ROOM_NAME,
        hotel_room_manager.add_room(party_1, DOUBLE_ROOM_NAME, Some("Garden view"), 2)?,
    );
    room_ids.insert(
        SINGLE_ROOM_NAME,
        hotel_room_manager.add_room(party_1, SINGLE_ROOM_NAME, None, 1)?,
    );
    room_ids.insert(
        ATTIC_ROOM_NAME,
        hotel_room_manager.add_room(party_2, ATTIC_ROOM_NAME, None, 4)?,
    );

    Ok(TestDatabase {
        dir,
        db_path,
        room_ids,
    })
}
