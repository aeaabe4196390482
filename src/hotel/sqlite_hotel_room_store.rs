use super::hotel_room_store::{HotelRoomStore, ReservationOutcome};
use super::models::{HotelRoom, HotelRoomStatus};
use crate::sqlite_persistence::{
    SharedConnection, HOTEL_ROOM_RESERVATION_TABLE_V_1, HOTEL_ROOM_TABLE_V_1, USER_TABLE_V_0,
};
use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension, Row};

#[derive(Clone)]
pub struct SqliteHotelRoomStore {
    conn: SharedConnection,
}

impl SqliteHotelRoomStore {
    pub fn new(conn: SharedConnection) -> Self {
        SqliteHotelRoomStore { conn }
    }
}

fn room_from_row(row: &Row) -> rusqlite::Result<HotelRoom> {
    Ok(HotelRoom {
        id: row.get(0)?,
        party_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        capacity: row.get(4)?,
    })
}

const ROOM_COLUMNS: &str = "r.id, r.party_id, r.name, r.description, r.capacity";

impl HotelRoomStore for SqliteHotelRoomStore {
    fn add_room(
        &self,
        party_id: usize,
        name: &str,
        description: Option<&str>,
        capacity: usize,
    ) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "INSERT INTO {} (party_id, name, description, capacity) VALUES (?1, ?2, ?3, ?4)",
                HOTEL_ROOM_TABLE_V_1.name
            ),
            params![party_id, name, description, capacity],
        )
        .with_context(|| format!("Failed to add room {} to party {}", name, party_id))?;
        Ok(conn.last_insert_rowid() as usize)
    }

    fn get_room(&self, room_id: usize) -> Result<Option<HotelRoom>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                &format!(
                    "SELECT {} FROM {} r WHERE r.id = ?1",
                    ROOM_COLUMNS, HOTEL_ROOM_TABLE_V_1.name
                ),
                params![room_id],
                room_from_row,
            )
            .optional()?)
    }

    fn list_rooms_for_user(&self, user_id: usize) -> Result<Vec<HotelRoomStatus>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {columns}, \
             (SELECT COUNT(*) FROM {reservation} res WHERE res.room_id = r.id), \
             EXISTS(SELECT 1 FROM {reservation} res WHERE res.room_id = r.id AND res.user_id = ?1) \
             FROM {room} r \
             WHERE r.party_id = (SELECT party_id FROM {user} WHERE id = ?1) \
             ORDER BY r.id",
            columns = ROOM_COLUMNS,
            reservation = HOTEL_ROOM_RESERVATION_TABLE_V_1.name,
            room = HOTEL_ROOM_TABLE_V_1.name,
            user = USER_TABLE_V_0.name,
        ))?;
        let rooms = stmt
            .query_map(params![user_id], |row| {
                Ok(HotelRoomStatus {
                    room: room_from_row(row)?,
                    reserved: row.get(5)?,
                    reserved_by_me: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rooms)
    }

    fn reserve(&self, user_id: usize, room_id: usize) -> Result<ReservationOutcome> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let capacity = tx
            .query_row(
                &format!(
                    "SELECT r.capacity FROM {} r \
                     WHERE r.id = ?1 AND r.party_id = (SELECT party_id FROM {} WHERE id = ?2)",
                    HOTEL_ROOM_TABLE_V_1.name, USER_TABLE_V_0.name
                ),
                params![room_id, user_id],
                |row| row.get::<usize, usize>(0),
            )
            .optional()?;
        let Some(capacity) = capacity else {
            return Ok(ReservationOutcome::RoomNotFound);
        };

        let has_reservation: bool = tx.query_row(
            &format!(
                "SELECT EXISTS(SELECT 1 FROM {} WHERE user_id = ?1)",
                HOTEL_ROOM_RESERVATION_TABLE_V_1.name
            ),
            params![user_id],
            |row| row.get(0),
        )?;
        if has_reservation {
            return Ok(ReservationOutcome::AlreadyReserved);
        }

        let reserved: usize = tx.query_row(
            &format!(
                "SELECT COUNT(*) FROM {} WHERE room_id = ?1",
                HOTEL_ROOM_RESERVATION_TABLE_V_1.name
            ),
            params![room_id],
            |row| row.get(0),
        )?;
        if reserved >= capacity {
            return Ok(ReservationOutcome::RoomFull);
        }

        tx.execute(
            &format!(
                "INSERT INTO {} (room_id, user_id) VALUES (?1, ?2)",
                HOTEL_ROOM_RESERVATION_TABLE_V_1.name
            ),
            params![room_id, user_id],
        )?;
        tx.commit()?;
        Ok(ReservationOutcome::Reserved)
    }

    fn cancel(&self, user_id: usize, room_id: usize) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            &format!(
                "DELETE FROM {} WHERE user_id = ?1 AND room_id = ?2",
                HOTEL_ROOM_RESERVATION_TABLE_V_1.name
            ),
            params![user_id, room_id],
        )?;
        Ok(deleted > 0)
    }

    fn get_user_reservation(&self, user_id: usize) -> Result<Option<HotelRoom>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                &format!(
                    "SELECT {} FROM {} r JOIN {} res ON res.room_id = r.id WHERE res.user_id = ?1",
                    ROOM_COLUMNS,
                    HOTEL_ROOM_TABLE_V_1.name,
                    HOTEL_ROOM_RESERVATION_TABLE_V_1.name
                ),
                params![user_id],
                room_from_row,
            )
            .optional()?)
    }
}
