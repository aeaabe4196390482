use super::hotel_room_store::{HotelRoomStore, ReservationOutcome};
use super::models::{HotelRoom, HotelRoomStatus};
use crate::sqlite_persistence::is_storable_id;
use anyhow::{bail, Context};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum HotelRoomError {
    #[error("Room {0} not found")]
    RoomNotFound(usize),

    #[error("You already have a hotel room reservation")]
    AlreadyReserved,

    #[error("Room {0} is full")]
    RoomFull(usize),

    #[error("No reservation found")]
    ReservationNotFound,

    #[error("Storage error: {0}")]
    Store(#[from] anyhow::Error),
}

pub struct HotelRoomManager {
    store: Box<dyn HotelRoomStore>,
}

impl HotelRoomManager {
    pub fn new(store: Box<dyn HotelRoomStore>) -> Self {
        Self { store }
    }

    pub fn add_room(
        &self,
        party_id: usize,
        name: &str,
        description: Option<&str>,
        capacity: usize,
    ) -> anyhow::Result<usize> {
        let name = name.trim();
        if name.is_empty() {
            bail!("The room name cannot be empty.");
        }
        if capacity == 0 {
            bail!("A room must fit at least one guest.");
        }
        let room_id = self
            .store
            .add_room(party_id, name, description, capacity)
            .context("Could not add room")?;
        info!("Added room {} ({}) to party {}", name, room_id, party_id);
        Ok(room_id)
    }

    pub fn list_rooms(&self, user_id: usize) -> Result<Vec<HotelRoomStatus>, HotelRoomError> {
        Ok(self.store.list_rooms_for_user(user_id)?)
    }

    pub fn reserve(&self, user_id: usize, room_id: usize) -> Result<HotelRoom, HotelRoomError> {
        if !is_storable_id(room_id) {
            return Err(HotelRoomError::RoomNotFound(room_id));
        }
        match self.store.reserve(user_id, room_id)? {
            ReservationOutcome::Reserved => {
                info!("User {} reserved room {}", user_id, room_id);
                self.store
                    .get_room(room_id)?
                    .ok_or(HotelRoomError::RoomNotFound(room_id))
            }
            ReservationOutcome::RoomNotFound => Err(HotelRoomError::RoomNotFound(room_id)),
            ReservationOutcome::AlreadyReserved => Err(HotelRoomError::AlreadyReserved),
            ReservationOutcome::RoomFull => Err(HotelRoomError::RoomFull(room_id)),
        }
    }

    pub fn cancel(&self, user_id: usize, room_id: usize) -> Result<(), HotelRoomError> {
        if is_storable_id(room_id) && self.store.cancel(user_id, room_id)? {
            info!("User {} cancelled reservation of room {}", user_id, room_id);
            Ok(())
        } else {
            Err(HotelRoomError::ReservationNotFound)
        }
    }

    pub fn get_reservation(&self, user_id: usize) -> Result<HotelRoom, HotelRoomError> {
        self.store
            .get_user_reservation(user_id)?
            .ok_or(HotelRoomError::ReservationNotFound)
    }
}
