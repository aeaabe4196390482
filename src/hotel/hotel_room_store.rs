use super::models::{HotelRoom, HotelRoomStatus};
use anyhow::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationOutcome {
    Reserved,
    /// The room does not exist or belongs to another party.
    RoomNotFound,
    /// The user already holds a reservation.
    AlreadyReserved,
    RoomFull,
}

pub trait HotelRoomStore: Send + Sync {
    /// Creates a room for the party and returns its id.
    fn add_room(
        &self,
        party_id: usize,
        name: &str,
        description: Option<&str>,
        capacity: usize,
    ) -> Result<usize>;

    fn get_room(&self, room_id: usize) -> Result<Option<HotelRoom>>;

    /// The rooms of the user's party with their occupancy, ordered by id.
    fn list_rooms_for_user(&self, user_id: usize) -> Result<Vec<HotelRoomStatus>>;

    /// Reserves a place in the room for the user. The checks and the insert
    /// run in one transaction.
    fn reserve(&self, user_id: usize, room_id: usize) -> Result<ReservationOutcome>;

    /// Returns Ok(false) if the user had no reservation for the room.
    fn cancel(&self, user_id: usize, room_id: usize) -> Result<bool>;

    fn get_user_reservation(&self, user_id: usize) -> Result<Option<HotelRoom>>;
}
