mod hotel_room_manager;
mod hotel_room_store;
pub mod models;
mod sqlite_hotel_room_store;

pub use hotel_room_manager::{HotelRoomError, HotelRoomManager};
pub use hotel_room_store::{HotelRoomStore, ReservationOutcome};
pub use models::{HotelRoom, HotelRoomStatus};
pub use sqlite_hotel_room_store::SqliteHotelRoomStore;
