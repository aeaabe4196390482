use serde::Serialize;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct HotelRoom {
    pub id: usize,
    pub party_id: usize,
    pub name: String,
    pub description: Option<String>,
    pub capacity: usize,
}

/// A room as seen by a member of its party.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct HotelRoomStatus {
    #[serde(flatten)]
    pub room: HotelRoom,
    pub reserved: usize,
    pub reserved_by_me: bool,
}
