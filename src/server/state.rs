use axum::extract::FromRef;

use crate::hotel::HotelRoomManager;
use crate::music_requests::MusicRequestManager;
use crate::user::UserManager;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedUserManager = Arc<UserManager>;
pub type GuardedMusicRequestManager = Arc<MusicRequestManager>;
pub type GuardedHotelRoomManager = Arc<HotelRoomManager>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub user_manager: GuardedUserManager,
    pub music_request_manager: GuardedMusicRequestManager,
    pub hotel_room_manager: GuardedHotelRoomManager,
    pub version: String,
}

impl FromRef<ServerState> for GuardedUserManager {
    fn from_ref(input: &ServerState) -> Self {
        input.user_manager.clone()
    }
}

impl FromRef<ServerState> for GuardedMusicRequestManager {
    fn from_ref(input: &ServerState) -> Self {
        input.music_request_manager.clone()
    }
}

impl FromRef<ServerState> for GuardedHotelRoomManager {
    fn from_ref(input: &ServerState) -> Self {
        input.hotel_room_manager.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
