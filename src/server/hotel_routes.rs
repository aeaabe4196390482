use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use super::error_response::error_response;
use super::session::Session;
use super::state::{GuardedHotelRoomManager, ServerState};

async fn list_hotel_rooms(
    session: Session,
    State(manager): State<GuardedHotelRoomManager>,
) -> Response {
    match manager.list_rooms(session.user_id) {
        Ok(rooms) => Json(rooms).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn reserve_hotel_room(
    session: Session,
    State(manager): State<GuardedHotelRoomManager>,
    room_id: Result<Path<usize>, PathRejection>,
) -> Response {
    let Path(room_id) = match room_id {
        Ok(room_id) => room_id,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, rejection.body_text()),
    };
    match manager.reserve(session.user_id, room_id) {
        Ok(room) => Json(room).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn cancel_hotel_room_reservation(
    session: Session,
    State(manager): State<GuardedHotelRoomManager>,
    room_id: Result<Path<usize>, PathRejection>,
) -> Response {
    let Path(room_id) = match room_id {
        Ok(room_id) => room_id,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, rejection.body_text()),
    };
    match manager.cancel(session.user_id, room_id) {
        Ok(()) => Json(serde_json::json!({ "id": room_id })).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn get_hotel_room_reservation(
    session: Session,
    State(manager): State<GuardedHotelRoomManager>,
) -> Response {
    match manager.get_reservation(session.user_id) {
        Ok(room) => Json(room).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn make_hotel_routes() -> Router<ServerState> {
    Router::new()
        .route("/hotel-rooms", get(list_hotel_rooms))
        .route(
            "/hotel-rooms/{room_id}/reservation",
            post(reserve_hotel_room).delete(cancel_hotel_room_reservation),
        )
        .route("/hotel-room-reservation", get(get_hotel_room_reservation))
}
