//! Maps workflow errors to HTTP responses with a `{"error": ...}` body.

use crate::hotel::HotelRoomError;
use crate::music_requests::MusicRequestError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

pub fn internal_error(err: &anyhow::Error) -> Response {
    error!("Internal error: {:#}", err);
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

impl IntoResponse for MusicRequestError {
    fn into_response(self) -> Response {
        let status = match &self {
            MusicRequestError::Validation(_) => StatusCode::BAD_REQUEST,
            MusicRequestError::QuotaExceeded { .. } => StatusCode::BAD_REQUEST,
            MusicRequestError::NotFound { .. } => StatusCode::NOT_FOUND,
            MusicRequestError::AlreadyRequested(_) => StatusCode::CONFLICT,
            MusicRequestError::Store(err) => return internal_error(err),
        };
        error_response(status, self.to_string())
    }
}

impl IntoResponse for HotelRoomError {
    fn into_response(self) -> Response {
        let status = match &self {
            HotelRoomError::RoomNotFound(_) => StatusCode::NOT_FOUND,
            HotelRoomError::ReservationNotFound => StatusCode::NOT_FOUND,
            HotelRoomError::AlreadyReserved => StatusCode::CONFLICT,
            HotelRoomError::RoomFull(_) => StatusCode::CONFLICT,
            HotelRoomError::Store(err) => return internal_error(err),
        };
        error_response(status, self.to_string())
    }
}
