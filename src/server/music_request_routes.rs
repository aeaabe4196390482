use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    response::{IntoResponse, Response},
    routing::{delete, get},
    Json, Router,
};
use tracing::debug;

use super::session::Session;
use super::state::{GuardedMusicRequestManager, ServerState};
use crate::music_requests::{
    AlbumRequests, ArtistRequests, MusicRequestError, RequestKind, SongRequests,
};

async fn list_music_requests<K: RequestKind>(
    session: Session,
    State(manager): State<GuardedMusicRequestManager>,
) -> Response {
    match manager.list::<K>(session.user_id) {
        Ok(entities) => Json(entities).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn request_music<K: RequestKind>(
    session: Session,
    State(manager): State<GuardedMusicRequestManager>,
    payload: Result<Json<K::Payload>, JsonRejection>,
) -> Response {
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => {
            debug!("Rejected {} request body: {}", K::KIND, rejection.body_text());
            return MusicRequestError::Validation(rejection.body_text()).into_response();
        }
    };
    match manager.request::<K>(session.user_id, payload) {
        Ok(entity) => Json(entity).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn withdraw_music_request<K: RequestKind>(
    session: Session,
    State(manager): State<GuardedMusicRequestManager>,
    id: Result<Path<usize>, PathRejection>,
) -> Response {
    let id = match id {
        Ok(Path(id)) => id,
        Err(rejection) => {
            return MusicRequestError::Validation(rejection.body_text()).into_response()
        }
    };
    match manager.withdraw::<K>(session.user_id, id) {
        Ok(()) => Json(serde_json::json!({ "id": id })).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn get_quota(
    session: Session,
    State(manager): State<GuardedMusicRequestManager>,
) -> Response {
    match manager.quota(session.user_id) {
        Ok(quota) => Json(quota).into_response(),
        Err(err) => err.into_response(),
    }
}

fn kind_routes<K: RequestKind>(path: &str) -> Router<ServerState> {
    Router::new()
        .route(
            path,
            get(list_music_requests::<K>).post(request_music::<K>),
        )
        .route(
            &format!("{}/{{id}}", path),
            delete(withdraw_music_request::<K>),
        )
}

pub fn make_music_request_routes() -> Router<ServerState> {
    Router::new()
        .merge(kind_routes::<ArtistRequests>("/music-request-artists"))
        .merge(kind_routes::<AlbumRequests>("/music-request-albums"))
        .merge(kind_routes::<SongRequests>("/music-request-songs"))
        .route("/music-requests/quota", get(get_quota))
}
