use anyhow::{Context, Result};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use tracing::{debug, info};

use crate::hotel::{HotelRoomManager, SqliteHotelRoomStore};
use crate::music_requests::{MusicRequestManager, SqliteMusicRequestStore};
use crate::sqlite_persistence::SharedConnection;
use crate::user::{SqliteUserStore, UserManager};
use axum_extra::extract::cookie::{Cookie, SameSite};
use tower_http::services::ServeDir;

use axum::{
    extract::State,
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::error_response::{error_response, internal_error};
use super::hotel_routes::make_hotel_routes;
use super::music_request_routes::make_music_request_routes;
use super::session::{Session, COOKIE_SESSION_TOKEN_KEY};
use super::{log_requests, state::*, ServerConfig};
use crate::user::auth::AuthTokenValue;

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub version: String,
    pub user_id: Option<usize>,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

#[derive(Deserialize)]
struct LoginBody {
    pub user_handle: String,
    pub password: String,
}

#[derive(Serialize)]
struct LoginSuccessResponse {
    token: String,
}

async fn home(session: Option<Session>, State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        version: state.version.clone(),
        user_id: session.map(|s| s.user_id),
    };
    Json(stats)
}

async fn login(
    State(user_manager): State<GuardedUserManager>,
    Json(body): Json<LoginBody>,
) -> Response {
    debug!("login() called for {}", body.user_handle);
    match user_manager.login(&body.user_handle, &body.password) {
        Ok(Some(auth_token)) => {
            let cookie = Cookie::build((COOKIE_SESSION_TOKEN_KEY, auth_token.value.0.clone()))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .build();
            (
                StatusCode::CREATED,
                [(header::SET_COOKIE, cookie.to_string())],
                Json(LoginSuccessResponse {
                    token: auth_token.value.0,
                }),
            )
                .into_response()
        }
        Ok(None) => error_response(StatusCode::UNAUTHORIZED, "Invalid credentials"),
        Err(err) => internal_error(&err),
    }
}

async fn logout(State(user_manager): State<GuardedUserManager>, session: Session) -> Response {
    match user_manager.logout(session.user_id, &AuthTokenValue(session.token)) {
        Ok(()) => {
            let cookie = Cookie::build((COOKIE_SESSION_TOKEN_KEY, ""))
                .path("/")
                .expires(time::OffsetDateTime::now_utc() - time::Duration::days(1))
                .same_site(SameSite::Lax)
                .build();
            (StatusCode::OK, [(header::SET_COOKIE, cookie.to_string())]).into_response()
        }
        Err(err) => error_response(StatusCode::BAD_REQUEST, err.to_string()),
    }
}

async fn get_profile(session: Session, State(user_manager): State<GuardedUserManager>) -> Response {
    match user_manager.get_profile(session.user_id) {
        Ok(Some(profile)) => Json(profile).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "User not found"),
        Err(err) => internal_error(&err),
    }
}

async fn get_party(session: Session, State(user_manager): State<GuardedUserManager>) -> Response {
    match user_manager.get_party_overview(session.user_id) {
        Ok(Some(party)) => Json(party).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "User not found"),
        Err(err) => internal_error(&err),
    }
}

impl ServerState {
    /// Builds every manager on top of the shared party database.
    pub fn new(
        config: ServerConfig,
        conn: SharedConnection,
        max_music_requests_per_user: usize,
    ) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            user_manager: Arc::new(UserManager::new(Box::new(SqliteUserStore::new(
                conn.clone(),
            )))),
            music_request_manager: Arc::new(MusicRequestManager::new(
                Box::new(SqliteMusicRequestStore::new(conn.clone())),
                max_music_requests_per_user,
            )),
            hotel_room_manager: Arc::new(HotelRoomManager::new(Box::new(
                SqliteHotelRoomStore::new(conn),
            ))),
            version: env!("CARGO_PKG_VERSION").to_owned(),
        }
    }
}

pub fn make_app(state: ServerState) -> Router {
    let auth_routes: Router = Router::new()
        .route("/login", post(login))
        .route("/logout", get(logout))
        .with_state(state.clone());

    let user_routes: Router = Router::new()
        .route("/profile", get(get_profile))
        .route("/party", get(get_party))
        .merge(make_music_request_routes())
        .merge(make_hotel_routes())
        .with_state(state.clone());

    let home_router: Router = match state.config.frontend_dir_path.clone() {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new()
            .route("/", get(home))
            .with_state(state.clone()),
    };

    home_router
        .nest("/v1/auth", auth_routes)
        .nest("/v1/user", user_routes)
        .layer(middleware::from_fn_with_state(state, log_requests))
}

pub async fn run_server(
    config: ServerConfig,
    conn: SharedConnection,
    max_music_requests_per_user: usize,
) -> Result<()> {
    let port = config.port;
    let app = make_app(ServerState::new(config, conn, max_music_requests_per_user));

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Could not bind port {}", port))?;
    info!("Listening on {}", listener.local_addr()?);

    Ok(axum::serve(listener, app).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::RequestsLoggingLevel;
    use crate::sqlite_persistence::open_database;
    use axum::{body::Body, http::Request};
    use tempfile::TempDir;
    use tower::ServiceExt; // for `oneshot`

    struct TestApp {
        app: Router,
        token: String,
        _temp_dir: TempDir,
    }

    fn make_test_app() -> TestApp {
        let temp_dir = TempDir::new().unwrap();
        let conn = open_database(temp_dir.path().join("party.db")).unwrap();
        let config = ServerConfig {
            requests_logging_level: RequestsLoggingLevel::None,
            ..Default::default()
        };
        let state = ServerState::new(config, conn, 2);

        let party_id = state.user_manager.add_party("smiths").unwrap();
        state.user_manager.add_user("alice", party_id).unwrap();
        state
            .user_manager
            .create_password_credentials("alice", "pw")
            .unwrap();
        let token = state
            .user_manager
            .login("alice", "pw")
            .unwrap()
            .unwrap()
            .value
            .0;

        TestApp {
            app: make_app(state),
            token,
            _temp_dir: temp_dir,
        }
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, token: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Authorization", format!("Bearer {}", token))
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    #[tokio::test]
    async fn responds_forbidden_on_protected_routes() {
        let test_app = make_test_app();

        let protected_routes = vec![
            "/v1/user/profile",
            "/v1/user/party",
            "/v1/user/music-request-artists",
            "/v1/user/music-request-albums",
            "/v1/user/music-request-songs",
            "/v1/user/music-requests/quota",
            "/v1/user/hotel-rooms",
            "/v1/user/hotel-room-reservation",
            "/v1/auth/logout",
        ];

        for route in protected_routes.into_iter() {
            let request = Request::builder().uri(route).body(Body::empty()).unwrap();
            let response = test_app.app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::FORBIDDEN, "{}", route);
        }

        let request = post_json(
            "/v1/user/music-request-artists",
            "not-a-token",
            r#"{"name":"Band","url":"band-url"}"#,
        );
        let response = test_app.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn home_reports_stats() {
        let test_app = make_test_app();

        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = test_app.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["user_id"].is_null());
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn login_sets_session_cookie() {
        let test_app = make_test_app();

        let request = Request::builder()
            .method("POST")
            .uri("/v1/auth/login")
            .header("Content-Type", "application/json")
            .body(Body::from(r#"{"user_handle":"alice","password":"pw"}"#))
            .unwrap();
        let response = test_app.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_owned();
        assert!(cookie.starts_with("session_token="));
        let body = body_json(response).await;
        assert!(cookie.contains(body["token"].as_str().unwrap()));

        let request = Request::builder()
            .method("POST")
            .uri("/v1/auth/login")
            .header("Content-Type", "application/json")
            .body(Body::from(r#"{"user_handle":"alice","password":"nope"}"#))
            .unwrap();
        let response = test_app.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn requests_song_with_nested_artist() {
        let test_app = make_test_app();

        let request = post_json(
            "/v1/user/music-request-songs",
            &test_app.token,
            r#"{"name":"songName","url":"songUrl","artist":{"name":"artistName","url":"artistUrl"}}"#,
        );
        let response = test_app.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["name"], "songName");
        assert_eq!(body["url"], "songUrl");
        assert_eq!(body["artist"]["name"], "artistName");
        assert_eq!(body["artist"]["url"], "artistUrl");
        assert!(body["artist"]["imageUrl"].is_null());
        assert!(body["artist"].get("imageUrl").is_some());
    }

    #[tokio::test]
    async fn rejects_malformed_music_requests() {
        let test_app = make_test_app();

        let bodies = vec![
            r#"{"name":"Record","url":"record-url"}"#,
            r#"{"name":"Record","url":"record-url","artist":{"name":"Band"}}"#,
            r#"not json"#,
        ];
        for body in bodies {
            let request = post_json("/v1/user/music-request-albums", &test_app.token, body);
            let response = test_app.app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", body);
            let body = body_json(response).await;
            assert!(body["error"].is_string());
        }
    }

    #[tokio::test]
    async fn reports_quota_exceeded() {
        let test_app = make_test_app();

        for (i, expected) in [StatusCode::OK, StatusCode::OK, StatusCode::BAD_REQUEST]
            .into_iter()
            .enumerate()
        {
            let request = post_json(
                "/v1/user/music-request-artists",
                &test_app.token,
                &format!(r#"{{"name":"Band {i}","url":"band-{i}"}}"#),
            );
            let response = test_app.app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), expected);
        }

        let request = Request::builder()
            .uri("/v1/user/music-requests/quota")
            .header("Authorization", &test_app.token)
            .body(Body::empty())
            .unwrap();
        let response = test_app.app.clone().oneshot(request).await.unwrap();
        let body = body_json(response).await;
        assert_eq!(body["artists"]["used"], 2);
        assert_eq!(body["artists"]["max"], 2);
        assert_eq!(body["songs"]["used"], 0);
    }

    #[tokio::test]
    async fn answers_bad_path_ids_with_json_errors() {
        let test_app = make_test_app();
        let max_id = usize::MAX.to_string();

        let cases = vec![
            ("DELETE", "/v1/user/music-request-artists/abc".to_string(), StatusCode::BAD_REQUEST),
            ("DELETE", format!("/v1/user/music-request-songs/{}", max_id), StatusCode::NOT_FOUND),
            ("POST", "/v1/user/hotel-rooms/abc/reservation".to_string(), StatusCode::BAD_REQUEST),
            ("POST", format!("/v1/user/hotel-rooms/{}/reservation", max_id), StatusCode::NOT_FOUND),
            ("DELETE", format!("/v1/user/hotel-rooms/{}/reservation", max_id), StatusCode::NOT_FOUND),
        ];
        for (method, uri, expected) in cases {
            let request = Request::builder()
                .method(method)
                .uri(&uri)
                .header("Authorization", &test_app.token)
                .body(Body::empty())
                .unwrap();
            let response = test_app.app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), expected, "{} {}", method, uri);
            let body = body_json(response).await;
            assert!(body["error"].is_string(), "{} {}", method, uri);
        }
    }

    #[test]
    fn formats_uptime() {
        assert_eq!(format_uptime(Duration::from_secs(0)), "0d 00:00:00");
        assert_eq!(
            format_uptime(Duration::from_secs(86_400 + 3600 * 2 + 60 * 3 + 4)),
            "1d 02:03:04"
        );
    }
}
