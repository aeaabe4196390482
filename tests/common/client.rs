//! HTTP client for end-to-end tests
//!
//! Wraps reqwest with a cookie store so that a login carries over to the
//! following requests, the way a browser would.

use super::constants::*;
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;

pub struct TestClient {
    client: Client,
    pub base_url: String,
}

#[allow(dead_code)]
impl TestClient {
    /// Creates a client without any session.
    pub fn new(base_url: String) -> Self {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build HTTP client");
        Self { client, base_url }
    }

    /// Creates a client logged in as TEST_USER.
    pub async fn authenticated(base_url: String) -> Self {
        Self::authenticated_as(base_url, TEST_USER, TEST_PASS).await
    }

    /// Creates a client logged in with the given credentials.
    pub async fn authenticated_as(base_url: String, handle: &str, password: &str) -> Self {
        let client = Self::new(base_url);
        let response = client.login(handle, password).await;
        assert_eq!(
            response.status(),
            StatusCode::CREATED,
            "Login as {} failed",
            handle
        );
        client
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ========================================================================
    // Auth
    // ========================================================================

    pub async fn login(&self, handle: &str, password: &str) -> Response {
        self.client
            .post(self.url("/v1/auth/login"))
            .json(&serde_json::json!({
                "user_handle": handle,
                "password": password,
            }))
            .send()
            .await
            .expect("Login request failed")
    }

    pub async fn logout(&self) -> Response {
        self.get("/v1/auth/logout").await
    }

    pub async fn get_home(&self) -> Response {
        self.get("/").await
    }

    pub async fn get_profile(&self) -> Response {
        self.get("/v1/user/profile").await
    }

    pub async fn get_party(&self) -> Response {
        self.get("/v1/user/party").await
    }

    // ========================================================================
    // Music requests
    // ========================================================================

    /// Lists the requests of the current user, `kind` is one of "artists",
    /// "albums" or "songs".
    pub async fn list_music_requests(&self, kind: &str) -> Response {
        self.get(&format!("/v1/user/music-request-{}", kind)).await
    }

    pub async fn request_music(&self, kind: &str, body: &Value) -> Response {
        self.client
            .post(self.url(&format!("/v1/user/music-request-{}", kind)))
            .json(body)
            .send()
            .await
            .expect("Music request failed")
    }

    /// Posts a body that is not valid JSON.
    pub async fn request_music_raw(&self, kind: &str, body: &'static str) -> Response {
        self.client
            .post(self.url(&format!("/v1/user/music-request-{}", kind)))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .expect("Music request failed")
    }

    pub async fn withdraw_music_request(&self, kind: &str, id: usize) -> Response {
        self.client
            .delete(self.url(&format!("/v1/user/music-request-{}/{}", kind, id)))
            .send()
            .await
            .expect("Music request withdrawal failed")
    }

    pub async fn get_quota(&self) -> Response {
        self.get("/v1/user/music-requests/quota").await
    }

    // ========================================================================
    // Hotel rooms
    // ========================================================================

    pub async fn list_hotel_rooms(&self) -> Response {
        self.get("/v1/user/hotel-rooms").await
    }

    pub async fn reserve_hotel_room(&self, room_id: usize) -> Response {
        self.client
            .post(self.url(&format!("/v1/user/hotel-rooms/{}/reservation", room_id)))
            .send()
            .await
            .expect("Reservation request failed")
    }

    pub async fn cancel_hotel_room_reservation(&self, room_id: usize) -> Response {
        self.client
            .delete(self.url(&format!("/v1/user/hotel-rooms/{}/reservation", room_id)))
            .send()
            .await
            .expect("Cancellation request failed")
    }

    pub async fn get_hotel_room_reservation(&self) -> Response {
        self.get("/v1/user/hotel-room-reservation").await
    }

    async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .unwrap_or_else(|e| panic!("GET {} failed: {}", path, e))
    }
}
