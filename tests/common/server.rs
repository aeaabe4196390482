//! Test server lifecycle management
//!
//! Spawns a real HTTP server on a random port, backed by a temporary database.

use super::constants::*;
use super::fixtures::{create_test_db, TestDatabase};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use wedding_party_server::open_database;
use wedding_party_server::server::state::ServerState;
use wedding_party_server::server::{make_app, RequestsLoggingLevel, ServerConfig};

/// A running test server, shut down when dropped.
pub struct TestServer {
    /// Base URL of the server, e.g. "http://127.0.0.1:54321"
    pub base_url: String,

    /// Hotel room ids by room name
    pub room_ids: HashMap<&'static str, usize>,

    #[allow(dead_code)]
    pub port: u16,

    // Keeps the database alive for the lifetime of the server
    _temp_dir: TempDir,

    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a server seeded with the fixture parties, users and rooms.
    ///
    /// # Panics
    ///
    /// Panics if the database cannot be created or the server does not
    /// become ready within SERVER_READY_TIMEOUT_MS.
    pub async fn spawn() -> Self {
        let TestDatabase {
            dir,
            db_path,
            room_ids,
        } = create_test_db().expect("Failed to create test database");

        let conn = open_database(&db_path).expect("Failed to open test database");

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr: SocketAddr = listener.local_addr().expect("Failed to get local address");
        let port = addr.port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let config = ServerConfig {
            requests_logging_level: RequestsLoggingLevel::None,
            port,
            frontend_dir_path: None,
        };
        let app = make_app(ServerState::new(config, conn, TEST_MAX_MUSIC_REQUESTS));

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            room_ids,
            port,
            _temp_dir: dir,
            shutdown_tx: Some(shutdown_tx),
        };
        server.wait_for_ready().await;
        server
    }

    /// Id of a fixture hotel room.
    #[allow(dead_code)]
    pub fn room_id(&self, name: &str) -> usize {
        *self
            .room_ids
            .get(name)
            .unwrap_or_else(|| panic!("No fixture room named {}", name))
    }

    async fn wait_for_ready(&self) {
        let client = reqwest::Client::new();
        let max_attempts = SERVER_READY_TIMEOUT_MS / SERVER_READY_POLL_INTERVAL_MS;

        for _ in 0..max_attempts {
            if let Ok(response) = client.get(&self.base_url).send().await {
                if response.status().is_success() {
                    return;
                }
            }
            tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
        }

        panic!(
            "Server did not become ready within {}ms",
            SERVER_READY_TIMEOUT_MS
        );
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
