//! Test server lifecycle management
//!
//! This module manages spawning and shutting down test HTTP servers.
//! Each test gets an isolated server with its own database, in-memory CMS
//! and recording notifier.

use super::constants::*;
use super::fixtures::{seed_profiles, RecordingNotifier};
use community_sync_server::cms::InMemoryContentStore;
use community_sync_server::config::Environment;
use community_sync_server::relational_store::SqliteRelationalStore;
use community_sync_server::server::{make_app, RequestsLoggingLevel, ServerConfig};
use community_sync_server::sync::SignaturePolicy;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance with isolated state
///
/// When dropped, the server gracefully shuts down and temp resources are cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// Relational store with service access, for seeding and assertions
    pub store: Arc<SqliteRelationalStore>,

    /// The CMS the server reads from and publishes to
    pub cms: Arc<InMemoryContentStore>,

    /// Every notification the server sent or scheduled
    pub notifier: Arc<RecordingNotifier>,

    /// Seeded admin profile id
    pub admin_id: String,

    /// Seeded regular profile id
    pub user_id: String,

    // Private fields - keep resources alive until drop
    _temp_db_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

/// Base configuration: development mode, signed webhooks, admin key set
pub fn test_config() -> ServerConfig {
    ServerConfig {
        requests_logging_level: RequestsLoggingLevel::None,
        port: 0,
        environment: Environment::Development,
        signature_policy: SignaturePolicy::from_config(Some(WEBHOOK_SECRET), false),
        admin_key: Some(ADMIN_KEY.to_string()),
        fallback_author_id: None,
        reminder_offsets_hours: vec![24, 1],
    }
}

impl TestServer {
    /// Spawns a new test server on a random port with [`test_config`]
    pub async fn spawn() -> Self {
        Self::spawn_with_config(test_config()).await
    }

    /// Spawns a production-mode server
    pub async fn spawn_production() -> Self {
        Self::spawn_with_config(ServerConfig {
            environment: Environment::Production,
            ..test_config()
        })
        .await
    }

    /// Spawns a new test server on a random port
    ///
    /// This function:
    /// 1. Creates a temporary database with an admin and a regular profile
    /// 2. Binds to a random port (127.0.0.1:0)
    /// 3. Spawns the server in a background task
    /// 4. Waits for the server to be ready
    ///
    /// # Panics
    ///
    /// Panics if database creation, port binding or startup fails.
    pub async fn spawn_with_config(mut config: ServerConfig) -> Self {
        let temp_db_dir = TempDir::new().expect("Failed to create temp dir");
        let store = Arc::new(
            SqliteRelationalStore::new(temp_db_dir.path().join("community.db"))
                .expect("Failed to open relational store"),
        );
        let profiles = seed_profiles(&store).expect("Failed to seed profiles");

        let cms = Arc::new(InMemoryContentStore::new());
        let notifier = Arc::new(RecordingNotifier::default());

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");

        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let base_url = format!("http://127.0.0.1:{}", port);
        config.port = port;

        // Create shutdown channel
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let app = make_app(config, store.clone(), cms.clone(), notifier.clone())
            .expect("Failed to build app");

        // Spawn server in background task with graceful shutdown
        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            })
            .await
            .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            store,
            cms,
            notifier,
            admin_id: profiles.admin_id,
            user_id: profiles.user_id,
            _temp_db_dir: temp_db_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the / endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => {
                    return;
                }
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        // Send shutdown signal
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
