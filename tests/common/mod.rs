//! Common test utilities for E2E tests

#![allow(dead_code)]

pub mod schema_validator;

use chrono::{Duration, Utc};
use serde_json::Value;
use std::sync::atomic::{AtomicI64, Ordering};
use tempfile::TempDir;
use tokio::net::TcpListener;
use vidtube::auth::{AccessClaims, create_access_token};
use vidtube::data::{EntityId, LikeKind, User, Video};
use vidtube::{AppState, config};

static CLOCK: AtomicI64 = AtomicI64::new(0);

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        Self::with_cascade(false).await
    }

    /// Create a test server with the given delete policy
    pub async fn with_cascade(cascade_deletes: bool) -> Self {
        // Create temporary directory for test database
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        // Create test configuration
        let config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
                cors_origin: None,
                body_limit_bytes: 16 * 1024,
            },
            database: config::DatabaseConfig {
                path: db_path,
                max_connections: 5,
                operation_timeout_ms: 5000,
            },
            auth: config::AuthConfig {
                token_secret: "test-secret-key-32-bytes-long!!!".to_string(),
                token_max_age: 3600,
            },
            pagination: config::PaginationConfig {
                default_limit: 5,
                max_limit: 100,
            },
            content: config::ContentConfig { cascade_deletes },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };

        vidtube::metrics::init_metrics();

        // Initialize app state
        let state = AppState::new(config).await.unwrap();

        // Create HTTP client
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        let app = vidtube::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr: addr_str,
            state,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Insert a user directly; accounts are owned by an external module
    pub async fn create_user(&self, username: &str) -> User {
        let now = Utc::now();
        let user = User {
            id: EntityId::new().0,
            username: username.to_string(),
            email: format!("{}@example.com", username),
            full_name: username.to_string(),
            avatar: format!("https://cdn.example.com/avatars/{}.png", username),
            cover_image: None,
            password_hash: "$2b$10$not-a-real-hash".to_string(),
            refresh_token: Some("refresh-token-secret".to_string()),
            created_at: now,
            updated_at: now,
        };
        self.state.db.insert_user(&user).await.unwrap();
        user
    }

    /// Insert a video directly with a strictly increasing creation time
    pub async fn create_video(&self, owner: &User, title: &str, published: bool) -> Video {
        let tick = CLOCK.fetch_add(1, Ordering::SeqCst);
        let created_at = Utc::now() - Duration::hours(1) + Duration::milliseconds(tick);
        let video = Video {
            id: EntityId::new().0,
            video_file: format!("https://cdn.example.com/videos/{}.mp4", title),
            thumbnail: format!("https://cdn.example.com/thumbs/{}.jpg", title),
            title: title.to_string(),
            description: format!("About {}", title),
            duration: 42.0,
            views: 0,
            is_published: published,
            owner_id: owner.id.clone(),
            created_at,
            updated_at: created_at,
        };
        self.state.db.insert_video(&video).await.unwrap();
        video
    }

    /// Current number of likes on a target, read straight from the store
    pub async fn like_count(&self, kind: LikeKind, target_id: &str) -> i64 {
        self.state
            .db
            .count_likes_batch(kind, &[target_id.to_string()])
            .await
            .expect("Failed to count likes")
            .get(target_id)
            .copied()
            .unwrap_or(0)
    }

    /// Access token for a user, signed with the server's secret
    pub fn token_for(&self, user: &User) -> String {
        let claims = AccessClaims::new(
            user.id.clone(),
            user.username.clone(),
            self.state.config.auth.token_max_age,
        );
        create_access_token(&claims, &self.state.config.auth.token_secret)
            .expect("Failed to create test token")
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> (u16, Value) {
        let mut request = self.client.get(self.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        envelope(request.send().await.unwrap()).await
    }

    pub async fn post(&self, path: &str, token: &str, body: Option<Value>) -> (u16, Value) {
        let mut request = self.client.post(self.url(path)).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(&body);
        }
        envelope(request.send().await.unwrap()).await
    }

    pub async fn patch(&self, path: &str, token: &str, body: Option<Value>) -> (u16, Value) {
        let mut request = self.client.patch(self.url(path)).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(&body);
        }
        envelope(request.send().await.unwrap()).await
    }

    pub async fn delete(&self, path: &str, token: &str) -> (u16, Value) {
        let request = self.client.delete(self.url(path)).bearer_auth(token);
        envelope(request.send().await.unwrap()).await
    }
}

/// Status code and parsed envelope of a response
///
/// Asserts the envelope invariants every API response must hold.
pub async fn envelope(response: reqwest::Response) -> (u16, Value) {
    let status = response.status().as_u16();
    let body: Value = response.json().await.unwrap();

    assert_eq!(body["statusCode"], status, "statusCode mirrors HTTP status");
    assert_eq!(body["success"], status < 400, "success follows statusCode");
    assert!(body["message"].is_string(), "message is always present");
    if status >= 400 {
        assert!(body["data"].is_null(), "failures carry no data");
    }

    (status, body)
}
