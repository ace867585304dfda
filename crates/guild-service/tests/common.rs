//! Common test utilities for guild integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::http::{header, HeaderName, HeaderValue};
use axum::Router;
use axum_test::TestServer;
use tempfile::TempDir;

use guild_core::{Email, Role, User};
use guild_service::auth::issue_token;
use guild_service::{create_router, AppState, ServiceConfig};
use guild_store::{RocksStore, Store};

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Temporary directory for the database (kept alive for test duration).
    pub _temp_dir: TempDir,
    /// Direct store handle for seeding and inspecting state.
    pub store: Arc<RocksStore>,
    /// The configuration the server runs with.
    pub config: ServiceConfig,
}

impl TestHarness {
    /// Create a new test harness with a fresh database.
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Create a harness after adjusting the default test configuration.
    pub fn with_config(adjust: impl FnOnce(&mut ServiceConfig)) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = Arc::new(RocksStore::open(temp_dir.path()).expect("Failed to open store"));

        let mut config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            data_dir: temp_dir.path().to_string_lossy().to_string(),
            access_token_secret: "test-secret".into(),
            cors_origins: vec!["*".into()],
            stripe_api_key: None,
            ..ServiceConfig::default()
        };
        adjust(&mut config);

        let state = AppState::new(Arc::clone(&store), config.clone());
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            _temp_dir: temp_dir,
            store,
            config,
        }
    }

    /// Bearer header carrying a valid session for `email`.
    pub fn auth(&self, email: &str) -> (HeaderName, HeaderValue) {
        let token = issue_token(&self.config, &parse(email)).expect("Failed to sign token");
        (
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).expect("Invalid header value"),
        )
    }

    /// Cookie header carrying a valid session for `email`.
    pub fn cookie(&self, email: &str) -> (HeaderName, HeaderValue) {
        let token = issue_token(&self.config, &parse(email)).expect("Failed to sign token");
        (
            header::COOKIE,
            HeaderValue::from_str(&format!("token={token}")).expect("Invalid header value"),
        )
    }

    /// Store a regular user.
    pub fn seed_user(&self, email: &str, name: &str) -> User {
        let user = User::new(parse(email), name, None);
        self.store
            .insert_user_if_absent(&user)
            .expect("Failed to seed user");
        user
    }

    /// Store a user and promote them to admin.
    pub fn seed_admin(&self, email: &str) -> User {
        self.seed_user(email, "Admin");
        self.store
            .set_user_role(&parse(email), Role::Admin)
            .expect("Failed to promote admin")
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a test email.
pub fn parse(email: &str) -> Email {
    Email::parse(email).expect("Invalid test email")
}
