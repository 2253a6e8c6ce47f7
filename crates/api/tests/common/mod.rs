//! Common test utilities for integration tests.
//!
//! Most suites drive the router against `MemoryTicketingStore`. Suites that need
//! PostgreSQL call `create_test_pool`, which returns `None` (and the test
//! returns early) when `TEST_DATABASE_URL` is not set.

// Helpers are shared across test binaries; not every binary uses all of them.
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use domain::services::{MemoryTicketingStore, MockTicketNotifier, TicketNotifier, TicketingStore};
use fake::faker::name::en::Name;
use fake::Fake;
use serde_json::{json, Value};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::Arc;
use std::time::Duration;
use ticketing_api::{
    app::create_app,
    config::{
        Config, DatabaseConfig, EmailConfig, LoggingConfig, SecurityConfig, ServerConfig,
        TicketingConfig,
    },
};
use tower::ServiceExt;

pub const ADMIN_KEY: &str = "test-admin-key";

/// Test configuration with a fixed admin key and email disabled.
pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            request_timeout_secs: 30,
            app_name: "Event Ticketing Test".to_string(),
        },
        database: DatabaseConfig {
            url: std::env::var("TEST_DATABASE_URL").unwrap_or_default(),
            max_connections: 20,
            min_connections: 1,
            connect_timeout_secs: 10,
            idle_timeout_secs: 600,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        security: SecurityConfig {
            cors_origins: vec![],
            admin_api_key: ADMIN_KEY.to_string(),
        },
        email: EmailConfig::default(),
        ticketing: TicketingConfig::default(),
    }
}

/// Router over an in-memory store, with handles to inspect the store and notifier.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryTicketingStore>,
    pub notifier: Arc<MockTicketNotifier>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_notifier(MockTicketNotifier::new())
    }

    pub fn with_notifier(notifier: MockTicketNotifier) -> Self {
        Self::build(test_config(), notifier)
    }

    pub fn build(config: Config, notifier: MockTicketNotifier) -> Self {
        let store = Arc::new(MemoryTicketingStore::new());
        let notifier = Arc::new(notifier);
        let router = create_app(
            config,
            store.clone() as Arc<dyn TicketingStore>,
            notifier.clone() as Arc<dyn TicketNotifier>,
        );
        Self {
            router,
            store,
            notifier,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        send(&self.router, request).await
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Router over PostgreSQL.
pub fn create_pg_app(pool: PgPool) -> Router {
    create_app(
        test_config(),
        Arc::new(persistence::PgTicketingStore::new(pool)),
        Arc::new(MockTicketNotifier::new()),
    )
}

/// Connects to `TEST_DATABASE_URL`, runs migrations and truncates every table.
///
/// Returns `None` when the variable is unset so the calling test can skip.
pub async fn create_test_pool() -> Option<PgPool> {
    let database_url = std::env::var("TEST_DATABASE_URL").ok()?;

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    persistence::db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    cleanup_all_test_data(&pool).await;

    Some(pool)
}

/// Clean up ALL test data from the database.
pub async fn cleanup_all_test_data(pool: &PgPool) {
    sqlx::query(
        "TRUNCATE TABLE check_ins, registrations, roster_entries, events RESTART IDENTITY CASCADE",
    )
    .execute(pool)
    .await
    .expect("Failed to truncate test tables");
}

pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, parse_response_body(response).await)
}

/// Helper to parse JSON response body.
pub async fn parse_response_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(Value::Null)
}

/// Build a JSON request without credentials.
pub fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

/// Build a JSON request carrying the admin key.
pub fn json_request_with_api_key(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header("X-API-Key", ADMIN_KEY)
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn get_request_with_api_key(uri: &str) -> Request<Body> {
    request_with_api_key(Method::GET, uri)
}

pub fn request_with_api_key(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("X-API-Key", ADMIN_KEY)
        .body(Body::empty())
        .unwrap()
}

/// Build a CSV upload request carrying the admin key.
pub fn csv_request_with_api_key(uri: &str, csv: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "text/csv")
        .header("X-API-Key", ADMIN_KEY)
        .body(Body::from(csv.to_string()))
        .unwrap()
}

/// Creates an event through the API and returns its id.
pub async fn create_test_event(router: &Router, name: &str, capacity: i32) -> i64 {
    let (status, body) = send(
        router,
        json_request_with_api_key(
            Method::POST,
            "/api/v1/events",
            json!({
                "name": name,
                "description": "Integration test event",
                "event_type": "hackathon_day",
                "event_date": "2026-03-05T09:30:00Z",
                "capacity": capacity
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create event failed: {body}");
    body["event"]["id"].as_i64().unwrap()
}

/// Generated participant data.
pub struct TestParticipant {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub affiliation: String,
}

impl TestParticipant {
    pub fn new() -> Self {
        let digits: u32 = (1_000_000..9_999_999).fake();
        Self {
            name: Name().fake(),
            email: format!("participant_{}@example.com", uuid::Uuid::new_v4().simple()),
            phone: format!("+1555{}", digits),
            affiliation: "State University".to_string(),
        }
    }

    pub fn with_email(email: &str) -> Self {
        Self {
            email: email.to_string(),
            ..Self::new()
        }
    }

    pub fn registration_body(&self, event_id: i64) -> Value {
        json!({
            "event_id": event_id,
            "name": self.name,
            "email": self.email,
            "phone": self.phone,
            "affiliation": self.affiliation
        })
    }
}

impl Default for TestParticipant {
    fn default() -> Self {
        Self::new()
    }
}

/// Registers a participant and returns the raw status and body.
pub async fn register(
    router: &Router,
    event_id: i64,
    participant: &TestParticipant,
) -> (StatusCode, Value) {
    send(
        router,
        json_request(
            Method::POST,
            "/api/v1/registrations",
            participant.registration_body(event_id),
        ),
    )
    .await
}

/// Registers a participant and returns the minted ticket id.
pub async fn register_ticket(router: &Router, event_id: i64, participant: &TestParticipant) -> String {
    let (status, body) = register(router, event_id, participant).await;
    assert_eq!(status, StatusCode::CREATED, "registration failed: {body}");
    body["ticket_id"].as_str().unwrap().to_string()
}
