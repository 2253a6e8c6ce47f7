//! Event repository for database operations.

use domain::models::event::CreateEventRequest;
use sqlx::PgPool;

use crate::entities::{EventEntity, EventTypeDb};
use crate::metrics::QueryTimer;

/// Repository for event-related database operations.
#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    /// Creates a new EventRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create a new event.
    pub async fn create(&self, request: &CreateEventRequest) -> Result<EventEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_event");
        let result = sqlx::query_as::<_, EventEntity>(
            r#"
            INSERT INTO events (name, description, event_type, event_date, capacity, registration_open)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, description, event_type, event_date, capacity, registration_open, created_at
            "#,
        )
        .bind(request.name.trim())
        .bind(request.description.as_deref())
        .bind(EventTypeDb::from(request.event_type))
        .bind(request.event_date)
        .bind(request.capacity)
        .bind(request.registration_open)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find event by ID.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<EventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_event_by_id");
        let result = sqlx::query_as::<_, EventEntity>(
            r#"
            SELECT id, name, description, event_type, event_date, capacity, registration_open, created_at
            FROM events
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List all events, soonest first.
    pub async fn list(&self) -> Result<Vec<EventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_events");
        let result = sqlx::query_as::<_, EventEntity>(
            r#"
            SELECT id, name, description, event_type, event_date, capacity, registration_open, created_at
            FROM events
            ORDER BY event_date ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Flip the registration-open flag. Returns the new value.
    pub async fn toggle_registration(&self, id: i64) -> Result<Option<bool>, sqlx::Error> {
        let timer = QueryTimer::new("toggle_event_registration");
        let result = sqlx::query_scalar::<_, bool>(
            r#"
            UPDATE events
            SET registration_open = NOT registration_open
            WHERE id = $1
            RETURNING registration_open
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Count registrations for an event.
    pub async fn count_registrations(&self, event_id: i64) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_event_registrations");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM registrations WHERE event_id = $1
            "#,
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }
}
