//! Check-in repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::entities::{CheckInCountsEntity, CheckInEntity, CheckInSourceDb};
use crate::metrics::QueryTimer;

/// Repository for check-in database operations.
#[derive(Clone)]
pub struct CheckInRepository {
    pool: PgPool,
}

impl CheckInRepository {
    /// Creates a new CheckInRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Mark a registration checked in and append a `code` check-in, atomically.
    ///
    /// The update only matches while `checked_in = FALSE`, so exactly one
    /// concurrent caller gets a timestamp back; the rest get `None`.
    pub async fn record_code_check_in(
        &self,
        registration_id: i64,
    ) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
        let timer = QueryTimer::new("record_code_check_in");
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, (i64, String, Option<String>, DateTime<Utc>)>(
            r#"
            UPDATE registrations
            SET checked_in = TRUE, checked_in_at = NOW()
            WHERE id = $1 AND checked_in = FALSE
            RETURNING event_id, email, ticket_id, checked_in_at
            "#,
        )
        .bind(registration_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((event_id, email, ticket_id, checked_in_at)) = updated else {
            timer.record();
            return Ok(None);
        };

        sqlx::query(
            r#"
            INSERT INTO check_ins (event_id, email, ticket_id, source, checked_in_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(event_id)
        .bind(&email)
        .bind(ticket_id.as_deref())
        .bind(CheckInSourceDb::Code)
        .bind(checked_in_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(Some(checked_in_at))
    }

    /// Append a `roster` check-in. Returns `None` if one already exists for (event, email).
    pub async fn record_roster_check_in(
        &self,
        event_id: i64,
        email: &str,
    ) -> Result<Option<CheckInEntity>, sqlx::Error> {
        let timer = QueryTimer::new("record_roster_check_in");
        let result = sqlx::query_as::<_, CheckInEntity>(
            r#"
            INSERT INTO check_ins (event_id, email, source)
            VALUES ($1, $2, $3)
            ON CONFLICT (event_id, email) WHERE source = 'roster' DO NOTHING
            RETURNING id, event_id, email, ticket_id, source, checked_in_at
            "#,
        )
        .bind(event_id)
        .bind(email)
        .bind(CheckInSourceDb::Roster)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_roster_check_in(
        &self,
        event_id: i64,
        email: &str,
    ) -> Result<Option<CheckInEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_roster_check_in");
        let result = sqlx::query_as::<_, CheckInEntity>(
            r#"
            SELECT id, event_id, email, ticket_id, source, checked_in_at
            FROM check_ins
            WHERE event_id = $1 AND email = $2 AND source = 'roster'
            "#,
        )
        .bind(event_id)
        .bind(email)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Registration and check-in counts for an event.
    pub async fn counts(&self, event_id: i64) -> Result<CheckInCountsEntity, sqlx::Error> {
        let timer = QueryTimer::new("check_in_counts");
        let result = sqlx::query_as::<_, CheckInCountsEntity>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM registrations WHERE event_id = $1) as total_registrations,
                (SELECT COUNT(*) FROM registrations WHERE event_id = $1 AND checked_in) as checked_in_registrations,
                (SELECT COUNT(*) FROM check_ins WHERE event_id = $1 AND source = 'roster') as roster_checkins,
                (SELECT COUNT(*) FROM check_ins WHERE event_id = $1) as total_checkins
            "#,
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Most recent check-ins for an event.
    pub async fn recent(&self, event_id: i64, limit: i64) -> Result<Vec<CheckInEntity>, sqlx::Error> {
        let timer = QueryTimer::new("recent_check_ins");
        let result = sqlx::query_as::<_, CheckInEntity>(
            r#"
            SELECT id, event_id, email, ticket_id, source, checked_in_at
            FROM check_ins
            WHERE event_id = $1
            ORDER BY checked_in_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(event_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
