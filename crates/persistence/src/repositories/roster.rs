//! Roster repository for database operations.

use domain::models::NewRosterEntry;
use sqlx::PgPool;

use crate::entities::{RosterEntryEntity, RosterSummaryEntity};
use crate::metrics::QueryTimer;

/// Repository for roster database operations.
#[derive(Clone)]
pub struct RosterRepository {
    pool: PgPool,
}

impl RosterRepository {
    /// Creates a new RosterRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Insert a roster entry. Returns `None` when the email already exists.
    pub async fn insert(
        &self,
        entry: &NewRosterEntry,
    ) -> Result<Option<RosterEntryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("insert_roster_entry");
        let result = sqlx::query_as::<_, RosterEntryEntity>(
            r#"
            INSERT INTO roster_entries (name, email, affiliation, phone)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email) DO NOTHING
            RETURNING id, name, email, affiliation, phone, imported_at
            "#,
        )
        .bind(&entry.name)
        .bind(&entry.email)
        .bind(entry.affiliation.as_deref())
        .bind(entry.phone.as_deref())
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find roster entry by normalized email.
    pub async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<RosterEntryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_roster_entry_by_email");
        let result = sqlx::query_as::<_, RosterEntryEntity>(
            r#"
            SELECT id, name, email, affiliation, phone, imported_at
            FROM roster_entries
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List all roster entries, most recently imported first.
    pub async fn list(&self) -> Result<Vec<RosterEntryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_roster_entries");
        let result = sqlx::query_as::<_, RosterEntryEntity>(
            r#"
            SELECT id, name, email, affiliation, phone, imported_at
            FROM roster_entries
            ORDER BY imported_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn summary(&self) -> Result<RosterSummaryEntity, sqlx::Error> {
        let timer = QueryTimer::new("roster_summary");
        let result = sqlx::query_as::<_, RosterSummaryEntity>(
            r#"
            SELECT COUNT(*) as total_participants, MAX(imported_at) as latest_import
            FROM roster_entries
            "#,
        )
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Delete every roster entry. Returns the number of deleted records.
    pub async fn clear(&self) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("clear_roster");
        let result = sqlx::query("DELETE FROM roster_entries")
            .execute(&self.pool)
            .await;
        timer.record();
        Ok(result?.rows_affected())
    }
}
