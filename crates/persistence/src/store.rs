//! PostgreSQL-backed `TicketingStore`.

use chrono::{DateTime, Utc};
use domain::models::event::CreateEventRequest;
use domain::models::roster::RosterSummary;
use domain::models::ticket::TicketMint;
use domain::models::{
    CheckInCounts, CheckInRecord, Event, NewRegistration, NewRosterEntry, Registration,
    RegistrationWithEvent, RosterEntry,
};
use domain::services::{AdmissionResult, StoreError, TicketingStore};
use sqlx::PgPool;

use crate::repositories::{
    CheckInRepository, EventRepository, RegistrationRepository, RosterRepository,
};

/// PostgreSQL unique-violation SQLSTATE.
const UNIQUE_VIOLATION: &str = "23505";

/// Maps a database error into the store error surfaced to the engines.
pub(crate) fn db_error(err: sqlx::Error) -> StoreError {
    tracing::error!(error = %err, "Database operation failed");
    StoreError::Database(err.to_string())
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION)
    )
}

/// `TicketingStore` over one shared connection pool.
#[derive(Clone)]
pub struct PgTicketingStore {
    pool: PgPool,
    events: EventRepository,
    registrations: RegistrationRepository,
    roster: RosterRepository,
    check_ins: CheckInRepository,
}

impl PgTicketingStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            events: EventRepository::new(pool.clone()),
            registrations: RegistrationRepository::new(pool.clone()),
            roster: RosterRepository::new(pool.clone()),
            check_ins: CheckInRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl TicketingStore for PgTicketingStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    async fn create_event(&self, request: &CreateEventRequest) -> Result<Event, StoreError> {
        let entity = self.events.create(request).await.map_err(db_error)?;
        Ok(entity.into())
    }

    async fn find_event(&self, event_id: i64) -> Result<Option<Event>, StoreError> {
        let entity = self.events.find_by_id(event_id).await.map_err(db_error)?;
        Ok(entity.map(Into::into))
    }

    async fn list_events(&self) -> Result<Vec<Event>, StoreError> {
        let entities = self.events.list().await.map_err(db_error)?;
        Ok(entities.into_iter().map(Into::into).collect())
    }

    async fn toggle_registration(&self, event_id: i64) -> Result<Option<bool>, StoreError> {
        self.events
            .toggle_registration(event_id)
            .await
            .map_err(db_error)
    }

    async fn count_registrations(&self, event_id: i64) -> Result<i64, StoreError> {
        self.events
            .count_registrations(event_id)
            .await
            .map_err(db_error)
    }

    async fn admit_registration(
        &self,
        registration: &NewRegistration,
        mint: TicketMint,
    ) -> Result<AdmissionResult, StoreError> {
        self.registrations.admit(registration, mint).await
    }

    async fn find_registration_by_ticket(
        &self,
        ticket_id: &str,
    ) -> Result<Option<RegistrationWithEvent>, StoreError> {
        let entity = self
            .registrations
            .find_by_ticket(ticket_id)
            .await
            .map_err(db_error)?;
        Ok(entity.map(Into::into))
    }

    async fn registration_exists(&self, event_id: i64, email: &str) -> Result<bool, StoreError> {
        self.registrations
            .exists(event_id, email)
            .await
            .map_err(db_error)
    }

    async fn list_registrations(&self, event_id: i64) -> Result<Vec<Registration>, StoreError> {
        let entities = self
            .registrations
            .list_for_event(event_id)
            .await
            .map_err(db_error)?;
        Ok(entities.into_iter().map(Into::into).collect())
    }

    async fn mark_ticket_checked_in(
        &self,
        registration: &Registration,
    ) -> Result<Option<DateTime<Utc>>, StoreError> {
        self.check_ins
            .record_code_check_in(registration.id)
            .await
            .map_err(db_error)
    }

    async fn insert_roster_entry(
        &self,
        entry: &NewRosterEntry,
    ) -> Result<Option<RosterEntry>, StoreError> {
        let entity = self.roster.insert(entry).await.map_err(db_error)?;
        Ok(entity.map(Into::into))
    }

    async fn find_roster_entry(&self, email: &str) -> Result<Option<RosterEntry>, StoreError> {
        let entity = self.roster.find_by_email(email).await.map_err(db_error)?;
        Ok(entity.map(Into::into))
    }

    async fn list_roster(&self) -> Result<Vec<RosterEntry>, StoreError> {
        let entities = self.roster.list().await.map_err(db_error)?;
        Ok(entities.into_iter().map(Into::into).collect())
    }

    async fn roster_summary(&self) -> Result<RosterSummary, StoreError> {
        let entity = self.roster.summary().await.map_err(db_error)?;
        Ok(RosterSummary {
            total_participants: entity.total_participants,
            latest_import: entity.latest_import,
        })
    }

    async fn clear_roster(&self) -> Result<u64, StoreError> {
        self.roster.clear().await.map_err(db_error)
    }

    async fn record_roster_check_in(
        &self,
        event_id: i64,
        email: &str,
    ) -> Result<Option<CheckInRecord>, StoreError> {
        let entity = self
            .check_ins
            .record_roster_check_in(event_id, email)
            .await
            .map_err(db_error)?;
        Ok(entity.map(Into::into))
    }

    async fn find_roster_check_in(
        &self,
        event_id: i64,
        email: &str,
    ) -> Result<Option<CheckInRecord>, StoreError> {
        let entity = self
            .check_ins
            .find_roster_check_in(event_id, email)
            .await
            .map_err(db_error)?;
        Ok(entity.map(Into::into))
    }

    async fn check_in_counts(&self, event_id: i64) -> Result<CheckInCounts, StoreError> {
        let entity = self.check_ins.counts(event_id).await.map_err(db_error)?;
        Ok(entity.into())
    }

    async fn recent_check_ins(
        &self,
        event_id: i64,
        limit: i64,
    ) -> Result<Vec<CheckInRecord>, StoreError> {
        let entities = self
            .check_ins
            .recent(event_id, limit)
            .await
            .map_err(db_error)?;
        Ok(entities.into_iter().map(Into::into).collect())
    }
}
