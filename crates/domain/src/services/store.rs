//! Persistent store seam used by the engines.
//!
//! Every method that participates in an admission decision is atomic with
//! respect to concurrent callers; the engines never read-then-write across two
//! calls where a race could change the answer.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::event::CreateEventRequest;
use crate::models::roster::RosterSummary;
use crate::models::ticket::{TicketCodeError, TicketMint};
use crate::models::{
    CheckInCounts, CheckInRecord, Event, NewRegistration, NewRosterEntry, Registration,
    RegistrationRejection, RegistrationWithEvent, RosterEntry,
};

/// Unexpected store failures. Admission rejections are not errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error(transparent)]
    TicketCode(#[from] TicketCodeError),
}

/// Result of the atomic admission unit of work.
#[derive(Debug, Clone)]
pub enum AdmissionResult {
    /// Registration committed with its ticket id and code.
    Admitted {
        registration: Registration,
        event: Event,
    },
    Rejected(RegistrationRejection),
}

/// Storage backend for events, registrations, roster and check-ins.
#[async_trait::async_trait]
pub trait TicketingStore: Send + Sync {
    /// Cheap connectivity check for readiness.
    async fn ping(&self) -> Result<(), StoreError>;

    // Events

    async fn create_event(&self, request: &CreateEventRequest) -> Result<Event, StoreError>;

    async fn find_event(&self, event_id: i64) -> Result<Option<Event>, StoreError>;

    /// All events ordered by event date ascending.
    async fn list_events(&self) -> Result<Vec<Event>, StoreError>;

    /// Flips the registration-open flag; returns the new value, `None` if the event is unknown.
    async fn toggle_registration(&self, event_id: i64) -> Result<Option<bool>, StoreError>;

    async fn count_registrations(&self, event_id: i64) -> Result<i64, StoreError>;

    // Registrations

    /// Runs the whole admission decision as one serialized unit of work per event:
    /// policy check, provisional insert, `mint`, ticket update, commit.
    async fn admit_registration(
        &self,
        registration: &NewRegistration,
        mint: TicketMint,
    ) -> Result<AdmissionResult, StoreError>;

    async fn find_registration_by_ticket(
        &self,
        ticket_id: &str,
    ) -> Result<Option<RegistrationWithEvent>, StoreError>;

    async fn registration_exists(&self, event_id: i64, email: &str) -> Result<bool, StoreError>;

    /// Registrations for an event, newest first.
    async fn list_registrations(&self, event_id: i64) -> Result<Vec<Registration>, StoreError>;

    /// Marks a ticketed registration checked in and appends a `code` check-in record.
    ///
    /// Returns the check-in time, or `None` when the registration was already checked in.
    async fn mark_ticket_checked_in(
        &self,
        registration: &Registration,
    ) -> Result<Option<DateTime<Utc>>, StoreError>;

    // Roster

    /// Inserts a roster entry; `None` when the email is already present.
    async fn insert_roster_entry(
        &self,
        entry: &NewRosterEntry,
    ) -> Result<Option<RosterEntry>, StoreError>;

    async fn find_roster_entry(&self, email: &str) -> Result<Option<RosterEntry>, StoreError>;

    /// Roster entries, most recently imported first.
    async fn list_roster(&self) -> Result<Vec<RosterEntry>, StoreError>;

    async fn roster_summary(&self) -> Result<RosterSummary, StoreError>;

    /// Deletes every roster entry; returns the number removed.
    async fn clear_roster(&self) -> Result<u64, StoreError>;

    // Check-ins

    /// Appends a `roster` check-in; `None` when one already exists for (event, email).
    async fn record_roster_check_in(
        &self,
        event_id: i64,
        email: &str,
    ) -> Result<Option<CheckInRecord>, StoreError>;

    async fn find_roster_check_in(
        &self,
        event_id: i64,
        email: &str,
    ) -> Result<Option<CheckInRecord>, StoreError>;

    async fn check_in_counts(&self, event_id: i64) -> Result<CheckInCounts, StoreError>;

    /// Check-ins for an event, newest first.
    async fn recent_check_ins(
        &self,
        event_id: i64,
        limit: i64,
    ) -> Result<Vec<CheckInRecord>, StoreError>;
}
