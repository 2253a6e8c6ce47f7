//! In-memory `TicketingStore` for tests and local runs without PostgreSQL.
//!
//! One async mutex guards all state, so every trait method is a single
//! serialized unit of work.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, MutexGuard};

use super::registration::evaluate_admission;
use super::store::{AdmissionResult, StoreError, TicketingStore};
use crate::models::event::CreateEventRequest;
use crate::models::roster::RosterSummary;
use crate::models::ticket::TicketMint;
use crate::models::{
    CheckInCounts, CheckInRecord, CheckInSource, Event, NewRegistration, NewRosterEntry,
    Registration, RegistrationWithEvent, RosterEntry,
};

#[derive(Debug, Default)]
struct State {
    events: Vec<Event>,
    registrations: Vec<Registration>,
    roster: Vec<RosterEntry>,
    check_ins: Vec<CheckInRecord>,
    next_event_id: i64,
    next_registration_id: i64,
    next_roster_id: i64,
    next_check_in_id: i64,
}

fn next_id(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

impl State {
    fn event(&self, event_id: i64) -> Option<&Event> {
        self.events.iter().find(|e| e.id == event_id)
    }

    fn push_check_in(
        &mut self,
        event_id: i64,
        email: &str,
        ticket_id: Option<String>,
        source: CheckInSource,
        at: DateTime<Utc>,
    ) -> CheckInRecord {
        let record = CheckInRecord {
            id: next_id(&mut self.next_check_in_id),
            event_id,
            email: email.to_string(),
            ticket_id,
            source,
            checked_in_at: at,
        };
        self.check_ins.push(record.clone());
        record
    }
}

/// `TicketingStore` backed by process memory.
#[derive(Debug, Default)]
pub struct MemoryTicketingStore {
    state: Mutex<State>,
    offline: AtomicBool,
}

impl MemoryTicketingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates losing the database: every call fails with `StoreError::Database`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    async fn lock(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Database("store is offline".to_string()));
        }
        Ok(self.state.lock().await)
    }
}

#[async_trait::async_trait]
impl TicketingStore for MemoryTicketingStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.lock().await.map(|_| ())
    }

    async fn create_event(&self, request: &CreateEventRequest) -> Result<Event, StoreError> {
        let mut state = self.lock().await?;
        let event = Event {
            id: next_id(&mut state.next_event_id),
            name: request.name.trim().to_string(),
            description: request.description.clone(),
            event_type: request.event_type,
            event_date: request.event_date,
            capacity: request.capacity,
            registration_open: request.registration_open,
            created_at: Utc::now(),
        };
        state.events.push(event.clone());
        Ok(event)
    }

    async fn find_event(&self, event_id: i64) -> Result<Option<Event>, StoreError> {
        Ok(self.lock().await?.event(event_id).cloned())
    }

    async fn list_events(&self) -> Result<Vec<Event>, StoreError> {
        let mut events = self.lock().await?.events.clone();
        events.sort_by_key(|e| (e.event_date, e.id));
        Ok(events)
    }

    async fn toggle_registration(&self, event_id: i64) -> Result<Option<bool>, StoreError> {
        let mut state = self.lock().await?;
        Ok(state
            .events
            .iter_mut()
            .find(|e| e.id == event_id)
            .map(|event| {
                event.registration_open = !event.registration_open;
                event.registration_open
            }))
    }

    async fn count_registrations(&self, event_id: i64) -> Result<i64, StoreError> {
        let state = self.lock().await?;
        Ok(state
            .registrations
            .iter()
            .filter(|r| r.event_id == event_id)
            .count() as i64)
    }

    async fn admit_registration(
        &self,
        new: &NewRegistration,
        mint: TicketMint,
    ) -> Result<AdmissionResult, StoreError> {
        let mut state = self.lock().await?;

        let event = state.event(new.event_id).cloned();
        let registered = state
            .registrations
            .iter()
            .filter(|r| r.event_id == new.event_id)
            .count() as i64;
        let duplicate = state
            .registrations
            .iter()
            .any(|r| r.event_id == new.event_id && r.email == new.email);

        let event = match evaluate_admission(event.as_ref(), registered, duplicate) {
            Ok(event) => event.clone(),
            Err(rejection) => return Ok(AdmissionResult::Rejected(rejection)),
        };

        // Mint before pushing so a failed mint leaves no provisional row behind.
        let id = next_id(&mut state.next_registration_id);
        let issued = mint(event.id, id)?;

        let registration = Registration {
            id,
            event_id: new.event_id,
            name: new.name.clone(),
            email: new.email.clone(),
            phone: new.phone.clone(),
            affiliation: new.affiliation.clone(),
            ticket_id: Some(issued.ticket_id.into_string()),
            qr_code: Some(issued.qr_code),
            checked_in: false,
            checked_in_at: None,
            created_at: Utc::now(),
        };
        state.registrations.push(registration.clone());

        Ok(AdmissionResult::Admitted {
            registration,
            event,
        })
    }

    async fn find_registration_by_ticket(
        &self,
        ticket_id: &str,
    ) -> Result<Option<RegistrationWithEvent>, StoreError> {
        let state = self.lock().await?;
        let Some(registration) = state
            .registrations
            .iter()
            .find(|r| r.ticket_id.as_deref() == Some(ticket_id))
        else {
            return Ok(None);
        };
        let event = state.event(registration.event_id).ok_or_else(|| {
            StoreError::Corrupt(format!(
                "registration {} references missing event {}",
                registration.id, registration.event_id
            ))
        })?;
        Ok(Some(RegistrationWithEvent {
            registration: registration.clone(),
            event_name: event.name.clone(),
            event_date: event.event_date,
        }))
    }

    async fn registration_exists(&self, event_id: i64, email: &str) -> Result<bool, StoreError> {
        let state = self.lock().await?;
        Ok(state
            .registrations
            .iter()
            .any(|r| r.event_id == event_id && r.email == email))
    }

    async fn list_registrations(&self, event_id: i64) -> Result<Vec<Registration>, StoreError> {
        let state = self.lock().await?;
        let mut registrations: Vec<Registration> = state
            .registrations
            .iter()
            .filter(|r| r.event_id == event_id)
            .cloned()
            .collect();
        registrations.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(registrations)
    }

    async fn mark_ticket_checked_in(
        &self,
        registration: &Registration,
    ) -> Result<Option<DateTime<Utc>>, StoreError> {
        let mut state = self.lock().await?;
        let now = Utc::now();

        let Some(stored) = state
            .registrations
            .iter_mut()
            .find(|r| r.id == registration.id)
        else {
            return Err(StoreError::Corrupt(format!(
                "registration {} vanished during check-in",
                registration.id
            )));
        };
        if stored.checked_in {
            return Ok(None);
        }
        stored.checked_in = true;
        stored.checked_in_at = Some(now);
        let (event_id, email, ticket_id) =
            (stored.event_id, stored.email.clone(), stored.ticket_id.clone());

        state.push_check_in(event_id, &email, ticket_id, CheckInSource::Code, now);
        Ok(Some(now))
    }

    async fn insert_roster_entry(
        &self,
        entry: &NewRosterEntry,
    ) -> Result<Option<RosterEntry>, StoreError> {
        let mut state = self.lock().await?;
        if state.roster.iter().any(|r| r.email == entry.email) {
            return Ok(None);
        }
        let stored = RosterEntry {
            id: next_id(&mut state.next_roster_id),
            name: entry.name.clone(),
            email: entry.email.clone(),
            affiliation: entry.affiliation.clone(),
            phone: entry.phone.clone(),
            imported_at: Utc::now(),
        };
        state.roster.push(stored.clone());
        Ok(Some(stored))
    }

    async fn find_roster_entry(&self, email: &str) -> Result<Option<RosterEntry>, StoreError> {
        let state = self.lock().await?;
        Ok(state.roster.iter().find(|r| r.email == email).cloned())
    }

    async fn list_roster(&self) -> Result<Vec<RosterEntry>, StoreError> {
        let mut roster = self.lock().await?.roster.clone();
        roster.sort_by(|a, b| (b.imported_at, b.id).cmp(&(a.imported_at, a.id)));
        Ok(roster)
    }

    async fn roster_summary(&self) -> Result<RosterSummary, StoreError> {
        let state = self.lock().await?;
        Ok(RosterSummary {
            total_participants: state.roster.len() as i64,
            latest_import: state.roster.iter().map(|r| r.imported_at).max(),
        })
    }

    async fn clear_roster(&self) -> Result<u64, StoreError> {
        let mut state = self.lock().await?;
        let deleted = state.roster.len() as u64;
        state.roster.clear();
        Ok(deleted)
    }

    async fn record_roster_check_in(
        &self,
        event_id: i64,
        email: &str,
    ) -> Result<Option<CheckInRecord>, StoreError> {
        let mut state = self.lock().await?;
        let exists = state.check_ins.iter().any(|c| {
            c.event_id == event_id && c.email == email && c.source == CheckInSource::Roster
        });
        if exists {
            return Ok(None);
        }
        Ok(Some(state.push_check_in(
            event_id,
            email,
            None,
            CheckInSource::Roster,
            Utc::now(),
        )))
    }

    async fn find_roster_check_in(
        &self,
        event_id: i64,
        email: &str,
    ) -> Result<Option<CheckInRecord>, StoreError> {
        let state = self.lock().await?;
        Ok(state
            .check_ins
            .iter()
            .find(|c| {
                c.event_id == event_id && c.email == email && c.source == CheckInSource::Roster
            })
            .cloned())
    }

    async fn check_in_counts(&self, event_id: i64) -> Result<CheckInCounts, StoreError> {
        let state = self.lock().await?;
        let registrations = state.registrations.iter().filter(|r| r.event_id == event_id);
        let check_ins = state.check_ins.iter().filter(|c| c.event_id == event_id);

        Ok(CheckInCounts {
            total_registrations: registrations.clone().count() as i64,
            checked_in_registrations: registrations.filter(|r| r.checked_in).count() as i64,
            roster_checkins: check_ins
                .clone()
                .filter(|c| c.source == CheckInSource::Roster)
                .count() as i64,
            total_checkins: check_ins.count() as i64,
        })
    }

    async fn recent_check_ins(
        &self,
        event_id: i64,
        limit: i64,
    ) -> Result<Vec<CheckInRecord>, StoreError> {
        let state = self.lock().await?;
        let mut records: Vec<CheckInRecord> = state
            .check_ins
            .iter()
            .filter(|c| c.event_id == event_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| (b.checked_in_at, b.id).cmp(&(a.checked_in_at, a.id)));
        records.truncate(usize::try_from(limit.max(0)).unwrap_or_default());
        Ok(records)
    }
}
