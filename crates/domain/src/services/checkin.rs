//! Check-in engine: entry decisions for ticket holders and roster participants.

use std::sync::Arc;
use tracing::info;

use super::store::{StoreError, TicketingStore};
use crate::models::checkin::clamp_recent_limit;
use crate::models::{CheckInOutcome, CheckInRecord, CheckInStats};
use shared::validation::normalize_email;

#[derive(Clone)]
pub struct CheckInService {
    store: Arc<dyn TicketingStore>,
}

impl CheckInService {
    pub fn new(store: Arc<dyn TicketingStore>) -> Self {
        Self { store }
    }

    /// Checks in a ticket holder by ticket id.
    ///
    /// A ticket for another event is rejected without touching any state.
    pub async fn check_in_by_code(
        &self,
        ticket_id: &str,
        event_id: i64,
    ) -> Result<CheckInOutcome, StoreError> {
        let Some(found) = self
            .store
            .find_registration_by_ticket(ticket_id.trim())
            .await?
        else {
            return Ok(CheckInOutcome::invalid_ticket());
        };

        let registration = &found.registration;
        if registration.event_id != event_id {
            info!(
                ticket_id = %ticket_id,
                ticket_event_id = registration.event_id,
                event_id,
                "Ticket presented at wrong event"
            );
            return Ok(CheckInOutcome::wrong_event(&found.event_name));
        }

        if let (true, Some(at)) = (registration.checked_in, registration.checked_in_at) {
            return Ok(CheckInOutcome::already_checked_in(
                Some(registration.name.clone()),
                at,
            ));
        }

        match self.store.mark_ticket_checked_in(registration).await? {
            Some(at) => {
                info!(
                    event_id,
                    registration_id = registration.id,
                    "Ticket holder checked in"
                );
                Ok(CheckInOutcome::admitted_by_code(
                    registration,
                    &found.event_name,
                    at,
                ))
            }
            None => self.lost_code_race(ticket_id).await,
        }
    }

    /// Another request won the conditional update; report its timestamp.
    async fn lost_code_race(&self, ticket_id: &str) -> Result<CheckInOutcome, StoreError> {
        let reread = self
            .store
            .find_registration_by_ticket(ticket_id.trim())
            .await?
            .map(|found| found.registration);

        match reread {
            Some(registration) => {
                let at = registration.checked_in_at.ok_or_else(|| {
                    StoreError::Corrupt(format!(
                        "registration {} checked in without a timestamp",
                        registration.id
                    ))
                })?;
                Ok(CheckInOutcome::already_checked_in(
                    Some(registration.name),
                    at,
                ))
            }
            None => Ok(CheckInOutcome::invalid_ticket()),
        }
    }

    /// Checks in by email: roster participants are admitted directly,
    /// ticket holders are sent to the code scanner.
    pub async fn check_in_by_identity(
        &self,
        email: &str,
        event_id: i64,
    ) -> Result<CheckInOutcome, StoreError> {
        let email = normalize_email(email);

        let Some(entry) = self.store.find_roster_entry(&email).await? else {
            if self.store.registration_exists(event_id, &email).await? {
                return Ok(CheckInOutcome::has_ticket());
            }
            return Ok(CheckInOutcome::unknown_identity());
        };

        if let Some(existing) = self.store.find_roster_check_in(event_id, &email).await? {
            return Ok(CheckInOutcome::already_checked_in(
                Some(entry.name),
                existing.checked_in_at,
            ));
        }

        match self.store.record_roster_check_in(event_id, &email).await? {
            Some(record) => {
                info!(event_id, email = %email, "Roster participant checked in");
                Ok(CheckInOutcome::admitted_from_roster(
                    &entry,
                    record.checked_in_at,
                ))
            }
            None => {
                let existing = self
                    .store
                    .find_roster_check_in(event_id, &email)
                    .await?
                    .ok_or_else(|| {
                        StoreError::Corrupt(format!(
                            "roster check-in for {} at event {} conflicted but is missing",
                            email, event_id
                        ))
                    })?;
                Ok(CheckInOutcome::already_checked_in(
                    Some(entry.name),
                    existing.checked_in_at,
                ))
            }
        }
    }

    /// Statistics for one event; `None` if the event does not exist.
    pub async fn stats(&self, event_id: i64) -> Result<Option<CheckInStats>, StoreError> {
        let Some(event) = self.store.find_event(event_id).await? else {
            return Ok(None);
        };
        let counts = self.store.check_in_counts(event_id).await?;
        Ok(Some(CheckInStats::new(event.name, event.capacity, counts)))
    }

    pub async fn recent(
        &self,
        event_id: i64,
        limit: Option<i64>,
    ) -> Result<Vec<CheckInRecord>, StoreError> {
        self.store
            .recent_check_ins(event_id, clamp_recent_limit(limit))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::{CreateEventRequest, EventType};
    use crate::models::{
        CheckInReason, CheckInSource, NewRegistration, NewRosterEntry, RegistrationDecision,
    };
    use crate::services::memory_store::MemoryTicketingStore;
    use crate::services::notification::MockTicketNotifier;
    use crate::services::registration::RegistrationService;
    use chrono::Utc;
    use std::time::Duration;

    struct Fixture {
        store: Arc<MemoryTicketingStore>,
        registrations: RegistrationService,
        check_ins: CheckInService,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryTicketingStore::new());
        Fixture {
            registrations: RegistrationService::new(
                store.clone(),
                Arc::new(MockTicketNotifier::new()),
                Duration::from_secs(1),
            ),
            check_ins: CheckInService::new(store.clone()),
            store,
        }
    }

    async fn create_event(store: &MemoryTicketingStore, name: &str, capacity: i32) -> i64 {
        store
            .create_event(&CreateEventRequest {
                name: name.to_string(),
                description: None,
                event_type: EventType::HackathonDay,
                event_date: Utc::now(),
                capacity,
                registration_open: true,
            })
            .await
            .unwrap()
            .id
    }

    async fn register(fx: &Fixture, event_id: i64, email: &str) -> String {
        let decision = fx
            .registrations
            .register(NewRegistration {
                event_id,
                name: "Ticket Holder".to_string(),
                email: email.to_string(),
                phone: "4155550123".to_string(),
                affiliation: "Uni".to_string(),
            })
            .await
            .unwrap();
        match decision {
            RegistrationDecision::Admitted(receipt) => receipt.ticket_id,
            RegistrationDecision::Rejected(r) => panic!("registration rejected: {r}"),
        }
    }

    async fn import(store: &MemoryTicketingStore, email: &str) {
        store
            .insert_roster_entry(&NewRosterEntry {
                name: "Roster Person".to_string(),
                email: email.to_string(),
                affiliation: Some("Guild".to_string()),
                phone: None,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_code_check_in_twice() {
        let fx = fixture();
        let event_id = create_event(&fx.store, "Hack Day", 10).await;
        let ticket = register(&fx, event_id, "t@x.com").await;

        let first = fx.check_ins.check_in_by_code(&ticket, event_id).await.unwrap();
        assert!(first.success);
        assert_eq!(first.reason, CheckInReason::Success);
        assert_eq!(first.source, Some(CheckInSource::Code));
        assert_eq!(first.event_name.as_deref(), Some("Hack Day"));

        let second = fx.check_ins.check_in_by_code(&ticket, event_id).await.unwrap();
        assert!(!second.success);
        assert_eq!(second.reason, CheckInReason::AlreadyCheckedIn);
        assert_eq!(second.checked_in_at, first.checked_in_at);

        let third = fx.check_ins.check_in_by_code(&ticket, event_id).await.unwrap();
        assert_eq!(third.checked_in_at, first.checked_in_at);
    }

    #[tokio::test]
    async fn test_code_check_in_unknown_ticket() {
        let fx = fixture();
        let event_id = create_event(&fx.store, "Hack Day", 10).await;
        let outcome = fx
            .check_ins
            .check_in_by_code("EVT0001-REG000001-ZZZZZZ", event_id)
            .await
            .unwrap();
        assert_eq!(outcome.reason, CheckInReason::NotFound);
        assert_eq!(outcome.message, "Invalid ticket");
    }

    #[tokio::test]
    async fn test_code_check_in_wrong_event_does_not_mutate() {
        let fx = fixture();
        let kickoff = create_event(&fx.store, "Kickoff", 10).await;
        let hack_day = create_event(&fx.store, "Hack Day", 10).await;
        let ticket = register(&fx, kickoff, "t@x.com").await;

        let outcome = fx.check_ins.check_in_by_code(&ticket, hack_day).await.unwrap();
        assert_eq!(outcome.reason, CheckInReason::WrongEvent);
        assert!(outcome.message.contains("Kickoff"));

        let found = fx.store.find_registration_by_ticket(&ticket).await.unwrap().unwrap();
        assert!(!found.registration.checked_in);
        assert_eq!(fx.store.check_in_counts(kickoff).await.unwrap().total_checkins, 0);
        assert_eq!(fx.store.check_in_counts(hack_day).await.unwrap().total_checkins, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_code_check_in_admits_once() {
        let fx = fixture();
        let event_id = create_event(&fx.store, "Hack Day", 10).await;
        let ticket = register(&fx, event_id, "t@x.com").await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let service = fx.check_ins.clone();
            let ticket = ticket.clone();
            handles.push(tokio::spawn(async move {
                service.check_in_by_code(&ticket, event_id).await
            }));
        }

        let mut successes = 0;
        for handle in handles {
            let outcome = handle.await.unwrap().unwrap();
            if outcome.success {
                successes += 1;
            } else {
                assert_eq!(outcome.reason, CheckInReason::AlreadyCheckedIn);
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(fx.store.check_in_counts(event_id).await.unwrap().total_checkins, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_identity_check_in_admits_once() {
        let fx = fixture();
        let event_id = create_event(&fx.store, "Hack Day", 10).await;
        import(&fx.store, "walkin@x.com").await;

        let mut handles = Vec::new();
        for i in 0..12 {
            let service = fx.check_ins.clone();
            // Same participant, typed differently at each door.
            let email = if i % 2 == 0 { "walkin@x.com" } else { " WALKIN@x.com" };
            handles.push(tokio::spawn(async move {
                service.check_in_by_identity(email, event_id).await
            }));
        }

        let mut successes = 0;
        let mut first_at = None;
        for handle in handles {
            let outcome = handle.await.unwrap().unwrap();
            if outcome.success {
                successes += 1;
                assert_eq!(outcome.source, Some(CheckInSource::Roster));
            } else {
                assert_eq!(outcome.reason, CheckInReason::AlreadyCheckedIn);
                let at = outcome.checked_in_at.unwrap();
                assert_eq!(*first_at.get_or_insert(at), at);
            }
        }
        assert_eq!(successes, 1);

        let counts = fx.store.check_in_counts(event_id).await.unwrap();
        assert_eq!(counts.roster_checkins, 1);
        assert_eq!(counts.total_checkins, 1);
    }

    #[tokio::test]
    async fn test_identity_check_in_normalizes_email() {
        let fx = fixture();
        let event_id = create_event(&fx.store, "Hack Day", 10).await;
        import(&fx.store, "c@x.com").await;

        let outcome = fx
            .check_ins
            .check_in_by_identity("C@X.com ", event_id)
            .await
            .unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.source, Some(CheckInSource::Roster));
        assert_eq!(outcome.email.as_deref(), Some("c@x.com"));
        assert_eq!(outcome.affiliation.as_deref(), Some("Guild"));
    }

    #[tokio::test]
    async fn test_identity_check_in_idempotent_per_event() {
        let fx = fixture();
        let first_event = create_event(&fx.store, "Kickoff", 10).await;
        let second_event = create_event(&fx.store, "Hack Day", 10).await;
        import(&fx.store, "r@x.com").await;

        let first = fx
            .check_ins
            .check_in_by_identity("r@x.com", first_event)
            .await
            .unwrap();
        assert!(first.success);

        let again = fx
            .check_ins
            .check_in_by_identity("r@x.com", first_event)
            .await
            .unwrap();
        assert_eq!(again.reason, CheckInReason::AlreadyCheckedIn);
        assert_eq!(again.checked_in_at, first.checked_in_at);

        let other = fx
            .check_ins
            .check_in_by_identity("r@x.com", second_event)
            .await
            .unwrap();
        assert!(other.success);
    }

    #[tokio::test]
    async fn test_identity_check_in_ticket_holder_redirected() {
        let fx = fixture();
        let event_id = create_event(&fx.store, "Hack Day", 10).await;
        register(&fx, event_id, "holder@x.com").await;

        let outcome = fx
            .check_ins
            .check_in_by_identity("Holder@X.com", event_id)
            .await
            .unwrap();
        assert_eq!(outcome.reason, CheckInReason::HasTicket);

        let unknown = fx
            .check_ins
            .check_in_by_identity("nobody@x.com", event_id)
            .await
            .unwrap();
        assert_eq!(unknown.reason, CheckInReason::NotFound);
    }

    #[tokio::test]
    async fn test_stats_counts_both_sources() {
        let fx = fixture();
        let event_id = create_event(&fx.store, "Hack Day", 2).await;
        let ticket = register(&fx, event_id, "t@x.com").await;
        register(&fx, event_id, "u@x.com").await;
        fx.check_ins.check_in_by_code(&ticket, event_id).await.unwrap();

        for email in ["r1@x.com", "r2@x.com"] {
            import(&fx.store, email).await;
            fx.check_ins.check_in_by_identity(email, event_id).await.unwrap();
        }

        let stats = fx.check_ins.stats(event_id).await.unwrap().unwrap();
        assert_eq!(stats.event_name, "Hack Day");
        assert_eq!(stats.total_registrations, 2);
        assert_eq!(stats.checked_in_registrations, 1);
        assert_eq!(stats.roster_checkins, 2);
        assert_eq!(stats.total_checkins, 3);
        assert_eq!(stats.remaining_capacity, -1);

        assert!(fx.check_ins.stats(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_recent_clamps_limit() {
        let fx = fixture();
        let event_id = create_event(&fx.store, "Hack Day", 10).await;
        for i in 0..3 {
            let email = format!("r{}@x.com", i);
            import(&fx.store, &email).await;
            fx.check_ins.check_in_by_identity(&email, event_id).await.unwrap();
        }

        assert_eq!(fx.check_ins.recent(event_id, None).await.unwrap().len(), 3);
        assert_eq!(fx.check_ins.recent(event_id, Some(0)).await.unwrap().len(), 1);
        let newest = fx.check_ins.recent(event_id, Some(2)).await.unwrap();
        assert_eq!(newest.len(), 2);
        assert_eq!(newest[0].email, "r2@x.com");
    }
}
