//! Registration engine: admission of ticketed signups.

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::notification::{NotificationResult, TicketDelivery, TicketNotifier};
use super::store::{AdmissionResult, StoreError, TicketingStore};
use crate::models::ticket::mint_ticket;
use crate::models::{
    Event, NewRegistration, Registration, RegistrationDecision, RegistrationReceipt,
    RegistrationRejection, RegistrationWithEvent,
};
use crate::models::registration::TicketVerification;

/// Default bound on a single notification attempt.
pub const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Admission policy, checked in order: existence, open flag, capacity, duplicate.
///
/// Stores call this inside their serialized unit of work so that `registered`
/// and `duplicate` cannot change before the insert.
pub fn evaluate_admission(
    event: Option<&Event>,
    registered: i64,
    duplicate: bool,
) -> Result<&Event, RegistrationRejection> {
    let event = event.ok_or(RegistrationRejection::EventNotFound)?;
    if !event.registration_open {
        return Err(RegistrationRejection::RegistrationClosed);
    }
    if registered >= i64::from(event.capacity) {
        return Err(RegistrationRejection::EventFull);
    }
    if duplicate {
        return Err(RegistrationRejection::DuplicateRegistration);
    }
    Ok(event)
}

/// Registers participants and hands their tickets to the notifier.
#[derive(Clone)]
pub struct RegistrationService {
    store: Arc<dyn TicketingStore>,
    notifier: Arc<dyn TicketNotifier>,
    notify_timeout: Duration,
}

impl RegistrationService {
    pub fn new(
        store: Arc<dyn TicketingStore>,
        notifier: Arc<dyn TicketNotifier>,
        notify_timeout: Duration,
    ) -> Self {
        Self {
            store,
            notifier,
            notify_timeout,
        }
    }

    /// Admits a registration, then attempts ticket delivery.
    ///
    /// Delivery failure or timeout only clears `notification_sent`.
    pub async fn register(
        &self,
        registration: NewRegistration,
    ) -> Result<RegistrationDecision, StoreError> {
        let (registration, event) = match self
            .store
            .admit_registration(&registration, mint_ticket)
            .await?
        {
            AdmissionResult::Admitted {
                registration,
                event,
            } => (registration, event),
            AdmissionResult::Rejected(rejection) => {
                info!(
                    event_id = registration.event_id,
                    reason = rejection.reason(),
                    "Registration rejected"
                );
                return Ok(RegistrationDecision::Rejected(rejection));
            }
        };

        let (ticket_id, qr_code) = issued_ticket(&registration)?;

        info!(
            event_id = event.id,
            registration_id = registration.id,
            ticket_id = %ticket_id,
            "Registration admitted"
        );

        let delivery = TicketDelivery {
            recipient_email: registration.email.clone(),
            recipient_name: registration.name.clone(),
            event_name: event.name.clone(),
            event_date_display: event.date_display(),
            ticket_id: ticket_id.clone(),
            qr_code: qr_code.clone(),
        };
        let notification_sent = self.deliver(delivery).await;

        Ok(RegistrationDecision::Admitted(RegistrationReceipt {
            registration_id: registration.id,
            ticket_id,
            qr_code,
            event_name: event.name,
            notification_sent,
        }))
    }

    async fn deliver(&self, delivery: TicketDelivery) -> bool {
        let ticket_id = delivery.ticket_id.clone();
        match tokio::time::timeout(self.notify_timeout, self.notifier.send_ticket(delivery)).await
        {
            Ok(NotificationResult::Sent) => true,
            Ok(NotificationResult::Skipped) => false,
            Ok(NotificationResult::Failed(reason)) => {
                warn!(ticket_id = %ticket_id, error = %reason, "Ticket delivery failed");
                false
            }
            Err(_) => {
                warn!(
                    ticket_id = %ticket_id,
                    timeout_secs = self.notify_timeout.as_secs(),
                    "Ticket delivery timed out"
                );
                false
            }
        }
    }

    pub async fn get_by_ticket(
        &self,
        ticket_id: &str,
    ) -> Result<Option<RegistrationWithEvent>, StoreError> {
        self.store.find_registration_by_ticket(ticket_id).await
    }

    pub async fn verify_ticket(&self, ticket_id: &str) -> Result<TicketVerification, StoreError> {
        Ok(self
            .store
            .find_registration_by_ticket(ticket_id)
            .await?
            .map(TicketVerification::from)
            .unwrap_or_else(TicketVerification::invalid))
    }

    /// Registrations for an event, newest first; `None` if the event does not exist.
    pub async fn list_for_event(
        &self,
        event_id: i64,
    ) -> Result<Option<Vec<Registration>>, StoreError> {
        if self.store.find_event(event_id).await?.is_none() {
            return Ok(None);
        }
        self.store.list_registrations(event_id).await.map(Some)
    }
}

fn issued_ticket(registration: &Registration) -> Result<(String, String), StoreError> {
    match (&registration.ticket_id, &registration.qr_code) {
        (Some(ticket_id), Some(qr_code)) => Ok((ticket_id.clone(), qr_code.clone())),
        _ => Err(StoreError::Corrupt(format!(
            "registration {} admitted without a ticket",
            registration.id
        ))),
    }
}
