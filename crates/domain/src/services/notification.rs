//! Ticket notification gateway.
//!
//! Delivers an issued ticket to the participant. Delivery is best-effort: the
//! result is reported to the caller and never rolls back a registration.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;

/// Everything a notifier needs to render and deliver a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TicketDelivery {
    pub recipient_email: String,
    pub recipient_name: String,
    pub event_name: String,
    pub event_date_display: String,
    pub ticket_id: String,
    /// Inline `data:` URI of the ticket's QR image.
    pub qr_code: String,
}

/// Result of a notification send attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationResult {
    /// Notification was handed to the provider.
    Sent,
    /// Sending failed (non-blocking).
    Failed(String),
    /// Notification was skipped (e.g. email disabled).
    Skipped,
}

impl NotificationResult {
    pub fn is_sent(&self) -> bool {
        matches!(self, NotificationResult::Sent)
    }
}

/// Gateway for delivering tickets to participants.
#[async_trait::async_trait]
pub trait TicketNotifier: Send + Sync {
    /// Deliver a ticket. Implementations log failures and report them in the result.
    async fn send_ticket(&self, delivery: TicketDelivery) -> NotificationResult;
}

/// Mock notifier for development and testing.
///
/// Records deliveries instead of sending them.
#[derive(Debug, Default)]
pub struct MockTicketNotifier {
    /// Whether to simulate failures for testing.
    pub simulate_failure: bool,
    /// Artificial latency before answering.
    pub delay: Option<Duration>,
    sent: Mutex<Vec<TicketDelivery>>,
}

impl MockTicketNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock notifier that simulates failures.
    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
            ..Self::default()
        }
    }

    /// Create a mock notifier that answers only after `delay`.
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    /// Deliveries accepted so far.
    pub fn sent(&self) -> Vec<TicketDelivery> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl TicketNotifier for MockTicketNotifier {
    async fn send_ticket(&self, delivery: TicketDelivery) -> NotificationResult {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.simulate_failure {
            tracing::warn!(
                ticket_id = %delivery.ticket_id,
                "Mock ticket notifier simulating failure"
            );
            return NotificationResult::Failed("Simulated failure".to_string());
        }

        tracing::info!(
            recipient = %delivery.recipient_email,
            ticket_id = %delivery.ticket_id,
            event_name = %delivery.event_name,
            "Mock: Would send ticket email"
        );

        if let Ok(mut sent) = self.sent.lock() {
            sent.push(delivery);
        }
        NotificationResult::Sent
    }
}
