//! Registration domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::validation::normalize_email;
use validator::Validate;

/// A participant's registration for an event.
///
/// `ticket_id` and `qr_code` are `None` only while the registration is
/// provisional inside the admission unit of work.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Registration {
    pub id: i64,
    pub event_id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub affiliation: String,
    pub ticket_id: Option<String>,
    pub qr_code: Option<String>,
    pub checked_in: bool,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Registration joined with the name and date of its event.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RegistrationWithEvent {
    #[serde(flatten)]
    pub registration: Registration,
    pub event_name: String,
    pub event_date: DateTime<Utc>,
}

/// Request payload for registering for an event.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateRegistrationRequest {
    pub event_id: i64,

    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: String,

    #[validate(custom(function = "shared::validation::validate_participant_email"))]
    pub email: String,

    #[validate(regex(
        path = *PHONE_REGEX,
        message = "phone must be 10-15 digits with optional leading +"
    ))]
    pub phone: String,

    #[serde(alias = "college")]
    #[validate(length(min = 1, max = 200, message = "affiliation must be 1-200 characters"))]
    pub affiliation: String,
}

lazy_static::lazy_static! {
    static ref PHONE_REGEX: regex::Regex = regex::Regex::new(r"^\+?[1-9]\d{9,14}$").unwrap();
}

/// Normalized registration input handed to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRegistration {
    pub event_id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub affiliation: String,
}

impl From<CreateRegistrationRequest> for NewRegistration {
    fn from(request: CreateRegistrationRequest) -> Self {
        Self {
            event_id: request.event_id,
            name: request.name.trim().to_string(),
            email: normalize_email(&request.email),
            phone: request.phone.trim().to_string(),
            affiliation: request.affiliation.trim().to_string(),
        }
    }
}

/// Why a registration was not admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationRejection {
    EventNotFound,
    RegistrationClosed,
    EventFull,
    DuplicateRegistration,
}

impl RegistrationRejection {
    /// Stable reason code for API consumers.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::EventNotFound => "event_not_found",
            Self::RegistrationClosed => "registration_closed",
            Self::EventFull => "event_full",
            Self::DuplicateRegistration => "duplicate_registration",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::EventNotFound => "Event not found",
            Self::RegistrationClosed => "Registration is closed for this event",
            Self::EventFull => "Event is full",
            Self::DuplicateRegistration => "You have already registered for this event",
        }
    }
}

impl std::fmt::Display for RegistrationRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.reason())
    }
}

/// Result of a successful admission.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RegistrationReceipt {
    pub registration_id: i64,
    pub ticket_id: String,
    pub qr_code: String,
    pub event_name: String,
    pub notification_sent: bool,
}

/// Outcome of a registration attempt. Rejections are expected outcomes, not errors.
#[derive(Debug, Clone)]
pub enum RegistrationDecision {
    Admitted(RegistrationReceipt),
    Rejected(RegistrationRejection),
}

/// Response after a successful registration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CreateRegistrationResponse {
    pub message: String,
    pub registration_id: i64,
    pub ticket_id: String,
    pub qr_code: String,
    pub event_name: String,
    pub notification_sent: bool,
}

impl From<RegistrationReceipt> for CreateRegistrationResponse {
    fn from(receipt: RegistrationReceipt) -> Self {
        let message = if receipt.notification_sent {
            "Registration successful! Check your email for the ticket."
        } else {
            "Registration successful! Your ticket could not be emailed; keep your ticket ID."
        };
        Self {
            message: message.to_string(),
            registration_id: receipt.registration_id,
            ticket_id: receipt.ticket_id,
            qr_code: receipt.qr_code,
            event_name: receipt.event_name,
            notification_sent: receipt.notification_sent,
        }
    }
}

/// Quick validity check for a presented ticket.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct TicketVerification {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub already_checked_in: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked_in_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participant_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
}

impl TicketVerification {
    pub fn invalid() -> Self {
        Self {
            valid: false,
            already_checked_in: None,
            message: Some("Invalid ticket".to_string()),
            checked_in_at: None,
            participant_name: None,
            event_name: None,
        }
    }
}

impl From<RegistrationWithEvent> for TicketVerification {
    fn from(found: RegistrationWithEvent) -> Self {
        let reg = found.registration;
        if reg.checked_in {
            Self {
                valid: true,
                already_checked_in: Some(true),
                message: Some("Ticket already used".to_string()),
                checked_in_at: reg.checked_in_at,
                participant_name: None,
                event_name: None,
            }
        } else {
            Self {
                valid: true,
                already_checked_in: Some(false),
                message: None,
                checked_in_at: None,
                participant_name: Some(reg.name),
                event_name: Some(found.event_name),
            }
        }
    }
}
