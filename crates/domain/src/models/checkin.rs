//! Check-in domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::registration::Registration;
use super::roster::RosterEntry;

/// Default number of recent check-ins returned.
pub const DEFAULT_RECENT_LIMIT: i64 = 10;

/// Hard ceiling on recent check-ins returned.
pub const MAX_RECENT_LIMIT: i64 = 50;

/// Clamps a requested recent-check-in limit into `1..=MAX_RECENT_LIMIT`.
pub fn clamp_recent_limit(requested: Option<i64>) -> i64 {
    requested
        .unwrap_or(DEFAULT_RECENT_LIMIT)
        .clamp(1, MAX_RECENT_LIMIT)
}

/// How a participant was admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckInSource {
    Code,
    Roster,
}

impl CheckInSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckInSource::Code => "code",
            CheckInSource::Roster => "roster",
        }
    }
}

impl std::fmt::Display for CheckInSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One successful check-in. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CheckInRecord {
    pub id: i64,
    pub event_id: i64,
    pub email: String,
    pub ticket_id: Option<String>,
    pub source: CheckInSource,
    pub checked_in_at: DateTime<Utc>,
}

/// Reason code attached to every check-in outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckInReason {
    Success,
    NotFound,
    WrongEvent,
    AlreadyCheckedIn,
    HasTicket,
}

/// Structured result of a check-in attempt.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CheckInOutcome {
    pub success: bool,
    pub reason: CheckInReason,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participant_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affiliation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<CheckInSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked_in_at: Option<DateTime<Utc>>,
}

impl CheckInOutcome {
    fn rejected(reason: CheckInReason, message: impl Into<String>) -> Self {
        Self {
            success: false,
            reason,
            message: message.into(),
            participant_name: None,
            email: None,
            affiliation: None,
            event_name: None,
            source: None,
            checked_in_at: None,
        }
    }

    pub fn invalid_ticket() -> Self {
        Self::rejected(CheckInReason::NotFound, "Invalid ticket")
    }

    pub fn unknown_identity() -> Self {
        Self::rejected(
            CheckInReason::NotFound,
            "Email not found in roster or event registrations",
        )
    }

    pub fn has_ticket() -> Self {
        Self::rejected(
            CheckInReason::HasTicket,
            "This participant has a ticket. Please use the QR code scanner.",
        )
    }

    /// The ticket belongs to another event; the message names that event.
    pub fn wrong_event(ticket_event_name: &str) -> Self {
        Self {
            event_name: Some(ticket_event_name.to_string()),
            ..Self::rejected(
                CheckInReason::WrongEvent,
                format!(
                    "This ticket is for {}, not the current event",
                    ticket_event_name
                ),
            )
        }
    }

    pub fn already_checked_in(
        participant_name: Option<String>,
        checked_in_at: DateTime<Utc>,
    ) -> Self {
        Self {
            participant_name,
            checked_in_at: Some(checked_in_at),
            ..Self::rejected(
                CheckInReason::AlreadyCheckedIn,
                format!("Already checked in at {}", checked_in_at.to_rfc3339()),
            )
        }
    }

    pub fn admitted_by_code(
        registration: &Registration,
        event_name: &str,
        checked_in_at: DateTime<Utc>,
    ) -> Self {
        Self {
            success: true,
            reason: CheckInReason::Success,
            message: "Check-in successful!".to_string(),
            participant_name: Some(registration.name.clone()),
            email: Some(registration.email.clone()),
            affiliation: Some(registration.affiliation.clone()),
            event_name: Some(event_name.to_string()),
            source: Some(CheckInSource::Code),
            checked_in_at: Some(checked_in_at),
        }
    }

    pub fn admitted_from_roster(entry: &RosterEntry, checked_in_at: DateTime<Utc>) -> Self {
        Self {
            success: true,
            reason: CheckInReason::Success,
            message: "Check-in successful! (Roster participant - free entry)".to_string(),
            participant_name: Some(entry.name.clone()),
            email: Some(entry.email.clone()),
            affiliation: entry.affiliation.clone(),
            event_name: None,
            source: Some(CheckInSource::Roster),
            checked_in_at: Some(checked_in_at),
        }
    }
}

/// Request to check in by ticket code.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CodeCheckInRequest {
    #[validate(length(min = 1, max = 64, message = "ticket_id must be 1-64 characters"))]
    pub ticket_id: String,
    pub event_id: i64,
}

/// Request to check in by email identity.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct IdentityCheckInRequest {
    #[validate(length(min = 1, max = 320, message = "email must be 1-320 characters"))]
    pub email: String,
    pub event_id: i64,
}

/// Raw counts backing the statistics view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckInCounts {
    pub total_registrations: i64,
    pub checked_in_registrations: i64,
    pub roster_checkins: i64,
    pub total_checkins: i64,
}

/// Check-in statistics for one event.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CheckInStats {
    pub event_name: String,
    pub capacity: i32,
    pub total_registrations: i64,
    pub checked_in_registrations: i64,
    pub roster_checkins: i64,
    pub total_checkins: i64,
    /// `capacity - total_checkins`; negative when roster check-ins overflow capacity.
    pub remaining_capacity: i64,
}

impl CheckInStats {
    pub fn new(event_name: String, capacity: i32, counts: CheckInCounts) -> Self {
        Self {
            event_name,
            capacity,
            total_registrations: counts.total_registrations,
            checked_in_registrations: counts.checked_in_registrations,
            roster_checkins: counts.roster_checkins,
            total_checkins: counts.total_checkins,
            remaining_capacity: i64::from(capacity) - counts.total_checkins,
        }
    }
}

/// Query parameters for recent check-ins.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecentCheckInsQuery {
    pub limit: Option<i64>,
}
