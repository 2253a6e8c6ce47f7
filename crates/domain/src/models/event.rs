//! Event domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use validator::Validate;

/// Display format used for event dates in tickets and emails.
pub const EVENT_DATE_DISPLAY_FORMAT: &str = "%B %d, %Y at %I:%M %p";

/// Kind of event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    PreEvent,
    HackathonDay,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::PreEvent => "pre_event",
            EventType::HackathonDay => "hackathon_day",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pre_event" => Ok(EventType::PreEvent),
            "hackathon_day" => Ok(EventType::HackathonDay),
            _ => Err(format!("Invalid event type: {}", s)),
        }
    }
}

/// An event participants can register for.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Event {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub event_type: EventType,
    pub event_date: DateTime<Utc>,
    pub capacity: i32,
    pub registration_open: bool,
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Human-readable date, e.g. `March 05, 2026 at 09:30 AM`.
    pub fn date_display(&self) -> String {
        self.event_date.format(EVENT_DATE_DISPLAY_FORMAT).to_string()
    }
}

/// Request to create an event.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateEventRequest {
    #[validate(length(min = 1, max = 200, message = "name must be 1-200 characters"))]
    pub name: String,

    #[validate(length(max = 2000, message = "description must be at most 2000 characters"))]
    pub description: Option<String>,

    pub event_type: EventType,

    pub event_date: DateTime<Utc>,

    #[validate(range(min = 1, message = "capacity must be greater than 0"))]
    pub capacity: i32,

    #[serde(default = "default_registration_open")]
    pub registration_open: bool,
}

fn default_registration_open() -> bool {
    true
}

/// Event with its current registration count.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct EventResponse {
    #[serde(flatten)]
    pub event: Event,
    pub registered_count: i64,
}

/// Response after creating an event.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CreateEventResponse {
    pub message: String,
    pub event: Event,
}

/// Response after toggling registration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ToggleRegistrationResponse {
    pub message: String,
    pub registration_open: bool,
}

impl ToggleRegistrationResponse {
    pub fn new(registration_open: bool) -> Self {
        let state = if registration_open { "opened" } else { "closed" };
        Self {
            message: format!("Registration {}", state),
            registration_open,
        }
    }
}
