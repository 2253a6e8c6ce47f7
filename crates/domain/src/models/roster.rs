//! Roster (imported allow-list) domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::validation::{email_local_part, is_valid_email, non_blank, normalize_email};
use thiserror::Error;
use validator::Validate;

/// Maximum records accepted in one JSON import request.
pub const MAX_ROSTER_IMPORT_RECORDS: usize = 5000;

/// A participant imported into the roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RosterEntry {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub affiliation: Option<String>,
    pub phone: Option<String>,
    pub imported_at: DateTime<Utc>,
}

/// Raw roster row as read from an import source. Only `email` is required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RosterRecord {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "college")]
    pub affiliation: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Per-row validation failure during import.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterRowError {
    #[error("Missing email")]
    EmailMissing,

    #[error("Invalid email '{0}'")]
    EmailInvalid(String),
}

/// Validated roster entry ready for insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRosterEntry {
    pub name: String,
    pub email: String,
    pub affiliation: Option<String>,
    pub phone: Option<String>,
}

impl RosterRecord {
    /// Validates the row and fills defaults.
    ///
    /// The email is normalized; the name falls back to the email's local part;
    /// blank affiliation and phone become `None`.
    pub fn into_entry(self) -> Result<NewRosterEntry, RosterRowError> {
        let email = normalize_email(self.email.as_deref().unwrap_or_default());
        if email.is_empty() {
            return Err(RosterRowError::EmailMissing);
        }
        if !is_valid_email(&email) {
            return Err(RosterRowError::EmailInvalid(email));
        }

        let name =
            non_blank(self.name.as_deref()).unwrap_or_else(|| email_local_part(&email).to_string());

        Ok(NewRosterEntry {
            name,
            affiliation: non_blank(self.affiliation.as_deref()),
            phone: non_blank(self.phone.as_deref()),
            email,
        })
    }
}

/// Aggregate result of a roster import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RosterImportSummary {
    pub total: usize,
    pub imported: usize,
    pub duplicate: usize,
    pub errors: usize,
    /// First few error messages; `errors` counts all of them.
    pub error_details: Vec<String>,
}

/// JSON roster import request.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct RosterImportRequest {
    #[validate(length(min = 1, max = 5000, message = "records must contain 1-5000 items"))]
    pub records: Vec<RosterRecord>,
}

/// Roster lookup response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RosterLookupResponse {
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participant: Option<RosterEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<Option<RosterEntry>> for RosterLookupResponse {
    fn from(entry: Option<RosterEntry>) -> Self {
        match entry {
            Some(participant) => Self {
                exists: true,
                participant: Some(participant),
                message: None,
            },
            None => Self {
                exists: false,
                participant: None,
                message: Some("Email not found in roster".to_string()),
            },
        }
    }
}

/// Roster totals.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RosterSummary {
    pub total_participants: i64,
    pub latest_import: Option<DateTime<Utc>>,
}

/// Response after clearing the roster.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ClearRosterResponse {
    pub message: String,
    pub deleted_count: u64,
}

impl ClearRosterResponse {
    pub fn new(deleted_count: u64) -> Self {
        Self {
            message: format!("Deleted {} participants", deleted_count),
            deleted_count,
        }
    }
}
