//! Registration entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{Registration, RegistrationWithEvent};
use sqlx::FromRow;

/// Database row mapping for the registrations table.
#[derive(Debug, Clone, FromRow)]
pub struct RegistrationEntity {
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

impl From<RegistrationEntity> for Registration {
    fn from(entity: RegistrationEntity) -> Self {
        Self {
            id: entity.id,
            event_id: entity.event_id,
            name: entity.name,
            email: entity.email,
            phone: entity.phone,
            affiliation: entity.affiliation,
            ticket_id: entity.ticket_id,
            qr_code: entity.qr_code,
            checked_in: entity.checked_in,
            checked_in_at: entity.checked_in_at,
            created_at: entity.created_at,
        }
    }
}

/// Registration joined with its event's name and date.
#[derive(Debug, Clone, FromRow)]
pub struct RegistrationWithEventEntity {
    #[sqlx(flatten)]
    pub registration: RegistrationEntity,
    pub event_name: String,
    pub event_date: DateTime<Utc>,
}

impl From<RegistrationWithEventEntity> for RegistrationWithEvent {
    fn from(entity: RegistrationWithEventEntity) -> Self {
        Self {
            registration: entity.registration.into(),
            event_name: entity.event_name,
            event_date: entity.event_date,
        }
    }
}
