//! Check-in entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{CheckInCounts, CheckInRecord, CheckInSource};
use sqlx::FromRow;

/// Database enum for check_in_source that maps to PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "check_in_source", rename_all = "lowercase")]
pub enum CheckInSourceDb {
    Code,
    Roster,
}

impl From<CheckInSourceDb> for CheckInSource {
    fn from(db_source: CheckInSourceDb) -> Self {
        match db_source {
            CheckInSourceDb::Code => CheckInSource::Code,
            CheckInSourceDb::Roster => CheckInSource::Roster,
        }
    }
}

impl From<CheckInSource> for CheckInSourceDb {
    fn from(source: CheckInSource) -> Self {
        match source {
            CheckInSource::Code => CheckInSourceDb::Code,
            CheckInSource::Roster => CheckInSourceDb::Roster,
        }
    }
}

/// Database row mapping for the check_ins table.
#[derive(Debug, Clone, FromRow)]
pub struct CheckInEntity {
    pub id: i64,
    pub event_id: i64,
    pub email: String,
    pub ticket_id: Option<String>,
    pub source: CheckInSourceDb,
    pub checked_in_at: DateTime<Utc>,
}

impl From<CheckInEntity> for CheckInRecord {
    fn from(entity: CheckInEntity) -> Self {
        Self {
            id: entity.id,
            event_id: entity.event_id,
            email: entity.email,
            ticket_id: entity.ticket_id,
            source: entity.source.into(),
            checked_in_at: entity.checked_in_at,
        }
    }
}

/// Aggregate row for the statistics query.
#[derive(Debug, Clone, FromRow)]
pub struct CheckInCountsEntity {
    pub total_registrations: i64,
    pub checked_in_registrations: i64,
    pub roster_checkins: i64,
    pub total_checkins: i64,
}

impl From<CheckInCountsEntity> for CheckInCounts {
    fn from(entity: CheckInCountsEntity) -> Self {
        Self {
            total_registrations: entity.total_registrations,
            checked_in_registrations: entity.checked_in_registrations,
            roster_checkins: entity.roster_checkins,
            total_checkins: entity.total_checkins,
        }
    }
}
