//! Event entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{Event, EventType};
use sqlx::FromRow;

/// Database enum for event_type that maps to PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "event_type", rename_all = "snake_case")]
pub enum EventTypeDb {
    PreEvent,
    HackathonDay,
}

impl From<EventTypeDb> for EventType {
    fn from(db_type: EventTypeDb) -> Self {
        match db_type {
            EventTypeDb::PreEvent => EventType::PreEvent,
            EventTypeDb::HackathonDay => EventType::HackathonDay,
        }
    }
}

impl From<EventType> for EventTypeDb {
    fn from(event_type: EventType) -> Self {
        match event_type {
            EventType::PreEvent => EventTypeDb::PreEvent,
            EventType::HackathonDay => EventTypeDb::HackathonDay,
        }
    }
}

/// Database row mapping for the events table.
#[derive(Debug, Clone, FromRow)]
pub struct EventEntity {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub event_type: EventTypeDb,
    pub event_date: DateTime<Utc>,
    pub capacity: i32,
    pub registration_open: bool,
    pub created_at: DateTime<Utc>,
}

impl From<EventEntity> for Event {
    fn from(entity: EventEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            description: entity.description,
            event_type: entity.event_type.into(),
            event_date: entity.event_date,
            capacity: entity.capacity,
            registration_open: entity.registration_open,
            created_at: entity.created_at,
        }
    }
}
