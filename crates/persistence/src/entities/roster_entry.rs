//! Roster entry entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::RosterEntry;
use sqlx::FromRow;

/// Database row mapping for the roster_entries table.
#[derive(Debug, Clone, FromRow)]
pub struct RosterEntryEntity {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub affiliation: Option<String>,
    pub phone: Option<String>,
    pub imported_at: DateTime<Utc>,
}

impl From<RosterEntryEntity> for RosterEntry {
    fn from(entity: RosterEntryEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            email: entity.email,
            affiliation: entity.affiliation,
            phone: entity.phone,
            imported_at: entity.imported_at,
        }
    }
}

/// Aggregate row for the roster summary query.
#[derive(Debug, Clone, FromRow)]
pub struct RosterSummaryEntity {
    pub total_participants: i64,
    pub latest_import: Option<DateTime<Utc>>,
}
