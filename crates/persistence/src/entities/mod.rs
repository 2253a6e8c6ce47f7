//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod check_in;
pub mod event;
pub mod registration;
pub mod roster_entry;

pub use check_in::{CheckInCountsEntity, CheckInEntity, CheckInSourceDb};
pub use event::{EventEntity, EventTypeDb};
pub use registration::{RegistrationEntity, RegistrationWithEventEntity};
pub use roster_entry::{RosterEntryEntity, RosterSummaryEntity};
