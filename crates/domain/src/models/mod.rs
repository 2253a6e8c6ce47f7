//! Domain models for event ticketing.

pub mod checkin;
pub mod event;
pub mod registration;
pub mod roster;
pub mod ticket;

pub use checkin::{
    CheckInCounts, CheckInOutcome, CheckInReason, CheckInRecord, CheckInSource, CheckInStats,
};
pub use event::{Event, EventType};
pub use registration::{
    NewRegistration, Registration, RegistrationDecision, RegistrationReceipt,
    RegistrationRejection, RegistrationWithEvent,
};
pub use roster::{NewRosterEntry, RosterEntry, RosterImportSummary, RosterRecord};
pub use ticket::{IssuedTicket, TicketCodeError, TicketId};
