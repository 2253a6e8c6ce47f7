//! Domain layer for the event ticketing backend.
//!
//! This crate contains:
//! - Domain models (Event, Registration, RosterEntry, CheckInRecord, tickets)
//! - The store and notifier seams the engines depend on
//! - Registration, check-in and roster services (the admission logic)

pub mod models;
pub mod services;
