//! Domain services for event ticketing.
//!
//! The engines hold the admission logic; storage and delivery sit behind the
//! `TicketingStore` and `TicketNotifier` traits.

pub mod checkin;
pub mod memory_store;
pub mod notification;
pub mod registration;
pub mod roster;
pub mod store;

pub use checkin::CheckInService;
pub use memory_store::MemoryTicketingStore;
pub use notification::{MockTicketNotifier, NotificationResult, TicketDelivery, TicketNotifier};
pub use registration::{evaluate_admission, RegistrationService, DEFAULT_NOTIFY_TIMEOUT};
pub use roster::RosterService;
pub use store::{AdmissionResult, StoreError, TicketingStore};
