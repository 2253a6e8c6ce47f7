//! External service integrations.

pub mod email;
pub mod roster_csv;

pub use email::TicketMailer;
