pub mod checkin;
pub mod events;
pub mod health;
pub mod registrations;
pub mod roster;
