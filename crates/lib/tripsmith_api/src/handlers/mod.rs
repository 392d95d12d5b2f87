//! Request handlers.

pub mod auth;
pub mod itinerary;
pub mod trips;
