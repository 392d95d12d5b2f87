//! # tripsmith_core
//!
//! Core domain logic for Tripsmith: credential sessions, trips and
//! itinerary generation.

pub mod auth;
pub mod itinerary;
pub mod migrate;
pub mod models;
pub mod store;
pub mod trips;
pub mod uuid;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
