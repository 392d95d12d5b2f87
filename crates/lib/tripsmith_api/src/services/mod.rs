//! Helpers shared by handlers.

pub mod cookies;
