//! Itinerary generation pipeline.
//!
//! Trip request → prompt → external text generation → bracketed-array
//! extraction → date normalization → itinerary replacement on the trip.
//!
//! # Public API
//!
//! - [`prompt::build`]: deterministic prompt for a trip request
//! - [`parser::parse`]: extract day plans from free-form model text
//! - [`dates::normalize`]: rewrite day dates to a contiguous run
//! - [`service::ItineraryGenerationService`]: the orchestrator
//! - [`provider::TextGenerator`]: the external capability seam

pub mod config;
pub mod dates;
pub mod parser;
pub mod prompt;
pub mod provider;
pub mod service;

use thiserror::Error;

pub use config::GenerationConfig;
pub use provider::TextGenerator;
pub use service::ItineraryGenerationService;

/// Errors that can occur while producing an itinerary.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Unparsable model response: {0}")]
    UnparsableResponse(String),

    #[error("Generation provider failed: {0}")]
    CapabilityFailure(String),

    #[error("Generation timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Generation config error: {0}")]
    Config(String),

    #[error("Failed to persist itinerary: {0}")]
    Persistence(#[from] crate::store::StoreError),
}
