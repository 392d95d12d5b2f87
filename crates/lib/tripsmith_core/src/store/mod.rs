//! Persistence gateway.
//!
//! Services talk to storage only through the traits here so the same flows
//! run against PostgreSQL in production and the in-memory store in tests.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::auth::{Identity, NewIdentity};
use crate::models::trip::{ItineraryDay, Trip, TripRequest};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Persistence errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Decode error: {0}")]
    Decode(String),
}

/// Identity lookup and registration.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Insert a new identity. Fails with `Conflict` when the email is taken.
    async fn create_identity(&self, identity: NewIdentity) -> Result<Identity, StoreError>;

    async fn find_identity_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError>;

    async fn find_identity_by_id(&self, id: &Uuid) -> Result<Option<Identity>, StoreError>;
}

/// Trip aggregate persistence.
#[async_trait]
pub trait TripStore: Send + Sync {
    /// Insert a trip with an empty itinerary.
    async fn create_trip(&self, owner: &Uuid, request: TripRequest) -> Result<Trip, StoreError>;

    async fn get_trip(&self, id: &Uuid) -> Result<Option<Trip>, StoreError>;

    /// Trips owned by `owner`, newest first.
    async fn list_trips(&self, owner: &Uuid) -> Result<Vec<Trip>, StoreError>;

    /// Overwrite the trip's request fields; the itinerary is untouched.
    async fn update_trip(&self, id: &Uuid, request: TripRequest) -> Result<Trip, StoreError>;

    /// Replace the whole itinerary in a single update.
    async fn replace_itinerary(
        &self,
        id: &Uuid,
        days: &[ItineraryDay],
    ) -> Result<Trip, StoreError>;

    /// Returns whether a trip was deleted.
    async fn delete_trip(&self, id: &Uuid) -> Result<bool, StoreError>;
}
