//! Trip lifecycle: create, read, list, update, delete, regenerate, preview.
//!
//! Creating a trip persists it with an empty itinerary and returns at once;
//! the itinerary appears later when background generation lands.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::itinerary::service::GenerationHandle;
use crate::itinerary::{GenerationError, ItineraryGenerationService};
use crate::models::trip::{ItineraryDay, Trip, TripRequest, TripRequestInput, ValidationError};
use crate::store::{StoreError, TripStore};

/// Errors surfaced by trip operations.
#[derive(Debug, Error)]
pub enum TripError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Trip not found")]
    NotFound,

    #[error("Trip belongs to another user")]
    Forbidden,

    #[error("Itinerary generation already running for this trip")]
    GenerationInFlight,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

pub struct TripService {
    trips: Arc<dyn TripStore>,
    generation: Arc<ItineraryGenerationService>,
}

impl TripService {
    pub fn new(trips: Arc<dyn TripStore>, generation: Arc<ItineraryGenerationService>) -> Self {
        Self { trips, generation }
    }

    /// Validate and persist a trip, then kick off generation in the
    /// background. The returned trip has an empty itinerary.
    pub async fn create_trip(
        &self,
        owner: &Uuid,
        input: TripRequestInput,
    ) -> Result<(Trip, Option<GenerationHandle>), TripError> {
        let request = TripRequest::try_from(input)?;
        let trip = self.trips.create_trip(owner, request).await?;
        info!(trip_id = %trip.id, %owner, destination = %trip.request.destination, "trip created");

        let handle = self
            .generation
            .spawn(trip.id, trip.request.clone(), *owner);
        Ok((trip, handle))
    }

    /// Fetch a trip owned by `owner`.
    pub async fn get_trip(&self, owner: &Uuid, id: &Uuid) -> Result<Trip, TripError> {
        let trip = self.trips.get_trip(id).await?.ok_or(TripError::NotFound)?;
        if trip.user_id != *owner {
            return Err(TripError::Forbidden);
        }
        Ok(trip)
    }

    pub async fn list_trips(&self, owner: &Uuid) -> Result<Vec<Trip>, TripError> {
        Ok(self.trips.list_trips(owner).await?)
    }

    /// Replace a trip's details with a re-validated request. Any change
    /// starts a fresh generation, since every field feeds the prompt; an
    /// unchanged request leaves the itinerary alone.
    pub async fn update_trip(
        &self,
        owner: &Uuid,
        id: &Uuid,
        input: TripRequestInput,
    ) -> Result<(Trip, Option<GenerationHandle>), TripError> {
        let current = self.get_trip(owner, id).await?;
        let request = TripRequest::try_from(input)?;
        if request == current.request {
            return Ok((current, None));
        }
        // A running generation would overwrite the new details' itinerary.
        if self.generation.is_in_flight(id) {
            return Err(TripError::GenerationInFlight);
        }

        let trip = self.trips.update_trip(id, request).await?;
        info!(trip_id = %trip.id, %owner, destination = %trip.request.destination, "trip updated");

        let handle = self
            .generation
            .spawn(trip.id, trip.request.clone(), *owner);
        Ok((trip, handle))
    }

    pub async fn delete_trip(&self, owner: &Uuid, id: &Uuid) -> Result<(), TripError> {
        self.get_trip(owner, id).await?;
        if !self.trips.delete_trip(id).await? {
            return Err(TripError::NotFound);
        }
        info!(trip_id = %id, %owner, "trip deleted");
        Ok(())
    }

    /// Start a fresh generation for an existing trip. At most one runs per
    /// trip at a time.
    pub async fn regenerate_itinerary(
        &self,
        owner: &Uuid,
        id: &Uuid,
    ) -> Result<GenerationHandle, TripError> {
        let trip = self.get_trip(owner, id).await?;
        self.generation
            .spawn(trip.id, trip.request, *owner)
            .ok_or(TripError::GenerationInFlight)
    }

    /// Generate an itinerary for an unsaved request. Nothing is persisted.
    pub async fn preview_itinerary(
        &self,
        input: TripRequestInput,
    ) -> Result<Vec<ItineraryDay>, TripError> {
        let request = TripRequest::try_from(input)?;
        Ok(self.generation.draft(&request).await?)
    }
}
