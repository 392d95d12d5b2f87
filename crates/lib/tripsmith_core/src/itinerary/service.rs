//! Itinerary generation orchestration.
//!
//! `generate` never fails its caller: any error is logged and turned into
//! "no itinerary produced", leaving the trip's itinerary as it was. The
//! provider call is bounded by a timeout and runs without holding any lock.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use super::provider::TextGenerator;
use super::{GenerationError, dates, parser, prompt};
use crate::models::trip::{ItineraryDay, TripRequest};
use crate::store::TripStore;

/// Background generation; resolves to the persisted itinerary, if any.
pub type GenerationHandle = JoinHandle<Option<Vec<ItineraryDay>>>;

pub struct ItineraryGenerationService {
    generator: Arc<dyn TextGenerator>,
    trips: Arc<dyn TripStore>,
    timeout: Duration,
    in_flight: Arc<DashMap<Uuid, ()>>,
}

/// Removes the trip from the in-flight set when the task ends, however it ends.
struct InFlightGuard {
    in_flight: Arc<DashMap<Uuid, ()>>,
    trip_id: Uuid,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight.remove(&self.trip_id);
    }
}

impl ItineraryGenerationService {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        trips: Arc<dyn TripStore>,
        timeout: Duration,
    ) -> Self {
        Self {
            generator,
            trips,
            timeout,
            in_flight: Arc::new(DashMap::new()),
        }
    }

    /// Prompt → provider → parse → normalize, without persisting.
    pub async fn draft(&self, request: &TripRequest) -> Result<Vec<ItineraryDay>, GenerationError> {
        let prompt = prompt::build(request);
        let text = tokio::time::timeout(self.timeout, self.generator.generate_text(&prompt))
            .await
            .map_err(|_| GenerationError::Timeout(self.timeout))??;
        let days = parser::parse(&text)?;
        Ok(dates::normalize(days, request.start_date))
    }

    /// Full pipeline, replacing the trip's itinerary on success.
    pub async fn try_generate(
        &self,
        trip_id: &Uuid,
        request: &TripRequest,
    ) -> Result<Vec<ItineraryDay>, GenerationError> {
        let days = self.draft(request).await?;
        self.trips.replace_itinerary(trip_id, &days).await?;
        Ok(days)
    }

    /// Full pipeline with failures absorbed into `None`.
    pub async fn generate(
        &self,
        trip_id: &Uuid,
        request: &TripRequest,
        owner: &Uuid,
    ) -> Option<Vec<ItineraryDay>> {
        match self.try_generate(trip_id, request).await {
            Ok(days) => {
                if days.len() != request.duration as usize {
                    warn!(
                        %trip_id,
                        requested = request.duration,
                        returned = days.len(),
                        "generated day count differs from trip duration"
                    );
                }
                info!(
                    %trip_id,
                    %owner,
                    provider = self.generator.name(),
                    days = days.len(),
                    "itinerary generated"
                );
                Some(days)
            }
            Err(e) => {
                warn!(
                    %trip_id,
                    %owner,
                    provider = self.generator.name(),
                    error = %e,
                    "itinerary generation failed"
                );
                None
            }
        }
    }

    /// Whether a background generation is running for the trip.
    pub fn is_in_flight(&self, trip_id: &Uuid) -> bool {
        self.in_flight.contains_key(trip_id)
    }

    /// Fire off generation in the background.
    ///
    /// Returns `None` without starting anything when a generation for the
    /// same trip is already running. Callers may drop the handle.
    pub fn spawn(
        self: &Arc<Self>,
        trip_id: Uuid,
        request: TripRequest,
        owner: Uuid,
    ) -> Option<GenerationHandle> {
        if self.in_flight.insert(trip_id, ()).is_some() {
            return None;
        }
        let guard = InFlightGuard {
            in_flight: self.in_flight.clone(),
            trip_id,
        };
        let service = Arc::clone(self);
        Some(tokio::spawn(async move {
            let _guard = guard;
            service.generate(&trip_id, &request, &owner).await
        }))
    }
}
