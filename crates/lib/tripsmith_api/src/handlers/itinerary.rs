//! Stateless itinerary preview.

use axum::extract::State;
use axum::{Extension, Json};
use tracing::debug;
use tripsmith_core::models::trip::TripRequestInput;

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::ItineraryResponse;

/// `POST /api/ai/generate-itinerary`: generate without saving a trip.
pub async fn generate_itinerary_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(body): Json<TripRequestInput>,
) -> AppResult<Json<ItineraryResponse>> {
    debug!(user = %user.0.sub, "itinerary preview requested");
    let itinerary = state.trips.preview_itinerary(body).await?;
    Ok(Json(ItineraryResponse {
        success: true,
        itinerary,
    }))
}
