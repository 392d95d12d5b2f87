//! Trip request handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use tripsmith_core::models::trip::{Trip, TripRequestInput};
use uuid::Uuid;

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{GenerationAccepted, SuccessResponse};

/// `GET /api/trips`: the caller's trips, newest first.
pub async fn list_trips_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> AppResult<Json<Vec<Trip>>> {
    Ok(Json(state.trips.list_trips(&user.id()?).await?))
}

/// `POST /api/trips`: create a trip. The itinerary fills in later.
pub async fn create_trip_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(body): Json<TripRequestInput>,
) -> AppResult<(StatusCode, Json<Trip>)> {
    let (trip, _generation) = state.trips.create_trip(&user.id()?, body).await?;
    Ok((StatusCode::CREATED, Json(trip)))
}

/// `GET /api/trips/{id}`
pub async fn get_trip_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Trip>> {
    Ok(Json(state.trips.get_trip(&user.id()?, &id).await?))
}

/// `PUT /api/trips/{id}`: replace the trip details. Changed details
/// regenerate the itinerary in the background.
pub async fn update_trip_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<TripRequestInput>,
) -> AppResult<Json<Trip>> {
    let (trip, _generation) = state.trips.update_trip(&user.id()?, &id, body).await?;
    Ok(Json(trip))
}

/// `DELETE /api/trips/{id}`
pub async fn delete_trip_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse>> {
    state.trips.delete_trip(&user.id()?, &id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

/// `POST /api/trips/{id}/itinerary`: regenerate in the background.
pub async fn regenerate_itinerary_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<GenerationAccepted>)> {
    let _generation = state.trips.regenerate_itinerary(&user.id()?, &id).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(GenerationAccepted {
            trip_id: id,
            status: "generating".into(),
        }),
    ))
}
