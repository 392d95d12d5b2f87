//! # tripsmith_api
//!
//! HTTP API library for Tripsmith.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;
use tripsmith_core::auth::AuthSessionService;
use tripsmith_core::trips::TripService;

use crate::config::ApiConfig;
use crate::handlers::{auth, itinerary, trips};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Login, refresh and logout orchestration.
    pub auth: Arc<AuthSessionService>,
    /// Trip lifecycle and itinerary generation.
    pub trips: Arc<TripService>,
    /// API configuration.
    pub config: ApiConfig,
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public = Router::new()
        .route("/api/auth/register", post(auth::register_handler))
        .route("/api/auth/login", post(auth::login_handler))
        .route("/api/auth/refresh", post(auth::refresh_handler));

    // Protected routes (require auth)
    let protected = Router::new()
        .route("/api/auth/logout", post(auth::logout_handler))
        .route("/api/auth/me", get(auth::me_handler))
        .route(
            "/api/trips",
            get(trips::list_trips_handler).post(trips::create_trip_handler),
        )
        .route(
            "/api/trips/{id}",
            get(trips::get_trip_handler)
                .put(trips::update_trip_handler)
                .delete(trips::delete_trip_handler),
        )
        .route(
            "/api/trips/{id}/itinerary",
            post(trips::regenerate_itinerary_handler),
        )
        .route(
            "/api/ai/generate-itinerary",
            post(itinerary::generate_itinerary_handler),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
