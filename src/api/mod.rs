//! HTTP surface: route table and the auth layer.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::auth::require_auth;
use crate::handlers::AppState;

pub mod auth {
    pub use crate::auth::*;
}

pub mod handlers {
    pub use crate::handlers::*;
}

/// The authenticated `/api/onboarding` routes, still missing their state.
pub fn onboarding_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/step1", post(handlers::save_step::<1>).get(handlers::get_step::<1>))
        .route("/step2", post(handlers::save_step::<2>).get(handlers::get_step::<2>))
        .route("/step3", post(handlers::save_step::<3>).get(handlers::get_step::<3>))
        .route("/step4", post(handlers::save_step::<4>).get(handlers::get_step::<4>))
        .route("/step5", post(handlers::save_step::<5>).get(handlers::get_step::<5>))
        .route("/step6", post(handlers::save_step::<6>).get(handlers::get_step::<6>))
        .route("/status", get(handlers::status))
        .route("/application", get(handlers::application))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}

/// Mounts `onboarding` under `/api/onboarding` next to the open `/health`.
pub fn app(state: Arc<AppState>, onboarding: Router<Arc<AppState>>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/onboarding", onboarding)
        .fallback(handlers::not_found)
        .with_state(state)
}

/// Full router without transport-level layers.
pub fn router(state: Arc<AppState>) -> Router {
    let onboarding = onboarding_routes(state.clone());
    app(state, onboarding)
}
