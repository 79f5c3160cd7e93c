use axum::{
    extract::{rejection::JsonRejection, State},
    http::{StatusCode, Uri},
    Extension, Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::config::Config;
use crate::db::Database;
use crate::errors::{AppError, ErrorCode, ValidationError};
use crate::identity::{AuthenticatedUser, IdentityVerifier};
use crate::models::{ApiResponse, ApplicationView, StatusView, Step, StepView};
use crate::onboarding::OnboardingService;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub service: OnboardingService,
    /// Checks bearer credentials for the onboarding routes.
    pub verifier: Arc<dyn IdentityVerifier>,
    /// `None` when running on the in-memory store.
    pub database: Option<Database>,
}

/// Health check endpoint.
///
/// Always answers 200 so the platform can tell "process up" from "database
/// down"; database trouble is reported in the body.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    let database = match &state.database {
        None => json!({ "status": "not_configured", "backend": "memory" }),
        Some(db) => match db.ping().await {
            Ok(()) => match db.info().await {
                Ok(info) => json!({ "status": "connected", "info": info }),
                Err(e) => {
                    tracing::warn!("Database info query failed: {}", e);
                    json!({ "status": "connected" })
                }
            },
            Err(e) => {
                tracing::error!("Health check could not reach database: {}", e);
                json!({ "status": "disconnected" })
            }
        },
    };

    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "message": "Service is running",
            "data": {
                "status": "healthy",
                "service": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
                "database": database,
            }
        })),
    )
}

fn step_for<const N: i32>() -> Result<Step, AppError> {
    Step::from_number(N).ok_or_else(|| AppError::InternalError(format!("No wizard step {}", N)))
}

/// POST /api/onboarding/step{N}
pub async fn save_step<const N: i32>(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ApiResponse<StepView>>, AppError> {
    let step = step_for::<N>()?;

    let Json(payload) = payload.map_err(|rejection| {
        tracing::debug!("Unreadable body for {}: {}", step, rejection.body_text());
        ValidationError::new(ErrorCode::InvalidJson, "Request body must be valid JSON")
    })?;

    let view = state.service.save_step(step, &user.uid, &payload).await?;
    Ok(Json(ApiResponse::success(
        view,
        format!("{} data saved successfully", step),
    )))
}

/// GET /api/onboarding/step{N}
///
/// A subject with no record gets an empty object, not an error.
pub async fn get_step<const N: i32>(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let step = step_for::<N>()?;

    let response = match state.service.get_step(step, &user.uid).await? {
        Some(view) => ApiResponse::success(
            to_json(&view)?,
            format!("{} data retrieved successfully", step),
        ),
        None => ApiResponse::success(json!({}), format!("No {} data found for user", step)),
    };
    Ok(Json(response))
}

/// GET /api/onboarding/status
pub async fn status(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<StatusView>>, AppError> {
    let status = state.service.get_status(&user.uid).await?;
    Ok(Json(ApiResponse::success(
        status,
        "Onboarding status retrieved successfully",
    )))
}

/// GET /api/onboarding/application
pub async fn application(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let response = match state.service.get_application(&user.uid).await? {
        Some(view) => ApiResponse::success(
            to_json::<ApplicationView>(&view)?,
            "Application retrieved successfully",
        ),
        None => ApiResponse::success(json!({}), "No application found for user"),
    };
    Ok(Json(response))
}

/// Unknown routes get the failure envelope too.
pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("Endpoint not found: {}", uri.path()))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, AppError> {
    serde_json::to_value(value)
        .map_err(|e| AppError::InternalError(format!("Failed to serialize response: {}", e)))
}
