use serde_json::Value;
use std::sync::Arc;

use crate::db_storage::RecordStore;
use crate::errors::AppError;
use crate::models::{ApplicationView, StatusView, Step, StepView};
use crate::validation::validate_step;

/// Wizard operations for one authenticated applicant at a time.
///
/// Every save validates first, so a rejected payload never reaches the
/// store and leaves the applicant's record untouched.
#[derive(Clone)]
pub struct OnboardingService {
    store: Arc<dyn RecordStore>,
}

impl OnboardingService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Validates and persists one step, returning the step as now stored.
    pub async fn save_step(
        &self,
        step: Step,
        firebase_uid: &str,
        payload: &Value,
    ) -> Result<StepView, AppError> {
        let data = validate_step(step, payload).inspect_err(|e| {
            tracing::info!("{} rejected for {}: {} ({})", step, firebase_uid, e.code, e.message)
        })?;

        let record = self
            .store
            .upsert(firebase_uid, &data)
            .await
            .inspect_err(|e| tracing::error!("Failed to save {} for {}: {}", step, firebase_uid, e))?;

        tracing::info!(
            "{} saved for {} (step_completed={}, is_completed={})",
            step,
            firebase_uid,
            record.step_completed,
            record.is_completed
        );
        Ok(StepView::from_record(step, &record))
    }

    /// `None` when the applicant has never saved anything.
    pub async fn get_step(
        &self,
        step: Step,
        firebase_uid: &str,
    ) -> Result<Option<StepView>, AppError> {
        let record = self
            .store
            .find(firebase_uid)
            .await
            .inspect_err(|e| tracing::error!("Failed to load {} for {}: {}", step, firebase_uid, e))?;

        Ok(record.map(|r| StepView::from_record(step, &r)))
    }

    pub async fn get_status(&self, firebase_uid: &str) -> Result<StatusView, AppError> {
        let record = self
            .store
            .find(firebase_uid)
            .await
            .inspect_err(|e| tracing::error!("Failed to load status for {}: {}", firebase_uid, e))?;

        Ok(record
            .as_ref()
            .map(StatusView::from)
            .unwrap_or_else(StatusView::not_started))
    }

    pub async fn get_application(
        &self,
        firebase_uid: &str,
    ) -> Result<Option<ApplicationView>, AppError> {
        let record = self.store.find(firebase_uid).await.inspect_err(|e| {
            tracing::error!("Failed to load application for {}: {}", firebase_uid, e)
        })?;

        Ok(record.as_ref().map(ApplicationView::from))
    }
}
