use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;

use crate::models::ApiResponse;

/// Stable, machine-readable error codes returned in the `error_code` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Request shape
    NoData,
    InvalidJson,
    MissingRequiredFields,
    // Step 1
    InvalidResidencyStatus,
    InvalidDateOfBirth,
    InvalidEmail,
    InvalidPhoneNumber,
    // Step 2
    InvalidEmploymentType,
    InvalidEmploymentDuration,
    InvalidIncomeAmount,
    MissingEmploymentDetails,
    NoIncomeSpecified,
    // Step 3
    InvalidNumericValue,
    InvalidRentAmount,
    InvalidExpensesAmount,
    InvalidDebtsAmount,
    InvalidDependentsCount,
    // Step 4
    InvalidSavingsAmount,
    InvalidAssetsAmount,
    InvalidPoliticalExposureFlag,
    // Step 5
    InvalidLoanAmount,
    MissingDeclarations,
    // Step 6
    InvalidDocumentSize,
    // Authentication
    MissingAuthHeader,
    InvalidAuthFormat,
    InvalidToken,
    ExpiredToken,
    TokenVerificationError,
    // Server side
    DatabaseError,
    InternalError,
    NotFound,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NoData => "NO_DATA",
            ErrorCode::InvalidJson => "INVALID_JSON",
            ErrorCode::MissingRequiredFields => "MISSING_REQUIRED_FIELDS",
            ErrorCode::InvalidResidencyStatus => "INVALID_RESIDENCY_STATUS",
            ErrorCode::InvalidDateOfBirth => "INVALID_DATE_OF_BIRTH",
            ErrorCode::InvalidEmail => "INVALID_EMAIL",
            ErrorCode::InvalidPhoneNumber => "INVALID_PHONE_NUMBER",
            ErrorCode::InvalidEmploymentType => "INVALID_EMPLOYMENT_TYPE",
            ErrorCode::InvalidEmploymentDuration => "INVALID_EMPLOYMENT_DURATION",
            ErrorCode::InvalidIncomeAmount => "INVALID_INCOME_AMOUNT",
            ErrorCode::MissingEmploymentDetails => "MISSING_EMPLOYMENT_DETAILS",
            ErrorCode::NoIncomeSpecified => "NO_INCOME_SPECIFIED",
            ErrorCode::InvalidNumericValue => "INVALID_NUMERIC_VALUE",
            ErrorCode::InvalidRentAmount => "INVALID_RENT_AMOUNT",
            ErrorCode::InvalidExpensesAmount => "INVALID_EXPENSES_AMOUNT",
            ErrorCode::InvalidDebtsAmount => "INVALID_DEBTS_AMOUNT",
            ErrorCode::InvalidDependentsCount => "INVALID_DEPENDENTS_COUNT",
            ErrorCode::InvalidSavingsAmount => "INVALID_SAVINGS_AMOUNT",
            ErrorCode::InvalidAssetsAmount => "INVALID_ASSETS_AMOUNT",
            ErrorCode::InvalidPoliticalExposureFlag => "INVALID_POLITICAL_EXPOSURE_FLAG",
            ErrorCode::InvalidLoanAmount => "INVALID_LOAN_AMOUNT",
            ErrorCode::MissingDeclarations => "MISSING_DECLARATIONS",
            ErrorCode::InvalidDocumentSize => "INVALID_DOCUMENT_SIZE",
            ErrorCode::MissingAuthHeader => "MISSING_AUTH_HEADER",
            ErrorCode::InvalidAuthFormat => "INVALID_AUTH_FORMAT",
            ErrorCode::InvalidToken => "INVALID_TOKEN",
            ErrorCode::ExpiredToken => "EXPIRED_TOKEN",
            ErrorCode::TokenVerificationError => "TOKEN_VERIFICATION_ERROR",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
            ErrorCode::NotFound => "NOT_FOUND",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rejected step payload.
///
/// `fields` names the offending payload keys (camelCase, as the caller sent them).
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub code: ErrorCode,
    pub message: String,
    pub fields: Vec<String>,
}

impl ValidationError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_fields(code: ErrorCode, message: impl Into<String>, fields: Vec<String>) -> Self {
        Self {
            code,
            message: message.into(),
            fields,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

impl std::error::Error for ValidationError {}

/// Application-specific error types.
#[derive(Debug)]
pub enum AppError {
    /// Database-related errors.
    DatabaseError(sqlx::Error),
    /// Step payload failed validation.
    Validation(ValidationError),
    /// Missing, malformed, invalid or expired credential.
    Unauthorized { code: ErrorCode, message: String },
    /// Unknown route.
    NotFound(String),
    /// Internal server error.
    InternalError(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl AppError {
    pub fn unauthorized(code: ErrorCode, message: impl Into<String>) -> Self {
        AppError::Unauthorized {
            code,
            message: message.into(),
        }
    }

    /// The code a caller will see for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::DatabaseError(_) => ErrorCode::DatabaseError,
            AppError::Validation(e) => e.code,
            AppError::Unauthorized { code, .. } => *code,
            AppError::NotFound(_) => ErrorCode::NotFound,
            AppError::InternalError(_) => ErrorCode::InternalError,
            AppError::WithContext { source, .. } => source.code(),
        }
    }
}

impl fmt::Display for AppError {
    /// Formats the error for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::DatabaseError(e) => write!(f, "Database error: {}", e),
            AppError::Validation(e) => write!(f, "Validation failed: {}", e),
            AppError::Unauthorized { code, message } => {
                write!(f, "Unauthorized ({}): {}", code, message)
            }
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Converts the error into the uniform failure envelope.
    ///
    /// Server-side failures are logged with full detail; the caller only
    /// ever sees a stable code and a short summary.
    fn into_response(self) -> Response {
        let error = match self {
            AppError::WithContext { source, context } => {
                // Log full context chain, then render as the underlying error
                tracing::error!("Error with context: {} -> {}", context, source);
                return (*source).into_response();
            }
            other => other,
        };

        let (status, message) = match &error {
            AppError::DatabaseError(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to access onboarding data".to_string(),
                )
            }
            AppError::Validation(e) => {
                tracing::debug!("Validation failed: {}", e);
                (StatusCode::BAD_REQUEST, e.message.clone())
            }
            AppError::Unauthorized { code, message } => {
                tracing::warn!("Unauthorized access ({}): {}", code, message);
                (StatusCode::UNAUTHORIZED, message.clone())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::WithContext { .. } => unreachable!("context unwrapped above"),
        };

        let body: ApiResponse<()> = ApiResponse::failure(message, error.code());
        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    /// Converts a `sqlx::Error` into an `AppError`.
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err)
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;

    /// Add context lazily (only evaluated on error).
    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: f(),
        })
    }
}

/// Extension for sqlx::Error to add context
impl<T> ResultExt<T> for Result<T, sqlx::Error> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(AppError::DatabaseError(e)),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(AppError::DatabaseError(e)),
            context: f(),
        })
    }
}
