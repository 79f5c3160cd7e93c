//! Loan Onboarding API Library
//!
//! Backend for a six-step loan onboarding wizard: bearer-token
//! authentication against Firebase, per-step validation, and a single
//! applicant record per subject with monotonic progress tracking.
//!
//! # Modules
//!
//! - `api`: Route table and namespace re-exports for the HTTP layer.
//! - `core`: Namespace re-exports for the domain layer.
//! - `integrations`: Namespace re-exports for external services.
//! - `auth`: Bearer-token middleware.
//! - `config`: Configuration management.
//! - `db`: Database connection pool and health-check gate.
//! - `db_storage`: Applicant record stores (Postgres and in-memory).
//! - `errors`: Error codes, error types and the failure envelope.
//! - `handlers`: HTTP request handlers.
//! - `identity`: Firebase ID token verification.
//! - `models`: Step payloads, database rows and response views.
//! - `onboarding`: Wizard operations.
//! - `validation`: Per-step payload validation.

pub mod api;
pub mod core;
pub mod integrations;

// Re-export primary modules for shared use in tests and other binaries
pub mod auth;
pub mod config;
pub mod db;
pub mod db_storage;
pub mod errors;
pub mod handlers;
pub mod identity;
pub mod models;
pub mod onboarding;
pub mod validation;
