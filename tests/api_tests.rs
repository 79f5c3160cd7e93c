/// Router-level tests: real handlers, auth middleware and service over the
/// in-memory record store, with a static token table standing in for Firebase.
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use loan_onboarding_api::api;
use loan_onboarding_api::config::{Config, StorageBackend};
use loan_onboarding_api::db_storage::MemoryRecordStore;
use loan_onboarding_api::errors::{AppError, ErrorCode};
use loan_onboarding_api::handlers::AppState;
use loan_onboarding_api::identity::{AuthenticatedUser, IdentityVerifier};
use loan_onboarding_api::onboarding::OnboardingService;

const ALICE: &str = "token-alice";
const BOB: &str = "token-bob";
const EXPIRED: &str = "token-expired";

struct StaticVerifier;

#[async_trait]
impl IdentityVerifier for StaticVerifier {
    async fn verify(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let uid = match token {
            ALICE => "uid-alice",
            BOB => "uid-bob",
            EXPIRED => {
                return Err(AppError::unauthorized(
                    ErrorCode::ExpiredToken,
                    "Token has expired",
                ))
            }
            _ => {
                return Err(AppError::unauthorized(
                    ErrorCode::InvalidToken,
                    "Invalid authentication token",
                ))
            }
        };
        Ok(AuthenticatedUser {
            uid: uid.to_string(),
            email: None,
            email_verified: true,
        })
    }
}

fn test_config() -> Config {
    Config {
        database_url: None,
        port: 0,
        storage_backend: StorageBackend::Memory,
        identity_api_key: "test-key".to_string(),
        identity_base_url: "http://localhost".to_string(),
        cors_origins: vec!["*".to_string()],
        db_max_connections: 1,
        db_min_connections: 0,
        db_acquire_timeout_secs: 1,
        db_max_lifetime_secs: 60,
        db_health_check_interval_secs: 300,
        token_cache_ttl_secs: 60,
        run_migrations: false,
        request_body_limit_bytes: 1024 * 1024,
    }
}

fn test_app() -> Router {
    let state = Arc::new(AppState {
        config: test_config(),
        service: OnboardingService::new(Arc::new(MemoryRecordStore::new())),
        verifier: Arc::new(StaticVerifier),
        database: None,
    });
    api::router(state)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn post(app: &Router, step: u8, token: &str, body: Value) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        &format!("/api/onboarding/step{}", step),
        Some(token),
        Some(body),
    )
    .await
}

async fn get(app: &Router, path: &str, token: &str) -> (StatusCode, Value) {
    send(app, "GET", &format!("/api/onboarding{}", path), Some(token), None).await
}

fn personal_info() -> Value {
    json!({
        "fullName": "Aroha Ngata",
        "dob": "1990-04-02",
        "address": "12 Queen Street, Auckland 1010",
        "email": "aroha@example.co.nz",
        "phoneNumber": "+64 27 123 4567",
        "nzResidencyStatus": "citizen",
        "taxNumber": "123-456-789"
    })
}

fn employment() -> Value {
    json!({
        "employmentType": "full_time",
        "employer": "Kiwi Builders Ltd",
        "jobTitle": "Site Manager",
        "employmentDuration": "2_to_5_years",
        "monthlyIncome": 6200,
        "otherIncome": "150.50"
    })
}

fn expenses() -> Value {
    json!({"rent": 1800, "monthlyExpenses": 950, "debts": 0, "dependents": 2})
}

fn loan_request(amount: Value) -> Value {
    json!({
        "loanAmount": amount,
        "loanPurpose": "Car repairs",
        "loanTerm": "12 months",
        "understandsTerms": true,
        "canAffordRepayments": true,
        "hasReceivedAdvice": true
    })
}

fn documents() -> Value {
    json!({
        "identityDocumentName": "passport.pdf",
        "identityDocumentSize": 204800,
        "identityDocumentType": "application/pdf",
        "addressProofName": "power-bill.pdf",
        "addressProofSize": 102400,
        "addressProofType": "application/pdf",
        "incomeProofName": "payslip.png",
        "incomeProofSize": 51200,
        "incomeProofType": "image/png"
    })
}

#[tokio::test]
async fn test_step1_round_trip_normalizes_input() {
    let app = test_app();

    let (status, body) = post(&app, 1, ALICE, personal_info()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Step 1 data saved successfully");
    assert!(body.get("error_code").is_none());

    let (status, body) = get(&app, "/step1", ALICE).await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["fullName"], "Aroha Ngata");
    assert_eq!(data["dob"], "1990-04-02");
    assert_eq!(data["phoneNumber"], "+64271234567");
    assert_eq!(data["nzResidencyStatus"], "citizen");
    assert_eq!(data["taxNumber"], "123-456-789");
    assert_eq!(data["stepCompleted"], 1);
    assert_eq!(data["isCompleted"], false);
}

#[tokio::test]
async fn test_out_of_order_saves_keep_highest_step() {
    let app = test_app();

    assert_eq!(post(&app, 2, ALICE, employment()).await.0, StatusCode::OK);
    let (_, body) = post(&app, 1, ALICE, personal_info()).await;
    assert_eq!(body["data"]["stepCompleted"], 2);
    assert_eq!(post(&app, 3, ALICE, expenses()).await.0, StatusCode::OK);

    let (status, body) = get(&app, "/status", ALICE).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["stepCompleted"], 3);
    assert_eq!(body["data"]["isCompleted"], false);
    assert!(body["data"]["createdAt"].is_string());
}

#[tokio::test]
async fn test_later_step_preserves_earlier_fields() {
    let app = test_app();

    post(&app, 1, ALICE, personal_info()).await;
    post(&app, 2, ALICE, employment()).await;

    let (_, body) = get(&app, "/step1", ALICE).await;
    assert_eq!(body["data"]["fullName"], "Aroha Ngata");
    assert_eq!(body["data"]["email"], "aroha@example.co.nz");
    assert_eq!(body["data"]["stepCompleted"], 2);

    let (_, body) = get(&app, "/step2", ALICE).await;
    assert_eq!(body["data"]["employer"], "Kiwi Builders Ltd");
    assert_eq!(body["data"]["monthlyIncome"], 6200.0);
    assert_eq!(body["data"]["otherIncome"], 150.5);
}

#[tokio::test]
async fn test_unemployed_needs_some_income() {
    let app = test_app();

    let (status, body) = post(
        &app,
        2,
        ALICE,
        json!({"employmentType": "unemployed", "monthlyIncome": 0, "otherIncome": 0}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error_code"], "NO_INCOME_SPECIFIED");

    let (status, body) = post(
        &app,
        2,
        ALICE,
        json!({"employmentType": "unemployed", "monthlyIncome": 0, "otherIncome": 500}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["otherIncome"], 500.0);
}

#[tokio::test]
async fn test_loan_amount_bounds() {
    let app = test_app();

    let (status, body) = post(&app, 5, ALICE, loan_request(json!(50))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "INVALID_LOAN_AMOUNT");

    // Rejected save leaves no record behind
    let (_, body) = get(&app, "/status", ALICE).await;
    assert_eq!(body["data"]["stepCompleted"], 0);

    let (status, body) = post(&app, 5, ALICE, loan_request(json!(2000))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["loanAmount"], 2000.0);
    assert_eq!(body["data"]["stepCompleted"], 5);
    assert_eq!(body["data"]["isCompleted"], false);
}

#[tokio::test]
async fn test_documents_complete_application() {
    let app = test_app();

    let (status, body) = post(&app, 6, ALICE, documents()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isCompleted"], true);
    assert_eq!(body["data"]["stepCompleted"], 6);
    assert_eq!(body["data"]["incomeProofType"], "image/png");
    assert!(body["data"]["identityDocumentUploadedAt"].is_string());

    // Resaving an earlier step never regresses progress
    post(&app, 1, ALICE, personal_info()).await;
    let (_, body) = get(&app, "/status", ALICE).await;
    assert_eq!(body["data"]["stepCompleted"], 6);
    assert_eq!(body["data"]["isCompleted"], true);
}

#[tokio::test]
async fn test_step3_round_trip_rounds_to_cents() {
    let app = test_app();

    let (status, _) = post(
        &app,
        3,
        ALICE,
        json!({"rent": "100.126", "monthlyExpenses": 950.5, "debts": "12000", "dependents": "3"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get(&app, "/step3", ALICE).await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["rent"], 100.13);
    assert_eq!(data["monthlyExpenses"], 950.5);
    assert_eq!(data["debts"], 12000.0);
    assert_eq!(data["dependents"], 3);
    assert_eq!(data["stepCompleted"], 3);
    assert_eq!(data["isCompleted"], false);
}

#[tokio::test]
async fn test_step4_round_trip_with_every_field() {
    let app = test_app();

    let (status, _) = post(
        &app,
        4,
        ALICE,
        json!({
            "savings": "15000.755",
            "assets": 320000,
            "sourceOfFunds": "Salary and KiwiSaver",
            "expectedAccountActivity": "Monthly repayments",
            "isPoliticallyExposed": true
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get(&app, "/step4", ALICE).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"],
        json!({
            "savings": 15000.76,
            "assets": 320000.0,
            "sourceOfFunds": "Salary and KiwiSaver",
            "expectedAccountActivity": "Monthly repayments",
            "isPoliticallyExposed": true,
            "stepCompleted": 4,
            "isCompleted": false
        })
    );
}

#[tokio::test]
async fn test_step4_round_trip_with_fields_absent() {
    let app = test_app();

    let (status, _) = post(&app, 4, BOB, json!({"savings": null, "assets": ""})).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get(&app, "/step4", BOB).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"],
        json!({
            "savings": null,
            "assets": null,
            "sourceOfFunds": null,
            "expectedAccountActivity": null,
            "isPoliticallyExposed": false,
            "stepCompleted": 4,
            "isCompleted": false
        })
    );
}

#[tokio::test]
async fn test_step5_round_trip() {
    let app = test_app();

    let (status, _) = post(&app, 5, ALICE, loan_request(json!("1250.50"))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get(&app, "/step5", ALICE).await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["loanAmount"], 1250.5);
    assert_eq!(data["loanPurpose"], "Car repairs");
    assert_eq!(data["loanTerm"], "12 months");
    assert_eq!(data["understandsTerms"], true);
    assert_eq!(data["canAffordRepayments"], true);
    assert_eq!(data["hasReceivedAdvice"], true);
    assert_eq!(data["stepCompleted"], 5);
}

#[tokio::test]
async fn test_step6_round_trip() {
    let app = test_app();

    post(&app, 6, ALICE, documents()).await;

    let (status, body) = get(&app, "/step6", ALICE).await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["identityDocumentName"], "passport.pdf");
    assert_eq!(data["identityDocumentSize"], 204800);
    assert_eq!(data["addressProofName"], "power-bill.pdf");
    assert_eq!(data["addressProofType"], "application/pdf");
    assert_eq!(data["incomeProofSize"], 51200);
    assert_eq!(data["incomeProofType"], "image/png");
    assert!(data["addressProofUploadedAt"].is_string());
    assert!(data["incomeProofUploadedAt"].is_string());
    assert_eq!(data["stepCompleted"], 6);
    assert_eq!(data["isCompleted"], true);
}

#[tokio::test]
async fn test_reads_before_any_save() {
    let app = test_app();

    let (status, body) = get(&app, "/status", ALICE).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({"stepCompleted": 0, "isCompleted": false}));

    let (status, body) = get(&app, "/step4", ALICE).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"], json!({}));

    let (_, body) = get(&app, "/application", ALICE).await;
    assert_eq!(body["data"], json!({}));
}

#[tokio::test]
async fn test_subjects_are_isolated() {
    let app = test_app();

    post(&app, 1, ALICE, personal_info()).await;

    let (_, body) = get(&app, "/step1", BOB).await;
    assert_eq!(body["data"], json!({}));
    let (_, body) = get(&app, "/status", BOB).await;
    assert_eq!(body["data"]["stepCompleted"], 0);
}

#[tokio::test]
async fn test_application_combines_sections() {
    let app = test_app();

    post(&app, 1, ALICE, personal_info()).await;
    post(&app, 3, ALICE, expenses()).await;

    let (status, body) = get(&app, "/application", ALICE).await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["status"]["stepCompleted"], 3);
    assert_eq!(data["personalInfo"]["fullName"], "Aroha Ngata");
    assert_eq!(data["expenses"]["rent"], 1800.0);
    assert_eq!(data["expenses"]["dependents"], 2);
    assert!(data["employment"]["employmentType"].is_null());
    assert_eq!(data["assets"]["isPoliticallyExposed"], false);
}

#[tokio::test]
async fn test_request_shape_errors() {
    let app = test_app();

    let (status, body) = post(&app, 3, ALICE, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "NO_DATA");

    let (status, body) = post(&app, 3, ALICE, json!([1, 2, 3])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "INVALID_JSON");

    let request = Request::builder()
        .method("POST")
        .uri("/api/onboarding/step1")
        .header(header::AUTHORIZATION, format!("Bearer {}", ALICE))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"fullName\": "))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error_code"], "INVALID_JSON");
}

#[tokio::test]
async fn test_missing_fields_are_reported() {
    let app = test_app();

    let (status, body) = post(&app, 3, ALICE, json!({"rent": 0, "debts": 0})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "MISSING_REQUIRED_FIELDS");
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("monthlyExpenses"));
    assert!(message.contains("dependents"));
}

#[tokio::test]
async fn test_authentication_failures() {
    let app = test_app();

    let (status, body) = send(&app, "GET", "/api/onboarding/status", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["error_code"], "MISSING_AUTH_HEADER");

    let request = Request::builder()
        .uri("/api/onboarding/status")
        .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error_code"], "INVALID_AUTH_FORMAT");

    let (status, body) = get(&app, "/step1", EXPIRED).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error_code"], "EXPIRED_TOKEN");

    let (status, body) = post(&app, 1, "forged", personal_info()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error_code"], "INVALID_TOKEN");

    // Nothing was written by the rejected save
    let (_, body) = get(&app, "/status", ALICE).await;
    assert_eq!(body["data"]["stepCompleted"], 0);
}

#[tokio::test]
async fn test_health_and_unknown_routes() {
    let app = test_app();

    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "healthy");
    assert_eq!(body["data"]["database"]["status"], "not_configured");

    let (status, body) = send(&app, "GET", "/api/onboarding/step7", Some(ALICE), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error_code"], "NOT_FOUND");
}
