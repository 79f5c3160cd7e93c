/// Integration tests for Firebase token verification against a mocked
/// Identity Toolkit endpoint.
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use loan_onboarding_api::errors::ErrorCode;
use loan_onboarding_api::identity::{FirebaseVerifier, IdentityVerifier};

fn verifier(server: &MockServer) -> FirebaseVerifier {
    FirebaseVerifier::new(server.uri(), "test-api-key".to_string(), Duration::from_secs(60))
        .unwrap()
}

fn provider_error(status: u16, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({
        "error": {"code": status, "message": message, "errors": [{"message": message}]}
    }))
}

#[tokio::test]
async fn test_valid_token_resolves_subject() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/accounts:lookup"))
        .and(query_param("key", "test-api-key"))
        .and(body_json(json!({"idToken": "good-token"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "identitytoolkit#GetAccountInfoResponse",
            "users": [{
                "localId": "firebase-uid-42",
                "email": "mere@example.nz",
                "emailVerified": true
            }]
        })))
        .mount(&server)
        .await;

    let user = verifier(&server).verify("good-token").await.unwrap();
    assert_eq!(user.uid, "firebase-uid-42");
    assert_eq!(user.email.as_deref(), Some("mere@example.nz"));
    assert!(user.email_verified);
}

#[tokio::test]
async fn test_verified_tokens_are_cached() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/accounts:lookup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [{"localId": "uid-cached"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let verifier = verifier(&server);
    for _ in 0..5 {
        assert_eq!(verifier.verify("same-token").await.unwrap().uid, "uid-cached");
    }
    // MockServer verifies `expect(1)` on drop
}

#[tokio::test]
async fn test_cached_tokens_are_rechecked_after_ttl() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/accounts:lookup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [{"localId": "uid-short"}]
        })))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:lookup"))
        .respond_with(provider_error(400, "TOKEN_EXPIRED"))
        .mount(&server)
        .await;

    let verifier = FirebaseVerifier::new(
        server.uri(),
        "test-api-key".to_string(),
        Duration::from_millis(100),
    )
    .unwrap();
    assert_eq!(verifier.verify("revoked-later").await.unwrap().uid, "uid-short");
    assert!(verifier.verify("revoked-later").await.is_ok());

    tokio::time::sleep(Duration::from_millis(250)).await;
    let err = verifier.verify("revoked-later").await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::ExpiredToken);
}

#[tokio::test]
async fn test_expired_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/accounts:lookup"))
        .respond_with(provider_error(400, "TOKEN_EXPIRED"))
        .mount(&server)
        .await;

    let err = verifier(&server).verify("old-token").await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::ExpiredToken);
}

#[tokio::test]
async fn test_rejected_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/accounts:lookup"))
        .respond_with(provider_error(400, "INVALID_ID_TOKEN"))
        .mount(&server)
        .await;

    let err = verifier(&server).verify("forged").await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidToken);
}

#[tokio::test]
async fn test_unknown_user_is_invalid() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/accounts:lookup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"kind": "x"})))
        .mount(&server)
        .await;

    let err = verifier(&server).verify("deleted-user").await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidToken);
}

#[tokio::test]
async fn test_provider_outage() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/accounts:lookup"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = verifier(&server).verify("any").await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::TokenVerificationError);
}

#[tokio::test]
async fn test_failures_are_not_cached() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/accounts:lookup"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:lookup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [{"localId": "uid-retry"}]
        })))
        .mount(&server)
        .await;

    let verifier = verifier(&server);
    assert!(verifier.verify("flaky").await.is_err());
    assert_eq!(verifier.verify("flaky").await.unwrap().uid, "uid-retry");
}

#[tokio::test]
async fn test_unreachable_provider() {
    // Nothing listens on port 9 (discard) in the test environment
    let verifier = FirebaseVerifier::new(
        "http://127.0.0.1:9".to_string(),
        "key".to_string(),
        Duration::from_secs(60),
    )
    .unwrap();

    let err = verifier.verify("any").await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::TokenVerificationError);
}
