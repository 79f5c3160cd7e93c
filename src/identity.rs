use async_trait::async_trait;
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::time::Duration;

use crate::config::Config;
use crate::errors::{AppError, ErrorCode};

/// The caller behind a verified bearer credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticatedUser {
    /// Subject identifier issued by the identity provider.
    pub uid: String,
    pub email: Option<String>,
    pub email_verified: bool,
}

/// Turns a bearer credential into a subject identity.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<AuthenticatedUser, AppError>;
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: ProviderError,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    #[serde(default)]
    message: String,
}

/// Upper bound on how long a verified token is trusted without asking the provider again.
pub const MAX_TOKEN_CACHE_TTL: Duration = Duration::from_secs(300);

/// Verifies Firebase ID tokens through the Identity Toolkit REST API.
///
/// Successful lookups are cached by token digest, so a burst of requests
/// carrying one token costs a single round trip. A cached token stays
/// accepted until its entry expires, even if the provider revokes it or its
/// own expiry passes in the meantime. That window is the cache TTL, which is
/// never longer than [`MAX_TOKEN_CACHE_TTL`].
#[derive(Clone)]
pub struct FirebaseVerifier {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    cache: Cache<String, AuthenticatedUser>,
}

impl FirebaseVerifier {
    pub fn new(base_url: String, api_key: String, cache_ttl: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                AppError::InternalError(format!("Failed to create identity client: {}", e))
            })?;

        let cache = Cache::builder()
            .time_to_live(cache_ttl.min(MAX_TOKEN_CACHE_TTL))
            .max_capacity(10_000)
            .build();

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            cache,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Self::new(
            config.identity_base_url.clone(),
            config.identity_api_key.clone(),
            Duration::from_secs(config.token_cache_ttl_secs),
        )
    }

    async fn lookup(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let url = reqwest::Url::parse_with_params(
            &format!("{}/v1/accounts:lookup", self.base_url),
            &[("key", self.api_key.as_str())],
        )
        .map_err(|e| AppError::InternalError(format!("Failed to build identity URL: {}", e)))?;

        // Redact key from logs
        tracing::debug!("Identity lookup: {}/v1/accounts:lookup?key=[REDACTED]", self.base_url);

        let response = self
            .client
            .post(url)
            .json(&json!({ "idToken": token }))
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Identity provider request failed: {}", e);
                verification_error()
            })?;

        let status = response.status();
        if status.is_server_error() {
            tracing::error!("Identity provider returned {}", status);
            return Err(verification_error());
        }

        if !status.is_success() {
            let reason = response
                .json::<ProviderErrorBody>()
                .await
                .map(|body| body.error.message)
                .unwrap_or_default();
            tracing::debug!("Identity provider rejected token: {} {}", status, reason);

            return Err(if reason.starts_with("TOKEN_EXPIRED") {
                AppError::unauthorized(ErrorCode::ExpiredToken, "Token has expired")
            } else {
                AppError::unauthorized(ErrorCode::InvalidToken, "Invalid authentication token")
            });
        }

        let body: LookupResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse identity provider response: {}", e);
            verification_error()
        })?;

        let user = body.users.into_iter().next().ok_or_else(|| {
            AppError::unauthorized(ErrorCode::InvalidToken, "Invalid authentication token")
        })?;

        Ok(AuthenticatedUser {
            uid: user.local_id,
            email: user.email,
            email_verified: user.email_verified,
        })
    }
}

#[async_trait]
impl IdentityVerifier for FirebaseVerifier {
    async fn verify(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let key = token_digest(token);
        if let Some(user) = self.cache.get(&key).await {
            tracing::debug!("Token cache hit for {}", user.uid);
            return Ok(user);
        }

        let user = self.lookup(token).await?;
        self.cache.insert(key, user.clone()).await;
        Ok(user)
    }
}

fn verification_error() -> AppError {
    AppError::unauthorized(
        ErrorCode::TokenVerificationError,
        "Token verification failed",
    )
}

/// SHA-256 hex digest, so raw tokens are never held as cache keys.
pub fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
