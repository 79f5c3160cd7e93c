use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::errors::{AppError, ErrorCode};
use crate::handlers::AppState;

/// Rejects requests without a verified bearer credential.
///
/// On success the verified [`crate::identity::AuthenticatedUser`] is added to
/// the request extensions for the handler to pick up.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())?;
    let user = state.verifier.verify(token).await?;

    tracing::debug!("Authenticated request for {}", user.uid);
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Extracts the credential from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = headers.get(AUTHORIZATION).ok_or_else(|| {
        AppError::unauthorized(ErrorCode::MissingAuthHeader, "Authorization header required")
    })?;

    let invalid_format = || {
        AppError::unauthorized(
            ErrorCode::InvalidAuthFormat,
            "Authorization header must be 'Bearer <token>'",
        )
    };

    let value = value.to_str().map_err(|_| invalid_format())?;
    let token = value.strip_prefix("Bearer ").ok_or_else(invalid_format)?.trim();
    if token.is_empty() {
        return Err(invalid_format());
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: Option<&str>) -> HeaderMap {
        let mut map = HeaderMap::new();
        if let Some(v) = value {
            map.insert(AUTHORIZATION, HeaderValue::from_str(v).unwrap());
        }
        map
    }

    #[test]
    fn test_bearer_token_extracted() {
        assert_eq!(bearer_token(&headers(Some("Bearer abc.def"))).unwrap(), "abc.def");
    }

    #[test]
    fn test_missing_header() {
        let err = bearer_token(&headers(None)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::MissingAuthHeader);
    }

    #[test]
    fn test_malformed_header() {
        for value in ["Basic dXNlcjpwYXNz", "Bearer", "Bearer    ", "bearer abc", "abc"] {
            let err = bearer_token(&headers(Some(value))).unwrap_err();
            assert_eq!(err.code(), ErrorCode::InvalidAuthFormat, "header: {}", value);
        }
    }
}
