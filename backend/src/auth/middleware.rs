//! Authentication gate
//!
//! Extractor that runs before protected handlers: pulls the access token
//! from the `accessToken` cookie first, then from `Authorization: Bearer`,
//! verifies it, loads the sanitized identity, and attaches it to the
//! request. Expired and malformed tokens are reported identically so the
//! response does not leak token state. Never mutates storage.

use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::FromRef,
    http::{header::AUTHORIZATION, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;
use userbase_shared::types::UserPublic;
use uuid::Uuid;

/// Cookie carrying the access token.
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
/// Cookie carrying the refresh token.
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Authenticated identity attached to the request by the gate.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub user: UserPublic,
}

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let token = extract_access_token(parts)
            .ok_or_else(|| ApiError::Unauthorized("Missing access token".to_string()))?;

        let claims = app_state
            .jwt()
            .verify_access_token(&token)
            .map_err(|_| ApiError::Unauthorized("Invalid access token".to_string()))?;

        let user_id = claims
            .user_id()
            .map_err(|_| ApiError::Unauthorized("Invalid access token".to_string()))?;

        // The identity may have been deleted after the token was issued.
        let record = app_state
            .store()
            .find_by_id(user_id)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| ApiError::Unauthorized("Invalid access token".to_string()))?;

        Ok(CurrentUser {
            id: record.id,
            user: record.into_public(),
        })
    }
}

/// Cookie first, bearer header as fallback.
fn extract_access_token(parts: &Parts) -> Option<String> {
    let jar = CookieJar::from_headers(&parts.headers);
    if let Some(cookie) = jar.get(ACCESS_TOKEN_COOKIE) {
        return Some(cookie.value().to_string());
    }

    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_headers(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_extracts_token_from_cookie() {
        let parts = parts_with_headers(&[("cookie", "accessToken=abc123")]);
        assert_eq!(extract_access_token(&parts).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_extracts_token_from_bearer_header() {
        let parts = parts_with_headers(&[("authorization", "Bearer abc123")]);
        assert_eq!(extract_access_token(&parts).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_cookie_takes_precedence_over_header() {
        let parts = parts_with_headers(&[
            ("cookie", "accessToken=from-cookie"),
            ("authorization", "Bearer from-header"),
        ]);
        assert_eq!(extract_access_token(&parts).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn test_missing_token_yields_none() {
        let parts = parts_with_headers(&[]);
        assert!(extract_access_token(&parts).is_none());
    }

    #[test]
    fn test_wrong_auth_scheme_yields_none() {
        let parts = parts_with_headers(&[("authorization", "Basic dXNlcjpwYXNz")]);
        assert!(extract_access_token(&parts).is_none());
    }
}
