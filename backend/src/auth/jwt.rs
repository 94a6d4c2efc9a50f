//! Token issuance and verification
//!
//! Access and refresh tokens are signed with distinct secrets; keys are
//! pre-computed once at startup and wrapped in Arc for cheap cloning.
//! Issuance never touches storage.

use anyhow::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Token claims: user id, issuance and expiry timestamps, plus a unique
/// token id so two tokens issued within the same second still differ.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Unique token id
    pub jti: String,
}

impl Claims {
    /// Parse the subject back into a user id.
    pub fn user_id(&self) -> Result<Uuid, TokenError> {
        Uuid::parse_str(&self.sub).map_err(|_| TokenError::Malformed)
    }
}

/// Verification failure, distinguishable from "absent token" at the gate.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is expired")]
    Expired,
    #[error("token is malformed or its signature is invalid")]
    Malformed,
}

/// Pre-computed signing/verification keys for one token class.
#[derive(Clone)]
struct KeyPair {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
}

impl KeyPair {
    fn new(secret: &str) -> Self {
        Self {
            encoding: Arc::new(EncodingKey::from_secret(secret.as_bytes())),
            decoding: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
        }
    }
}

/// Token issuer and verifier
///
/// Holds one key pair per token class. Construct once at startup and store
/// in AppState; cloning is O(1).
#[derive(Clone)]
pub struct JwtService {
    access: KeyPair,
    refresh: KeyPair,
    access_expiry_secs: i64,
    refresh_expiry_secs: i64,
}

impl JwtService {
    pub fn new(
        access_secret: &str,
        refresh_secret: &str,
        access_expiry_secs: i64,
        refresh_expiry_secs: i64,
    ) -> Self {
        Self {
            access: KeyPair::new(access_secret),
            refresh: KeyPair::new(refresh_secret),
            access_expiry_secs,
            refresh_expiry_secs,
        }
    }

    /// Issue a short-lived access token for a user.
    pub fn issue_access_token(&self, user_id: Uuid) -> Result<String> {
        Self::issue(&self.access, user_id, self.access_expiry_secs)
    }

    /// Issue a longer-lived refresh token for a user.
    pub fn issue_refresh_token(&self, user_id: Uuid) -> Result<String> {
        Self::issue(&self.refresh, user_id, self.refresh_expiry_secs)
    }

    /// Verify an access token's signature and expiry.
    pub fn verify_access_token(&self, token: &str) -> Result<Claims, TokenError> {
        Self::verify(&self.access, token)
    }

    /// Verify a refresh token's signature and expiry.
    pub fn verify_refresh_token(&self, token: &str) -> Result<Claims, TokenError> {
        Self::verify(&self.refresh, token)
    }

    fn issue(keys: &KeyPair, user_id: Uuid, expiry_secs: i64) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(expiry_secs)).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &keys.encoding)
            .map_err(|e| anyhow::anyhow!("Failed to sign token: {}", e))
    }

    fn verify(keys: &KeyPair, token: &str) -> Result<Claims, TokenError> {
        // Zero leeway: a token past its expiry never verifies.
        let mut validation = Validation::default();
        validation.leeway = 0;

        decode::<Claims>(token, &keys.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_service() -> JwtService {
        JwtService::new("test-access-secret", "test-refresh-secret", 3600, 604800)
    }

    #[test]
    fn test_issue_and_verify_access_token() {
        let service = create_test_service();
        let user_id = Uuid::new_v4();

        let token = service.issue_access_token(user_id).unwrap();
        let claims = service.verify_access_token(&token).unwrap();

        assert_eq!(claims.user_id().unwrap(), user_id);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_issue_and_verify_refresh_token() {
        let service = create_test_service();
        let user_id = Uuid::new_v4();

        let token = service.issue_refresh_token(user_id).unwrap();
        let claims = service.verify_refresh_token(&token).unwrap();

        assert_eq!(claims.user_id().unwrap(), user_id);
    }

    #[test]
    fn test_token_classes_use_disjoint_secrets() {
        let service = create_test_service();
        let user_id = Uuid::new_v4();

        let access = service.issue_access_token(user_id).unwrap();
        let refresh = service.issue_refresh_token(user_id).unwrap();

        assert_eq!(
            service.verify_refresh_token(&access).unwrap_err(),
            TokenError::Malformed
        );
        assert_eq!(
            service.verify_access_token(&refresh).unwrap_err(),
            TokenError::Malformed
        );
    }

    #[test]
    fn test_expired_token_fails_with_expired() {
        // Negative expiry puts `exp` in the past.
        let service = JwtService::new("test-access-secret", "test-refresh-secret", -60, -60);
        let user_id = Uuid::new_v4();

        let token = service.issue_access_token(user_id).unwrap();
        assert_eq!(
            service.verify_access_token(&token).unwrap_err(),
            TokenError::Expired
        );
    }

    #[test]
    fn test_garbage_token_is_malformed() {
        let service = create_test_service();
        assert_eq!(
            service.verify_access_token("not.a.token").unwrap_err(),
            TokenError::Malformed
        );
    }

    #[test]
    fn test_wrong_secret_is_malformed() {
        let service = create_test_service();
        let other = JwtService::new("other-access-secret", "other-refresh-secret", 3600, 604800);
        let token = other.issue_access_token(Uuid::new_v4()).unwrap();

        assert_eq!(
            service.verify_access_token(&token).unwrap_err(),
            TokenError::Malformed
        );
    }

    #[test]
    fn test_tokens_are_unique_within_a_second() {
        let service = create_test_service();
        let user_id = Uuid::new_v4();

        let first = service.issue_refresh_token(user_id).unwrap();
        let second = service.issue_refresh_token(user_id).unwrap();
        assert_ne!(first, second);
    }
}
