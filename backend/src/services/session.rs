//! Session lifecycle manager
//!
//! Orchestrates login, refresh, logout and password change over the token
//! issuer/verifier and the credential store. A user has at most one live
//! refresh token; login overwrites it, refresh rotates it via an atomic
//! compare-and-set, logout clears it.

use crate::auth::{JwtService, PasswordService};
use crate::error::ApiError;
use crate::store::CredentialStore;
use userbase_shared::types::UserPublic;
use userbase_shared::validation;
use uuid::Uuid;

/// Freshly issued access/refresh pair.
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: UserPublic,
    pub tokens: IssuedTokens,
}

/// Session lifecycle operations
pub struct SessionService;

impl SessionService {
    /// Login with username or email plus password. On success the issued
    /// refresh token replaces any previously stored one.
    pub async fn login(
        store: &dyn CredentialStore,
        jwt: &JwtService,
        username: Option<&str>,
        email: Option<&str>,
        password: &str,
    ) -> Result<LoginOutcome, ApiError> {
        let identifier = username
            .or(email)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ApiError::Validation("username or email is required".to_string()))?;

        let user = store
            .find_by_username_or_email(identifier)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| ApiError::NotFound("user does not exist".to_string()))?;

        let valid =
            PasswordService::verify_async(password.to_string(), user.password_hash.clone())
                .await
                .map_err(ApiError::Internal)?;
        if !valid {
            return Err(ApiError::InvalidCredentials);
        }

        let access_token = jwt.issue_access_token(user.id).map_err(ApiError::Internal)?;
        let refresh_token = jwt
            .issue_refresh_token(user.id)
            .map_err(ApiError::Internal)?;

        store
            .set_refresh_token(user.id, Some(&refresh_token))
            .await
            .map_err(ApiError::Internal)?;

        Ok(LoginOutcome {
            user: user.into_public(),
            tokens: IssuedTokens {
                access_token,
                refresh_token,
            },
        })
    }

    /// Rotate the presented refresh token into a new pair. The swap is a
    /// compare-and-set against the stored value: a stale or replayed token
    /// fails with `TokenReused`, and of two concurrent calls with the same
    /// token exactly one succeeds.
    pub async fn refresh(
        store: &dyn CredentialStore,
        jwt: &JwtService,
        presented: &str,
    ) -> Result<IssuedTokens, ApiError> {
        let claims = jwt
            .verify_refresh_token(presented)
            .map_err(|_| ApiError::Unauthorized("Invalid refresh token".to_string()))?;

        let user_id = claims
            .user_id()
            .map_err(|_| ApiError::Unauthorized("Invalid refresh token".to_string()))?;

        let user = store
            .find_by_id(user_id)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| ApiError::Unauthorized("Invalid refresh token".to_string()))?;

        // Issue before swapping so a failed swap leaves nothing persisted.
        let access_token = jwt.issue_access_token(user.id).map_err(ApiError::Internal)?;
        let next_refresh = jwt
            .issue_refresh_token(user.id)
            .map_err(ApiError::Internal)?;

        let rotated = store
            .swap_refresh_token(user.id, presented, &next_refresh)
            .await
            .map_err(ApiError::Internal)?;
        if !rotated {
            return Err(ApiError::TokenReused);
        }

        Ok(IssuedTokens {
            access_token,
            refresh_token: next_refresh,
        })
    }

    /// Clear the stored refresh token so no future refresh succeeds, even
    /// before natural expiry. Idempotent.
    pub async fn logout(store: &dyn CredentialStore, user_id: Uuid) -> Result<(), ApiError> {
        store
            .set_refresh_token(user_id, None)
            .await
            .map_err(ApiError::Internal)
    }

    /// Replace the stored password hash after verifying the old password.
    /// Existing sessions stay valid; only the hash changes.
    pub async fn change_password(
        store: &dyn CredentialStore,
        user_id: Uuid,
        old_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<(), ApiError> {
        if new_password != confirm_password {
            return Err(ApiError::Validation(
                "new password and confirmation do not match".to_string(),
            ));
        }
        validation::validate_password(new_password).map_err(ApiError::Validation)?;

        let user = store
            .find_by_id(user_id)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| ApiError::NotFound("user does not exist".to_string()))?;

        let valid =
            PasswordService::verify_async(old_password.to_string(), user.password_hash.clone())
                .await
                .map_err(ApiError::Internal)?;
        if !valid {
            return Err(ApiError::InvalidCredentials);
        }

        let new_hash = PasswordService::hash_async(new_password.to_string())
            .await
            .map_err(ApiError::Internal)?;

        store
            .update_password_hash(user_id, &new_hash)
            .await
            .map_err(ApiError::Internal)
    }
}
