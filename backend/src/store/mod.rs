//! Credential store
//!
//! Persisted user records behind a narrow async interface. All session
//! state lives here; refresh-token rotation is an atomic compare-and-set
//! so concurrent rotations cannot both win.

mod postgres;

#[cfg(test)]
pub mod memory;

pub use postgres::PgCredentialStore;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use userbase_shared::types::UserPublic;
use uuid::Uuid;

/// Persisted user record
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub cover_image_url: Option<String>,
    pub password_hash: String,
    /// Latest issued refresh token; `None` while logged out.
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    /// Sanitized view with credential fields stripped.
    pub fn into_public(self) -> UserPublic {
        UserPublic {
            id: self.id.to_string(),
            username: self.username,
            email: self.email,
            full_name: self.full_name,
            avatar_url: self.avatar_url,
            cover_image_url: self.cover_image_url,
            created_at: self.created_at,
        }
    }
}

/// Input for creating a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
}

/// Partial profile update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub email: Option<String>,
}

/// Which user image an upload replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserImage {
    Avatar,
    CoverImage,
}

/// Collaborator contract for persisted credentials and session state.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn create(&self, user: NewUser) -> Result<UserRecord>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>>;

    /// Look up by case-insensitive username or exact email.
    async fn find_by_username_or_email(&self, identifier: &str) -> Result<Option<UserRecord>>;

    async fn username_or_email_taken(&self, username: &str, email: &str) -> Result<bool>;

    /// Unconditionally overwrite the stored refresh token; `None` clears it.
    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> Result<()>;

    /// Atomic compare-and-set rotation: replaces the stored refresh token
    /// with `next` only if it currently equals `current`. Returns whether
    /// the swap happened.
    async fn swap_refresh_token(&self, id: Uuid, current: &str, next: &str) -> Result<bool>;

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<()>;

    async fn update_profile(&self, id: Uuid, update: ProfileUpdate)
        -> Result<Option<UserRecord>>;

    async fn set_image_url(
        &self,
        id: Uuid,
        image: UserImage,
        url: &str,
    ) -> Result<Option<UserRecord>>;

    /// Cheap connectivity check for readiness probes.
    async fn ping(&self) -> Result<()>;
}
