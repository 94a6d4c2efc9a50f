//! Account management: registration, profile updates, image uploads
//!
//! Thin glue around the credential store and the media client. Image
//! uploads spool the request body to a temp file that is removed on every
//! path, and the hosted URL is persisted only after the upload succeeds.

use crate::auth::PasswordService;
use crate::error::ApiError;
use crate::media::MediaClient;
use crate::store::{CredentialStore, NewUser, ProfileUpdate, UserImage};
use std::io::Write;
use tempfile::NamedTempFile;
use tracing::error;
use userbase_shared::types::{RegisterRequest, UpdateAccountRequest, UserPublic};
use userbase_shared::validation;
use uuid::Uuid;

/// An image file received from a multipart request.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Account operations
pub struct AccountService;

impl AccountService {
    /// Register a new user. Usernames are stored lowercase so the unique
    /// index enforces case-insensitive uniqueness.
    pub async fn register(
        store: &dyn CredentialStore,
        req: RegisterRequest,
    ) -> Result<UserPublic, ApiError> {
        let full_name = req.full_name.trim().to_string();
        let email = req.email.trim().to_string();
        let username = req.username.trim().to_lowercase();

        if full_name.is_empty() || email.is_empty() || username.is_empty() || req.password.is_empty()
        {
            return Err(ApiError::Validation("All fields are required".to_string()));
        }
        validation::validate_full_name(&full_name).map_err(ApiError::Validation)?;
        validation::validate_email(&email).map_err(ApiError::Validation)?;
        validation::validate_username(&username).map_err(ApiError::Validation)?;
        validation::validate_password(&req.password).map_err(ApiError::Validation)?;

        if store
            .username_or_email_taken(&username, &email)
            .await
            .map_err(ApiError::Internal)?
        {
            return Err(ApiError::Conflict(
                "user with email or username already exists".to_string(),
            ));
        }

        let password_hash = PasswordService::hash_async(req.password)
            .await
            .map_err(ApiError::Internal)?;

        let user = store
            .create(NewUser {
                username,
                email,
                full_name,
                password_hash,
            })
            .await
            .map_err(ApiError::Internal)?;

        Ok(user.into_public())
    }

    /// Update full name and/or email.
    pub async fn update_account(
        store: &dyn CredentialStore,
        user_id: Uuid,
        req: UpdateAccountRequest,
    ) -> Result<UserPublic, ApiError> {
        if req.full_name.is_none() && req.email.is_none() {
            return Err(ApiError::Validation(
                "at least one of fullName or email is required".to_string(),
            ));
        }

        if let Some(full_name) = &req.full_name {
            validation::validate_full_name(full_name).map_err(ApiError::Validation)?;
        }
        if let Some(email) = &req.email {
            validation::validate_email(email).map_err(ApiError::Validation)?;
            // The new email may already belong to someone else.
            if let Some(existing) = store
                .find_by_username_or_email(email)
                .await
                .map_err(ApiError::Internal)?
            {
                if existing.id != user_id {
                    return Err(ApiError::Conflict("email already in use".to_string()));
                }
            }
        }

        let updated = store
            .update_profile(
                user_id,
                ProfileUpdate {
                    full_name: req.full_name,
                    email: req.email,
                },
            )
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| ApiError::NotFound("user does not exist".to_string()))?;

        Ok(updated.into_public())
    }

    /// Upload an avatar or cover image to the media host, then persist the
    /// hosted URL. A failed upload leaves the record untouched.
    pub async fn set_user_image(
        store: &dyn CredentialStore,
        media: &MediaClient,
        user_id: Uuid,
        image: UserImage,
        upload: ImageUpload,
    ) -> Result<UserPublic, ApiError> {
        if upload.bytes.is_empty() {
            return Err(ApiError::Validation("image file is required".to_string()));
        }

        // Spool to disk; the temp file is deleted when `spool` drops,
        // whether or not the upload succeeds.
        let bytes = upload.bytes;
        let spool = tokio::task::spawn_blocking(move || -> anyhow::Result<NamedTempFile> {
            let mut file = NamedTempFile::new()?;
            file.write_all(&bytes)?;
            Ok(file)
        })
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Task join error: {}", e)))?
        .map_err(ApiError::Internal)?;

        let asset = media
            .upload_file(spool.path(), &upload.file_name)
            .await
            .map_err(|e| {
                error!("media upload failed: {}", e);
                ApiError::Upstream("media upload failed".to_string())
            })?;

        let updated = store
            .set_image_url(user_id, image, &asset.url)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| ApiError::NotFound("user does not exist".to_string()))?;

        Ok(updated.into_public())
    }
}
