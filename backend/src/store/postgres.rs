//! PostgreSQL credential store

use super::{CredentialStore, NewUser, ProfileUpdate, UserImage, UserRecord};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, username, email, full_name, avatar_url, cover_image_url, \
                            password_hash, refresh_token, created_at, updated_at";

/// Credential store backed by a PostgreSQL pool.
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn create(&self, user: NewUser) -> Result<UserRecord> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            r#"
            INSERT INTO users (username, email, full_name, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn find_by_username_or_email(&self, identifier: &str) -> Result<Option<UserRecord>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(username) = LOWER($1) OR email = $1"
        ))
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn username_or_email_taken(&self, username: &str, email: &str) -> Result<bool> {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(username) = LOWER($1) OR email = $2)",
        )
        .bind(username)
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(taken)
    }

    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> Result<()> {
        sqlx::query("UPDATE users SET refresh_token = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn swap_refresh_token(&self, id: Uuid, current: &str, next: &str) -> Result<bool> {
        // Conditional update: of two concurrent rotations against the same
        // stored value, exactly one matches the WHERE clause.
        let result = sqlx::query(
            r#"
            UPDATE users SET refresh_token = $3, updated_at = NOW()
            WHERE id = $1 AND refresh_token = $2
            "#,
        )
        .bind(id)
        .bind(current)
        .bind(next)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<()> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Option<UserRecord>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            r#"
            UPDATE users SET
                full_name = COALESCE($2, full_name),
                email = COALESCE($3, email),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(update.full_name)
        .bind(update.email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn set_image_url(
        &self,
        id: Uuid,
        image: UserImage,
        url: &str,
    ) -> Result<Option<UserRecord>> {
        let column = match image {
            UserImage::Avatar => "avatar_url",
            UserImage::CoverImage => "cover_image_url",
        };

        let record = sqlx::query_as::<_, UserRecord>(&format!(
            r#"
            UPDATE users SET {column} = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
