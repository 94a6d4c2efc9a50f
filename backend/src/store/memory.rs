//! In-memory credential store for tests
//!
//! Mirrors the PostgreSQL semantics, including the compare-and-set
//! rotation: every mutation runs under one mutex, so a swap observes and
//! replaces the stored token atomically.

use super::{CredentialStore, NewUser, ProfileUpdate, UserImage, UserRecord};
use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<HashMap<Uuid, UserRecord>>,
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn create(&self, user: NewUser) -> Result<UserRecord> {
        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| {
            u.username.eq_ignore_ascii_case(&user.username) || u.email == user.email
        }) {
            bail!("duplicate username or email");
        }

        let now = Utc::now();
        let record = UserRecord {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            avatar_url: None,
            cover_image_url: None,
            password_hash: user.password_hash,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        };
        users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_username_or_email(&self, identifier: &str) -> Result<Option<UserRecord>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.username.eq_ignore_ascii_case(identifier) || u.email == identifier)
            .cloned())
    }

    async fn username_or_email_taken(&self, username: &str, email: &str) -> Result<bool> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .any(|u| u.username.eq_ignore_ascii_case(username) || u.email == email))
    }

    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> Result<()> {
        if let Some(user) = self.users.lock().unwrap().get_mut(&id) {
            user.refresh_token = token.map(str::to_string);
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn swap_refresh_token(&self, id: Uuid, current: &str, next: &str) -> Result<bool> {
        let mut users = self.users.lock().unwrap();
        match users.get_mut(&id) {
            Some(user) if user.refresh_token.as_deref() == Some(current) => {
                user.refresh_token = Some(next.to_string());
                user.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<()> {
        if let Some(user) = self.users.lock().unwrap().get_mut(&id) {
            user.password_hash = password_hash.to_string();
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Option<UserRecord>> {
        let mut users = self.users.lock().unwrap();
        Ok(users.get_mut(&id).map(|user| {
            if let Some(full_name) = update.full_name {
                user.full_name = full_name;
            }
            if let Some(email) = update.email {
                user.email = email;
            }
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn set_image_url(
        &self,
        id: Uuid,
        image: UserImage,
        url: &str,
    ) -> Result<Option<UserRecord>> {
        let mut users = self.users.lock().unwrap();
        Ok(users.get_mut(&id).map(|user| {
            match image {
                UserImage::Avatar => user.avatar_url = Some(url.to_string()),
                UserImage::CoverImage => user.cover_image_url = Some(url.to_string()),
            }
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
