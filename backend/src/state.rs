//! Application state management
//!
//! Shared resources passed to handlers via Axum state extraction. All
//! fields are built once at startup and cheap to clone; nothing in here is
//! mutated during request handling.

use crate::auth::JwtService;
use crate::config::AppConfig;
use crate::media::MediaClient;
use crate::store::CredentialStore;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn CredentialStore>,
    config: Arc<AppConfig>,
    jwt: JwtService,
    media: Arc<MediaClient>,
}

impl AppState {
    /// Build the state, pre-computing the JWT keys from the config secrets.
    pub fn new(store: Arc<dyn CredentialStore>, media: MediaClient, config: AppConfig) -> Self {
        let jwt = JwtService::new(
            &config.jwt.access_token_secret,
            &config.jwt.refresh_token_secret,
            config.jwt.access_token_expiry_secs,
            config.jwt.refresh_token_expiry_secs,
        );

        Self {
            store,
            config: Arc::new(config),
            jwt,
            media: Arc::new(media),
        }
    }

    #[inline]
    pub fn store(&self) -> &dyn CredentialStore {
        self.store.as_ref()
    }

    #[inline]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[inline]
    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }

    #[inline]
    pub fn media(&self) -> &MediaClient {
        &self.media
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    fn test_state() -> AppState {
        let config = AppConfig::default();
        let media = MediaClient::new(&config.media).unwrap();
        AppState::new(Arc::new(MemoryStore::default()), media, config)
    }

    #[test]
    fn test_state_clone_is_cheap() {
        let state = test_state();
        let _cloned = state.clone();
    }

    #[test]
    fn test_jwt_service_is_precomputed() {
        let state = test_state();
        let token = state
            .jwt()
            .issue_access_token(uuid::Uuid::new_v4())
            .unwrap();
        assert!(!token.is_empty());
    }
}
