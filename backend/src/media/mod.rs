//! Media-hosting client
//!
//! Uploads spooled image files to the configured media host and returns
//! the hosted asset URL. Upload failures surface as `MediaError` and must
//! abort the calling operation before any database write.

use crate::config::MediaConfig;
use anyhow::Result;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Media upload failure
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("media host request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("media host rejected the upload with status {0}")]
    Rejected(u16),

    #[error("could not read spooled upload: {0}")]
    Spool(#[from] std::io::Error),
}

/// Hosted asset returned by the media host.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaAsset {
    pub url: String,
}

/// Client for the third-party media host.
#[derive(Clone)]
pub struct MediaClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl MediaClient {
    pub fn new(config: &MediaConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.upload_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Upload a spooled file and resolve it to a hosted URL.
    ///
    /// The caller owns the spool file; dropping it removes the temp file on
    /// success and failure alike.
    pub async fn upload_file(&self, path: &Path, file_name: &str) -> Result<MediaAsset, MediaError> {
        let bytes = tokio::fs::read(path).await?;
        debug!(file_name, size = bytes.len(), "uploading to media host");

        let part = Part::bytes(bytes).file_name(file_name.to_string());
        let form = Form::new().part("file", part);

        let response = self
            .http
            .post(format!("{}/upload", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MediaError::Rejected(status.as_u16()));
        }

        Ok(response.json::<MediaAsset>().await?)
    }
}
