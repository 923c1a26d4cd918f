//! WordPress REST API implementation.

use super::{BackendCredentials, ContentBackend, MediaUpload, PageDraft, SiteStatus};
use crate::config::BackendSettings;
use crate::error::{QuillError, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Pages requested per listing call (the API maximum).
const PAGES_PER_REQUEST: u32 = 100;

/// Gateway to a WordPress `wp/v2` REST API using HTTP basic auth.
pub struct WordPressBackend {
    client: reqwest::Client,
    base_url: String,
    credentials: BackendCredentials,
}

impl WordPressBackend {
    /// Create a gateway for `base_url` (e.g. `https://example.com/wp-json/wp/v2`).
    pub fn new(base_url: &str, credentials: BackendCredentials, timeout: Duration) -> Result<Self> {
        let parsed = url::Url::parse(base_url)
            .map_err(|e| QuillError::Config(format!("Invalid backend URL '{}': {}", base_url, e)))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| QuillError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            credentials,
        })
    }

    /// Create a gateway from settings. Credentials must be configured.
    pub fn from_settings(settings: &BackendSettings) -> Result<Self> {
        let credentials = BackendCredentials::from_settings(settings).ok_or_else(|| {
            QuillError::Config(
                "Backend credentials not set. Set backend.username/backend.password \
                 or CMS_USERNAME/CMS_PASSWORD."
                    .to_string(),
            )
        })?;
        Self::new(
            &settings.base_url,
            credentials,
            Duration::from_secs(settings.timeout_seconds),
        )
    }

    /// The credentials this gateway authenticates with.
    pub fn credentials(&self) -> &BackendCredentials {
        &self.credentials
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.basic_auth(&self.credentials.username, Some(&self.credentials.password))
    }

    /// Send a request and decode the JSON body, mapping non-2xx to `Backend`.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QuillError::Backend {
                status: status.as_u16(),
                message: error_message(&body, status),
            });
        }

        Ok(response.json::<Value>().await?)
    }
}

/// Pull the human-readable message out of a WordPress error body.
fn error_message(body: &str, status: reqwest::StatusCode) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.chars().take(500).collect())
        })
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string())
}

#[async_trait]
impl ContentBackend for WordPressBackend {
    #[instrument(skip(self, page), fields(title = ?page.title))]
    async fn create_page(&self, page: &PageDraft) -> Result<Value> {
        let request = self.authed(self.client.post(self.endpoint("pages"))).json(page);
        let created = self.send(request).await?;
        let id = created.get("id").cloned().unwrap_or_default();
        info!("Created page {}", id);
        Ok(created)
    }

    #[instrument(skip(self, page))]
    async fn update_page(&self, page_id: u64, page: &PageDraft) -> Result<Value> {
        let request = self
            .authed(self.client.put(self.endpoint(&format!("pages/{}", page_id))))
            .json(page);
        let updated = self.send(request).await?;
        info!("Updated page {}", page_id);
        Ok(updated)
    }

    #[instrument(skip(self, media), fields(filename = %media.filename, size = media.bytes.len()))]
    async fn upload_media(&self, media: MediaUpload) -> Result<Value> {
        let part = Part::bytes(media.bytes)
            .file_name(media.filename)
            .mime_str(&media.content_type)?;
        let form = Form::new().part("file", part);

        let request = self
            .authed(self.client.post(self.endpoint("media")))
            .multipart(form);
        self.send(request).await
    }

    #[instrument(skip(self))]
    async fn list_pages(&self) -> Result<Value> {
        let request = self
            .authed(self.client.get(self.endpoint("pages")))
            .query(&[("per_page", PAGES_PER_REQUEST)]);
        let pages = self.send(request).await?;
        debug!(
            "Listed {} pages",
            pages.as_array().map(|a| a.len()).unwrap_or_default()
        );
        Ok(pages)
    }

    #[instrument(skip(self))]
    async fn site_status(&self) -> Result<SiteStatus> {
        let response = self.client.get(self.endpoint("")).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QuillError::Backend {
                status: status.as_u16(),
                message: error_message(&body, status),
            });
        }

        let api_version = response
            .headers()
            .get("X-WP-Version")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("Unknown")
            .to_string();

        Ok(SiteStatus { api_version })
    }
}
