//! Backend gateway to the remote CMS REST API.
//!
//! A stateless shim: every call maps one internal page/media operation onto
//! one authenticated HTTP request and hands back the raw JSON response.

mod wordpress;

pub use wordpress::WordPressBackend;

use crate::config::BackendSettings;
use crate::error::{QuillError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// Page fields sent on create/update.
///
/// Unknown fields are carried through untouched so relayed requests reach the
/// backend as the caller sent them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PageDraft {
    /// A published page with the given title and content.
    pub fn publish(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            content: Some(content.into()),
            status: Some("publish".to_string()),
            kind: Some("page".to_string()),
            extra: Map::new(),
        }
    }

    /// A partial update that only replaces the content.
    pub fn content_only(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }
}

/// A file to upload to the media library.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl MediaUpload {
    /// Read a local file, guessing its content type from the extension.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                QuillError::InvalidInput(format!("Not a file path: {}", path.display()))
            })?
            .to_string();
        let bytes = tokio::fs::read(path).await?;
        let content_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Ok(Self {
            filename,
            content_type,
            bytes,
        })
    }
}

/// Reachability of the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteStatus {
    /// Version header reported by the API, or `Unknown`.
    pub api_version: String,
}

/// Credentials for the backend API, also used to guard the passthrough endpoints.
#[derive(Clone, PartialEq, Eq)]
pub struct BackendCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for BackendCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

impl BackendCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Resolve credentials from settings, falling back to `CMS_USERNAME` / `CMS_PASSWORD`.
    pub fn from_settings(settings: &BackendSettings) -> Option<Self> {
        let username = settings
            .username
            .clone()
            .or_else(|| std::env::var("CMS_USERNAME").ok())
            .filter(|u| !u.is_empty())?;
        let password = settings
            .password
            .clone()
            .or_else(|| std::env::var("CMS_PASSWORD").ok())
            .filter(|p| !p.is_empty())?;
        Some(Self { username, password })
    }

    /// Check a username/password pair against these credentials.
    pub fn matches(&self, username: &str, password: &str) -> bool {
        // Both comparisons always run.
        let user_ok = constant_time_eq(self.username.as_bytes(), username.as_bytes());
        let pass_ok = constant_time_eq(self.password.as_bytes(), password.as_bytes());
        user_ok & pass_ok
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Page and media operations against the remote content API.
#[async_trait]
pub trait ContentBackend: Send + Sync {
    /// Create a page.
    async fn create_page(&self, page: &PageDraft) -> Result<Value>;

    /// Update an existing page by ID.
    async fn update_page(&self, page_id: u64, page: &PageDraft) -> Result<Value>;

    /// Upload a file to the media library.
    async fn upload_media(&self, media: MediaUpload) -> Result<Value>;

    /// List pages.
    async fn list_pages(&self) -> Result<Value>;

    /// Check that the API is reachable.
    async fn site_status(&self) -> Result<SiteStatus>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_draft_publish_serialization() {
        let draft = PageDraft::publish("Q4 Guide", "<p>x</p>");
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "title": "Q4 Guide",
                "content": "<p>x</p>",
                "status": "publish",
                "type": "page"
            })
        );
    }

    #[test]
    fn test_page_draft_keeps_unknown_fields() {
        let body = serde_json::json!({"title": "About", "menu_order": 3, "parent": 12});
        let draft: PageDraft = serde_json::from_value(body.clone()).unwrap();
        assert_eq!(draft.title.as_deref(), Some("About"));
        assert_eq!(serde_json::to_value(&draft).unwrap(), body);
    }

    #[test]
    fn test_credentials_match() {
        let creds = BackendCredentials::new("editor", "s3cret");
        assert!(creds.matches("editor", "s3cret"));
        assert!(!creds.matches("editor", "s3cret!"));
        assert!(!creds.matches("admin", "s3cret"));
        assert!(!creds.matches("", ""));
    }

    #[test]
    fn test_credentials_from_settings() {
        let settings = BackendSettings {
            username: Some("editor".to_string()),
            password: Some("pw".to_string()),
            ..Default::default()
        };
        let creds = BackendCredentials::from_settings(&settings).unwrap();
        assert_eq!(creds.username, "editor");
        assert!(!format!("{:?}", creds).contains("pw"));
    }

    #[tokio::test]
    async fn test_media_upload_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.png");
        std::fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

        let upload = MediaUpload::from_path(&path).await.unwrap();
        assert_eq!(upload.filename, "logo.png");
        assert_eq!(upload.content_type, "image/png");
        assert_eq!(upload.bytes.len(), 4);
    }
}
