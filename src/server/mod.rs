//! HTTP API for the orchestrator and authenticated backend passthrough.
//!
//! `/agent/*` routes run orchestrator operations. `/pages`, `/media` relay
//! straight to the backend gateway. Every route that writes to the site, or
//! spends model calls, requires HTTP Basic credentials equal to the configured
//! backend credentials.

mod auth;
mod handlers;

pub use auth::basic_credentials;

use crate::backend::{BackendCredentials, ContentBackend};
use crate::error::QuillError;
use crate::orchestrator::ContentOrchestrator;
use axum::extract::DefaultBodyLimit;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Shared application state.
pub struct AppState {
    pub orchestrator: ContentOrchestrator,
    pub backend: Arc<dyn ContentBackend>,
    pub credentials: BackendCredentials,
    /// Body limit of the media upload route.
    pub max_upload_bytes: usize,
}

/// Error responses of the passthrough endpoints.
#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    BadRequest(String),
    Backend(String),
}

impl From<QuillError> for ApiError {
    fn from(err: QuillError) -> Self {
        match err {
            QuillError::Auth => ApiError::Unauthorized,
            QuillError::Backend { message, .. } => ApiError::Backend(message),
            other => ApiError::Backend(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, "Basic")],
                Json(json!({ "detail": "Unauthorized" })),
            )
                .into_response(),
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "detail": message })),
            )
                .into_response(),
            ApiError::Backend(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "detail": format!("Backend API error: {}", message) })),
            )
                .into_response(),
        }
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let upload_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/agent/pages", post(handlers::agent_create_page))
        .route("/agent/homepage", put(handlers::agent_update_homepage))
        .route("/agent/seo", post(handlers::agent_optimize))
        .route("/agent/status", get(handlers::agent_status))
        .route(
            "/pages",
            get(handlers::list_pages).post(handlers::create_page),
        )
        .route("/pages/{page_id}", put(handlers::update_page))
        .route(
            "/media",
            post(handlers::upload_media).layer(upload_limit),
        )
        .route("/status", get(handlers::site_status))
        .layer(cors)
        .with_state(state)
}

/// Endpoint summary for startup output.
pub const ENDPOINTS: [(&str, &str); 10] = [
    ("Health", "GET  /health"),
    ("Create page (agent)", "POST /agent/pages"),
    ("Update homepage (agent)", "PUT  /agent/homepage"),
    ("Optimize SEO", "POST /agent/seo"),
    ("Agent status", "GET  /agent/status"),
    ("Create page", "POST /pages"),
    ("Update page", "PUT  /pages/{page_id}"),
    ("Upload media", "POST /media"),
    ("List pages", "GET  /pages"),
    ("Site status", "GET  /status"),
];
