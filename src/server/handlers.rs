//! Request handlers.

use super::auth::Authorized;
use super::{ApiError, AppState};
use crate::backend::{MediaUpload, PageDraft};
use crate::content::ContentRequest;
use crate::orchestrator::OperationOutcome;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

// === Request/Response Types ===

#[derive(Deserialize)]
pub struct CreatePageRequest {
    title: String,
    topic: String,
    #[serde(default)]
    optimize: bool,
}

#[derive(Deserialize)]
pub struct ContentBody {
    content: String,
}

#[derive(Serialize)]
struct RelayResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    page: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    media: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pages: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

impl RelayResponse {
    fn new() -> Self {
        Self {
            success: true,
            page: None,
            media: None,
            pages: None,
            message: None,
        }
    }
}

fn outcome_response(outcome: OperationOutcome) -> Response {
    let status = if outcome.success() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(outcome)).into_response()
}

// === Handlers ===

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn agent_create_page(
    State(state): State<Arc<AppState>>,
    _auth: Authorized,
    Json(req): Json<CreatePageRequest>,
) -> Response {
    let outcome = state
        .orchestrator
        .create_page_with(ContentRequest::new(req.title, req.topic), req.optimize)
        .await;
    outcome_response(outcome)
}

pub async fn agent_update_homepage(
    State(state): State<Arc<AppState>>,
    _auth: Authorized,
    Json(req): Json<ContentBody>,
) -> Response {
    outcome_response(state.orchestrator.update_homepage(&req.content).await)
}

pub async fn agent_optimize(
    State(state): State<Arc<AppState>>,
    _auth: Authorized,
    Json(req): Json<ContentBody>,
) -> Response {
    outcome_response(state.orchestrator.optimize_seo_content(&req.content).await)
}

pub async fn agent_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.orchestrator.get_agent_status().await)
}

pub async fn create_page(
    State(state): State<Arc<AppState>>,
    _auth: Authorized,
    Json(page): Json<PageDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state.backend.create_page(&page).await?;
    Ok(Json(RelayResponse {
        page: Some(created),
        message: Some("Page created successfully"),
        ..RelayResponse::new()
    }))
}

pub async fn update_page(
    State(state): State<Arc<AppState>>,
    _auth: Authorized,
    Path(page_id): Path<u64>,
    Json(page): Json<PageDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state.backend.update_page(page_id, &page).await?;
    Ok(Json(RelayResponse {
        page: Some(updated),
        message: Some("Page updated successfully"),
        ..RelayResponse::new()
    }))
}

pub async fn upload_media(
    State(state): State<Arc<AppState>>,
    _auth: Authorized,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| {
                mime_guess::from_path(&filename)
                    .first_or_octet_stream()
                    .essence_str()
                    .to_string()
            });
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;

        upload = Some(MediaUpload {
            filename,
            content_type,
            bytes: bytes.to_vec(),
        });
        break;
    }

    let upload =
        upload.ok_or_else(|| ApiError::BadRequest("Missing multipart field 'file'".to_string()))?;
    info!("Relaying upload of {} ({} bytes)", upload.filename, upload.bytes.len());

    let media = state.backend.upload_media(upload).await?;
    Ok(Json(RelayResponse {
        media: Some(media),
        message: Some("Media uploaded successfully"),
        ..RelayResponse::new()
    }))
}

pub async fn list_pages(
    State(state): State<Arc<AppState>>,
    _auth: Authorized,
) -> Result<impl IntoResponse, ApiError> {
    let pages = state.backend.list_pages().await?;
    Ok(Json(RelayResponse {
        pages: Some(pages),
        ..RelayResponse::new()
    }))
}

pub async fn site_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.backend.site_status().await {
        Ok(status) => Json(json!({
            "success": true,
            "status": "Site is accessible",
            "api_version": status.api_version,
        })),
        Err(e) => {
            warn!("Site status check failed: {}", e);
            Json(json!({
                "success": false,
                "status": "Site is not accessible",
                "error": e.to_string(),
            }))
        }
    }
}
