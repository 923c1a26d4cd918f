//! HTTP API server command.

use crate::backend::{BackendCredentials, ContentBackend, WordPressBackend};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::ContentOrchestrator;
use crate::server::{self, AppState, ENDPOINTS};
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

/// Run the HTTP API server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> Result<()> {
    preflight::check(Operation::Publish, &settings)?;

    let credentials = BackendCredentials::from_settings(&settings.backend).ok_or_else(|| {
        anyhow::anyhow!(
            "Backend credentials are required for the passthrough endpoints. \
             Set [backend] username/password or CMS_USERNAME and CMS_PASSWORD"
        )
    })?;
    let backend: Arc<dyn ContentBackend> = Arc::new(WordPressBackend::from_settings(&settings.backend)?);
    let orchestrator = ContentOrchestrator::new(&settings)?;

    let state = Arc::new(AppState {
        orchestrator,
        backend,
        credentials,
        max_upload_bytes: settings.server.max_upload_bytes,
    });

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Quill API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    for (name, route) in ENDPOINTS {
        Output::kv(name, route);
    }
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, server::router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    info!("API server stopped");
    Ok(())
}
