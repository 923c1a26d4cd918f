//! Local static file server for previewing generated pages.

use crate::error::{QuillError, Result};
use axum::Router;
use std::net::TcpListener as StdTcpListener;
use std::path::{Path, PathBuf};
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tracing::{debug, info};

/// Find the first port in `start..start + max_attempts` that can be bound on `host`.
pub fn find_available_port(host: &str, start: u16, max_attempts: u16) -> Option<u16> {
    (0..max_attempts)
        .filter_map(|offset| start.checked_add(offset))
        .find(|port| match StdTcpListener::bind((host, *port)) {
            Ok(_) => true,
            Err(e) => {
                debug!("Port {} unavailable: {}", port, e);
                false
            }
        })
}

/// A bound, not yet running, preview server.
pub struct Preview {
    listener: TcpListener,
    directory: PathBuf,
    port: u16,
}

impl Preview {
    /// Bind the first free port from `start_port` upward.
    pub async fn bind(directory: &Path, host: &str, start_port: u16, max_attempts: u16) -> Result<Self> {
        if !directory.is_dir() {
            return Err(QuillError::InvalidInput(format!(
                "Preview directory not found: {}",
                directory.display()
            )));
        }

        let port = find_available_port(host, start_port, max_attempts).ok_or_else(|| {
            QuillError::Config(format!(
                "No available port in {}..{}",
                start_port,
                start_port.saturating_add(max_attempts)
            ))
        })?;

        let listener = TcpListener::bind((host, port)).await?;
        Ok(Self {
            listener,
            directory: directory.to_path_buf(),
            port,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Serve until Ctrl+C.
    pub async fn run(self) -> Result<()> {
        self.run_until(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
    }

    /// Serve until `shutdown` resolves.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        info!("Serving {:?} on port {}", self.directory, self.port);
        axum::serve(self.listener, router(&self.directory))
            .with_graceful_shutdown(shutdown)
            .await?;
        info!("Preview server stopped");
        Ok(())
    }
}

fn router(directory: &Path) -> Router {
    Router::new().fallback_service(ServeDir::new(directory))
}
