//! HTTP Server
//!
//! Binds the router on TCP and serves until the shutdown token fires.

use crate::handler::{self, AppState};
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use tokio::task::JoinHandle;
use tracing::{error, info};
use ytflow_core::application::ShutdownToken;
use ytflow_core::error::AppError;

const DEFAULT_HTTP_HOST: &str = "127.0.0.1";
const DEFAULT_HTTP_PORT: u16 = 3000;

/// HTTP Server Configuration
#[derive(Debug, Clone)]
pub struct HttpServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HTTP_HOST.to_string(),
            port: DEFAULT_HTTP_PORT,
        }
    }
}

/// Build the route table
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/yt", post(handler::submit))
        .route("/yt/{job_id}", get(handler::get_job))
        .route("/health", get(handler::health))
        .with_state(state)
}

/// Running server
pub struct ServerHandle {
    pub local_addr: SocketAddr,
    join: JoinHandle<()>,
}

impl ServerHandle {
    /// Wait for the serve loop to finish draining
    pub async fn stopped(self) {
        if let Err(e) = self.join.await {
            error!(error = %e, "HTTP server task panicked");
        }
    }
}

/// HTTP Server
pub struct HttpServer {
    config: HttpServerConfig,
    state: AppState,
}

impl HttpServer {
    pub fn new(config: HttpServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Bind and start serving in the background
    ///
    /// In-flight requests are allowed to finish once `shutdown` fires.
    pub async fn start(self, shutdown: ShutdownToken) -> Result<ServerHandle, AppError> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| AppError::Config(format!("Failed to bind {}: {}", addr, e)))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| AppError::Internal(e.to_string()))?;

        info!(addr = %local_addr, "HTTP server listening");

        let app = router(self.state);
        let join = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown.wait())
                .await
            {
                error!(error = %e, "HTTP server error");
            }
            info!("HTTP server stopped");
        });

        Ok(ServerHandle { local_addr, join })
    }
}
