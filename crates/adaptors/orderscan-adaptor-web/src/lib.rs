//! Web UI for OrderScan
//!
//! Routes:
//!
//! - `GET /`: upload form
//! - `POST /analyze`: multipart upload (`file`), answers with the results page
//! - `POST /api/analyze`: same upload, answers with the JSON report and CSV text
//! - `GET /health`: liveness probe

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod handlers;
mod templates;

pub use error::WebError;
pub use handlers::{data_uri, ANALYSIS_FILE_NAME, FIELDS_FILE_NAME, UPLOAD_FILE_NAME};
pub use templates::Pages;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use orderscan_core::{get_env_int, get_env_or, DocumentPipeline, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Web server settings
#[derive(Debug, Clone)]
pub struct WebUiConfig {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Largest accepted request body
    pub max_upload_bytes: usize,
    /// Parent of the per-request directories (system temp dir when unset)
    pub work_dir: Option<PathBuf>,
}

const DEFAULT_MAX_UPLOAD_MB: usize = 25;

impl Default for WebUiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8501,
            max_upload_bytes: upload_limit_bytes(DEFAULT_MAX_UPLOAD_MB),
            work_dir: None,
        }
    }
}

impl WebUiConfig {
    /// Read `ORDERSCAN_HOST`, `ORDERSCAN_PORT`, `ORDERSCAN_MAX_UPLOAD_MB` and
    /// `ORDERSCAN_WORK_DIR`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let work_dir = get_env_or("ORDERSCAN_WORK_DIR", "");
        Self {
            host: get_env_or("ORDERSCAN_HOST", &defaults.host),
            port: get_env_int("ORDERSCAN_PORT", defaults.port),
            max_upload_bytes: upload_limit_bytes(get_env_int(
                "ORDERSCAN_MAX_UPLOAD_MB",
                DEFAULT_MAX_UPLOAD_MB,
            )),
            work_dir: (!work_dir.trim().is_empty()).then(|| PathBuf::from(work_dir.trim())),
        }
    }

    /// `host:port`
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Megabytes to bytes, clamped at `usize::MAX`
fn upload_limit_bytes(megabytes: usize) -> usize {
    megabytes.saturating_mul(1024 * 1024)
}

/// Interactive analysis server
#[derive(Clone)]
pub struct WebUiServer {
    config: Arc<WebUiConfig>,
    pipeline: Arc<DocumentPipeline>,
    pages: Arc<Pages>,
}

impl WebUiServer {
    /// Create a server around a shared pipeline
    pub fn new(config: WebUiConfig, pipeline: Arc<DocumentPipeline>) -> Result<Self> {
        Ok(Self {
            config: Arc::new(config),
            pipeline,
            pages: Arc::new(Pages::new()?),
        })
    }

    /// Settings in use
    pub fn config(&self) -> &WebUiConfig {
        &self.config
    }

    /// Application router with body limit and request tracing
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(handlers::index))
            .route("/analyze", post(handlers::analyze_page))
            .route("/api/analyze", post(handlers::analyze_api))
            .route("/health", get(handlers::health))
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(DefaultBodyLimit::disable())
                    .layer(RequestBodyLimitLayer::new(self.config.max_upload_bytes)),
            )
            .with_state(self.clone())
    }

    /// Bind and serve until Ctrl-C
    pub async fn serve(&self) -> Result<()> {
        let addr = self.config.bind_addr();
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        info!("WEB_UI_LISTENING addr=http://{}", addr);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                info!("WEB_UI_SHUTDOWN");
            })
            .await?;
        Ok(())
    }
}
