//! HTTP surface
//!
//! Maps `GET /movie/amazon/{amazon_id}` onto the scrape engine and turns
//! each failure kind into its own status code. The engine itself knows
//! nothing about HTTP.

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Notify;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::application::ScrapeService;
use crate::domain::Record;
use crate::infrastructure::config::ServerConfig;
use crate::infrastructure::scrape_error::{ErrorKind, ScrapeError};

/// Failure response: `{"error": <kind>, "message": <details>}`
#[derive(Debug)]
pub struct ApiError(pub ScrapeError);

impl From<ScrapeError> for ApiError {
    fn from(error: ScrapeError) -> Self {
        Self(error)
    }
}

/// Status code for each failure kind
pub const fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NetworkFailure | ErrorKind::HttpStatus => StatusCode::BAD_GATEWAY,
        ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let body = Json(json!({
            "error": kind.as_str(),
            "message": self.0.to_string(),
        }));
        (status_for(kind), body).into_response()
    }
}

pub fn router(service: ScrapeService) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/movie/amazon/:amazon_id", get(movie_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

async fn health_handler() -> &'static str {
    "OK"
}

async fn movie_handler(
    State(service): State<ScrapeService>,
    Path(amazon_id): Path<String>,
) -> Result<Json<Record>, ApiError> {
    let record = service.scrape(&amazon_id).await?;
    Ok(Json(record))
}

/// Serve until Ctrl-C/SIGTERM, then drain for at most the configured grace period
pub async fn serve(config: &ServerConfig, service: ScrapeService) -> Result<()> {
    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to listen on {address}"))?;
    info!("HTTP service starting on {}", address);

    let shutdown = Arc::new(Notify::new());
    let trigger = shutdown.clone();
    let app = router(service);

    let server = async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown_signal().await;
                trigger.notify_one();
            })
            .await
    };

    let grace = config.shutdown_timeout();
    tokio::select! {
        result = server => {
            result.context("HTTP server error")?;
            info!("Server exited properly");
        }
        () = async {
            shutdown.notified().await;
            tokio::time::sleep(grace).await;
        } => {
            warn!("Graceful shutdown exceeded {:?}, closing remaining connections", grace);
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => warn!("Ctrl-C received, shutting down"),
        () = terminate => warn!("SIGTERM received, shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::scrape_error::FetchError;
    use std::time::Duration;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(ErrorKind::Validation), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::HttpStatus), StatusCode::BAD_GATEWAY);
        assert_eq!(status_for(ErrorKind::NetworkFailure), StatusCode::BAD_GATEWAY);
        assert_eq!(status_for(ErrorKind::Timeout), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(status_for(ErrorKind::NotFound), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_timeout_error_response() {
        let error = ApiError(FetchError::timeout("http://x/B0", Duration::from_secs(1)).into());
        assert_eq!(error.into_response().status(), StatusCode::GATEWAY_TIMEOUT);
    }
}
