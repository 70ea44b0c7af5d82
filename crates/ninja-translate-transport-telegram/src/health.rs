//! Liveness endpoint.
//!
//! The hosting platform probes `GET /` on `PORT` and expects a 200.

use axum::{routing::get, Router};
use tracing::{error, info};

/// Body returned by the liveness probe.
pub const HEALTH_MESSAGE: &str = "NinjaTranslate bot is running!";

/// Router serving the liveness probe.
pub fn build_router() -> Router {
    Router::new().route("/", get(health))
}

async fn health() -> &'static str {
    HEALTH_MESSAGE
}

/// Serve the liveness probe until the process exits.
pub async fn serve(port: u16) {
    let addr = format!("0.0.0.0:{port}");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("Health server failed to bind to {addr}: {e}");
            return;
        }
    };

    info!("Health server listening on {addr}");

    if let Err(e) = axum::serve(listener, build_router()).await {
        error!("Health server error: {e}");
    }
}
