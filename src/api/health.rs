//! Health check endpoints
//!
//! Provides health check endpoints for monitoring and load balancers.

use axum::{http::StatusCode, Json};
use serde::Serialize;

/// Basic health response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Simple health check endpoint (for load balancers)
///
/// Returns 200 OK if the service is running.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Liveness probe (for Kubernetes)
///
/// Returns 200 OK if the process is alive.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// Readiness probe (for Kubernetes)
///
/// The service holds no local state, so readiness matches liveness.
pub async fn readiness() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check_returns_healthy() {
        let response = health_check().await;
        assert_eq!(response.status, "healthy");
    }

    #[tokio::test]
    async fn test_health_check_returns_version() {
        let response = health_check().await;
        assert!(!response.version.is_empty());
    }

    #[tokio::test]
    async fn test_probes_return_ok() {
        assert_eq!(liveness().await, StatusCode::OK);
        assert_eq!(readiness().await, StatusCode::OK);
    }
}
