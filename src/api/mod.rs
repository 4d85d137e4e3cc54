//! API routes and handlers
//!
//! This module defines all API endpoints and their routing.

use axum::{routing::get, Router};

use crate::AppState;

mod health;
mod reports;

pub use health::*;
pub use reports::{OrgReportRequest, VolunteerLetterRequest};

/// Create the full API router
pub fn routes() -> Router<AppState> {
    Router::new()
        // Health check endpoints
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        // Report generation endpoints
        .nest("/reports", reports::routes())
}
