//! Peak Impact Reports Library
//!
//! This crate provides the core functionality for the Peak Impact
//! attendance reporting service.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod models;
pub mod services;
pub mod utils;

pub use config::AppConfig;
pub use services::store::VolunteerStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Document store the reports are built from
    pub store: Arc<dyn VolunteerStore>,
}
