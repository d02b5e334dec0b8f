//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::service::ProgressService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Progress service for every query and the write path.
    pub progress_service: Arc<ProgressService>,
}

impl AppState {
    /// Wraps a service for sharing across handlers.
    #[must_use]
    pub fn new(progress_service: ProgressService) -> Self {
        Self {
            progress_service: Arc::new(progress_service),
        }
    }
}
