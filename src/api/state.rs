//! Application state for the API server

use crate::{Config, MediaService};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// Cloned for each request (cheap Arc clone). Holds no per-request data.
#[derive(Clone)]
pub struct AppState {
    /// The media pipeline
    pub service: Arc<MediaService>,

    /// Configuration (read-only)
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(service: Arc<MediaService>, config: Arc<Config>) -> Self {
        Self { service, config }
    }
}
