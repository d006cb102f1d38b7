//! Application state for the HTTP server.

use std::sync::Arc;

use crate::db::repository::FullRepository;
use crate::services::ClassService;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance, used directly for health checks
    pub repository: Arc<dyn FullRepository>,
    /// Lifecycle service every domain handler delegates to
    pub service: Arc<ClassService>,
}

impl AppState {
    /// Create a new application state around the given repository.
    pub fn new(repository: Arc<dyn FullRepository>) -> Self {
        let service = Arc::new(ClassService::new(repository.clone()));
        Self {
            repository,
            service,
        }
    }
}
