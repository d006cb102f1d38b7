//! Factory for creating repository instances.

use std::sync::Arc;

use super::repository::FullRepository;

/// Supported repository backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryType {
    /// In-memory backend (feature `local-repo`).
    Local,
}

/// Factory for constructing repository instances behind the
/// [`FullRepository`] trait object the rest of the crate works with.
pub struct RepositoryFactory;

impl RepositoryFactory {
    /// Create an in-memory repository.
    #[cfg(feature = "local-repo")]
    pub fn create_local() -> Arc<dyn FullRepository> {
        Arc::new(super::repositories::LocalRepository::new())
    }
}
