//! Repository traits for the class scheduling store.
//!
//! The engine receives store access through these traits (dependency
//! injection) rather than ambient global state, so the expander and the
//! reconciler can be unit-tested against an in-memory fake.

pub mod classes;
pub mod error;
pub mod instances;

use async_trait::async_trait;

pub use classes::ClassRepository;
pub use error::{ErrorContext, RepositoryError, RepositoryResult};
pub use instances::InstanceRepository;

/// Combined repository trait covering classes and their instances.
#[async_trait]
pub trait FullRepository: ClassRepository + InstanceRepository {
    /// Check that the store is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;
}
