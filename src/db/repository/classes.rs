//! Class repository trait: identity-keyed CRUD with field-merge updates.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::api::{Class, ClassId, NewClass};
use crate::db::models::{ClassFilter, ClassPatch, Page};

/// Repository trait for class entities.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait ClassRepository: Send + Sync {
    /// Persist a new class and return the stored record.
    async fn insert_class(&self, class: NewClass) -> RepositoryResult<Class>;

    /// Fetch a class by id. `Ok(None)` when it does not exist.
    async fn find_class(&self, id: ClassId) -> RepositoryResult<Option<Class>>;

    /// List classes matching a filter, newest first, with pagination.
    ///
    /// # Returns
    /// * `Ok((classes, total))` - The requested page and the total match count
    async fn list_classes(
        &self,
        filter: &ClassFilter,
        page: &Page,
    ) -> RepositoryResult<(Vec<Class>, usize)>;

    /// Merge the patch into the stored class and return the updated record.
    /// `Ok(None)` when the class does not exist.
    async fn update_class(
        &self,
        id: ClassId,
        patch: ClassPatch,
    ) -> RepositoryResult<Option<Class>>;

    /// Delete a class. Returns whether a record was removed. Instance
    /// cascade deletion is the lifecycle service's responsibility.
    async fn delete_class(&self, id: ClassId) -> RepositoryResult<bool>;
}
