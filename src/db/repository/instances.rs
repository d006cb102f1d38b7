//! Instance repository trait: bulk insert, compound filters, bulk delete.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::api::{ClassInstance, InstanceId, NewInstance};
use crate::db::models::{InstanceFilter, InstancePatch, Page};

/// Repository trait for class instance records.
///
/// Implementations must keep `created_at == updated_at` on insert and bump
/// `updated_at` on every update; reconciliation relies on that inequality
/// to tell touched instances from pristine ones.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait InstanceRepository: Send + Sync {
    /// Bulk-insert unsaved occurrences and return the stored records in
    /// insertion order.
    async fn insert_instances(
        &self,
        instances: Vec<NewInstance>,
    ) -> RepositoryResult<Vec<ClassInstance>>;

    /// Fetch one instance by id. `Ok(None)` when it does not exist.
    async fn find_instance(&self, id: InstanceId) -> RepositoryResult<Option<ClassInstance>>;

    /// Fetch instances matching a filter, ordered ascending by
    /// `(scheduled_date, start_time)`, optionally windowed by a page.
    async fn find_instances(
        &self,
        filter: &InstanceFilter,
        page: Option<&Page>,
    ) -> RepositoryResult<Vec<ClassInstance>>;

    /// Count instances matching a filter.
    async fn count_instances(&self, filter: &InstanceFilter) -> RepositoryResult<usize>;

    /// Merge the patch into one instance and return the updated record.
    /// `Ok(None)` when the instance does not exist.
    async fn update_instance(
        &self,
        id: InstanceId,
        patch: InstancePatch,
    ) -> RepositoryResult<Option<ClassInstance>>;

    /// Merge the patch into every instance matching the filter.
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of records modified
    async fn update_instances(
        &self,
        filter: &InstanceFilter,
        patch: InstancePatch,
    ) -> RepositoryResult<usize>;

    /// Delete every instance matching the filter.
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of records removed
    async fn delete_instances(&self, filter: &InstanceFilter) -> RepositoryResult<usize>;
}
