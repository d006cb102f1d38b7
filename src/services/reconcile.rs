//! Reconciliation: regenerate a class's future instances from its
//! recurrence rule without destroying manually-modified or status-changed
//! ones.
//!
//! The sequence (classify, delete, recompute, insert) is not atomic; the
//! lifecycle service serializes reconciliations per class so at most one is
//! in flight for a given class at a time. Store errors propagate unchanged.

use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::debug;

use crate::api::{ClassId, ClassInstance, InstanceStatus, RecurrenceConfig, TimeOfDay};
use crate::db::models::InstanceFilter;
use crate::db::repository::{FullRepository, RepositoryResult};
use crate::services::expander::{self, DEFAULT_HARD_CAP};

/// Regenerate the future instances of a class from its recurrence config.
///
/// Stored instances dated on or after `today` are classified as *protected*
/// (status no longer `scheduled`, or edited since creation) or *regenerable*
/// (pristine projections). Regenerable ones are deleted, the rule is
/// re-expanded from its original start date, candidates before `today` or
/// colliding with a protected `(scheduled_date, start_time)` are dropped,
/// and the survivors are bulk-inserted.
///
/// Afterwards every future date/time the rule calls for is covered by
/// exactly one instance: the original protected one, or a fresh one.
///
/// # Returns
/// The newly inserted instances, ascending by `(scheduled_date, start_time)`.
pub async fn reconcile(
    repo: &dyn FullRepository,
    class_id: ClassId,
    recurrence: &RecurrenceConfig,
    today: NaiveDate,
) -> RepositoryResult<Vec<ClassInstance>> {
    // Step 1: classify stored future instances.
    let future = InstanceFilter::for_class(class_id).from_date(today);
    let stored = repo.find_instances(&future, None).await?;
    let protected: HashSet<(NaiveDate, TimeOfDay)> = stored
        .iter()
        .filter(|instance| instance.is_exception())
        .map(|instance| (instance.scheduled_date, instance.start_time))
        .collect();

    // Step 2: pristine future projections are disposable.
    let regenerable = future
        .clone()
        .with_status(InstanceStatus::Scheduled)
        .touched(false);
    let deleted = repo.delete_instances(&regenerable).await?;

    // Step 3: re-derive the full sequence from the original start date so
    // the result follows the rule itself, not an incrementally drifted copy.
    // Step 4: protected instances win their (date, start time) pair.
    let candidates: Vec<_> = expander::expand(recurrence, class_id, DEFAULT_HARD_CAP)
        .into_iter()
        .filter(|candidate| candidate.scheduled_date >= today)
        .filter(|candidate| !protected.contains(&(candidate.scheduled_date, candidate.start_time)))
        .collect();

    debug!(
        %class_id,
        deleted,
        protected = protected.len(),
        candidates = candidates.len(),
        "reconciled recurring class"
    );

    // Step 5: persist the survivors.
    if candidates.is_empty() {
        return Ok(Vec::new());
    }
    repo.insert_instances(candidates).await
}
