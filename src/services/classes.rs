//! Class lifecycle service.
//!
//! Thin orchestration over the repository traits: create/update/delete
//! classes, materialize their recurrence rules into instances, and keep the
//! stored instances consistent with the rule after edits. Reconciliation for
//! a given class is serialized through a per-class async lock so concurrent
//! edits never interleave a delete/insert cycle.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use serde::Serialize;
use tokio::sync::Mutex as AsyncMutex;
use tracing::info;

use crate::api::{
    Class, ClassId, ClassInstance, ClassStatus, InstanceId, InstanceStatus, NewClass, TimeOfDay,
};
use crate::db::models::{ClassFilter, ClassPatch, InstanceFilter, InstancePatch, Page};
use crate::db::repository::{ErrorContext, FullRepository, RepositoryError, RepositoryResult};
use crate::services::expander::{self, DEFAULT_HARD_CAP};
use crate::services::reconcile;

/// A created class together with the instances materialized for it.
#[derive(Debug, Clone)]
pub struct CreatedClass {
    pub class: Class,
    pub instances: Vec<ClassInstance>,
}

/// An updated class together with any instances regenerated as a result.
#[derive(Debug, Clone)]
pub struct UpdatedClass {
    pub class: Class,
    pub regenerated: Vec<ClassInstance>,
}

/// Unified status vocabulary for calendar events. One-time classes carry
/// their class status, recurring occurrences their instance status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarEventStatus {
    Active,
    Scheduled,
    Cancelled,
    Completed,
}

impl From<ClassStatus> for CalendarEventStatus {
    fn from(status: ClassStatus) -> Self {
        match status {
            ClassStatus::Active => Self::Active,
            ClassStatus::Cancelled => Self::Cancelled,
            ClassStatus::Completed => Self::Completed,
        }
    }
}

impl From<InstanceStatus> for CalendarEventStatus {
    fn from(status: InstanceStatus) -> Self {
        match status {
            InstanceStatus::Scheduled => Self::Scheduled,
            InstanceStatus::Cancelled => Self::Cancelled,
            InstanceStatus::Completed => Self::Completed,
        }
    }
}

/// One entry in the merged calendar view: either a one-time class or a
/// single occurrence of a recurring class, enriched with class details.
#[derive(Debug, Clone, Serialize)]
pub struct CalendarEvent {
    pub class_id: ClassId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<InstanceId>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub instructor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub capacity: u32,
    pub scheduled_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<TimeOfDay>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<TimeOfDay>,
    pub status: CalendarEventStatus,
    pub is_recurring: bool,
}

/// Lifecycle operations for classes and their instances.
pub struct ClassService {
    repository: Arc<dyn FullRepository>,
    class_locks: parking_lot::Mutex<HashMap<ClassId, Arc<AsyncMutex<()>>>>,
}

impl ClassService {
    pub fn new(repository: Arc<dyn FullRepository>) -> Self {
        Self {
            repository,
            class_locks: parking_lot::Mutex::new(HashMap::new()),
        }
    }

    /// Lock handle serializing instance regeneration for one class. The
    /// registry guard is released before the async lock is awaited.
    fn class_lock(&self, id: ClassId) -> Arc<AsyncMutex<()>> {
        self.class_locks.lock().entry(id).or_default().clone()
    }

    fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    // ===== Class lifecycle =====

    /// Create a class. Recurring classes with a recurrence config get their
    /// instances materialized immediately.
    pub async fn create_class(&self, new_class: NewClass) -> RepositoryResult<CreatedClass> {
        let class = self.repository.insert_class(new_class).await?;

        let mut instances = Vec::new();
        if class.is_recurring {
            if let Some(recurrence) = &class.recurrence {
                let projected = expander::expand(recurrence, class.id, DEFAULT_HARD_CAP);
                if !projected.is_empty() {
                    instances = self.repository.insert_instances(projected).await?;
                }
            }
        }

        info!(class_id = %class.id, instances = instances.len(), "created class");
        Ok(CreatedClass { class, instances })
    }

    pub async fn list_classes(
        &self,
        filter: &ClassFilter,
        page: &Page,
    ) -> RepositoryResult<(Vec<Class>, usize)> {
        self.repository.list_classes(filter, page).await
    }

    pub async fn get_class(&self, id: ClassId) -> RepositoryResult<Class> {
        self.repository
            .find_class(id)
            .await?
            .ok_or_else(|| class_not_found(id))
    }

    /// Apply a patch to a class. When the patch touches scheduling fields of
    /// an active recurring class, future instances are reconciled against
    /// the updated rule; manually edited or status-changed instances are
    /// preserved.
    pub async fn update_class(
        &self,
        id: ClassId,
        patch: ClassPatch,
    ) -> RepositoryResult<UpdatedClass> {
        let lock = self.class_lock(id);
        let _guard = lock.lock().await;

        // A one-sided time patch must stay consistent with the stored
        // counterpart; the DTO layer can only check pairs it was given.
        if patch.start_time.is_some() || patch.end_time.is_some() {
            let stored = self
                .repository
                .find_class(id)
                .await?
                .ok_or_else(|| class_not_found(id))?;
            let start = patch.start_time.or(stored.start_time);
            let end = patch.end_time.or(stored.end_time);
            if let (Some(start), Some(end)) = (start, end) {
                check_time_window(start, end)?;
            }
        }

        let touches_recurrence = patch.touches_recurrence();
        let class = self
            .repository
            .update_class(id, patch)
            .await?
            .ok_or_else(|| class_not_found(id))?;

        let mut regenerated = Vec::new();
        if touches_recurrence && class.is_recurring && class.status == ClassStatus::Active {
            if let Some(recurrence) = &class.recurrence {
                regenerated =
                    reconcile::reconcile(self.repository.as_ref(), id, recurrence, Self::today())
                        .await?;
            }
        }

        info!(class_id = %id, regenerated = regenerated.len(), "updated class");
        Ok(UpdatedClass { class, regenerated })
    }

    /// Transition a class's status. Cancelling or completing a class
    /// cascades to its untouched future scheduled instances; instances
    /// already cancelled, completed, or manually edited keep their state.
    pub async fn update_class_status(
        &self,
        id: ClassId,
        status: ClassStatus,
    ) -> RepositoryResult<Class> {
        let lock = self.class_lock(id);
        let _guard = lock.lock().await;

        let patch = ClassPatch {
            status: Some(status),
            ..ClassPatch::default()
        };
        let class = self
            .repository
            .update_class(id, patch)
            .await?
            .ok_or_else(|| class_not_found(id))?;

        let cascade = match status {
            ClassStatus::Cancelled => Some(InstanceStatus::Cancelled),
            ClassStatus::Completed => Some(InstanceStatus::Completed),
            ClassStatus::Active => None,
        };
        if let Some(instance_status) = cascade {
            let filter = InstanceFilter::for_class(id)
                .from_date(Self::today())
                .with_status(InstanceStatus::Scheduled)
                .touched(false);
            let cascaded = self
                .repository
                .update_instances(&filter, InstancePatch::status(instance_status))
                .await?;
            info!(class_id = %id, ?status, cascaded, "cascaded class status to instances");
        }

        Ok(class)
    }

    /// Delete a class and every instance that belongs to it. Takes the
    /// class's lock so an in-flight regeneration cannot insert instances
    /// after the cascade delete.
    pub async fn delete_class(&self, id: ClassId) -> RepositoryResult<()> {
        let lock = self.class_lock(id);
        let _guard = lock.lock().await;

        let deleted = self.repository.delete_class(id).await?;
        if !deleted {
            return Err(class_not_found(id));
        }
        let removed = self
            .repository
            .delete_instances(&InstanceFilter::for_class(id))
            .await?;
        self.class_locks.lock().remove(&id);
        info!(class_id = %id, removed, "deleted class");
        Ok(())
    }

    /// Rebuild the future instances of a recurring class from its current
    /// recurrence config. Non-recurring classes regenerate nothing.
    pub async fn regenerate_instances(
        &self,
        id: ClassId,
    ) -> RepositoryResult<Vec<ClassInstance>> {
        let lock = self.class_lock(id);
        let _guard = lock.lock().await;

        let class = self.get_class(id).await?;
        let Some(recurrence) = &class.recurrence else {
            return Ok(Vec::new());
        };
        if !class.is_recurring {
            return Ok(Vec::new());
        }
        reconcile::reconcile(self.repository.as_ref(), id, recurrence, Self::today()).await
    }

    // ===== Instance operations =====

    pub async fn list_instances(
        &self,
        filter: &InstanceFilter,
    ) -> RepositoryResult<Vec<ClassInstance>> {
        self.repository.find_instances(filter, None).await
    }

    pub async fn instances_for_class(
        &self,
        class_id: ClassId,
        page: &Page,
    ) -> RepositoryResult<(Vec<ClassInstance>, usize)> {
        let filter = InstanceFilter::for_class(class_id);
        let instances = self.repository.find_instances(&filter, Some(page)).await?;
        let total = self.repository.count_instances(&filter).await?;
        Ok((instances, total))
    }

    /// Patch a single instance. The store bumps `updated_at`, marking the
    /// instance as an exception that future reconciliations preserve.
    pub async fn update_instance(
        &self,
        id: InstanceId,
        patch: InstancePatch,
    ) -> RepositoryResult<ClassInstance> {
        if patch.start_time.is_some() || patch.end_time.is_some() {
            let stored = self
                .repository
                .find_instance(id)
                .await?
                .ok_or_else(|| instance_not_found(id))?;
            let start = patch.start_time.unwrap_or(stored.start_time);
            let end = patch.end_time.unwrap_or(stored.end_time);
            check_time_window(start, end)?;
        }
        self.repository
            .update_instance(id, patch)
            .await?
            .ok_or_else(|| instance_not_found(id))
    }

    pub async fn update_instance_status(
        &self,
        id: InstanceId,
        status: InstanceStatus,
    ) -> RepositoryResult<ClassInstance> {
        self.update_instance(id, InstancePatch::status(status)).await
    }

    /// Patch the instance of a class identified by its date (and optionally
    /// start time) instead of its id.
    pub async fn update_instance_by_details(
        &self,
        class_id: ClassId,
        scheduled_date: NaiveDate,
        start_time: Option<TimeOfDay>,
        patch: InstancePatch,
    ) -> RepositoryResult<ClassInstance> {
        let mut filter = InstanceFilter::for_class(class_id)
            .from_date(scheduled_date)
            .to_date(scheduled_date);
        if let Some(start_time) = start_time {
            filter = filter.with_start_time(start_time);
        }
        let found = self.repository.find_instances(&filter, None).await?;
        let Some(instance) = found.into_iter().next() else {
            return Err(RepositoryError::not_found_with_context(
                "no instance matches the given details",
                ErrorContext::new("update_instance_by_details")
                    .with_entity("class_instance")
                    .with_entity_id(format!("{class_id}@{scheduled_date}")),
            ));
        };
        self.update_instance(instance.id, patch).await
    }

    /// Apply a patch to every instance of a class. Returns the number of
    /// instances modified. Rejected as a whole if the patched times would
    /// invert any instance's window.
    pub async fn update_all_instances(
        &self,
        class_id: ClassId,
        patch: InstancePatch,
    ) -> RepositoryResult<usize> {
        let filter = InstanceFilter::for_class(class_id);
        if patch.start_time.is_some() || patch.end_time.is_some() {
            for instance in self.repository.find_instances(&filter, None).await? {
                let start = patch.start_time.unwrap_or(instance.start_time);
                let end = patch.end_time.unwrap_or(instance.end_time);
                check_time_window(start, end)?;
            }
        }
        self.repository.update_instances(&filter, patch).await
    }

    // ===== Calendar view =====

    /// Merge one-time classes and recurring-class instances within a date
    /// range into a single chronological event list. Instances whose class
    /// no longer exists are skipped.
    pub async fn calendar_view(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepositoryResult<Vec<CalendarEvent>> {
        let one_time_filter = ClassFilter {
            is_recurring: Some(false),
            date_range: Some((from, to)),
            ..ClassFilter::default()
        };
        let (one_time, _) = self
            .repository
            .list_classes(&one_time_filter, &Page::new(1, usize::MAX))
            .await?;

        let instance_filter = InstanceFilter::default().from_date(from).to_date(to);
        let instances = self.repository.find_instances(&instance_filter, None).await?;

        let mut events: Vec<CalendarEvent> = Vec::with_capacity(one_time.len() + instances.len());
        for class in one_time {
            let Some(scheduled_date) = class.scheduled_date else {
                continue;
            };
            events.push(CalendarEvent {
                class_id: class.id,
                instance_id: None,
                title: class.title,
                description: class.description,
                instructor: class.instructor,
                location: class.location,
                capacity: class.capacity,
                scheduled_date,
                start_time: class.start_time,
                end_time: class.end_time,
                status: class.status.into(),
                is_recurring: false,
            });
        }

        let mut class_cache: HashMap<ClassId, Option<Class>> = HashMap::new();
        for instance in instances {
            let class = match class_cache.get(&instance.class_id) {
                Some(cached) => cached.clone(),
                None => {
                    let fetched = self.repository.find_class(instance.class_id).await?;
                    class_cache.insert(instance.class_id, fetched.clone());
                    fetched
                }
            };
            let Some(class) = class else {
                continue;
            };
            events.push(CalendarEvent {
                class_id: class.id,
                instance_id: Some(instance.id),
                title: class.title,
                description: class.description,
                instructor: class.instructor,
                location: class.location,
                capacity: class.capacity,
                scheduled_date: instance.scheduled_date,
                start_time: Some(instance.start_time),
                end_time: Some(instance.end_time),
                status: instance.status.into(),
                is_recurring: true,
            });
        }

        events.sort_by(|a, b| {
            (a.scheduled_date, a.start_time).cmp(&(b.scheduled_date, b.start_time))
        });
        Ok(events)
    }
}

fn check_time_window(start: TimeOfDay, end: TimeOfDay) -> RepositoryResult<()> {
    if start >= end {
        return Err(RepositoryError::validation(format!(
            "start time {start} must be before end time {end}"
        )));
    }
    Ok(())
}

fn class_not_found(id: ClassId) -> RepositoryError {
    RepositoryError::not_found_with_context(
        "class does not exist",
        ErrorContext::new("find_class")
            .with_entity("class")
            .with_entity_id(id),
    )
}

fn instance_not_found(id: InstanceId) -> RepositoryError {
    RepositoryError::not_found_with_context(
        "instance does not exist",
        ErrorContext::new("update_instance")
            .with_entity("class_instance")
            .with_entity_id(id),
    )
}
