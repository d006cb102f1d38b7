//! In-memory repository implementation for unit testing and local
//! development.
//!
//! Mirrors the filter semantics a document store would provide: compound
//! filters over class identity, date range, status, start time, and the
//! `updated_at != created_at` inequality used to detect touched records.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::api::{Class, ClassId, ClassInstance, ClassStatus, InstanceId, NewClass, NewInstance};
use crate::db::models::{ClassFilter, ClassPatch, InstanceFilter, InstancePatch, Page};
use crate::db::repository::{
    ClassRepository, FullRepository, InstanceRepository, RepositoryResult,
};

/// In-memory repository backed by `parking_lot` maps.
#[derive(Default)]
pub struct LocalRepository {
    classes: RwLock<HashMap<ClassId, Class>>,
    instances: RwLock<HashMap<InstanceId, ClassInstance>>,
}

impl LocalRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches_class(class: &Class, filter: &ClassFilter) -> bool {
    if let Some(status) = filter.status {
        if class.status != status {
            return false;
        }
    }
    if let Some(is_recurring) = filter.is_recurring {
        if class.is_recurring != is_recurring {
            return false;
        }
    }
    if let Some(availability) = filter.availability {
        if class.availability != availability {
            return false;
        }
    }
    if let Some(ref search) = filter.search {
        let needle = search.to_lowercase();
        let in_title = class.title.to_lowercase().contains(&needle);
        let in_instructor = class.instructor.to_lowercase().contains(&needle);
        if !in_title && !in_instructor {
            return false;
        }
    }
    if let Some((from, to)) = filter.date_range {
        if class.is_recurring {
            // Recurring classes match when their recurrence window overlaps
            // the range; an open-ended window always overlaps the future.
            match &class.recurrence {
                Some(recurrence) => {
                    if recurrence.start_date > to {
                        return false;
                    }
                    if let Some(end) = recurrence.end_date {
                        if end < from {
                            return false;
                        }
                    }
                }
                None => return false,
            }
        } else {
            match class.scheduled_date {
                Some(date) => {
                    if date < from || date > to {
                        return false;
                    }
                }
                None => return false,
            }
        }
    }
    true
}

fn matches_instance(instance: &ClassInstance, filter: &InstanceFilter) -> bool {
    if let Some(class_id) = filter.class_id {
        if instance.class_id != class_id {
            return false;
        }
    }
    if let Some(from) = filter.from {
        if instance.scheduled_date < from {
            return false;
        }
    }
    if let Some(to) = filter.to {
        if instance.scheduled_date > to {
            return false;
        }
    }
    if let Some(status) = filter.status {
        if instance.status != status {
            return false;
        }
    }
    if let Some(start_time) = filter.start_time {
        if instance.start_time != start_time {
            return false;
        }
    }
    if let Some(touched) = filter.touched {
        let is_touched = instance.updated_at != instance.created_at;
        if is_touched != touched {
            return false;
        }
    }
    true
}

fn apply_class_patch(class: &mut Class, patch: ClassPatch) {
    if let Some(title) = patch.title {
        class.title = title;
    }
    if let Some(description) = patch.description {
        class.description = Some(description);
    }
    if let Some(instructor) = patch.instructor {
        class.instructor = instructor;
    }
    if let Some(location) = patch.location {
        class.location = Some(location);
    }
    if let Some(capacity) = patch.capacity {
        class.capacity = capacity;
    }
    if let Some(availability) = patch.availability {
        class.availability = availability;
    }
    if let Some(status) = patch.status {
        class.status = status;
    }
    if let Some(is_recurring) = patch.is_recurring {
        class.is_recurring = is_recurring;
    }
    if let Some(scheduled_date) = patch.scheduled_date {
        class.scheduled_date = Some(scheduled_date);
    }
    if let Some(start_time) = patch.start_time {
        class.start_time = Some(start_time);
    }
    if let Some(end_time) = patch.end_time {
        class.end_time = Some(end_time);
    }
    if let Some(recurrence) = patch.recurrence {
        class.recurrence = Some(recurrence);
    }
    class.updated_at = Utc::now();
}

fn apply_instance_patch(instance: &mut ClassInstance, patch: &InstancePatch) {
    if let Some(scheduled_date) = patch.scheduled_date {
        instance.scheduled_date = scheduled_date;
    }
    if let Some(start_time) = patch.start_time {
        instance.start_time = start_time;
    }
    if let Some(end_time) = patch.end_time {
        instance.end_time = end_time;
    }
    if let Some(status) = patch.status {
        instance.status = status;
    }
    instance.updated_at = Utc::now();
}

#[async_trait]
impl ClassRepository for LocalRepository {
    async fn insert_class(&self, class: NewClass) -> RepositoryResult<Class> {
        let now = Utc::now();
        let stored = Class {
            id: ClassId::new(),
            title: class.title,
            description: class.description,
            instructor: class.instructor,
            location: class.location,
            capacity: class.capacity,
            availability: class.availability,
            status: ClassStatus::Active,
            is_recurring: class.is_recurring,
            scheduled_date: class.scheduled_date,
            start_time: class.start_time,
            end_time: class.end_time,
            recurrence: class.recurrence,
            created_at: now,
            updated_at: now,
        };
        self.classes.write().insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_class(&self, id: ClassId) -> RepositoryResult<Option<Class>> {
        Ok(self.classes.read().get(&id).cloned())
    }

    async fn list_classes(
        &self,
        filter: &ClassFilter,
        page: &Page,
    ) -> RepositoryResult<(Vec<Class>, usize)> {
        let classes = self.classes.read();
        let mut matched: Vec<Class> = classes
            .values()
            .filter(|class| matches_class(class, filter))
            .cloned()
            .collect();
        // Newest first; the id tiebreak keeps pagination stable for
        // classes created in the same batch.
        matched.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        let total = matched.len();
        let paged = matched
            .into_iter()
            .skip(page.offset())
            .take(page.limit)
            .collect();
        Ok((paged, total))
    }

    async fn update_class(
        &self,
        id: ClassId,
        patch: ClassPatch,
    ) -> RepositoryResult<Option<Class>> {
        let mut classes = self.classes.write();
        match classes.get_mut(&id) {
            Some(class) => {
                apply_class_patch(class, patch);
                Ok(Some(class.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_class(&self, id: ClassId) -> RepositoryResult<bool> {
        Ok(self.classes.write().remove(&id).is_some())
    }
}

#[async_trait]
impl InstanceRepository for LocalRepository {
    async fn insert_instances(
        &self,
        instances: Vec<NewInstance>,
    ) -> RepositoryResult<Vec<ClassInstance>> {
        let now = Utc::now();
        let mut store = self.instances.write();
        let mut stored = Vec::with_capacity(instances.len());
        for instance in instances {
            let record = ClassInstance {
                id: InstanceId::new(),
                class_id: instance.class_id,
                scheduled_date: instance.scheduled_date,
                start_time: instance.start_time,
                end_time: instance.end_time,
                status: instance.status,
                created_at: now,
                updated_at: now,
            };
            store.insert(record.id, record.clone());
            stored.push(record);
        }
        Ok(stored)
    }

    async fn find_instance(&self, id: InstanceId) -> RepositoryResult<Option<ClassInstance>> {
        Ok(self.instances.read().get(&id).cloned())
    }

    async fn find_instances(
        &self,
        filter: &InstanceFilter,
        page: Option<&Page>,
    ) -> RepositoryResult<Vec<ClassInstance>> {
        let instances = self.instances.read();
        let mut matched: Vec<ClassInstance> = instances
            .values()
            .filter(|instance| matches_instance(instance, filter))
            .cloned()
            .collect();
        matched.sort_by(|a, b| {
            (a.scheduled_date, a.start_time).cmp(&(b.scheduled_date, b.start_time))
        });

        if let Some(page) = page {
            matched = matched
                .into_iter()
                .skip(page.offset())
                .take(page.limit)
                .collect();
        }
        Ok(matched)
    }

    async fn count_instances(&self, filter: &InstanceFilter) -> RepositoryResult<usize> {
        let instances = self.instances.read();
        Ok(instances
            .values()
            .filter(|instance| matches_instance(instance, filter))
            .count())
    }

    async fn update_instance(
        &self,
        id: InstanceId,
        patch: InstancePatch,
    ) -> RepositoryResult<Option<ClassInstance>> {
        let mut instances = self.instances.write();
        match instances.get_mut(&id) {
            Some(instance) => {
                apply_instance_patch(instance, &patch);
                Ok(Some(instance.clone()))
            }
            None => Ok(None),
        }
    }

    async fn update_instances(
        &self,
        filter: &InstanceFilter,
        patch: InstancePatch,
    ) -> RepositoryResult<usize> {
        let mut instances = self.instances.write();
        let mut modified = 0;
        for instance in instances.values_mut() {
            if matches_instance(instance, filter) {
                apply_instance_patch(instance, &patch);
                modified += 1;
            }
        }
        Ok(modified)
    }

    async fn delete_instances(&self, filter: &InstanceFilter) -> RepositoryResult<usize> {
        let mut instances = self.instances.write();
        let before = instances.len();
        instances.retain(|_, instance| !matches_instance(instance, filter));
        Ok(before - instances.len())
    }
}

#[async_trait]
impl FullRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(true)
    }
}
