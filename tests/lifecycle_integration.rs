//! End-to-end lifecycle tests: class creation, recurrence materialization,
//! reconciliation on update, status cascades, and the calendar view, all
//! against the in-memory repository.

use std::sync::Arc;

use chrono::{Days, Local, NaiveDate};

use calander_rust::api::{
    ClassStatus, InstanceStatus, NewClass, RecurrenceConfig, RecurrencePattern, TimeOfDay,
    TimeSlot,
};
use calander_rust::db::models::{ClassFilter, ClassPatch, InstanceFilter, InstancePatch, Page};
use calander_rust::db::repositories::LocalRepository;
use calander_rust::db::repository::{FullRepository, InstanceRepository, RepositoryError};
use calander_rust::services::ClassService;

fn service() -> ClassService {
    let repo = Arc::new(LocalRepository::new()) as Arc<dyn FullRepository>;
    ClassService::new(repo)
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn time(h: u32, m: u32) -> TimeOfDay {
    TimeOfDay::new(h, m).unwrap()
}

fn slot(start: TimeOfDay, end: TimeOfDay) -> TimeSlot {
    TimeSlot::new(start, end)
}

fn daily_config(start: NaiveDate, occurrences: u32, slots: Vec<TimeSlot>) -> RecurrenceConfig {
    RecurrenceConfig {
        start_date: start,
        end_date: None,
        occurrences: Some(occurrences),
        pattern: RecurrencePattern::Daily { time_slots: slots },
    }
}

fn recurring_class(title: &str, config: RecurrenceConfig) -> NewClass {
    NewClass {
        title: title.to_string(),
        description: None,
        instructor: "Ada".to_string(),
        location: Some("Studio 2".to_string()),
        capacity: 20,
        availability: true,
        is_recurring: true,
        scheduled_date: None,
        start_time: None,
        end_time: None,
        recurrence: Some(config),
    }
}

fn one_time_class(title: &str, date: NaiveDate) -> NewClass {
    NewClass {
        title: title.to_string(),
        description: None,
        instructor: "Grace".to_string(),
        location: None,
        capacity: 10,
        availability: true,
        is_recurring: false,
        scheduled_date: Some(date),
        start_time: Some(time(18, 0)),
        end_time: Some(time(19, 0)),
        recurrence: None,
    }
}

#[tokio::test]
async fn test_create_recurring_class_materializes_instances() {
    let service = service();
    let config = daily_config(today(), 4, vec![slot(time(9, 0), time(10, 0))]);
    let created = service
        .create_class(recurring_class("Yoga", config))
        .await
        .unwrap();

    assert_eq!(created.class.status, ClassStatus::Active);
    assert_eq!(created.instances.len(), 4);
    assert_eq!(created.instances[0].scheduled_date, today());
    assert!(created
        .instances
        .iter()
        .all(|i| i.status == InstanceStatus::Scheduled));
}

#[tokio::test]
async fn test_create_one_time_class_has_no_instances() {
    let service = service();
    let created = service
        .create_class(one_time_class("Workshop", today()))
        .await
        .unwrap();
    assert!(created.instances.is_empty());

    let (instances, total) = service
        .instances_for_class(created.class.id, &Page::new(1, 10))
        .await
        .unwrap();
    assert!(instances.is_empty());
    assert_eq!(total, 0);
}

#[tokio::test]
async fn test_update_recurrence_regenerates_but_preserves_cancelled() {
    let service = service();
    let config = daily_config(today(), 4, vec![slot(time(9, 0), time(10, 0))]);
    let created = service
        .create_class(recurring_class("Pilates", config))
        .await
        .unwrap();
    let class_id = created.class.id;

    // Cancel one occurrence by hand before the rule changes.
    let cancelled = &created.instances[1];
    service
        .update_instance_status(cancelled.id, InstanceStatus::Cancelled)
        .await
        .unwrap();

    let patch = ClassPatch {
        recurrence: Some(daily_config(today(), 4, vec![slot(time(11, 0), time(12, 0))])),
        ..ClassPatch::default()
    };
    let updated = service.update_class(class_id, patch).await.unwrap();
    // The cancelled occurrence keeps its slot; the other three follow the
    // new rule.
    assert_eq!(updated.regenerated.len(), 4);
    assert!(updated
        .regenerated
        .iter()
        .all(|i| i.start_time == time(11, 0)));

    let (all, _) = service
        .instances_for_class(class_id, &Page::new(1, 50))
        .await
        .unwrap();
    assert_eq!(all.len(), 5);
    assert!(all
        .iter()
        .any(|i| i.id == cancelled.id && i.status == InstanceStatus::Cancelled));
}

#[tokio::test]
async fn test_update_without_scheduling_fields_keeps_instances() {
    let service = service();
    let config = daily_config(today(), 3, vec![slot(time(9, 0), time(10, 0))]);
    let created = service
        .create_class(recurring_class("Spin", config))
        .await
        .unwrap();

    let patch = ClassPatch {
        title: Some("Spin (evening)".to_string()),
        ..ClassPatch::default()
    };
    let updated = service.update_class(created.class.id, patch).await.unwrap();
    assert_eq!(updated.class.title, "Spin (evening)");
    assert!(updated.regenerated.is_empty());

    let (all, _) = service
        .instances_for_class(created.class.id, &Page::new(1, 50))
        .await
        .unwrap();
    let original_ids: Vec<_> = created.instances.iter().map(|i| i.id).collect();
    assert!(all.iter().all(|i| original_ids.contains(&i.id)));
}

#[tokio::test]
async fn test_cancel_class_cascades_to_untouched_instances() {
    let service = service();
    let config = daily_config(today(), 3, vec![slot(time(9, 0), time(10, 0))]);
    let created = service
        .create_class(recurring_class("Boxing", config))
        .await
        .unwrap();
    let class_id = created.class.id;

    // One occurrence was already completed by hand.
    let completed = &created.instances[0];
    service
        .update_instance_status(completed.id, InstanceStatus::Completed)
        .await
        .unwrap();

    let class = service
        .update_class_status(class_id, ClassStatus::Cancelled)
        .await
        .unwrap();
    assert_eq!(class.status, ClassStatus::Cancelled);

    let (all, _) = service
        .instances_for_class(class_id, &Page::new(1, 50))
        .await
        .unwrap();
    for instance in &all {
        if instance.id == completed.id {
            assert_eq!(instance.status, InstanceStatus::Completed);
        } else {
            assert_eq!(instance.status, InstanceStatus::Cancelled);
        }
    }
}

#[tokio::test]
async fn test_delete_class_removes_instances() {
    let service = service();
    let config = daily_config(today(), 3, vec![slot(time(9, 0), time(10, 0))]);
    let created = service
        .create_class(recurring_class("Dance", config))
        .await
        .unwrap();

    service.delete_class(created.class.id).await.unwrap();

    assert!(service.get_class(created.class.id).await.is_err());
    let instances = service
        .list_instances(&InstanceFilter::for_class(created.class.id))
        .await
        .unwrap();
    assert!(instances.is_empty());
}

#[tokio::test]
async fn test_delete_racing_regenerate_leaves_no_orphans() {
    let repo = Arc::new(LocalRepository::new());
    let service = ClassService::new(repo.clone() as Arc<dyn FullRepository>);
    let config = daily_config(today(), 5, vec![slot(time(9, 0), time(10, 0))]);
    let created = service
        .create_class(recurring_class("Fencing", config))
        .await
        .unwrap();
    let class_id = created.class.id;

    // Both take the class lock, so whichever runs second sees the other's
    // completed effect: either the regenerated instances are deleted with
    // the class, or regeneration finds the class gone and inserts nothing.
    let (delete_result, _regenerate_result) = tokio::join!(
        service.delete_class(class_id),
        service.regenerate_instances(class_id)
    );
    assert!(delete_result.is_ok());

    let remaining = repo
        .count_instances(&InstanceFilter::for_class(class_id))
        .await
        .unwrap();
    assert_eq!(remaining, 0);
}

#[tokio::test]
async fn test_one_sided_instance_time_patch_checked_against_stored() {
    let service = service();
    let config = daily_config(today(), 2, vec![slot(time(9, 0), time(10, 0))]);
    let created = service
        .create_class(recurring_class("Judo", config))
        .await
        .unwrap();
    let instance = &created.instances[0];

    // Start moved past the stored 10:00 end.
    let inverted = InstancePatch {
        start_time: Some(time(10, 30)),
        ..InstancePatch::default()
    };
    let err = service
        .update_instance(instance.id, inverted)
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::ValidationError { .. }));

    // End moved before the stored 09:00 start.
    let inverted = InstancePatch {
        end_time: Some(time(8, 30)),
        ..InstancePatch::default()
    };
    assert!(service.update_instance(instance.id, inverted).await.is_err());

    // An earlier start keeps the window valid.
    let earlier = InstancePatch {
        start_time: Some(time(8, 0)),
        ..InstancePatch::default()
    };
    let updated = service.update_instance(instance.id, earlier).await.unwrap();
    assert_eq!(updated.start_time, time(8, 0));
    assert_eq!(updated.end_time, time(10, 0));
}

#[tokio::test]
async fn test_one_sided_class_time_patch_checked_against_stored() {
    let service = service();
    let created = service
        .create_class(one_time_class("Recital", today()))
        .await
        .unwrap();

    // End moved before the stored 18:00 start.
    let inverted = ClassPatch {
        end_time: Some(time(17, 0)),
        ..ClassPatch::default()
    };
    let err = service
        .update_class(created.class.id, inverted)
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::ValidationError { .. }));

    let earlier = ClassPatch {
        start_time: Some(time(17, 30)),
        ..ClassPatch::default()
    };
    let updated = service.update_class(created.class.id, earlier).await.unwrap();
    assert_eq!(updated.class.start_time, Some(time(17, 30)));
}

#[tokio::test]
async fn test_bulk_time_patch_rejected_when_any_window_inverts() {
    let service = service();
    // Two slots per day: 09:00-10:00 and 10:30-11:30.
    let config = daily_config(
        today(),
        4,
        vec![slot(time(9, 0), time(10, 0)), slot(time(10, 30), time(11, 30))],
    );
    let created = service
        .create_class(recurring_class("Chess", config))
        .await
        .unwrap();

    // 10:15 is valid against the 10:30 slots but inverts the 10:00 ones,
    // so the whole bulk update is rejected.
    let patch = InstancePatch {
        start_time: Some(time(10, 15)),
        ..InstancePatch::default()
    };
    assert!(service
        .update_all_instances(created.class.id, patch)
        .await
        .is_err());

    let modified = service
        .update_all_instances(
            created.class.id,
            InstancePatch {
                start_time: Some(time(8, 0)),
                ..InstancePatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(modified, 4);
}

#[tokio::test]
async fn test_regenerate_non_recurring_is_a_no_op() {
    let service = service();
    let created = service
        .create_class(one_time_class("Seminar", today()))
        .await
        .unwrap();
    let regenerated = service
        .regenerate_instances(created.class.id)
        .await
        .unwrap();
    assert!(regenerated.is_empty());
}

#[tokio::test]
async fn test_update_instance_by_details() {
    let service = service();
    let config = daily_config(today(), 3, vec![slot(time(9, 0), time(10, 0))]);
    let created = service
        .create_class(recurring_class("Swim", config))
        .await
        .unwrap();
    let target_date = today().checked_add_days(Days::new(1)).unwrap();

    let patch = InstancePatch::status(InstanceStatus::Completed);
    let instance = service
        .update_instance_by_details(created.class.id, target_date, Some(time(9, 0)), patch)
        .await
        .unwrap();
    assert_eq!(instance.scheduled_date, target_date);
    assert_eq!(instance.status, InstanceStatus::Completed);

    // No instance matches a start time the rule never generates.
    let missing = service
        .update_instance_by_details(
            created.class.id,
            target_date,
            Some(time(13, 0)),
            InstancePatch::status(InstanceStatus::Cancelled),
        )
        .await;
    assert!(missing.is_err());
}

#[tokio::test]
async fn test_update_all_instances() {
    let service = service();
    let config = daily_config(today(), 3, vec![slot(time(9, 0), time(10, 0))]);
    let created = service
        .create_class(recurring_class("Rowing", config))
        .await
        .unwrap();

    let modified = service
        .update_all_instances(created.class.id, InstancePatch::status(InstanceStatus::Cancelled))
        .await
        .unwrap();
    assert_eq!(modified, 3);
}

#[tokio::test]
async fn test_instances_for_class_pagination() {
    let service = service();
    let config = daily_config(today(), 10, vec![slot(time(9, 0), time(10, 0))]);
    let created = service
        .create_class(recurring_class("Karate", config))
        .await
        .unwrap();

    let (first, total) = service
        .instances_for_class(created.class.id, &Page::new(1, 4))
        .await
        .unwrap();
    assert_eq!(first.len(), 4);
    assert_eq!(total, 10);

    let (last, _) = service
        .instances_for_class(created.class.id, &Page::new(3, 4))
        .await
        .unwrap();
    assert_eq!(last.len(), 2);
    // Pages are chronological.
    assert!(first[0].scheduled_date < last[0].scheduled_date);
}

#[tokio::test]
async fn test_list_classes_with_filters() {
    let service = service();
    let config = daily_config(today(), 2, vec![slot(time(9, 0), time(10, 0))]);
    service
        .create_class(recurring_class("Morning Yoga", config))
        .await
        .unwrap();
    service
        .create_class(one_time_class("Guest Lecture", today()))
        .await
        .unwrap();

    let filter = ClassFilter {
        is_recurring: Some(true),
        ..ClassFilter::default()
    };
    let (recurring, total) = service.list_classes(&filter, &Page::new(1, 10)).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(recurring[0].title, "Morning Yoga");

    let filter = ClassFilter {
        search: Some("lecture".to_string()),
        ..ClassFilter::default()
    };
    let (found, total) = service.list_classes(&filter, &Page::new(1, 10)).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(found[0].title, "Guest Lecture");
}

#[tokio::test]
async fn test_calendar_view_merges_and_orders() {
    let service = service();
    let start = today();
    let config = daily_config(start, 3, vec![slot(time(9, 0), time(10, 0))]);
    let recurring = service
        .create_class(recurring_class("Tai Chi", config))
        .await
        .unwrap();
    let one_time = service
        .create_class(one_time_class("Open Day", start.checked_add_days(Days::new(1)).unwrap()))
        .await
        .unwrap();

    let to = start.checked_add_days(Days::new(7)).unwrap();
    let events = service.calendar_view(start, to).await.unwrap();
    assert_eq!(events.len(), 4);

    // Chronological by date, then start time.
    for pair in events.windows(2) {
        assert!(
            (pair[0].scheduled_date, pair[0].start_time)
                <= (pair[1].scheduled_date, pair[1].start_time)
        );
    }
    assert!(events
        .iter()
        .any(|e| e.class_id == one_time.class.id && !e.is_recurring));
    assert_eq!(
        events
            .iter()
            .filter(|e| e.class_id == recurring.class.id)
            .count(),
        3
    );

    // Deleting a class removes its occurrences from the view.
    service.delete_class(recurring.class.id).await.unwrap();
    let events = service.calendar_view(start, to).await.unwrap();
    assert_eq!(events.len(), 1);
}
