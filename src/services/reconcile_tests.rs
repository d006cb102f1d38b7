//! Reconciliation tests against the in-memory repository.

use chrono::NaiveDate;

use crate::api::{
    ClassId, DayOfWeek, DayWiseTimeSlots, InstanceStatus, RecurrenceConfig, RecurrencePattern,
    TimeOfDay, TimeSlot,
};
use crate::db::models::{InstanceFilter, InstancePatch};
use crate::db::repository::InstanceRepository;
use crate::db::repositories::LocalRepository;
use crate::services::{expander, reconcile};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn time(h: u32, m: u32) -> TimeOfDay {
    TimeOfDay::new(h, m).unwrap()
}

fn slot(start: TimeOfDay, end: TimeOfDay) -> TimeSlot {
    TimeSlot {
        start_time: start,
        end_time: end,
    }
}

fn daily(start: NaiveDate, occurrences: u32, slots: Vec<TimeSlot>) -> RecurrenceConfig {
    RecurrenceConfig {
        start_date: start,
        end_date: None,
        occurrences: Some(occurrences),
        pattern: RecurrencePattern::Daily { time_slots: slots },
    }
}

async fn seed(repo: &LocalRepository, class_id: ClassId, config: &RecurrenceConfig) {
    let projected = expander::expand(config, class_id, expander::DEFAULT_HARD_CAP);
    repo.insert_instances(projected).await.unwrap();
}

#[tokio::test]
async fn test_reconcile_replaces_pristine_future_instances() {
    let repo = LocalRepository::new();
    let class_id = ClassId::new();
    let today = date(2026, 2, 1);

    let original = daily(today, 5, vec![slot(time(9, 0), time(10, 0))]);
    seed(&repo, class_id, &original).await;

    // The rule moved to a later slot; every pristine projection follows it.
    let updated = daily(today, 5, vec![slot(time(10, 0), time(11, 0))]);
    let inserted = reconcile(&repo, class_id, &updated, today).await.unwrap();
    assert_eq!(inserted.len(), 5);

    let all = repo
        .find_instances(&InstanceFilter::for_class(class_id), None)
        .await
        .unwrap();
    assert_eq!(all.len(), 5);
    assert!(all.iter().all(|i| i.start_time == time(10, 0)));
}

#[tokio::test]
async fn test_reconcile_preserves_cancelled_instance() {
    let repo = LocalRepository::new();
    let class_id = ClassId::new();
    let today = date(2026, 2, 1);

    let config = daily(today, 5, vec![slot(time(9, 0), time(10, 0))]);
    seed(&repo, class_id, &config).await;

    let stored = repo
        .find_instances(&InstanceFilter::for_class(class_id), None)
        .await
        .unwrap();
    let cancelled = &stored[2];
    repo.update_instance(cancelled.id, InstancePatch::status(InstanceStatus::Cancelled))
        .await
        .unwrap();

    let inserted = reconcile(&repo, class_id, &config, today).await.unwrap();
    // The cancelled occurrence keeps its slot; only the other four are fresh.
    assert_eq!(inserted.len(), 4);

    let all = repo
        .find_instances(&InstanceFilter::for_class(class_id), None)
        .await
        .unwrap();
    assert_eq!(all.len(), 5);
    let survivor = all
        .iter()
        .find(|i| i.scheduled_date == cancelled.scheduled_date)
        .unwrap();
    assert_eq!(survivor.id, cancelled.id);
    assert_eq!(survivor.status, InstanceStatus::Cancelled);
}

#[tokio::test]
async fn test_reconcile_preserves_manually_rescheduled_instance() {
    let repo = LocalRepository::new();
    let class_id = ClassId::new();
    let today = date(2026, 2, 1);

    let config = daily(today, 3, vec![slot(time(9, 0), time(10, 0))]);
    seed(&repo, class_id, &config).await;

    let stored = repo
        .find_instances(&InstanceFilter::for_class(class_id), None)
        .await
        .unwrap();
    // A one-off move to a date the rule never generates.
    let moved = &stored[1];
    let patch = InstancePatch {
        scheduled_date: Some(date(2026, 2, 20)),
        ..Default::default()
    };
    repo.update_instance(moved.id, patch).await.unwrap();

    let inserted = reconcile(&repo, class_id, &config, today).await.unwrap();
    // The rescheduled instance stays scheduled but is touched, so the rule
    // fills its vacated original date with a fresh instance.
    assert_eq!(inserted.len(), 3);

    let all = repo
        .find_instances(&InstanceFilter::for_class(class_id), None)
        .await
        .unwrap();
    assert_eq!(all.len(), 4);
    assert!(all.iter().any(|i| i.id == moved.id && i.scheduled_date == date(2026, 2, 20)));
}

#[tokio::test]
async fn test_reconcile_drops_candidates_colliding_with_protected() {
    let repo = LocalRepository::new();
    let class_id = ClassId::new();
    let today = date(2026, 2, 1);

    let config = daily(today, 3, vec![slot(time(9, 0), time(10, 0))]);
    seed(&repo, class_id, &config).await;

    let stored = repo
        .find_instances(&InstanceFilter::for_class(class_id), None)
        .await
        .unwrap();
    for instance in &stored {
        repo.update_instance(instance.id, InstancePatch::status(InstanceStatus::Completed))
            .await
            .unwrap();
    }

    // Every slot the rule calls for is already covered by a protected
    // instance, so nothing is inserted.
    let inserted = reconcile(&repo, class_id, &config, today).await.unwrap();
    assert!(inserted.is_empty());

    let all = repo
        .find_instances(&InstanceFilter::for_class(class_id), None)
        .await
        .unwrap();
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn test_reconcile_never_inserts_past_dates() {
    let repo = LocalRepository::new();
    let class_id = ClassId::new();
    let start = date(2026, 2, 1);
    let today = date(2026, 2, 3);

    let config = daily(start, 5, vec![slot(time(9, 0), time(10, 0))]);
    seed(&repo, class_id, &config).await;

    let inserted = reconcile(&repo, class_id, &config, today).await.unwrap();
    assert_eq!(inserted.len(), 3);
    assert!(inserted.iter().all(|i| i.scheduled_date >= today));

    // Past instances were outside the reconciliation window and survive.
    let all = repo
        .find_instances(&InstanceFilter::for_class(class_id), None)
        .await
        .unwrap();
    assert_eq!(all.len(), 5);
    assert_eq!(all[0].scheduled_date, start);
}

#[tokio::test]
async fn test_reconcile_from_empty_store_covers_every_future_rule_date() {
    let repo = LocalRepository::new();
    let class_id = ClassId::new();
    // 2026-02-01 is a Sunday; Tuesdays in the window are 02-03, 02-10,
    // 02-17, 02-24 and 03-03 (end date inclusive).
    let today = date(2026, 2, 5);
    let config = RecurrenceConfig {
        start_date: date(2026, 2, 1),
        end_date: Some(date(2026, 3, 3)),
        occurrences: None,
        pattern: RecurrencePattern::Weekly {
            day_wise_slots: vec![DayWiseTimeSlots {
                day: DayOfWeek::Tuesday,
                time_slots: vec![slot(time(9, 0), time(10, 0))],
            }],
        },
    };

    // No stored occurrences at all: everything the rule calls for from
    // today onward must be inserted, nothing more, nothing less.
    let inserted = reconcile(&repo, class_id, &config, today).await.unwrap();
    let dates: Vec<_> = inserted.iter().map(|i| i.scheduled_date).collect();
    assert_eq!(
        dates,
        vec![
            date(2026, 2, 10),
            date(2026, 2, 17),
            date(2026, 2, 24),
            date(2026, 3, 3),
        ]
    );
    assert!(inserted.iter().all(|i| i.start_time == time(9, 0)));
    assert!(inserted
        .iter()
        .all(|i| i.status == InstanceStatus::Scheduled));

    let all = repo
        .find_instances(&InstanceFilter::for_class(class_id), None)
        .await
        .unwrap();
    assert_eq!(all.len(), 4);
}

#[tokio::test]
async fn test_reconcile_empty_pattern_inserts_nothing() {
    let repo = LocalRepository::new();
    let class_id = ClassId::new();
    let today = date(2026, 2, 1);

    let config = daily(today, 3, vec![slot(time(9, 0), time(10, 0))]);
    seed(&repo, class_id, &config).await;

    let emptied = daily(today, 3, Vec::new());
    let inserted = reconcile(&repo, class_id, &emptied, today).await.unwrap();
    assert!(inserted.is_empty());

    // Pristine future projections are still cleared.
    let remaining = repo
        .count_instances(&InstanceFilter::for_class(class_id))
        .await
        .unwrap();
    assert_eq!(remaining, 0);
}
