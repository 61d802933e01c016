use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{Value, json};
use std::cell::Cell;
use std::sync::Arc;
use tally_core::{
    Clock, NewTask, Priority, Task, TaskGenerator, TaskPatch, TaskStatus, TaskStore,
    compute_average_roi, derive_view, normalize_records,
};

struct StepClock(Cell<DateTime<Utc>>);

impl Clock for StepClock {
    fn now(&self) -> DateTime<Utc> {
        let t = self.0.get();
        self.0.set(t + Duration::seconds(30));
        t
    }
}

struct NoFallback;

impl TaskGenerator for NoFallback {
    fn generate(&mut self, _count: usize, _now: DateTime<Utc>) -> Vec<Task> {
        Vec::new()
    }
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 19, 12, 0, 0).unwrap()
}

fn store_with(records: Value) -> TaskStore<StepClock> {
    let mut store = TaskStore::with_clock(StepClock(Cell::new(start())));
    store.finish_load(Ok(records.as_array().unwrap().clone()), &mut NoFallback);
    store
}

fn sample_store() -> TaskStore<StepClock> {
    store_with(json!([
        { "id": "t1", "title": "Quote for client", "revenue": 400, "timeTaken": 4, "priority": "High", "status": "In Progress" },
        { "id": "t2", "title": "Fix CI", "revenue": 0, "timeTaken": 1.5, "priority": "Low", "status": "Todo" },
        { "id": "t3", "title": "Ship v1", "revenue": 900, "timeTaken": 6, "priority": "High", "status": "Done",
          "createdAt": "2026-02-01T10:00:00Z", "completedAt": "2026-02-03T16:00:00Z" },
    ]))
}

#[test]
fn average_roi_example_and_ranking_of_zero_time_task() {
    let records = json!([{ "revenue": 100, "timeTaken": 10 }, { "revenue": 300, "timeTaken": 0 }]);
    let tasks = normalize_records(records.as_array().unwrap(), start());
    assert_eq!(compute_average_roi(&tasks), 10.0);

    let view = derive_view(&tasks);
    assert_eq!(view[0].roi, Some(10.0));
    assert_eq!(view[1].revenue, 300.0);
    assert_eq!(view[1].roi, None);
}

#[test]
fn add_delete_undo_round_trip() {
    let mut store = sample_store();
    let added = store
        .add_task(
            NewTask::new("Write proposal")
                .with_revenue(250.0)
                .with_time(2.5)
                .with_priority(Priority::High)
                .with_notes("for the Q2 pitch"),
            None,
        )
        .unwrap();

    store.delete_task(&added.id).unwrap();
    assert!(store.get(&added.id).is_none());
    assert_eq!(store.last_deleted(), Some(&added));

    let restored = store.undo_delete().unwrap().unwrap();
    assert_eq!(restored, added);
    assert_eq!(store.tasks()[0], added);
    assert!(store.last_deleted().is_none());
}

#[test]
fn only_the_latest_deletion_is_recoverable() {
    let mut store = sample_store();
    store.delete_task("t1").unwrap();
    store.delete_task("t2").unwrap();

    let restored = store.undo_delete().unwrap().unwrap();
    assert_eq!(restored.id, "t2");
    assert!(store.get("t1").is_none());
    assert_eq!(store.undo_delete().unwrap(), None);
    assert_eq!(store.tasks().len(), 2);
}

#[test]
fn completing_a_task_stamps_once() {
    let mut store = sample_store();
    let created = store.get("t2").unwrap().created_at;

    store
        .update_task("t2", &TaskPatch::new().status(TaskStatus::Done))
        .unwrap();
    let first = store.get("t2").unwrap().completed_at.unwrap();
    assert!(first >= created);

    store
        .update_task("t2", &TaskPatch::new().status(TaskStatus::Done))
        .unwrap();
    assert_eq!(store.get("t2").unwrap().completed_at, Some(first));
}

#[test]
fn reopening_does_not_clear_completion() {
    let mut store = sample_store();
    store
        .update_task("t3", &TaskPatch::new().status(TaskStatus::InProgress))
        .unwrap();
    let t3 = store.get("t3").unwrap();
    assert_eq!(t3.status, TaskStatus::InProgress);
    assert_eq!(
        t3.completed_at,
        Some(Utc.with_ymd_and_hms(2026, 2, 3, 16, 0, 0).unwrap())
    );
}

#[test]
fn unknown_id_update_is_a_content_equal_copy() {
    let mut store = sample_store();
    let before = Arc::clone(store.tasks());
    let view_before = Arc::clone(store.view());

    store
        .update_task("missing", &TaskPatch::new().title("ghost").status(TaskStatus::Done))
        .unwrap();

    assert!(!Arc::ptr_eq(&before, store.tasks()));
    assert_eq!(*before, **store.tasks());
    assert_eq!(*view_before, **store.view());
}

#[test]
fn update_keeps_order_and_untouched_fields() {
    let mut store = sample_store();
    store
        .update_task("t2", &TaskPatch::new().revenue(75.0))
        .unwrap();
    let ids: Vec<_> = store.tasks().iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["t1", "t2", "t3"]);
    let t2 = store.get("t2").unwrap();
    assert_eq!(t2.revenue, 75.0);
    assert_eq!(t2.title, "Fix CI");
    assert_eq!(t2.priority, Priority::Low);
}

#[test]
fn metrics_follow_every_mutation() {
    let mut store = sample_store();
    assert_eq!(store.metrics().total_revenue, 1300.0);
    assert_eq!(store.metrics().total_time_taken, 11.5);

    store.delete_task("t3").unwrap();
    assert_eq!(store.metrics().total_revenue, 400.0);
    assert_eq!(store.metrics().time_efficiency_pct, 0.0);

    store.undo_delete().unwrap();
    assert_eq!(store.metrics().total_revenue, 1300.0);
    let pct = store.metrics().time_efficiency_pct;
    assert!((pct - 6.0 / 11.5 * 100.0).abs() < 1e-9);
}

#[test]
fn ranked_view_is_independent_of_collection_order() {
    let mut store = sample_store();
    store.add_task(NewTask::new("Zero hours").with_revenue(10_000.0), None).unwrap();
    let view = store.view();
    assert_eq!(view.last().unwrap().title, "Zero hours");
    // t3: 150/h, t1: 100/h, t2: 0/h
    let ranked: Vec<_> = view.iter().take(3).map(|t| t.id.as_str()).collect();
    assert_eq!(ranked, vec!["t3", "t1", "t2"]);

    let mut reversed: Vec<Task> = store.tasks().to_vec();
    reversed.reverse();
    assert_eq!(derive_view(&reversed), view.to_vec());
}
