//! Load-time normalization: loosely-typed JSON records -> canonical tasks.
//!
//! Per-field rules (a missing or ill-typed field never rejects the record):
//! - id:          non-empty string or number; otherwise (or on duplicate) a fresh id
//! - title:       non-empty string; otherwise "Untitled task"
//! - revenue:     number or numeric string, finite and >= 0; otherwise 0
//! - timeTaken:   number or numeric string, finite and >= 0; otherwise 0
//! - priority:    Low | Medium | High (case-insensitive); otherwise Medium
//! - status:      Todo | In Progress | Done (lenient); otherwise Todo
//! - notes:       string; otherwise none
//! - createdAt:   parseable timestamp; otherwise anchor - (len - index) days,
//!                so earlier records look older
//! - completedAt: parseable timestamp kept as-is; otherwise createdAt + 1 day
//!                when status is Done, else none
//!
//! Array entries that are not objects are skipped.

use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::task::{Priority, Task, TaskStatus, generate_id};
use crate::time::parse_timestamp;

pub const DEFAULT_TITLE: &str = "Untitled task";

pub fn normalize_records(records: &[Value], anchor: DateTime<Utc>) -> Vec<Task> {
    let len = records.len();
    let mut seen: HashSet<String> = HashSet::with_capacity(len);
    let mut out = Vec::with_capacity(len);

    for (index, raw) in records.iter().enumerate() {
        let Some(obj) = raw.as_object() else {
            tracing::warn!(index, "skipping non-object task record");
            continue;
        };
        let mut task = normalize_record(obj, index, len, anchor);
        if !seen.insert(task.id.clone()) {
            tracing::warn!(index, id = %task.id, "duplicate task id, assigning a fresh one");
            task.id = generate_id();
            seen.insert(task.id.clone());
        }
        out.push(task);
    }

    out
}

/// Normalize a single record. `index`/`len` position it in the source array
/// for createdAt synthesis.
pub fn normalize_record(
    obj: &Map<String, Value>,
    index: usize,
    len: usize,
    anchor: DateTime<Utc>,
) -> Task {
    let id = coerce_id(obj.get("id")).unwrap_or_else(generate_id);

    let title = obj
        .get("title")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_TITLE)
        .to_string();

    let revenue = coerce_non_negative(obj.get("revenue"));
    let time_taken = coerce_non_negative(obj.get("timeTaken"));

    let priority = obj
        .get("priority")
        .and_then(Value::as_str)
        .and_then(Priority::parse)
        .unwrap_or(Priority::Medium);

    let status = obj
        .get("status")
        .and_then(Value::as_str)
        .and_then(TaskStatus::parse)
        .unwrap_or(TaskStatus::Todo);

    let notes = obj
        .get("notes")
        .and_then(Value::as_str)
        .map(str::to_string);

    let created_at = coerce_timestamp(obj.get("createdAt"))
        .unwrap_or_else(|| synthesized_created_at(index, len, anchor));

    let completed_at = coerce_timestamp(obj.get("completedAt")).or_else(|| {
        if status.is_terminal() {
            Some(created_at + Duration::days(1))
        } else {
            None
        }
    });

    Task {
        id,
        title,
        revenue,
        time_taken,
        priority,
        status,
        notes,
        created_at,
        completed_at,
    }
}

/// Strictly increasing with `index`; the last record lands one day before
/// `anchor`.
fn synthesized_created_at(index: usize, len: usize, anchor: DateTime<Utc>) -> DateTime<Utc> {
    let back = len.saturating_sub(index) as i64;
    anchor - Duration::days(back)
}

fn coerce_id(v: Option<&Value>) -> Option<String> {
    match v? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn coerce_number(v: Option<&Value>) -> Option<f64> {
    let n = match v? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn coerce_non_negative(v: Option<&Value>) -> f64 {
    coerce_number(v).filter(|n| *n >= 0.0).unwrap_or(0.0)
}

fn coerce_timestamp(v: Option<&Value>) -> Option<DateTime<Utc>> {
    v?.as_str().and_then(parse_timestamp)
}
