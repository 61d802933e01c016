//! Pure collection transforms behind the store's mutation entry points.
//!
//! Each function takes the current collection and returns a fresh one; the
//! store only swaps references and tracks `last_deleted`.

use chrono::{DateTime, Utc};

use crate::error::{Result, StoreError};
use crate::task::{NewTask, Task, TaskPatch, generate_id};

fn check_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(StoreError::Validation("title must not be empty".into()));
    }
    Ok(())
}

fn check_amount(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(StoreError::Validation(format!(
            "{field} must be a finite, non-negative number (got {value})"
        )));
    }
    Ok(())
}

pub fn validate_new(payload: &NewTask) -> Result<()> {
    check_title(&payload.title)?;
    check_amount("revenue", payload.revenue)?;
    check_amount("timeTaken", payload.time_taken)
}

pub fn validate_patch(patch: &TaskPatch) -> Result<()> {
    if let Some(ref title) = patch.title {
        check_title(title)?;
    }
    if let Some(revenue) = patch.revenue {
        check_amount("revenue", revenue)?;
    }
    if let Some(hours) = patch.time_taken {
        check_amount("timeTaken", hours)?;
    }
    Ok(())
}

/// A supplied `completed_at` may not precede the task's creation.
pub fn validate_completion(task: &Task, patch: &TaskPatch) -> Result<()> {
    match patch.completed_at {
        Some(at) if at < task.created_at => Err(StoreError::Validation(format!(
            "completedAt {at} is before createdAt {}",
            task.created_at
        ))),
        _ => Ok(()),
    }
}

/// Build a canonical task from a creation payload. `completed_at` is stamped
/// only when the task starts out `Done`.
pub fn build_task(payload: NewTask, id: Option<String>, now: DateTime<Utc>) -> Task {
    let completed_at = payload.status.is_terminal().then_some(now);
    Task {
        id: id.unwrap_or_else(generate_id),
        title: payload.title.trim().to_string(),
        revenue: payload.revenue,
        time_taken: payload.time_taken,
        priority: payload.priority,
        status: payload.status,
        notes: payload.notes,
        created_at: now,
        completed_at,
    }
}

/// Most recent first.
pub fn prepend(tasks: &[Task], task: Task) -> Vec<Task> {
    let mut out = Vec::with_capacity(tasks.len() + 1);
    out.push(task);
    out.extend_from_slice(tasks);
    out
}

/// Merge `patch` into the task with `id`; other tasks and the order are kept.
/// An unknown id yields a content-equal copy.
///
/// Entering `Done` stamps the patch's `completed_at`, or `now` (never earlier
/// than `created_at`). An existing `completed_at` is never altered, and a
/// patch that does not enter `Done` cannot set one.
pub fn apply_patch(tasks: &[Task], id: &str, patch: &TaskPatch, now: DateTime<Utc>) -> Vec<Task> {
    tasks
        .iter()
        .map(|t| {
            if t.id != id {
                return t.clone();
            }
            let mut next = patch.apply_to(t);
            let entering_done = !t.status.is_terminal() && next.status.is_terminal();
            if entering_done && next.completed_at.is_none() {
                let at = match patch.completed_at {
                    Some(at) => at,
                    None => now.max(t.created_at),
                };
                next.completed_at = Some(at);
            }
            next
        })
        .collect()
}

/// Remove the task with `id`, returning the remaining tasks and the removed one.
pub fn remove(tasks: &[Task], id: &str) -> (Vec<Task>, Option<Task>) {
    let mut removed = None;
    let mut rest = Vec::with_capacity(tasks.len());
    for t in tasks {
        if removed.is_none() && t.id == id {
            removed = Some(t.clone());
        } else {
            rest.push(t.clone());
        }
    }
    (rest, removed)
}
