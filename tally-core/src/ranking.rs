//! Derived tasks and the ranking order over them.
//!
//! Ordering:
//! - roi DESC, tasks without a roi (zero hours) after every numeric roi
//! - revenue DESC
//! - created_at ASC (older first)
//! - id ASC (last resort so the order is total)

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::task::Task;

/// A task plus computed ranking fields. Regenerated from the canonical
/// collection, never mutated on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedTask {
    #[serde(flatten)]
    pub task: Task,
    /// Revenue per hour; `None` when no time was logged.
    pub roi: Option<f64>,
}

impl std::ops::Deref for DerivedTask {
    type Target = Task;

    fn deref(&self) -> &Task {
        &self.task
    }
}

pub fn with_derived(task: &Task) -> DerivedTask {
    let roi = if task.time_taken > 0.0 {
        Some(task.revenue / task.time_taken).filter(|r| r.is_finite())
    } else {
        None
    };
    DerivedTask {
        task: task.clone(),
        roi,
    }
}

/// Total order used for ranking; `Less` means `a` ranks first.
pub fn compare_derived(a: &DerivedTask, b: &DerivedTask) -> Ordering {
    let by_roi = match (a.roi, b.roi) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_roi
        .then_with(|| b.revenue.total_cmp(&a.revenue))
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Returns a newly ordered vector; the input is left as-is.
pub fn sort_tasks(tasks: &[DerivedTask]) -> Vec<DerivedTask> {
    let mut out = tasks.to_vec();
    out.sort_by(compare_derived);
    out
}

/// Derive and rank a canonical collection in one pass.
pub fn derive_view(tasks: &[Task]) -> Vec<DerivedTask> {
    let derived: Vec<DerivedTask> = tasks.iter().map(with_derived).collect();
    sort_tasks(&derived)
}
