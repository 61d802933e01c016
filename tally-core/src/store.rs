//! TaskStore: owner of the canonical task collection.
//!
//! Lifecycle is `Loading -> Ready { error }`. The initial record fetch happens
//! outside (see `tally-ingest`); its outcome is handed to `finish_load`, after
//! which the five mutation entry points are accepted. Every mutation swaps in
//! a fresh collection and recomputes the ranked view and metrics from it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::error::{Result, StoreError};
use crate::metrics::{GradeBands, Metrics, compute_metrics};
use crate::mutation;
use crate::normalize::normalize_records;
use crate::ranking::{DerivedTask, derive_view};
use crate::task::{NewTask, Task, TaskPatch};
use crate::time::{Clock, SystemClock};

/// Produces synthetic tasks when the initial load yields nothing.
pub trait TaskGenerator {
    fn generate(&mut self, count: usize, now: DateTime<Utc>) -> Vec<Task>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Phase {
    Loading,
    /// `error` carries the load failure message, if any. The store is usable
    /// either way.
    Ready { error: Option<String> },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoreOptions {
    /// How many synthetic tasks to generate when the load comes back empty.
    pub fallback_count: usize,
    pub bands: GradeBands,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            fallback_count: 50,
            bands: GradeBands::default(),
        }
    }
}

/// Everything the presentation layer reads, in one serializable value.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    pub loading: bool,
    pub error: Option<String>,
    pub tasks: Vec<Task>,
    pub derived_sorted: Vec<DerivedTask>,
    pub metrics: Metrics,
    pub last_deleted: Option<Task>,
}

#[derive(Debug)]
pub struct TaskStore<C: Clock = SystemClock> {
    clock: C,
    options: StoreOptions,
    phase: Phase,
    tasks: Arc<[Task]>,
    view: Arc<[DerivedTask]>,
    metrics: Metrics,
    last_deleted: Option<Task>,
}

impl TaskStore<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for TaskStore<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> TaskStore<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            options: StoreOptions::default(),
            phase: Phase::Loading,
            tasks: Arc::from(Vec::new()),
            view: Arc::from(Vec::new()),
            metrics: Metrics::default(),
            last_deleted: None,
        }
    }

    pub fn with_options(mut self, options: StoreOptions) -> Self {
        self.options = options;
        self.metrics = compute_metrics(&self.tasks, &self.options.bands);
        self
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    pub fn error(&self) -> Option<&str> {
        match &self.phase {
            Phase::Ready { error } => error.as_deref(),
            Phase::Loading => None,
        }
    }

    /// Canonical collection, most recently added first. The `Arc` changes
    /// identity on every mutation.
    pub fn tasks(&self) -> &Arc<[Task]> {
        &self.tasks
    }

    /// Derived tasks in ranking order.
    pub fn view(&self) -> &Arc<[DerivedTask]> {
        &self.view
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// The task `undo_delete` would restore.
    pub fn last_deleted(&self) -> Option<&Task> {
        self.last_deleted.as_ref()
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            loading: self.is_loading(),
            error: self.error().map(str::to_string),
            tasks: self.tasks.to_vec(),
            derived_sorted: self.view.to_vec(),
            metrics: self.metrics,
            last_deleted: self.last_deleted.clone(),
        }
    }

    /// Complete the initial load with the fetched raw records, or the failure
    /// message. Falls back to generated tasks when nothing usable came back.
    /// Only the first call has any effect.
    pub fn finish_load<G: TaskGenerator>(
        &mut self,
        outcome: std::result::Result<Vec<Value>, String>,
        generator: &mut G,
    ) {
        if !self.is_loading() {
            tracing::warn!("initial load already finished, ignoring second result");
            return;
        }

        let now = self.clock.now();
        let (mut tasks, error) = match outcome {
            Ok(records) => (normalize_records(&records, now), None),
            Err(message) => {
                tracing::warn!(%message, "task load failed");
                (Vec::new(), Some(message))
            }
        };

        let fallback = tasks.is_empty();
        if fallback {
            tasks = generator.generate(self.options.fallback_count, now);
        }
        tracing::info!(count = tasks.len(), fallback, "task store ready");

        self.phase = Phase::Ready { error };
        self.replace(tasks);
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.is_loading() {
            return Err(StoreError::NotReady);
        }
        Ok(())
    }

    /// Create a task and put it at the front. Returns the stored task so the
    /// caller learns the assigned id.
    pub fn add_task(&mut self, payload: NewTask, id: Option<String>) -> Result<Task> {
        self.ensure_ready()?;
        mutation::validate_new(&payload)?;
        if let Some(ref id) = id {
            let held = self.last_deleted.as_ref().is_some_and(|t| t.id == *id);
            if held || self.get(id).is_some() {
                return Err(StoreError::Validation(format!("task id already exists: {id}")));
            }
        }

        let task = mutation::build_task(payload, id, self.clock.now());
        tracing::debug!(id = %task.id, "add task");
        let next = mutation::prepend(&self.tasks, task.clone());
        self.replace(next);
        Ok(task)
    }

    /// Merge `patch` into the task with `id`. Unknown ids are ignored.
    pub fn update_task(&mut self, id: &str, patch: &TaskPatch) -> Result<()> {
        self.ensure_ready()?;
        mutation::validate_patch(patch)?;

        match self.get(id) {
            Some(current) => {
                mutation::validate_completion(current, patch)?;
                tracing::debug!(id, "update task");
            }
            None => tracing::debug!(id, "update for unknown task ignored"),
        }
        let next = mutation::apply_patch(&self.tasks, id, patch, self.clock.now());
        self.replace(next);
        Ok(())
    }

    /// Remove the task with `id` and hold it for undo, replacing whatever was
    /// held before. Unknown ids are ignored.
    pub fn delete_task(&mut self, id: &str) -> Result<()> {
        self.ensure_ready()?;

        let (next, removed) = mutation::remove(&self.tasks, id);
        match removed {
            Some(task) => {
                if let Some(ref dropped) = self.last_deleted {
                    tracing::debug!(id = %dropped.id, "undo history overwritten");
                }
                tracing::debug!(id, "delete task");
                self.last_deleted = Some(task);
            }
            None => tracing::debug!(id, "delete for unknown task ignored"),
        }
        self.replace(next);
        Ok(())
    }

    /// Put the last deleted task back at the front. Returns it, or `None` when
    /// nothing was pending.
    pub fn undo_delete(&mut self) -> Result<Option<Task>> {
        self.ensure_ready()?;

        let Some(task) = self.last_deleted.take() else {
            return Ok(None);
        };
        tracing::debug!(id = %task.id, "undo delete");
        let next = mutation::prepend(&self.tasks, task.clone());
        self.replace(next);
        Ok(Some(task))
    }

    /// Forget the pending undo without restoring it.
    pub fn clear_history(&mut self) -> Result<()> {
        self.ensure_ready()?;
        self.last_deleted = None;
        Ok(())
    }

    fn replace(&mut self, next: Vec<Task>) {
        self.view = Arc::from(derive_view(&next));
        self.metrics = compute_metrics(&next, &self.options.bands);
        self.tasks = Arc::from(next);
    }
}
