//! Task model: the canonical record owned by the store, plus the payload and
//! patch shapes used by the mutation entry points.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fresh task id: UUIDv7, a millisecond timestamp plus random bits, so ids
/// sort roughly by creation time and collide only if the RNG does.
pub fn generate_id() -> String {
    Uuid::now_v7().to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "Todo")]
    Todo,
    #[serde(rename = "In Progress")]
    InProgress,
    /// Terminal.
    #[serde(rename = "Done")]
    Done,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Done)
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "Todo",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Done => "Done",
        }
    }

    /// Lenient parse used by normalization and the shell.
    /// Accepts "in progress", "in-progress", "InProgress", "done", ...
    pub fn parse(s: &str) -> Option<Self> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "todo" => Some(TaskStatus::Todo),
            "inprogress" | "doing" => Some(TaskStatus::InProgress),
            "done" | "completed" => Some(TaskStatus::Done),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn label(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Priority::Low),
            "medium" | "med" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            _ => None,
        }
    }
}

/// Canonical task.
///
/// Serialized field names follow the external record shape (`timeTaken`,
/// `createdAt`, ...) so a normalized collection can be written back out as
/// valid input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,

    /// Non-negative.
    pub revenue: f64,

    /// Hours, non-negative.
    pub time_taken: f64,

    pub priority: Priority,
    pub status: TaskStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,

    /// Set at most once, on the transition into `Done`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(id: impl Into<String>, title: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            revenue: 0.0,
            time_taken: 0.0,
            priority: Priority::Medium,
            status: TaskStatus::Todo,
            notes: None,
            created_at,
            completed_at: None,
        }
    }

    pub fn with_revenue(mut self, revenue: f64) -> Self {
        self.revenue = revenue;
        self
    }

    pub fn with_time(mut self, hours: f64) -> Self {
        self.time_taken = hours;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_completed_at(mut self, at: DateTime<Utc>) -> Self {
        self.completed_at = Some(at);
        self
    }

    pub fn is_done(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Fields supplied by the caller of `add_task`. Everything else (`id`,
/// `createdAt`, `completedAt`) is assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub revenue: f64,
    pub time_taken: f64,
    pub priority: Priority,
    pub status: TaskStatus,
    pub notes: Option<String>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            revenue: 0.0,
            time_taken: 0.0,
            priority: Priority::Medium,
            status: TaskStatus::Todo,
            notes: None,
        }
    }

    pub fn with_revenue(mut self, revenue: f64) -> Self {
        self.revenue = revenue;
        self
    }

    pub fn with_time(mut self, hours: f64) -> Self {
        self.time_taken = hours;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Partial update. `None` leaves the field untouched; for `notes`,
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub revenue: Option<f64>,
    pub time_taken: Option<f64>,
    pub priority: Option<Priority>,
    pub status: Option<TaskStatus>,
    pub notes: Option<Option<String>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TaskPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn revenue(mut self, revenue: f64) -> Self {
        self.revenue = Some(revenue);
        self
    }

    pub fn time_taken(mut self, hours: f64) -> Self {
        self.time_taken = Some(hours);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn notes(mut self, notes: Option<String>) -> Self {
        self.notes = Some(notes);
        self
    }

    pub fn completed_at(mut self, at: DateTime<Utc>) -> Self {
        self.completed_at = Some(at);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge onto `task`, patch wins on overlap. `completed_at` is never
    /// touched here; it is only set on entering `Done`, see `mutation`.
    pub fn apply_to(&self, task: &Task) -> Task {
        let mut next = task.clone();
        if let Some(ref title) = self.title {
            next.title = title.trim().to_string();
        }
        if let Some(revenue) = self.revenue {
            next.revenue = revenue;
        }
        if let Some(hours) = self.time_taken {
            next.time_taken = hours;
        }
        if let Some(priority) = self.priority {
            next.priority = priority;
        }
        if let Some(status) = self.status {
            next.status = status;
        }
        if let Some(ref notes) = self.notes {
            next.notes = notes.clone();
        }
        next
    }
}
