//! Filtering over the ranked view.

use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};

use crate::ranking::DerivedTask;
use crate::task::{Priority, TaskStatus};

#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    /// Case-insensitive, matched against title and notes.
    pub search: Option<Regex>,
}

impl TaskFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_search(mut self, pattern: &str) -> Result<Self> {
        let re = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .with_context(|| format!("invalid search pattern: {pattern}"))?;
        self.search = Some(re);
        Ok(self)
    }

    pub fn matches(&self, task: &DerivedTask) -> bool {
        if self.status.is_some_and(|s| s != task.status) {
            return false;
        }
        if self.priority.is_some_and(|p| p != task.priority) {
            return false;
        }
        if let Some(ref re) = self.search {
            let in_notes = task.notes.as_deref().is_some_and(|n| re.is_match(n));
            if !re.is_match(&task.title) && !in_notes {
                return false;
            }
        }
        true
    }

    /// Keeps the ranking order of `view`.
    pub fn apply<'a>(&self, view: &'a [DerivedTask]) -> Vec<&'a DerivedTask> {
        view.iter().filter(|t| self.matches(t)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::derive_view;
    use crate::task::Task;
    use chrono::{TimeZone, Utc};

    fn view() -> Vec<DerivedTask> {
        let t0 = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        derive_view(&[
            Task::new("a", "Invoice ACME", t0).with_revenue(300.0).with_time(2.0),
            Task::new("b", "Refactor billing", t0)
                .with_revenue(100.0)
                .with_time(4.0)
                .with_priority(Priority::High)
                .with_notes("blocked on invoice schema"),
            Task::new("c", "Team lunch", t0).with_status(TaskStatus::Done),
        ])
    }

    #[test]
    fn empty_filter_keeps_everything_in_order() {
        let v = view();
        let out = TaskFilter::new().apply(&v);
        let ids: Vec<_> = out.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn search_hits_title_and_notes() {
        let v = view();
        let f = TaskFilter::new().with_search("INVOICE").unwrap();
        let ids: Vec<_> = f.apply(&v).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn status_and_priority_narrow() {
        let v = view();
        assert_eq!(TaskFilter::new().with_status(TaskStatus::Done).apply(&v).len(), 1);
        let f = TaskFilter::new().with_priority(Priority::High);
        assert_eq!(f.apply(&v)[0].id, "b");
    }

    #[test]
    fn bad_pattern_is_an_error() {
        assert!(TaskFilter::new().with_search("(").is_err());
    }
}
