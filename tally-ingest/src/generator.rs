//! Synthetic task generator used when no records are available.
//!
//! Output is internally consistent (valid enums, non-negative numbers,
//! `completed_at` only on Done tasks and never before `created_at` or after
//! `now`), so it goes into the store without normalization.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;
use tally_core::{Priority, Task, TaskGenerator, TaskStatus};

const VERBS: &[&str] = &[
    "Draft", "Review", "Ship", "Audit", "Refactor", "Design", "Migrate", "Invoice", "Pitch",
    "Document",
];

const OBJECTS: &[&str] = &[
    "landing page",
    "billing flow",
    "client proposal",
    "onboarding email",
    "API docs",
    "Q3 report",
    "search index",
    "mobile release",
    "pricing table",
    "support backlog",
];

const NOTES: &[&str] = &[
    "waiting on client feedback",
    "split into two PRs",
    "billable at the standard rate",
    "needs a second reviewer",
];

#[derive(Debug)]
pub struct SyntheticGenerator {
    rng: StdRng,
}

impl SyntheticGenerator {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Same seed, same tasks (given the same `now`).
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.gen_range(0..items.len())]
    }

    fn one(&mut self, index: usize, now: DateTime<Utc>) -> Task {
        let title = format!("{} {}", self.pick(VERBS), self.pick(OBJECTS));
        let id = format!("gen-{index:04}-{:08x}", self.rng.r#gen::<u32>());

        // Whole dollars, some tasks earn nothing.
        let revenue = if self.rng.gen_bool(0.15) {
            0.0
        } else {
            self.rng.gen_range(50..=5_000) as f64
        };
        // Quarter-hour granularity, some tasks have no time logged yet.
        let time_taken = if self.rng.gen_bool(0.1) {
            0.0
        } else {
            self.rng.gen_range(1..=160) as f64 / 4.0
        };

        let priority = match self.rng.gen_range(0..3) {
            0 => Priority::Low,
            1 => Priority::Medium,
            _ => Priority::High,
        };
        let status = match self.rng.gen_range(0..10) {
            0..=3 => TaskStatus::Done,
            4..=6 => TaskStatus::InProgress,
            _ => TaskStatus::Todo,
        };

        let age_minutes = self.rng.gen_range(60..=90 * 24 * 60);
        let created_at = now - Duration::minutes(age_minutes);
        let completed_at = status.is_terminal().then(|| {
            let after = self.rng.gen_range(1..=age_minutes);
            created_at + Duration::minutes(after)
        });

        let notes = self
            .rng
            .gen_bool(0.3)
            .then(|| self.pick(NOTES).to_string());

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

    /// Generated tasks serialized in the external record shape.
    pub fn records(&mut self, count: usize, now: DateTime<Utc>) -> Vec<Value> {
        self.generate(count, now)
            .iter()
            .filter_map(|t| serde_json::to_value(t).ok())
            .collect()
    }
}

impl Default for SyntheticGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskGenerator for SyntheticGenerator {
    fn generate(&mut self, count: usize, now: DateTime<Utc>) -> Vec<Task> {
        (0..count).map(|i| self.one(i, now)).collect()
    }
}
