//! tally-core: task model, derived metrics and the in-memory task store.

pub mod error;
pub mod filter;
pub mod metrics;
pub mod mutation;
pub mod normalize;
pub mod ranking;
pub mod store;
pub mod task;
pub mod time;

pub use error::StoreError;
pub use filter::TaskFilter;
pub use metrics::{
    GradeBands, InvalidBands, Metrics, PerformanceGrade, compute_average_roi, compute_metrics,
    compute_performance_grade, compute_revenue_per_hour, compute_time_efficiency,
    compute_total_revenue,
};
pub use normalize::normalize_records;
pub use ranking::{DerivedTask, derive_view, sort_tasks, with_derived};
pub use store::{Phase, StoreOptions, StoreSnapshot, TaskGenerator, TaskStore};
pub use task::{NewTask, Priority, Task, TaskPatch, TaskStatus, generate_id};
pub use time::{Clock, SystemClock};
