//! Plain-text rendering for the list and summary commands.

use chrono_tz::Tz;
use std::fmt::Write;
use tally_core::time::format_local;
use tally_core::{DerivedTask, Metrics};

pub fn format_roi(roi: Option<f64>) -> String {
    match roi {
        Some(r) => format!("{r:.2}"),
        None => "—".to_string(),
    }
}

/// One line per task, `#` is the 1-based rank in the ranked view.
pub fn format_table(rows: &[(usize, &DerivedTask)], tz: Tz) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>3}  {:>9}  {:>10}  {:>6}  {:<6}  {:<11}  {:<16}  {}",
        "#", "ROI", "revenue", "hours", "prio", "status", "created", "title"
    );
    for (rank, t) in rows {
        let _ = writeln!(
            out,
            "{:>3}  {:>9}  {:>10.2}  {:>6.2}  {:<6}  {:<11}  {:<16}  {}  [{}]",
            rank,
            format_roi(t.roi),
            t.revenue,
            t.time_taken,
            t.priority.label(),
            t.status.label(),
            format_local(t.created_at, tz),
            t.title,
            t.id,
        );
    }
    out
}

pub fn format_summary(m: &Metrics, task_count: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Tasks:            {task_count}");
    let _ = writeln!(out, "Total revenue:    ${:.2}", m.total_revenue);
    let _ = writeln!(out, "Time logged:      {:.2} h", m.total_time_taken);
    let _ = writeln!(out, "Time efficiency:  {:.1}%", m.time_efficiency_pct);
    let _ = writeln!(out, "Revenue / hour:   ${:.2}", m.revenue_per_hour);
    let _ = writeln!(out, "Average ROI:      {:.2}", m.average_roi);
    let _ = writeln!(out, "Grade:            {}", m.performance_grade.label());
    out
}
