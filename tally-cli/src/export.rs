//! CSV export of the ranked view.

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use tally_core::DerivedTask;
use tally_core::time::to_rfc3339_utc;

#[derive(Debug, Serialize)]
struct Row<'a> {
    rank: usize,
    id: &'a str,
    title: &'a str,
    revenue: f64,
    time_taken: f64,
    roi: Option<f64>,
    priority: &'static str,
    status: &'static str,
    created_at: String,
    completed_at: Option<String>,
    notes: Option<&'a str>,
}

/// Write `view` as CSV, in ranking order. Returns the row count.
pub fn write_csv<W: Write>(view: &[DerivedTask], out: W) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(out);
    for (i, t) in view.iter().enumerate() {
        wtr.serialize(Row {
            rank: i + 1,
            id: &t.id,
            title: &t.title,
            revenue: t.revenue,
            time_taken: t.time_taken,
            roi: t.roi,
            priority: t.priority.label(),
            status: t.status.label(),
            created_at: to_rfc3339_utc(t.created_at),
            completed_at: t.completed_at.map(to_rfc3339_utc),
            notes: t.notes.as_deref(),
        })
        .with_context(|| format!("write row for {}", t.id))?;
    }
    wtr.flush().context("flush csv")?;
    Ok(view.len())
}
