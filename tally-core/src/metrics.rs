//! Aggregate metrics over a task collection.
//!
//! Every function here is pure: same slice in, same number out. Divisions by a
//! zero total are defined as 0 rather than producing NaN/inf.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::task::Task;

/// Letter-style grade derived from the average ROI. Ordered worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PerformanceGrade {
    #[serde(rename = "Needs Improvement")]
    NeedsImprovement,
    #[serde(rename = "Fair")]
    Fair,
    #[serde(rename = "Good")]
    Good,
    #[serde(rename = "Excellent")]
    Excellent,
}

impl PerformanceGrade {
    pub fn label(&self) -> &'static str {
        match self {
            PerformanceGrade::NeedsImprovement => "Needs Improvement",
            PerformanceGrade::Fair => "Fair",
            PerformanceGrade::Good => "Good",
            PerformanceGrade::Excellent => "Excellent",
        }
    }
}

#[derive(Debug, Error, PartialEq)]
#[error("grade thresholds must be finite and non-decreasing (low={low}, mid={mid}, high={high})")]
pub struct InvalidBands {
    pub low: f64,
    pub mid: f64,
    pub high: f64,
}

/// Upper bounds (inclusive) for the three lower grades; anything above `high`
/// is `Excellent`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradeBands {
    pub low: f64,
    pub mid: f64,
    pub high: f64,
}

impl Default for GradeBands {
    fn default() -> Self {
        Self {
            low: 50.0,
            mid: 200.0,
            high: 500.0,
        }
    }
}

impl GradeBands {
    pub fn new(low: f64, mid: f64, high: f64) -> Result<Self, InvalidBands> {
        let bands = Self { low, mid, high };
        bands.validate()?;
        Ok(bands)
    }

    pub fn validate(&self) -> Result<(), InvalidBands> {
        let finite = self.low.is_finite() && self.mid.is_finite() && self.high.is_finite();
        if !finite || self.low > self.mid || self.mid > self.high {
            return Err(InvalidBands {
                low: self.low,
                mid: self.mid,
                high: self.high,
            });
        }
        Ok(())
    }

    /// Total over f64: NaN grades as `NeedsImprovement`.
    pub fn grade(&self, average_roi: f64) -> PerformanceGrade {
        if average_roi.is_nan() || average_roi <= self.low {
            PerformanceGrade::NeedsImprovement
        } else if average_roi <= self.mid {
            PerformanceGrade::Fair
        } else if average_roi <= self.high {
            PerformanceGrade::Good
        } else {
            PerformanceGrade::Excellent
        }
    }
}

/// Aggregate summary of the whole collection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub total_revenue: f64,
    pub total_time_taken: f64,
    pub time_efficiency_pct: f64,
    pub revenue_per_hour: f64,
    #[serde(rename = "averageROI")]
    pub average_roi: f64,
    pub performance_grade: PerformanceGrade,
}

impl Default for Metrics {
    fn default() -> Self {
        compute_metrics(&[], &GradeBands::default())
    }
}

pub fn compute_total_revenue(tasks: &[Task]) -> f64 {
    tasks.iter().map(|t| t.revenue).sum()
}

pub fn compute_total_time(tasks: &[Task]) -> f64 {
    tasks.iter().map(|t| t.time_taken).sum()
}

/// Share of logged hours that went to `Done` tasks, as a percentage.
pub fn compute_time_efficiency(tasks: &[Task]) -> f64 {
    let total = compute_total_time(tasks);
    if total <= 0.0 {
        return 0.0;
    }
    let done: f64 = tasks
        .iter()
        .filter(|t| t.is_done())
        .map(|t| t.time_taken)
        .sum();
    done / total * 100.0
}

pub fn compute_revenue_per_hour(tasks: &[Task]) -> f64 {
    let total = compute_total_time(tasks);
    if total <= 0.0 {
        return 0.0;
    }
    let rate = compute_total_revenue(tasks) / total;
    if rate.is_finite() { rate } else { 0.0 }
}

/// Mean of per-task ROI over tasks that have one (see `with_derived`).
/// Zero-time tasks and overflowing ratios are left out of both the sum and
/// the count.
pub fn compute_average_roi(tasks: &[Task]) -> f64 {
    let (sum, count) = tasks
        .iter()
        .filter(|t| t.time_taken > 0.0)
        .map(|t| t.revenue / t.time_taken)
        .filter(|roi| roi.is_finite())
        .fold((0.0_f64, 0_usize), |(sum, count), roi| (sum + roi, count + 1));
    if count == 0 {
        return 0.0;
    }
    let mean = sum / count as f64;
    if mean.is_finite() { mean } else { 0.0 }
}

/// Grade with the default bands.
pub fn compute_performance_grade(average_roi: f64) -> PerformanceGrade {
    GradeBands::default().grade(average_roi)
}

pub fn compute_metrics(tasks: &[Task], bands: &GradeBands) -> Metrics {
    let average_roi = compute_average_roi(tasks);
    Metrics {
        total_revenue: compute_total_revenue(tasks),
        total_time_taken: compute_total_time(tasks),
        time_efficiency_pct: compute_time_efficiency(tasks),
        revenue_per_hour: compute_revenue_per_hour(tasks),
        average_roi,
        performance_grade: bands.grade(average_roi),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskStatus;
    use chrono::{TimeZone, Utc};

    fn task(id: &str, revenue: f64, hours: f64) -> Task {
        let t0 = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        Task::new(id, id, t0).with_revenue(revenue).with_time(hours)
    }

    #[test]
    fn average_roi_skips_zero_time_tasks() {
        let tasks = vec![task("a", 100.0, 10.0), task("b", 300.0, 0.0)];
        assert_eq!(compute_average_roi(&tasks), 10.0);
    }

    #[test]
    fn average_roi_is_zero_when_nothing_qualifies() {
        assert_eq!(compute_average_roi(&[]), 0.0);
        assert_eq!(compute_average_roi(&[task("a", 50.0, 0.0)]), 0.0);
    }

    #[test]
    fn average_roi_is_mean_of_ratios_not_ratio_of_sums() {
        let tasks = vec![task("a", 100.0, 1.0), task("b", 100.0, 4.0)];
        // (100 + 25) / 2
        assert_eq!(compute_average_roi(&tasks), 62.5);
        // 200 / 5
        assert_eq!(compute_revenue_per_hour(&tasks), 40.0);
    }

    #[test]
    fn time_efficiency_counts_done_hours() {
        let tasks = vec![
            task("a", 0.0, 3.0).with_status(TaskStatus::Done),
            task("b", 0.0, 1.0).with_status(TaskStatus::InProgress),
        ];
        assert_eq!(compute_time_efficiency(&tasks), 75.0);
    }

    #[test]
    fn zero_total_time_yields_zero_not_nan() {
        let tasks = vec![task("a", 500.0, 0.0)];
        assert_eq!(compute_time_efficiency(&tasks), 0.0);
        assert_eq!(compute_revenue_per_hour(&tasks), 0.0);
        let m = compute_metrics(&tasks, &GradeBands::default());
        assert_eq!(m.total_revenue, 500.0);
        assert_eq!(m.performance_grade, PerformanceGrade::NeedsImprovement);
    }

    #[test]
    fn overflowing_ratios_stay_finite_and_match_the_view() {
        let tasks = vec![task("huge", 1e300, 1e-10), task("a", 100.0, 10.0)];
        assert_eq!(compute_average_roi(&tasks), 10.0);
        assert_eq!(compute_revenue_per_hour(&[task("huge", 1e300, 1e-10)]), 0.0);

        let view = crate::ranking::derive_view(&tasks);
        let huge = view.iter().find(|t| t.id == "huge").unwrap();
        assert_eq!(huge.roi, None);

        let m = compute_metrics(&tasks, &GradeBands::default());
        assert_eq!(m.performance_grade, PerformanceGrade::NeedsImprovement);
        let v = serde_json::to_value(m).unwrap();
        assert!(v["averageROI"].is_number());
        assert!(v["revenuePerHour"].is_number());
    }

    #[test]
    fn grade_boundaries() {
        assert_eq!(compute_performance_grade(f64::NEG_INFINITY), PerformanceGrade::NeedsImprovement);
        assert_eq!(compute_performance_grade(50.0), PerformanceGrade::NeedsImprovement);
        assert_eq!(compute_performance_grade(50.01), PerformanceGrade::Fair);
        assert_eq!(compute_performance_grade(200.0), PerformanceGrade::Fair);
        assert_eq!(compute_performance_grade(200.5), PerformanceGrade::Good);
        assert_eq!(compute_performance_grade(500.0), PerformanceGrade::Good);
        assert_eq!(compute_performance_grade(500.1), PerformanceGrade::Excellent);
        assert_eq!(compute_performance_grade(f64::INFINITY), PerformanceGrade::Excellent);
        assert_eq!(compute_performance_grade(f64::NAN), PerformanceGrade::NeedsImprovement);
    }

    #[test]
    fn grade_is_monotonic() {
        let bands = GradeBands::default();
        let mut prev = bands.grade(-1000.0);
        let mut x = -1000.0;
        while x < 2000.0 {
            let g = bands.grade(x);
            assert!(g >= prev, "grade dropped at {x}");
            prev = g;
            x += 12.5;
        }
    }

    #[test]
    fn bands_reject_decreasing_thresholds() {
        assert!(GradeBands::new(10.0, 5.0, 20.0).is_err());
        assert!(GradeBands::new(10.0, 20.0, f64::NAN).is_err());
        assert!(GradeBands::new(10.0, 10.0, 10.0).is_ok());
    }

    #[test]
    fn metrics_serialize_with_record_names() {
        let m = compute_metrics(&[task("a", 100.0, 10.0)], &GradeBands::default());
        let v = serde_json::to_value(m).unwrap();
        assert_eq!(v["averageROI"], 10.0);
        assert_eq!(v["performanceGrade"], "Needs Improvement");
        assert_eq!(v["timeEfficiencyPct"], 0.0);
    }
}
