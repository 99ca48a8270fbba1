use std::collections::BTreeMap;

use serde::Serialize;

use crate::stats;

/// Summary statistics for a duration distribution, in days.
#[derive(Debug, Clone, Serialize)]
pub struct DistributionSummary {
    pub samples: u64,
    pub mean: f64,
    pub median: f64,
    pub p85: f64,
    pub p95: f64,
    /// Sample standard deviation; absent below 2 samples.
    pub stdev: Option<f64>,
    pub min: f64,
    pub max: f64,
}

impl DistributionSummary {
    /// Summarize a set of durations. `None` for an empty set — absent
    /// metrics are reported as absent, never as zeros.
    pub fn from_samples(xs: &[f64]) -> Option<Self> {
        if xs.is_empty() {
            return None;
        }
        Some(Self {
            samples: xs.len() as u64,
            mean: stats::mean(xs)?,
            median: stats::median(xs)?,
            p85: stats::percentile(xs, 0.85)?,
            p95: stats::percentile(xs, 0.95)?,
            stdev: stats::stdev(xs),
            min: stats::percentile(xs, 0.0)?,
            max: stats::percentile(xs, 1.0)?,
        })
    }
}

/// Throughput and lead time for one item type within a window.
#[derive(Debug, Clone, Serialize)]
pub struct TypeBreakdown {
    pub completed: u64,
    pub throughput_per_day: f64,
    pub avg_lead_time_days: f64,
}

/// Flow metrics for one scope and time window.
#[derive(Debug, Clone, Serialize)]
pub struct FlowSnapshot {
    pub scope: String,
    pub window: String,
    pub completed_count: u64,
    /// Items resolved per calendar day of the window.
    pub throughput_per_day: f64,
    /// Mean of one WIP sample per calendar day.
    pub avg_wip: f64,
    pub lead_time: Option<DistributionSummary>,
    pub cycle_time: Option<DistributionSummary>,
    /// Keyed by item type; only types actually present appear.
    pub by_type: BTreeMap<String, TypeBreakdown>,
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_empty_is_none() {
        assert!(DistributionSummary::from_samples(&[]).is_none());
    }

    #[test]
    fn test_summary_single_sample_has_no_stdev() {
        let s = DistributionSummary::from_samples(&[4.0]).unwrap();
        assert_eq!(s.samples, 1);
        assert_eq!(s.mean, 4.0);
        assert_eq!(s.median, 4.0);
        assert_eq!(s.min, 4.0);
        assert_eq!(s.max, 4.0);
        assert!(s.stdev.is_none());
    }

    #[test]
    fn test_summary_percentiles() {
        let xs: Vec<f64> = (1..=20).map(|i| i as f64).collect();
        let s = DistributionSummary::from_samples(&xs).unwrap();
        assert_eq!(s.p85, 17.0);
        assert_eq!(s.p95, 19.0);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 20.0);
        assert!(s.stdev.is_some());
    }
}
