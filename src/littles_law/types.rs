use std::collections::BTreeMap;

use serde::Serialize;

/// Per-stage slice of the capacity model: average dwell, the WIP implied
/// by Little's Law, and a recommended limit with buffer applied.
#[derive(Debug, Clone, Serialize)]
pub struct StageMetric {
    pub stage: String,
    pub avg_time_days: f64,
    /// `throughput_per_day * avg_time_days`.
    pub wip: f64,
    /// `ceil(wip * buffer)` — ceiling is the fixed rounding policy.
    pub recommended_limit: u32,
    pub items: u64,
}

/// Rolling throughput baseline over prior periods with data.
#[derive(Debug, Clone, Serialize)]
pub struct HistoricalBaseline {
    pub periods_analyzed: u32,
    pub period_keys: Vec<String>,
    pub avg_throughput_per_period: f64,
    pub avg_throughput_per_day: f64,
    pub min_throughput: u64,
    pub max_throughput: u64,
    /// Sample stdev across per-period counts; absent below 2 periods.
    pub throughput_stdev: Option<f64>,
    pub avg_lead_time_days: Option<f64>,
}

/// Current period contextualized against the historical baseline.
#[derive(Debug, Clone, Serialize)]
pub struct CapacityAnalysis {
    pub baseline: HistoricalBaseline,
    /// `current_count / historical_avg_count * 100`.
    pub capacity_utilization_pct: f64,
    pub throughput_vs_baseline_pct: f64,
    pub lead_time_vs_baseline_pct: Option<f64>,
}

/// Planned-vs-delivered reconciliation from explicit commitment flags.
#[derive(Debug, Clone, Serialize)]
pub struct PlanningMetrics {
    pub committed: u64,
    pub uncommitted: u64,
    pub post_period_additions: u64,
    pub delivered_committed: u64,
    pub missed_committed: u64,
    /// `delivered_committed / committed * 100`; 0 when nothing was
    /// committed.
    pub planning_accuracy_pct: f64,
    /// Missed committed items grouped by team.
    pub missed_by_team: BTreeMap<String, u64>,
    /// True when the overall miss rate exceeds the configured threshold.
    pub systemic_miss: bool,
}

/// Flow-health classification from average lead time and flow efficiency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Success,
    Info,
    Warning,
    Critical,
}

/// The reconciled capacity model for one scope and period.
///
/// `predicted_wip` equals `throughput_per_day * avg_lead_time_days` by
/// construction; the observed (sampled) WIP lives in `FlowSnapshot` and is
/// deliberately not restated here.
#[derive(Debug, Clone, Serialize)]
pub struct LittlesLawMetrics {
    pub period: String,
    pub scope: String,
    pub completed_count: u64,
    /// λ — items resolved per day of the period.
    pub throughput_per_day: f64,
    /// W — mean lead time of the same completed set.
    pub avg_lead_time_days: f64,
    /// L = λ·W.
    pub predicted_wip: f64,
    pub flow_efficiency_pct: f64,
    pub stage_metrics: Vec<StageMetric>,
    /// λ · target lead time.
    pub optimal_wip: f64,
    /// `predicted_wip - optimal_wip`; negative means headroom, the sign is
    /// meaningful and never clamped.
    pub wip_reduction: f64,
    /// Absent when no prior period had data.
    pub capacity_analysis: Option<CapacityAnalysis>,
    pub planning: PlanningMetrics,
    pub severity: Severity,
    pub warnings: Vec<String>,
}
