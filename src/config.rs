use std::collections::{BTreeMap, BTreeSet};

/// Threshold ladder for classifying a period's flow health from average
/// lead time (days) and flow efficiency (percent).
#[derive(Debug, Clone)]
pub struct SeverityThresholds {
    pub lead_time_critical: f64,
    pub lead_time_warning: f64,
    pub lead_time_info: f64,
    pub efficiency_critical: f64,
    pub efficiency_warning: f64,
    pub efficiency_info: f64,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self {
            lead_time_critical: 60.0,
            lead_time_warning: 45.0,
            lead_time_info: 30.0,
            efficiency_critical: 30.0,
            efficiency_warning: 40.0,
            efficiency_info: 50.0,
        }
    }
}

/// All thresholds, stage policy, and lookback settings the engine needs.
/// Passed explicitly into every entry point; the engine reads nothing from
/// the environment and keeps no global state.
///
/// The stage lists are business policy and vary by organization; the
/// defaults describe a common kanban board and exist so small callers can
/// start without ceremony.
#[derive(Debug, Clone)]
pub struct AnalyticsConfig {
    /// Global stuck threshold: an item strictly over this many days in a
    /// stage is stuck.
    pub stuck_threshold_days: f64,
    /// Per-stage overrides for `stuck_threshold_days`.
    pub stage_thresholds: BTreeMap<String, f64>,
    /// Expected dwell per stage. A stage listed here is scored against its
    /// expectation; unlisted stages use the threshold-based fallback score.
    pub expected_stage_days: BTreeMap<String, f64>,
    /// Canonical stage ordering, used to infer an item's current stage when
    /// the ingester does not supply one.
    pub stage_order: Vec<String>,
    /// Stages counted as value-adding for flow efficiency.
    pub active_stages: BTreeSet<String>,
    /// Target lead time for the optimal-WIP computation.
    pub target_lead_time_days: f64,
    /// How many prior periods the historical capacity baseline walks.
    pub lookback_periods: u32,
    /// Minimum completed items for a Little's Law computation.
    pub min_sample_size: usize,
    /// Multiplier applied to stage WIP when recommending a limit.
    pub wip_limit_buffer: f64,
    /// Override for the period length used as the throughput denominator.
    /// Defaults to the period's calendar length.
    pub period_duration_days: Option<f64>,
    /// Overall committed-miss rate (percent) above which the miss pattern
    /// is flagged systemic.
    pub systemic_miss_threshold_pct: f64,
    pub severity: SeverityThresholds,
}

impl AnalyticsConfig {
    /// Stuck threshold for a stage: per-stage override or the global value.
    pub fn stage_threshold(&self, stage: &str) -> f64 {
        self.stage_thresholds
            .get(stage)
            .copied()
            .unwrap_or(self.stuck_threshold_days)
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        let stage_order = ["backlog", "analysis", "in_progress", "review", "testing"];
        let active = ["in_progress", "review", "testing"];
        Self {
            stuck_threshold_days: 5.0,
            stage_thresholds: BTreeMap::new(),
            expected_stage_days: BTreeMap::new(),
            stage_order: stage_order.iter().map(|s| s.to_string()).collect(),
            active_stages: active.iter().map(|s| s.to_string()).collect(),
            target_lead_time_days: 30.0,
            lookback_periods: 3,
            min_sample_size: 5,
            wip_limit_buffer: 1.2,
            period_duration_days: None,
            systemic_miss_threshold_pct: 30.0,
            severity: SeverityThresholds::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_threshold_override() {
        let mut config = AnalyticsConfig::default();
        config.stage_thresholds.insert("review".into(), 2.0);
        assert_eq!(config.stage_threshold("review"), 2.0);
        assert_eq!(config.stage_threshold("testing"), 5.0);
    }
}
