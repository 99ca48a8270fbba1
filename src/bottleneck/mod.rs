use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::config::AnalyticsConfig;
use crate::model::{validate_records, LifecycleRecord};

/// Congestion signal for one workflow stage. Higher score = worse.
#[derive(Debug, Clone, Serialize)]
pub struct BottleneckScore {
    pub stage: String,
    pub score: f64,
    pub mean_time_days: f64,
    pub max_time_days: f64,
    pub items_exceeding_threshold: u64,
    pub total_items: u64,
}

/// One unresolved item sitting over threshold in one stage. An item stuck
/// in several stages produces one record per stage.
#[derive(Debug, Clone, Serialize)]
pub struct StuckItemRecord {
    pub key: String,
    pub stage: String,
    pub days_in_stage: f64,
    /// Whether this is the item's current stage (explicit field from the
    /// ingester, else the stage-ordering heuristic).
    pub current: bool,
}

/// An item stuck in two or more distinct stages — a hidden-dependency
/// signal, independent of the per-stage scores.
#[derive(Debug, Clone, Serialize)]
pub struct MultiStageStuckItem {
    pub key: String,
    pub stage_count: u64,
    pub total_stuck_days: f64,
    pub stages: Vec<String>,
}

/// Everything the detector produces for one record set.
#[derive(Debug, Clone, Serialize)]
pub struct BottleneckReport {
    pub scores: Vec<BottleneckScore>,
    pub stuck_items: Vec<StuckItemRecord>,
    pub multi_stage_stuck: Vec<MultiStageStuckItem>,
    pub warnings: Vec<String>,
}

/// Run the full detector: stage scores, stuck items, and the multi-stage
/// aggregation, with validation warnings attached.
pub fn analyze(records: &[LifecycleRecord], config: &AnalyticsConfig) -> BottleneckReport {
    let (valid, warnings) = validate_records(records);
    let stuck_items = stuck_items_of(&valid, config);
    BottleneckReport {
        scores: scores_of(&valid, config),
        multi_stage_stuck: find_multi_stage_stuck(&stuck_items),
        stuck_items,
        warnings,
    }
}

/// Score each workflow stage for congestion, worst first. Stages with no
/// positive dwell observations are skipped entirely — absence of data is
/// not evidence of health.
pub fn score_stages(records: &[LifecycleRecord], config: &AnalyticsConfig) -> Vec<BottleneckScore> {
    let (valid, _) = validate_records(records);
    scores_of(&valid, config)
}

/// Find unresolved items strictly over threshold in any stage. An item
/// exactly at threshold is not stuck.
pub fn find_stuck_items(
    records: &[LifecycleRecord],
    config: &AnalyticsConfig,
) -> Vec<StuckItemRecord> {
    let (valid, _) = validate_records(records);
    stuck_items_of(&valid, config)
}

/// Group stuck records by item; items stuck in two or more distinct stages
/// are reported once, with the stage count and the summed stuck days.
pub fn find_multi_stage_stuck(stuck: &[StuckItemRecord]) -> Vec<MultiStageStuckItem> {
    let mut by_key: BTreeMap<&str, (BTreeSet<&str>, f64)> = BTreeMap::new();
    for record in stuck {
        let entry = by_key.entry(record.key.as_str()).or_default();
        entry.0.insert(record.stage.as_str());
        entry.1 += record.days_in_stage;
    }

    let mut items: Vec<MultiStageStuckItem> = by_key
        .into_iter()
        .filter(|(_, (stages, _))| stages.len() >= 2)
        .map(|(key, (stages, total))| MultiStageStuckItem {
            key: key.to_string(),
            stage_count: stages.len() as u64,
            total_stuck_days: total,
            stages: stages.iter().map(|s| s.to_string()).collect(),
        })
        .collect();
    items.sort_by(|a, b| {
        b.total_stuck_days
            .total_cmp(&a.total_stuck_days)
            .then_with(|| a.key.cmp(&b.key))
    });
    items
}

#[derive(Default)]
struct StageAccumulator {
    sum: f64,
    max: f64,
    count: u64,
    exceeding: u64,
}

fn scores_of(records: &[&LifecycleRecord], config: &AnalyticsConfig) -> Vec<BottleneckScore> {
    let mut stages: BTreeMap<&str, StageAccumulator> = BTreeMap::new();
    for record in records {
        for (stage, days) in &record.stage_days {
            // Zero dwell means the stage was never entered.
            if *days <= 0.0 {
                continue;
            }
            let acc = stages.entry(stage.as_str()).or_default();
            acc.sum += days;
            acc.count += 1;
            acc.max = acc.max.max(*days);
            if *days > config.stage_threshold(stage) {
                acc.exceeding += 1;
            }
        }
    }

    let mut scores: Vec<BottleneckScore> = stages
        .into_iter()
        .map(|(stage, acc)| {
            let mean = acc.sum / acc.count as f64;
            let score = match config.expected_stage_days.get(stage) {
                Some(expected) if *expected > 0.0 => mean / expected * 100.0,
                _ => mean / 10.0 + acc.exceeding as f64 / acc.count as f64 * 100.0,
            };
            BottleneckScore {
                stage: stage.to_string(),
                score,
                mean_time_days: mean,
                max_time_days: acc.max,
                items_exceeding_threshold: acc.exceeding,
                total_items: acc.count,
            }
        })
        .collect();

    scores.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| b.items_exceeding_threshold.cmp(&a.items_exceeding_threshold))
            .then_with(|| a.stage.cmp(&b.stage))
    });
    scores
}

fn stuck_items_of(records: &[&LifecycleRecord], config: &AnalyticsConfig) -> Vec<StuckItemRecord> {
    let mut stuck = Vec::new();
    for record in records {
        if record.is_resolved() {
            continue;
        }
        let current_stage = record.current_stage(&config.stage_order);
        for (stage, days) in &record.stage_days {
            if *days > config.stage_threshold(stage) {
                stuck.push(StuckItemRecord {
                    key: record.key.clone(),
                    stage: stage.clone(),
                    days_in_stage: *days,
                    current: current_stage == Some(stage.as_str()),
                });
            }
        }
    }
    stuck.sort_by(|a, b| {
        b.days_in_stage
            .total_cmp(&a.days_in_stage)
            .then_with(|| a.key.cmp(&b.key))
            .then_with(|| a.stage.cmp(&b.stage))
    });
    stuck
}
