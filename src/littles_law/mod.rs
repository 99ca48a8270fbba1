pub mod types;

pub use types::*;

use std::collections::BTreeMap;

use crate::config::{AnalyticsConfig, SeverityThresholds};
use crate::error::{Error, Result};
use crate::model::{validate_records, Commitment, LifecycleRecord, Scope, TimeWindow};
use crate::period::Period;
use crate::source::RecordSource;
use crate::stats;

/// Reconcile throughput, lead time, and WIP under Little's Law for one
/// scope and period.
///
/// λ, W, and L are all derived from the same completed-item set, so
/// `predicted_wip == throughput_per_day * avg_lead_time_days` holds
/// exactly. Fewer completed items than `min_sample_size` is an
/// [`Error::InsufficientData`], never a metrics object with near-zero
/// denominators. A missing historical baseline degrades to an absent
/// `capacity_analysis` section.
pub fn calculate(
    records: &[LifecycleRecord],
    scope: &Scope,
    period: &Period,
    config: &AnalyticsConfig,
    baseline: Option<HistoricalBaseline>,
) -> Result<LittlesLawMetrics> {
    if config.active_stages.is_empty() {
        return Err(Error::Config(
            "active_stages is empty; flow efficiency needs at least one active stage".into(),
        ));
    }
    let duration_days = config
        .period_duration_days
        .unwrap_or_else(|| period.duration_days());
    if duration_days <= 0.0 {
        return Err(Error::Config(format!(
            "period duration must be positive, got {duration_days}"
        )));
    }

    let (records, warnings) = validate_records(records);
    let records: Vec<&LifecycleRecord> =
        records.into_iter().filter(|r| scope.matches(r)).collect();

    let window = TimeWindow::from_period(period);
    let completed: Vec<&LifecycleRecord> = records
        .iter()
        .copied()
        .filter(|r| r.resolved_date().is_some_and(|d| window.contains(d)))
        .collect();

    if completed.len() < config.min_sample_size {
        return Err(Error::InsufficientData {
            required: config.min_sample_size,
            actual: completed.len(),
        });
    }

    let lead_times: Vec<f64> = completed.iter().filter_map(|r| r.lead_time_days()).collect();
    let throughput_per_day = completed.len() as f64 / duration_days;
    let avg_lead_time_days = stats::mean(&lead_times).unwrap_or(0.0);
    let predicted_wip = throughput_per_day * avg_lead_time_days;

    let flow_efficiency_pct = flow_efficiency(&completed, config);
    let stage_metrics = stage_metrics(&completed, throughput_per_day, config);

    let optimal_wip = throughput_per_day * config.target_lead_time_days;
    let wip_reduction = predicted_wip - optimal_wip;

    let capacity_analysis = baseline.and_then(|b| {
        capacity_analysis(
            b,
            completed.len() as u64,
            throughput_per_day,
            avg_lead_time_days,
        )
    });

    let planning = reconcile_planning(&records, &window, config);
    let severity = classify(avg_lead_time_days, flow_efficiency_pct, &config.severity);

    Ok(LittlesLawMetrics {
        period: period.to_key(),
        scope: scope.to_string(),
        completed_count: completed.len() as u64,
        throughput_per_day,
        avg_lead_time_days,
        predicted_wip,
        flow_efficiency_pct,
        stage_metrics,
        optimal_wip,
        wip_reduction,
        capacity_analysis,
        planning,
        severity,
        warnings,
    })
}

/// Walk the N periods immediately preceding `period` through the injected
/// source and aggregate a throughput baseline. Periods with no completed
/// items are skipped, not counted as zero; a failed fetch degrades to a
/// warning. `None` when no prior period qualifies.
pub async fn historical_baseline<S: RecordSource>(
    source: &S,
    scope: &Scope,
    period: &Period,
    config: &AnalyticsConfig,
) -> Option<HistoricalBaseline> {
    let mut counts: Vec<f64> = Vec::new();
    let mut per_day_rates: Vec<f64> = Vec::new();
    let mut lead_times: Vec<f64> = Vec::new();
    let mut period_keys: Vec<String> = Vec::new();

    let mut prior = period.clone();
    for _ in 0..config.lookback_periods {
        prior = prior.previous();
        let records = match source.fetch_period_throughput(scope, &prior).await {
            Ok(records) => records,
            Err(e) => {
                log::warn!("baseline: skipping period {prior}: {e}");
                continue;
            }
        };
        let (records, _) = validate_records(&records);
        let window = TimeWindow::from_period(&prior);
        let completed: Vec<&LifecycleRecord> = records
            .into_iter()
            .filter(|r| r.resolved_date().is_some_and(|d| window.contains(d)))
            .collect();
        if completed.is_empty() {
            log::debug!("baseline: no data for period {prior}");
            continue;
        }

        counts.push(completed.len() as f64);
        per_day_rates.push(completed.len() as f64 / prior.duration_days());
        lead_times.extend(completed.iter().filter_map(|r| r.lead_time_days()));
        period_keys.push(prior.to_key());
    }

    if counts.is_empty() {
        return None;
    }

    Some(HistoricalBaseline {
        periods_analyzed: counts.len() as u32,
        period_keys,
        avg_throughput_per_period: stats::mean(&counts).unwrap_or(0.0),
        avg_throughput_per_day: stats::mean(&per_day_rates).unwrap_or(0.0),
        min_throughput: counts.iter().fold(f64::INFINITY, |a, &b| a.min(b)) as u64,
        max_throughput: counts.iter().fold(0.0f64, |a, &b| a.max(b)) as u64,
        throughput_stdev: stats::stdev(&counts),
        avg_lead_time_days: stats::mean(&lead_times),
    })
}

/// Σ active-stage days / Σ lead-time days over the completed set, as a
/// percentage.
fn flow_efficiency(completed: &[&LifecycleRecord], config: &AnalyticsConfig) -> f64 {
    let mut active_sum = 0.0;
    let mut lead_sum = 0.0;
    for record in completed {
        let Some(lead) = record.lead_time_days() else {
            continue;
        };
        lead_sum += lead;
        active_sum += record
            .stage_days
            .iter()
            .filter(|(stage, _)| config.active_stages.contains(stage.as_str()))
            .map(|(_, days)| days)
            .sum::<f64>();
    }
    if lead_sum > 0.0 {
        active_sum / lead_sum * 100.0
    } else {
        0.0
    }
}

fn stage_metrics(
    completed: &[&LifecycleRecord],
    throughput_per_day: f64,
    config: &AnalyticsConfig,
) -> Vec<StageMetric> {
    let mut sums: BTreeMap<&str, (f64, u64)> = BTreeMap::new();
    for record in completed {
        for (stage, days) in &record.stage_days {
            if *days <= 0.0 {
                continue;
            }
            let entry = sums.entry(stage.as_str()).or_default();
            entry.0 += days;
            entry.1 += 1;
        }
    }

    let mut metrics: Vec<StageMetric> = sums
        .into_iter()
        .map(|(stage, (sum, count))| {
            let avg_time_days = sum / count as f64;
            let wip = throughput_per_day * avg_time_days;
            StageMetric {
                stage: stage.to_string(),
                avg_time_days,
                wip,
                recommended_limit: (wip * config.wip_limit_buffer).ceil() as u32,
                items: count,
            }
        })
        .collect();
    metrics.sort_by(|a, b| b.wip.total_cmp(&a.wip).then_with(|| a.stage.cmp(&b.stage)));
    metrics
}

fn capacity_analysis(
    baseline: HistoricalBaseline,
    current_count: u64,
    throughput_per_day: f64,
    avg_lead_time_days: f64,
) -> Option<CapacityAnalysis> {
    if baseline.periods_analyzed == 0 || baseline.avg_throughput_per_period <= 0.0 {
        return None;
    }
    let capacity_utilization_pct =
        current_count as f64 / baseline.avg_throughput_per_period * 100.0;
    let throughput_vs_baseline_pct = if baseline.avg_throughput_per_day > 0.0 {
        (throughput_per_day - baseline.avg_throughput_per_day) / baseline.avg_throughput_per_day
            * 100.0
    } else {
        0.0
    };
    let lead_time_vs_baseline_pct = baseline
        .avg_lead_time_days
        .filter(|b| *b > 0.0)
        .map(|b| (avg_lead_time_days - b) / b * 100.0);
    Some(CapacityAnalysis {
        baseline,
        capacity_utilization_pct,
        throughput_vs_baseline_pct,
        lead_time_vs_baseline_pct,
    })
}

/// Classify items by their planning-time commitment flags and reconcile
/// against what actually shipped inside the period.
fn reconcile_planning(
    records: &[&LifecycleRecord],
    window: &TimeWindow,
    config: &AnalyticsConfig,
) -> PlanningMetrics {
    let mut committed = 0u64;
    let mut uncommitted = 0u64;
    let mut post_period = 0u64;
    let mut delivered_committed = 0u64;
    let mut missed_by_team: BTreeMap<String, u64> = BTreeMap::new();

    for record in records {
        let delivered = record
            .resolved_date()
            .is_some_and(|d| window.contains(d));
        match record.commitment {
            Commitment::Committed => {
                committed += 1;
                if delivered {
                    delivered_committed += 1;
                } else {
                    let team = record.team.clone().unwrap_or_else(|| "unassigned".into());
                    *missed_by_team.entry(team).or_default() += 1;
                }
            }
            Commitment::Uncommitted => uncommitted += 1,
            Commitment::PostPeriodAddition => post_period += 1,
        }
    }

    let missed_committed = committed - delivered_committed;
    let planning_accuracy_pct = if committed > 0 {
        delivered_committed as f64 / committed as f64 * 100.0
    } else {
        0.0
    };
    let miss_rate_pct = if committed > 0 {
        missed_committed as f64 / committed as f64 * 100.0
    } else {
        0.0
    };

    PlanningMetrics {
        committed,
        uncommitted,
        post_period_additions: post_period,
        delivered_committed,
        missed_committed,
        planning_accuracy_pct,
        missed_by_team,
        systemic_miss: miss_rate_pct > config.systemic_miss_threshold_pct,
    }
}

fn classify(lead_time: f64, efficiency: f64, t: &SeverityThresholds) -> Severity {
    if lead_time > t.lead_time_critical || efficiency < t.efficiency_critical {
        Severity::Critical
    } else if lead_time > t.lead_time_warning || efficiency < t.efficiency_warning {
        Severity::Warning
    } else if lead_time > t.lead_time_info || efficiency < t.efficiency_info {
        Severity::Info
    } else {
        Severity::Success
    }
}
