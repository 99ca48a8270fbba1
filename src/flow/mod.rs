pub mod types;

pub use types::*;

use std::collections::BTreeMap;

use chrono::Duration;

use crate::error::{Error, Result};
use crate::model::{validate_records, LifecycleRecord, Scope, TimeWindow};
use crate::stats;

/// Compute flow metrics for a scope and time window.
///
/// Completed-in-window means resolved with the resolution date inside the
/// window. Items without a terminal state never enter lead/cycle-time
/// statistics but still count toward WIP. Malformed records are excluded
/// and reported through the snapshot's warnings.
pub fn calculate(
    records: &[LifecycleRecord],
    window: &TimeWindow,
    scope: &Scope,
) -> Result<FlowSnapshot> {
    if window.end < window.start {
        return Err(Error::Config(format!(
            "window ends ({}) before it starts ({})",
            window.end, window.start
        )));
    }

    let (records, warnings) = validate_records(records);
    let records: Vec<&LifecycleRecord> =
        records.into_iter().filter(|r| scope.matches(r)).collect();

    let completed: Vec<&LifecycleRecord> = records
        .iter()
        .copied()
        .filter(|r| r.resolved_date().is_some_and(|d| window.contains(d)))
        .collect();

    let duration_days = window.duration_days();
    let throughput_per_day = if duration_days > 0.0 {
        completed.len() as f64 / duration_days
    } else {
        0.0
    };

    let avg_wip = average_wip(&records, window);

    let lead_times: Vec<f64> = completed.iter().filter_map(|r| r.lead_time_days()).collect();
    let cycle_times: Vec<f64> = completed.iter().filter_map(|r| r.cycle_time_days()).collect();

    Ok(FlowSnapshot {
        scope: scope.to_string(),
        window: window.label.clone(),
        completed_count: completed.len() as u64,
        throughput_per_day,
        avg_wip,
        lead_time: DistributionSummary::from_samples(&lead_times),
        cycle_time: DistributionSummary::from_samples(&cycle_times),
        by_type: breakdown_by_type(&completed, duration_days),
        warnings,
    })
}

/// Average WIP over the window, sampled once per calendar day. Day-granular
/// sampling (not event-based integration) is the fixed, reproducible
/// definition.
fn average_wip(records: &[&LifecycleRecord], window: &TimeWindow) -> f64 {
    let mut daily_counts = Vec::new();
    let mut day = window.start;
    while day <= window.end {
        let count = records.iter().filter(|r| r.in_progress_on(day)).count();
        daily_counts.push(count as f64);
        day += Duration::days(1);
    }
    stats::mean(&daily_counts).unwrap_or(0.0)
}

fn breakdown_by_type(
    completed: &[&LifecycleRecord],
    duration_days: f64,
) -> BTreeMap<String, TypeBreakdown> {
    let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for record in completed {
        if let Some(lead) = record.lead_time_days() {
            groups.entry(record.item_type.as_str()).or_default().push(lead);
        }
    }

    groups
        .into_iter()
        .map(|(item_type, leads)| {
            let count = leads.len() as u64;
            let throughput = if duration_days > 0.0 {
                count as f64 / duration_days
            } else {
                0.0
            };
            let breakdown = TypeBreakdown {
                completed: count,
                throughput_per_day: throughput,
                avg_lead_time_days: stats::mean(&leads).unwrap_or(0.0),
            };
            (item_type.to_string(), breakdown)
        })
        .collect()
}
