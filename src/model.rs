use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::date_util::days_inclusive;
use crate::error::{Error, Result};
use crate::period::Period;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Statuses that imply an item reached a terminal state. A record carrying
/// one of these without a resolution timestamp is malformed.
const TERMINAL_STATUSES: &[&str] = &["done", "closed", "resolved", "completed"];

/// Commitment classification recorded at planning time.
///
/// These are explicit flags supplied by the ingestion collaborator, never
/// inferred from dates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Commitment {
    Committed,
    #[default]
    Uncommitted,
    PostPeriodAddition,
}

/// One work item's full stage history, as normalized by the ingestion
/// collaborator. Immutable input to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleRecord {
    pub key: String,
    pub item_type: String,
    pub status: String,
    pub created_at: NaiveDateTime,
    /// First transition into an in-progress state; basis for cycle time.
    pub started_at: Option<NaiveDateTime>,
    pub resolved_at: Option<NaiveDateTime>,
    /// Days spent in each workflow stage. Zero dwell means the stage was
    /// never entered.
    pub stage_days: BTreeMap<String, f64>,
    /// Current stage from transition history, when the ingester has it.
    /// Absent, the engine falls back to a stage-ordering heuristic.
    pub current_stage: Option<String>,
    pub team: Option<String>,
    pub train: Option<String>,
    pub commitment: Commitment,
}

impl LifecycleRecord {
    pub fn new(
        key: impl Into<String>,
        item_type: impl Into<String>,
        status: impl Into<String>,
        created_at: NaiveDateTime,
    ) -> Self {
        Self {
            key: key.into(),
            item_type: item_type.into(),
            status: status.into(),
            created_at,
            started_at: None,
            resolved_at: None,
            stage_days: BTreeMap::new(),
            current_stage: None,
            team: None,
            train: None,
            commitment: Commitment::default(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved_at.is_some()
    }

    pub fn resolved_date(&self) -> Option<NaiveDate> {
        self.resolved_at.map(|t| t.date())
    }

    /// Elapsed time from creation to resolution, in fractional days.
    pub fn lead_time_days(&self) -> Option<f64> {
        self.resolved_at
            .map(|r| (r - self.created_at).num_seconds() as f64 / SECONDS_PER_DAY)
    }

    /// Elapsed time from start of active work to resolution, in fractional
    /// days. Absent when the item never recorded a work start.
    pub fn cycle_time_days(&self) -> Option<f64> {
        match (self.started_at, self.resolved_at) {
            (Some(s), Some(r)) => Some((r - s).num_seconds() as f64 / SECONDS_PER_DAY),
            _ => None,
        }
    }

    /// Whether the item counts as in progress on day `d`: created on or
    /// before `d` and not resolved before `d`.
    pub fn in_progress_on(&self, d: NaiveDate) -> bool {
        self.created_at.date() <= d && self.resolved_date().is_none_or(|r| r >= d)
    }

    /// The stage the item currently sits in. The explicit field wins when
    /// the ingester supplied it; otherwise the last stage in the canonical
    /// ordering with nonzero dwell. Stages outside the ordering are never
    /// inferred as current.
    pub fn current_stage<'a>(&'a self, stage_order: &'a [String]) -> Option<&'a str> {
        if let Some(ref s) = self.current_stage {
            return Some(s.as_str());
        }
        stage_order
            .iter()
            .rev()
            .find(|s| self.stage_days.get(s.as_str()).is_some_and(|d| *d > 0.0))
            .map(|s| s.as_str())
    }

    fn has_terminal_status(&self) -> bool {
        let status = self.status.to_lowercase();
        TERMINAL_STATUSES.contains(&status.as_str())
    }

    /// Validate structural invariants. `Err` means the record must be
    /// excluded from computation, not that the batch fails.
    fn check(&self) -> Result<()> {
        if self.has_terminal_status() && self.resolved_at.is_none() {
            return Err(Error::MalformedRecord {
                key: self.key.clone(),
                message: format!("status '{}' implies completion but no resolution timestamp", self.status),
            });
        }
        if let Some(r) = self.resolved_at {
            if r < self.created_at {
                return Err(Error::MalformedRecord {
                    key: self.key.clone(),
                    message: "resolved before created".into(),
                });
            }
            if self.started_at.is_some_and(|s| s > r) {
                return Err(Error::MalformedRecord {
                    key: self.key.clone(),
                    message: "work started after resolution".into(),
                });
            }
        }
        for (stage, days) in &self.stage_days {
            if !days.is_finite() || *days < 0.0 {
                return Err(Error::MalformedRecord {
                    key: self.key.clone(),
                    message: format!("invalid duration {days} for stage '{stage}'"),
                });
            }
        }
        Ok(())
    }
}

/// Split a batch into usable records and warnings for the excluded ones.
/// A malformed record never aborts the batch.
pub fn validate_records(records: &[LifecycleRecord]) -> (Vec<&LifecycleRecord>, Vec<String>) {
    let mut valid = Vec::with_capacity(records.len());
    let mut warnings = Vec::new();
    for record in records {
        match record.check() {
            Ok(()) => valid.push(record),
            Err(e) => {
                log::warn!("excluding record: {e}");
                warnings.push(e.to_string());
            }
        }
    }
    (valid, warnings)
}

/// An analysis interval with inclusive endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub label: String,
}

impl TimeWindow {
    pub fn new(start: NaiveDate, end: NaiveDate, label: impl Into<String>) -> Result<Self> {
        if end < start {
            return Err(Error::Config(format!("window ends ({end}) before it starts ({start})")));
        }
        Ok(Self { start, end, label: label.into() })
    }

    pub fn from_period(period: &Period) -> Self {
        let (start, end) = period.date_range();
        Self { start, end, label: period.to_key() }
    }

    pub fn contains(&self, d: NaiveDate) -> bool {
        d >= self.start && d <= self.end
    }

    /// Window length in calendar days, counting both endpoints.
    pub fn duration_days(&self) -> f64 {
        days_inclusive(self.start, self.end) as f64
    }
}

/// Analysis scope: everything, one team, or one train.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    All,
    Team(String),
    Train(String),
}

impl Scope {
    pub fn matches(&self, record: &LifecycleRecord) -> bool {
        match self {
            Scope::All => true,
            Scope::Team(t) => record.team.as_deref() == Some(t.as_str()),
            Scope::Train(t) => record.train.as_deref() == Some(t.as_str()),
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scope::All => write!(f, "all"),
            Scope::Team(t) => write!(f, "team:{t}"),
            Scope::Train(t) => write!(f, "train:{t}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(12, 0, 0).unwrap()
    }

    #[test]
    fn test_lead_time_days() {
        let mut r = LifecycleRecord::new("FLOW-1", "story", "Done", dt(2026, 1, 1));
        assert_eq!(r.lead_time_days(), None);
        r.resolved_at = Some(dt(2026, 1, 11));
        assert_eq!(r.lead_time_days(), Some(10.0));
    }

    #[test]
    fn test_cycle_time_requires_start() {
        let mut r = LifecycleRecord::new("FLOW-1", "story", "Done", dt(2026, 1, 1));
        r.resolved_at = Some(dt(2026, 1, 11));
        assert_eq!(r.cycle_time_days(), None);
        r.started_at = Some(dt(2026, 1, 5));
        assert_eq!(r.cycle_time_days(), Some(6.0));
    }

    #[test]
    fn test_in_progress_on() {
        let mut r = LifecycleRecord::new("FLOW-1", "story", "In Progress", dt(2026, 1, 5));
        let day = |d| NaiveDate::from_ymd_opt(2026, 1, d).unwrap();
        assert!(!r.in_progress_on(day(4)));
        assert!(r.in_progress_on(day(5)));
        assert!(r.in_progress_on(day(20)));

        r.resolved_at = Some(dt(2026, 1, 10));
        assert!(r.in_progress_on(day(10)));
        assert!(!r.in_progress_on(day(11)));
    }

    #[test]
    fn test_current_stage_explicit_wins() {
        let order = vec!["analysis".to_string(), "build".to_string(), "review".to_string()];
        let mut r = LifecycleRecord::new("FLOW-1", "story", "In Progress", dt(2026, 1, 1));
        r.stage_days.insert("analysis".into(), 2.0);
        r.stage_days.insert("review".into(), 1.0);
        assert_eq!(r.current_stage(&order), Some("review"));

        r.current_stage = Some("build".into());
        assert_eq!(r.current_stage(&order), Some("build"));
    }

    #[test]
    fn test_current_stage_ignores_unknown_stages() {
        let order = vec!["analysis".to_string(), "build".to_string()];
        let mut r = LifecycleRecord::new("FLOW-1", "story", "In Progress", dt(2026, 1, 1));
        r.stage_days.insert("weird-stage".into(), 9.0);
        assert_eq!(r.current_stage(&order), None);
        r.stage_days.insert("analysis".into(), 1.0);
        assert_eq!(r.current_stage(&order), Some("analysis"));
    }

    #[test]
    fn test_validate_excludes_terminal_without_resolution() {
        let good = {
            let mut r = LifecycleRecord::new("FLOW-1", "story", "Done", dt(2026, 1, 1));
            r.resolved_at = Some(dt(2026, 1, 3));
            r
        };
        let bad = LifecycleRecord::new("FLOW-2", "story", "Done", dt(2026, 1, 1));
        let records = [good, bad];
        let (valid, warnings) = validate_records(&records);
        assert_eq!(valid.len(), 1);
        assert_eq!(valid[0].key, "FLOW-1");
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("FLOW-2"));
    }

    #[test]
    fn test_validate_excludes_negative_durations() {
        let mut r = LifecycleRecord::new("FLOW-1", "story", "In Progress", dt(2026, 1, 1));
        r.stage_days.insert("build".into(), -1.0);
        let records = [r];
        let (valid, warnings) = validate_records(&records);
        assert!(valid.is_empty());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_validate_excludes_resolved_before_created() {
        let mut r = LifecycleRecord::new("FLOW-1", "story", "Done", dt(2026, 2, 1));
        r.resolved_at = Some(dt(2026, 1, 1));
        let records = [r];
        let (valid, warnings) = validate_records(&records);
        assert!(valid.is_empty());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_window_rejects_inverted_range() {
        let start = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        assert!(TimeWindow::new(start, end, "bad").is_err());
        assert!(TimeWindow::new(end, start, "ok").is_ok());
    }

    #[test]
    fn test_window_duration_counts_both_endpoints() {
        let w = TimeWindow::from_period(&Period::Month(2026, 2));
        assert_eq!(w.duration_days(), 28.0);
        assert_eq!(w.label, "2026-02");
    }

    #[test]
    fn test_scope_matches() {
        let mut r = LifecycleRecord::new("FLOW-1", "story", "In Progress", dt(2026, 1, 1));
        r.team = Some("payments".into());
        r.train = Some("platform".into());

        assert!(Scope::All.matches(&r));
        assert!(Scope::Team("payments".into()).matches(&r));
        assert!(!Scope::Team("checkout".into()).matches(&r));
        assert!(Scope::Train("platform".into()).matches(&r));
        assert!(!Scope::Train("mobile".into()).matches(&r));
    }
}
