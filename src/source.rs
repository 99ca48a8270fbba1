use std::collections::BTreeMap;

use crate::error::Result;
use crate::model::{LifecycleRecord, Scope};
use crate::period::Period;

/// Data-access contract implemented by an ingestion collaborator.
///
/// The engine depends only on this interface — it knows nothing about the
/// tracker, transport, or storage behind it. Timeout, retry, and
/// cancellation policy belong to implementations, not to the computation
/// core.
pub trait RecordSource {
    /// All lifecycle records for a scope and period.
    async fn fetch_lifecycle_records(
        &self,
        scope: &Scope,
        period: &Period,
    ) -> Result<Vec<LifecycleRecord>>;

    /// Records backing historical throughput lookups. Implementations may
    /// return a pre-filtered completed set; the analyzer re-filters by
    /// resolution date either way.
    async fn fetch_period_throughput(
        &self,
        scope: &Scope,
        period: &Period,
    ) -> Result<Vec<LifecycleRecord>>;
}

/// In-memory source keyed by period, for tests and embedding callers.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    by_period: BTreeMap<String, Vec<LifecycleRecord>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register records under a period. Repeated inserts for the same
    /// period append.
    pub fn insert(&mut self, period: &Period, records: Vec<LifecycleRecord>) {
        self.by_period
            .entry(period.to_key())
            .or_default()
            .extend(records);
    }

    fn scoped(&self, scope: &Scope, period: &Period) -> Vec<LifecycleRecord> {
        self.by_period
            .get(&period.to_key())
            .map(|records| {
                records
                    .iter()
                    .filter(|r| scope.matches(r))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl RecordSource for InMemorySource {
    async fn fetch_lifecycle_records(
        &self,
        scope: &Scope,
        period: &Period,
    ) -> Result<Vec<LifecycleRecord>> {
        Ok(self.scoped(scope, period))
    }

    async fn fetch_period_throughput(
        &self,
        scope: &Scope,
        period: &Period,
    ) -> Result<Vec<LifecycleRecord>> {
        Ok(self.scoped(scope, period))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(key: &str, team: &str) -> LifecycleRecord {
        let created = NaiveDate::from_ymd_opt(2026, 1, 5)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let mut r = LifecycleRecord::new(key, "story", "In Progress", created);
        r.team = Some(team.to_string());
        r
    }

    #[tokio::test]
    async fn test_in_memory_source_scoping() {
        let period = Period::Quarter(2026, 1);
        let mut source = InMemorySource::new();
        source.insert(
            &period,
            vec![record("FLOW-1", "payments"), record("FLOW-2", "checkout")],
        );

        let all = source
            .fetch_lifecycle_records(&Scope::All, &period)
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        let payments = source
            .fetch_lifecycle_records(&Scope::Team("payments".into()), &period)
            .await
            .unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].key, "FLOW-1");
    }

    #[tokio::test]
    async fn test_in_memory_source_unknown_period_is_empty() {
        let source = InMemorySource::new();
        let records = source
            .fetch_period_throughput(&Scope::All, &Period::Quarter(2025, 4))
            .await
            .unwrap();
        assert!(records.is_empty());
    }
}
