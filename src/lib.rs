pub mod bottleneck;
pub mod config;
pub mod date_util;
pub mod error;
pub mod flow;
pub mod littles_law;
pub mod model;
pub mod period;
pub mod source;
pub mod stats;

pub use bottleneck::{BottleneckReport, BottleneckScore, MultiStageStuckItem, StuckItemRecord};
pub use config::{AnalyticsConfig, SeverityThresholds};
pub use error::{Error, Result};
pub use flow::{DistributionSummary, FlowSnapshot, TypeBreakdown};
pub use littles_law::{
    CapacityAnalysis, HistoricalBaseline, LittlesLawMetrics, PlanningMetrics, Severity,
    StageMetric,
};
pub use model::{Commitment, LifecycleRecord, Scope, TimeWindow};
pub use period::Period;
pub use source::{InMemorySource, RecordSource};

use serde::Serialize;

/// All three engine outputs for one scope and period, ready for a report
/// or insight layer. An insufficient Little's Law sample degrades to
/// `None` with a warning instead of failing the bundle.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisBundle {
    pub period: String,
    pub scope: String,
    pub snapshot: FlowSnapshot,
    pub littles_law: Option<LittlesLawMetrics>,
    pub bottlenecks: BottleneckReport,
    pub warnings: Vec<String>,
}

/// Main entry point: flow analytics over an injected record source.
///
/// Holds no mutable state; every computation is a pure function of the
/// fetched records and the configuration, so a shared reference can be
/// used from multiple tasks concurrently.
pub struct FlowAnalytics<S> {
    source: S,
    config: AnalyticsConfig,
}

impl<S: RecordSource> FlowAnalytics<S> {
    pub fn new(source: S, config: AnalyticsConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Flow metrics (throughput, WIP, lead/cycle distributions) for a
    /// scope over a period.
    pub async fn flow_snapshot(&self, scope: &Scope, period: &Period) -> Result<FlowSnapshot> {
        let records = self.source.fetch_lifecycle_records(scope, period).await?;
        flow::calculate(&records, &TimeWindow::from_period(period), scope)
    }

    /// The reconciled Little's Law capacity model, contextualized against
    /// the historical baseline when prior periods have data.
    pub async fn littles_law(&self, scope: &Scope, period: &Period) -> Result<LittlesLawMetrics> {
        let records = self.source.fetch_lifecycle_records(scope, period).await?;
        let baseline =
            littles_law::historical_baseline(&self.source, scope, period, &self.config).await;
        littles_law::calculate(&records, scope, period, &self.config, baseline)
    }

    /// Stage congestion scores plus stuck-item signals.
    pub async fn bottlenecks(&self, scope: &Scope, period: &Period) -> Result<BottleneckReport> {
        let records = self.source.fetch_lifecycle_records(scope, period).await?;
        Ok(bottleneck::analyze(&records, &self.config))
    }

    /// Run the full engine over one fetch: snapshot, capacity model, and
    /// bottleneck report.
    pub async fn analyze(&self, scope: &Scope, period: &Period) -> Result<AnalysisBundle> {
        let records = self.source.fetch_lifecycle_records(scope, period).await?;
        let window = TimeWindow::from_period(period);

        let snapshot = flow::calculate(&records, &window, scope)?;
        let bottlenecks = bottleneck::analyze(&records, &self.config);

        let mut warnings = Vec::new();
        let baseline =
            littles_law::historical_baseline(&self.source, scope, period, &self.config).await;
        let littles = match littles_law::calculate(&records, scope, period, &self.config, baseline)
        {
            Ok(metrics) => Some(metrics),
            Err(Error::InsufficientData { required, actual }) => {
                log::warn!(
                    "capacity model unavailable for {scope} {period}: {actual} completed items, {required} required"
                );
                warnings.push(format!(
                    "capacity model unavailable: {actual} completed items, {required} required"
                ));
                None
            }
            Err(e) => return Err(e),
        };

        Ok(AnalysisBundle {
            period: period.to_key(),
            scope: scope.to_string(),
            snapshot,
            littles_law: littles,
            bottlenecks,
            warnings,
        })
    }
}
