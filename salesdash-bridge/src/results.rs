//! Structured operation results.
//!
//! The presentation layer never receives free-form text: each operation
//! answers with one of these variants, serialized with a `type` tag.

use serde::Serialize;

use salesdash_pipeline::abc::AbcAssignment;
use salesdash_pipeline::anomaly::AnomalyFlag;
use salesdash_pipeline::breakdown::Breakdown;
use salesdash_pipeline::demand::{DemandDimension, DemandScore};
use salesdash_pipeline::forecast::{ForecastResult, ScenarioProjection};
use salesdash_pipeline::kpi::{KpiDelta, KpiResult};
use salesdash_pipeline::pipelines::dashboard::DashboardReport;
use salesdash_pipeline::time_series::TimeSeriesAnalysis;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum OperationResult {
    KpiSummary { kpis: KpiResult, delta: KpiDelta },

    AbcTiers { assignment: AbcAssignment },

    Series { analysis: TimeSeriesAnalysis },

    AnomalyFlags { flags: Vec<AnomalyFlag>, flagged: usize },

    DemandRanking {
        dimension: DemandDimension,
        scores: Vec<DemandScore>,
    },

    Projection {
        forecast: ForecastResult,
        revenue: ScenarioProjection,
    },

    Breakdowns { breakdown: Breakdown },

    Dashboard { report: Box<DashboardReport> },
}

impl OperationResult {
    /// Short one-line summary for logs and the audit trail.
    pub fn summary(&self) -> String {
        match self {
            OperationResult::KpiSummary { kpis, .. } => {
                format!("{} records, sales {:.2}", kpis.record_count, kpis.total_sales)
            }
            OperationResult::AbcTiers { assignment } => {
                format!("{} products ranked", assignment.products.len())
            }
            OperationResult::Series { analysis } => {
                format!("{} {} buckets", analysis.buckets.len(), analysis.granularity)
            }
            OperationResult::AnomalyFlags { flags, flagged } => {
                format!("{} of {} flagged", flagged, flags.len())
            }
            OperationResult::DemandRanking { dimension, scores } => {
                format!("{} {} entries", scores.len(), dimension)
            }
            OperationResult::Projection { forecast, .. } => {
                format!("{} forecast points", forecast.points.len())
            }
            OperationResult::Breakdowns { breakdown } => {
                format!("{} categories", breakdown.categories.len())
            }
            OperationResult::Dashboard { report } => {
                format!("dashboard of {} records", report.kpis.record_count)
            }
        }
    }
}
