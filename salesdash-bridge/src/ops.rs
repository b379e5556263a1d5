//! Analytics operations: the complete vocabulary a dashboard can request.
//!
//! A request that does not parse into one of these variants is rejected
//! before any computation runs. Adding an operation means handling it in
//! the protocol dispatch as well; the match there is exhaustive.

use serde::{Deserialize, Serialize};

use salesdash_pipeline::demand::{DemandDimension, DemandWeights};
use salesdash_pipeline::forecast::Scenario;
use salesdash_pipeline::pipelines::dashboard::DashboardOptions;
use salesdash_pipeline::types::{Granularity, Metric};
use salesdash_stats::defaults::{ANOMALY_Z_THRESHOLD, DEFAULT_TOP_K, FORECAST_DEFAULT_HORIZON};

/// Every analytics view the session can compute over the filtered table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "params")]
pub enum AnalyticsOperation {
    /// Headline metrics and their delta to the unfiltered table.
    Kpis,

    /// ABC tiers with stocking recommendations.
    Abc,

    /// Contiguous buckets, growth rates and seasonal decomposition.
    TimeSeries {
        #[serde(default = "default_granularity")]
        granularity: Granularity,
    },

    /// Z-score flags over periods, or over individual orders when
    /// `granularity` is absent.
    Anomalies {
        #[serde(default)]
        granularity: Option<Granularity>,
        #[serde(default)]
        metric: Metric,
        #[serde(default = "default_threshold")]
        threshold: f64,
    },

    /// Composite demand ranking by product or city.
    Demand {
        #[serde(default)]
        dimension: DemandDimension,
        #[serde(default)]
        weights: DemandWeights,
        #[serde(default)]
        top_k: Option<usize>,
    },

    /// Linear forecast with an optional price/volume scenario.
    Forecast {
        #[serde(default = "default_granularity")]
        granularity: Granularity,
        #[serde(default)]
        metric: Metric,
        /// Days ahead, 7 to 90.
        #[serde(default = "default_horizon")]
        horizon: u32,
        #[serde(default)]
        scenario: Scenario,
    },

    /// Category, discount, day-type, status, returns and regional views.
    Breakdown {
        #[serde(default = "default_top_k")]
        top_k: usize,
    },

    /// Every view at once.
    Dashboard {
        #[serde(default)]
        options: DashboardOptions,
    },
}

fn default_granularity() -> Granularity {
    Granularity::Month
}

fn default_threshold() -> f64 {
    ANOMALY_Z_THRESHOLD
}

fn default_horizon() -> u32 {
    FORECAST_DEFAULT_HORIZON
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

impl AnalyticsOperation {
    /// Variant name, used in errors and the audit log.
    pub fn name(&self) -> &'static str {
        match self {
            AnalyticsOperation::Kpis => "Kpis",
            AnalyticsOperation::Abc => "Abc",
            AnalyticsOperation::TimeSeries { .. } => "TimeSeries",
            AnalyticsOperation::Anomalies { .. } => "Anomalies",
            AnalyticsOperation::Demand { .. } => "Demand",
            AnalyticsOperation::Forecast { .. } => "Forecast",
            AnalyticsOperation::Breakdown { .. } => "Breakdown",
            AnalyticsOperation::Dashboard { .. } => "Dashboard",
        }
    }

    /// Human-readable description of what this operation computes.
    pub fn describe(&self) -> String {
        match self {
            AnalyticsOperation::Kpis => "KPI summary".into(),
            AnalyticsOperation::Abc => "ABC classification".into(),
            AnalyticsOperation::TimeSeries { granularity } => {
                format!("Time series by {granularity}")
            }
            AnalyticsOperation::Anomalies {
                granularity,
                metric,
                threshold,
            } => match granularity {
                Some(g) => format!("Anomalies in {metric} by {g} (|z| > {threshold})"),
                None => format!("Order-level anomalies (|z| > {threshold})"),
            },
            AnalyticsOperation::Demand {
                dimension, top_k, ..
            } => match top_k {
                Some(k) => format!("Top {k} {dimension} demand"),
                None => format!("Demand by {dimension}"),
            },
            AnalyticsOperation::Forecast {
                granularity,
                metric,
                horizon,
                scenario,
            } => format!(
                "Forecast {metric} {horizon} days ahead by {granularity} ({})",
                scenario.label()
            ),
            AnalyticsOperation::Breakdown { top_k } => format!("Breakdowns (top {top_k})"),
            AnalyticsOperation::Dashboard { .. } => "Full dashboard".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_unit_operation() {
        let op: AnalyticsOperation = serde_json::from_str(r#"{"op": "Kpis"}"#).unwrap();
        assert_eq!(op, AnalyticsOperation::Kpis);
    }

    #[test]
    fn params_fall_back_to_defaults() {
        let json = r#"{"op": "Forecast", "params": {"horizon": 14}}"#;
        let op: AnalyticsOperation = serde_json::from_str(json).unwrap();
        assert_eq!(
            op,
            AnalyticsOperation::Forecast {
                granularity: Granularity::Month,
                metric: Metric::Sales,
                horizon: 14,
                scenario: Scenario::identity(),
            }
        );
    }

    #[test]
    fn parse_demand_with_dimension() {
        let json = r#"{"op": "Demand", "params": {"dimension": "city", "top_k": 5}}"#;
        match serde_json::from_str::<AnalyticsOperation>(json).unwrap() {
            AnalyticsOperation::Demand {
                dimension, top_k, ..
            } => {
                assert_eq!(dimension, DemandDimension::City);
                assert_eq!(top_k, Some(5));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unknown_op_rejected() {
        let json = r#"{"op": "DropTable", "params": {}}"#;
        assert!(serde_json::from_str::<AnalyticsOperation>(json).is_err());
    }

    #[test]
    fn all_ops_described() {
        let ops = vec![
            AnalyticsOperation::Kpis,
            AnalyticsOperation::Abc,
            AnalyticsOperation::TimeSeries {
                granularity: Granularity::Day,
            },
            AnalyticsOperation::Anomalies {
                granularity: None,
                metric: Metric::Sales,
                threshold: 2.0,
            },
            AnalyticsOperation::Demand {
                dimension: DemandDimension::Product,
                weights: DemandWeights::default(),
                top_k: None,
            },
            AnalyticsOperation::Forecast {
                granularity: Granularity::Day,
                metric: Metric::Profit,
                horizon: 30,
                scenario: Scenario::new(5.0, 10.0),
            },
            AnalyticsOperation::Breakdown { top_k: 10 },
            AnalyticsOperation::Dashboard {
                options: DashboardOptions::default(),
            },
        ];
        for op in &ops {
            assert!(!op.describe().is_empty(), "empty description for {:?}", op);
            assert!(!op.name().is_empty());
        }
    }
}
