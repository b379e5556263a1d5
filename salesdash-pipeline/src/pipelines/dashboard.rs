use serde::{Deserialize, Serialize};

use salesdash_stats::defaults::{ANOMALY_Z_THRESHOLD, DEFAULT_TOP_K, FORECAST_DEFAULT_HORIZON};

use crate::abc::{self, AbcAssignment};
use crate::anomaly::{self, AnomalyFlag};
use crate::breakdown::Breakdown;
use crate::demand::{self, DemandDimension, DemandScore, DemandWeights};
use crate::error::{AnalyticsError, AnalyticsResult};
use crate::filter_engine::FilterEngine;
use crate::forecast::{self, ForecastResult, Scenario, ScenarioProjection};
use crate::kpi::{self, KpiDelta, KpiResult};
use crate::time_series::{self, TimeSeriesAnalysis};
use crate::types::{FilterSpec, Granularity, Metric, TransactionTable};

/// Tunables of a dashboard run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardOptions {
    pub granularity: Granularity,
    /// Metric used for anomalies and the forecast.
    pub metric: Metric,
    pub anomaly_threshold: f64,
    /// Forecast horizon in days.
    pub horizon: u32,
    pub scenario: Scenario,
    pub demand_weights: DemandWeights,
    pub top_k: usize,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            granularity: Granularity::Month,
            metric: Metric::Sales,
            anomaly_threshold: ANOMALY_Z_THRESHOLD,
            horizon: FORECAST_DEFAULT_HORIZON,
            scenario: Scenario::identity(),
            demand_weights: DemandWeights::default(),
            top_k: DEFAULT_TOP_K,
        }
    }
}

impl DashboardOptions {
    pub fn validate(&self) -> AnalyticsResult<()> {
        anomaly::validate_threshold(self.anomaly_threshold)?;
        forecast::validate_horizon(self.horizon)?;
        self.scenario.validate()?;
        self.demand_weights.validate()?;
        if self.top_k == 0 {
            return Err(AnalyticsError::invalid_param("top_k", "must be at least 1"));
        }
        Ok(())
    }
}

/// A forecast, or why none could be produced.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status")]
pub enum ForecastSection {
    Available(ForecastResult),
    Unavailable { reason: String },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DashboardReport {
    pub table_version: u64,
    pub kpis: KpiResult,
    /// Filtered view against the unfiltered table.
    pub kpi_delta: KpiDelta,
    pub abc: AbcAssignment,
    pub time_series: TimeSeriesAnalysis,
    pub anomalies: Vec<AnomalyFlag>,
    pub top_products: Vec<DemandScore>,
    pub top_cities: Vec<DemandScore>,
    pub forecast: ForecastSection,
    pub revenue_projection: ScenarioProjection,
    pub breakdown: Breakdown,
}

impl DashboardReport {
    pub fn anomaly_count(&self) -> usize {
        self.anomalies.iter().filter(|f| f.is_anomalous).count()
    }
}

/// Every dashboard view of a filtered table.
///
/// Pipeline flow:
/// 1. FilterEngine narrows the table to the spec
/// 2. KPIs of the filtered view and their delta to the full table
/// 3. ABC tiers and demand rankings (products, cities)
/// 4. Time-series buckets, decomposition and anomaly flags
/// 5. Forecast and revenue projection under the scenario
/// 6. Grouped breakdowns
pub struct DashboardPipeline {
    engine: FilterEngine,
    options: DashboardOptions,
}

impl DashboardPipeline {
    pub fn new() -> Self {
        Self::with_options(DashboardOptions::default())
    }

    pub fn with_options(options: DashboardOptions) -> Self {
        Self {
            engine: FilterEngine::new(),
            options,
        }
    }

    pub fn options(&self) -> &DashboardOptions {
        &self.options
    }

    pub fn run(
        &self,
        table: &TransactionTable,
        spec: &FilterSpec,
    ) -> AnalyticsResult<DashboardReport> {
        self.options.validate()?;
        let filtered = self.engine.apply(table, spec)?;
        self.report(table, &filtered)
    }

    /// Build the report from a view already filtered out of `table`.
    pub fn report(
        &self,
        table: &TransactionTable,
        filtered: &TransactionTable,
    ) -> AnalyticsResult<DashboardReport> {
        let opts = &self.options;
        opts.validate()?;

        let kpis = kpi::aggregate(filtered);
        let kpi_delta = kpi::compare(&kpis, &kpi::aggregate(table));

        let abc = abc::classify(filtered);
        let top_products = demand::top(
            demand::score(filtered, DemandDimension::Product, &opts.demand_weights)?,
            opts.top_k,
        );
        let top_cities = demand::top(
            demand::score(filtered, DemandDimension::City, &opts.demand_weights)?,
            opts.top_k,
        );

        let time_series = time_series::analyze(filtered, opts.granularity);
        let anomalies = anomaly::detect(
            &time_series.buckets,
            opts.metric,
            opts.anomaly_threshold,
        )?;

        let forecast = match forecast::forecast(
            &time_series.buckets,
            opts.metric,
            opts.horizon,
            opts.scenario,
        ) {
            Ok(result) => ForecastSection::Available(result),
            Err(e @ AnalyticsError::InsufficientData { .. }) => {
                log::info!("forecast unavailable: {}", e);
                ForecastSection::Unavailable { reason: e.to_string() }
            }
            Err(e) => return Err(e),
        };
        let revenue_projection = forecast::project_revenue(kpis.total_sales, opts.scenario)?;

        let breakdown = Breakdown::compute(filtered, opts.top_k);

        log::info!(
            "dashboard version={:016x} rows={} buckets={} products={}",
            filtered.version(),
            filtered.len(),
            time_series.buckets.len(),
            abc.products.len()
        );

        Ok(DashboardReport {
            table_version: filtered.version(),
            kpis,
            kpi_delta,
            abc,
            time_series,
            anomalies,
            top_products,
            top_cities,
            forecast,
            revenue_projection,
            breakdown,
        })
    }
}

impl Default for DashboardPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{date, table, tx};

    #[test]
    fn empty_table_reports_without_failing() {
        let report = DashboardPipeline::new()
            .run(&table(Vec::new()), &FilterSpec::default())
            .unwrap();
        assert_eq!(report.kpis, KpiResult::default());
        assert!(report.time_series.buckets.is_empty());
        assert!(matches!(report.forecast, ForecastSection::Unavailable { .. }));
        assert_eq!(report.revenue_projection.projected, 0.0);
    }

    #[test]
    fn filter_narrows_every_section() {
        let mut rows = vec![
            tx("O-1", date(2024, 1, 5), "Kettle", 100.0),
            tx("O-2", date(2024, 2, 5), "Kettle", 200.0),
            tx("O-3", date(2024, 3, 5), "Toaster", 300.0),
        ];
        rows[2].city = "Chennai".into();
        let mut spec = FilterSpec::default();
        spec.cities.insert("Bengaluru".into());

        let options = DashboardOptions {
            horizon: 7,
            ..DashboardOptions::default()
        };
        let report = DashboardPipeline::with_options(options).run(&table(rows), &spec).unwrap();
        assert_eq!(report.kpis.record_count, 2);
        assert!((report.kpi_delta.sales_growth_pct - (-50.0)).abs() < 1e-9);
        assert_eq!(report.abc.products.len(), 1);
        assert_eq!(report.top_cities.len(), 1);
        assert_eq!(report.time_series.buckets.len(), 2);
        match &report.forecast {
            ForecastSection::Available(f) => {
                assert_eq!(f.points.len(), 1);
                assert_eq!(f.points[0].date, date(2024, 3, 1));
            }
            other => panic!("expected forecast, got {:?}", other),
        }
    }

    #[test]
    fn default_forecast_looks_one_month_ahead() {
        let rows = vec![
            tx("O-1", date(2026, 4, 2), "Kettle", 120.0),
            tx("O-2", date(2026, 5, 14), "Kettle", 180.0),
            tx("O-3", date(2026, 6, 9), "Kettle", 240.0),
        ];
        let report = DashboardPipeline::new().run(&table(rows), &FilterSpec::default()).unwrap();
        let ForecastSection::Available(f) = &report.forecast else {
            panic!("expected forecast, got {:?}", report.forecast);
        };
        assert_eq!(f.points.len(), 1);
        assert_eq!(f.points[0].date, date(2026, 7, 1));
    }

    #[test]
    fn invalid_options_fail_fast() {
        let options = DashboardOptions {
            horizon: 200,
            ..DashboardOptions::default()
        };
        let result = DashboardPipeline::with_options(options).run(&table(Vec::new()), &FilterSpec::default());
        assert!(matches!(result, Err(AnalyticsError::HorizonOutOfRange { .. })));
    }
}
