//! Periodic bucketing, growth rates and additive decomposition.
//!
//! Buckets run contiguously from the table's first to last period. Periods
//! without any order are emitted with zero values so growth rates and charts
//! never skip a period.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use salesdash_stats::math::{centered_moving_average, growth_pct};

use crate::error::{AnalyticsError, AnalyticsResult};
use crate::types::{Granularity, Metric, TransactionTable};

/// Aggregates for one calendar period.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimeBucket {
    pub period_start: NaiveDate,
    pub granularity: Granularity,
    pub sales: f64,
    pub profit: f64,
    pub quantity: u64,
    pub record_count: usize,
    /// Sales growth versus the previous bucket, in percent. 0 for the first
    /// bucket and whenever the previous bucket had no sales.
    pub growth_pct: f64,
    /// Sales growth versus the bucket one full cycle earlier (week over
    /// week for days, year over year for months).
    pub cycle_growth_pct: Option<f64>,
}

impl TimeBucket {
    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Sales => self.sales,
            Metric::Profit => self.profit,
            Metric::Quantity => self.quantity as f64,
        }
    }
}

/// Additive split of a series into trend, seasonal and residual parts.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SeasonalDecomposition {
    pub metric: Metric,
    /// Cycle length in buckets.
    pub period: usize,
    /// Centered moving average; undefined within half a cycle of either edge.
    pub trend: Vec<Option<f64>>,
    /// Average deviation from trend for each cycle position.
    pub seasonal_indices: Vec<f64>,
    /// `seasonal_indices` laid out along the series.
    pub seasonal: Vec<f64>,
    /// `actual - trend - seasonal` where the trend is defined.
    pub residual: Vec<Option<f64>>,
}

/// Decomposition outcome as reported to the presentation layer.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status")]
pub enum DecompositionStatus {
    Available(SeasonalDecomposition),
    Unavailable { required: usize, actual: usize },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimeSeriesAnalysis {
    pub granularity: Granularity,
    pub buckets: Vec<TimeBucket>,
    pub decomposition: DecompositionStatus,
}

#[derive(Default)]
struct PeriodTotals {
    sales: f64,
    profit: f64,
    quantity: u64,
    records: usize,
}

/// Group `table` into contiguous buckets of the given granularity.
pub fn buckets(table: &TransactionTable, granularity: Granularity) -> Vec<TimeBucket> {
    let Some((min_date, max_date)) = table.date_bounds() else {
        return Vec::new();
    };

    let mut totals: BTreeMap<NaiveDate, PeriodTotals> = BTreeMap::new();
    for row in table.iter() {
        let entry = totals
            .entry(granularity.period_start(row.order_date))
            .or_default();
        entry.sales += row.sales_amount;
        entry.profit += row.profit;
        entry.quantity += row.quantity as u64;
        entry.records += 1;
    }

    let first = granularity.period_start(min_date);
    let last = granularity.period_start(max_date);
    let cycle = granularity.cycle();

    let mut out: Vec<TimeBucket> = Vec::new();
    let mut period = first;
    while period <= last {
        let t = totals.remove(&period).unwrap_or_default();
        let growth = out
            .last()
            .map(|prev| growth_pct(t.sales, prev.sales))
            .unwrap_or(0.0);
        let cycle_growth = out
            .len()
            .checked_sub(cycle)
            .map(|idx| growth_pct(t.sales, out[idx].sales));
        out.push(TimeBucket {
            period_start: period,
            granularity,
            sales: t.sales,
            profit: t.profit,
            quantity: t.quantity,
            record_count: t.records,
            growth_pct: growth,
            cycle_growth_pct: cycle_growth,
        });
        period = granularity.advance(period, 1);
    }
    out
}

/// Decompose `metric` over `series` with the granularity's natural cycle.
///
/// Needs at least two full cycles of buckets.
pub fn decompose(
    series: &[TimeBucket],
    granularity: Granularity,
    metric: Metric,
) -> AnalyticsResult<SeasonalDecomposition> {
    let period = granularity.cycle();
    let required = 2 * period;
    if series.len() < required {
        return Err(AnalyticsError::InsufficientData {
            operation: "decomposition".into(),
            required,
            actual: series.len(),
        });
    }

    let values: Vec<f64> = series.iter().map(|b| b.value(metric)).collect();
    let trend = centered_moving_average(&values, period);

    let mut deviation_sums = vec![0.0; period];
    let mut deviation_counts = vec![0usize; period];
    for (i, (value, t)) in values.iter().zip(&trend).enumerate() {
        if let Some(t) = t {
            deviation_sums[i % period] += value - t;
            deviation_counts[i % period] += 1;
        }
    }
    let seasonal_indices: Vec<f64> = deviation_sums
        .iter()
        .zip(&deviation_counts)
        .map(|(sum, n)| if *n == 0 { 0.0 } else { sum / *n as f64 })
        .collect();

    let seasonal: Vec<f64> = (0..values.len())
        .map(|i| seasonal_indices[i % period])
        .collect();
    let residual = values
        .iter()
        .zip(&trend)
        .zip(&seasonal)
        .map(|((v, t), s)| t.map(|t| v - t - s))
        .collect();

    Ok(SeasonalDecomposition {
        metric,
        period,
        trend,
        seasonal_indices,
        seasonal,
        residual,
    })
}

/// Bucket `table` and decompose its sales when enough history exists.
pub fn analyze(table: &TransactionTable, granularity: Granularity) -> TimeSeriesAnalysis {
    let series = buckets(table, granularity);
    let decomposition = match decompose(&series, granularity, Metric::Sales) {
        Ok(d) => DecompositionStatus::Available(d),
        Err(AnalyticsError::InsufficientData {
            required, actual, ..
        }) => {
            log::debug!(
                "decomposition unavailable: granularity={} buckets={} required={}",
                granularity,
                actual,
                required
            );
            DecompositionStatus::Unavailable { required, actual }
        }
        Err(e) => {
            log::warn!("decomposition failed: {}", e);
            DecompositionStatus::Unavailable {
                required: 2 * granularity.cycle(),
                actual: series.len(),
            }
        }
    };

    TimeSeriesAnalysis {
        granularity,
        buckets: series,
        decomposition,
    }
}
