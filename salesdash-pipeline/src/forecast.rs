//! Linear-trend forecasting with price/volume what-if scenarios.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use salesdash_stats::defaults::{
    FORECAST_MAX_HORIZON, FORECAST_MIN_HORIZON, SCENARIO_MAX_CHANGE_PCT, SCENARIO_MIN_CHANGE_PCT,
};
use salesdash_stats::math::linear_fit;

use crate::error::{AnalyticsError, AnalyticsResult};
use crate::time_series::TimeBucket;
use crate::types::Metric;

/// Expected price and volume changes, in percent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub price_change_pct: f64,
    pub volume_change_pct: f64,
}

impl Scenario {
    pub fn new(price_change_pct: f64, volume_change_pct: f64) -> Self {
        Self {
            price_change_pct,
            volume_change_pct,
        }
    }

    /// No price or volume change.
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn is_identity(&self) -> bool {
        self.price_change_pct == 0.0 && self.volume_change_pct == 0.0
    }

    /// `(1 + price%/100) * (1 + volume%/100)`
    pub fn multiplier(&self) -> f64 {
        (1.0 + self.price_change_pct / 100.0) * (1.0 + self.volume_change_pct / 100.0)
    }

    /// Factor applied to a forecast of `metric`. Unit counts only follow
    /// the volume change.
    pub fn multiplier_for(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Sales | Metric::Profit => self.multiplier(),
            Metric::Quantity => 1.0 + self.volume_change_pct / 100.0,
        }
    }

    pub fn validate(&self) -> AnalyticsResult<()> {
        for (param, pct) in [
            ("price_change_pct", self.price_change_pct),
            ("volume_change_pct", self.volume_change_pct),
        ] {
            let in_bounds = (SCENARIO_MIN_CHANGE_PCT..=SCENARIO_MAX_CHANGE_PCT).contains(&pct);
            if !pct.is_finite() || !in_bounds {
                return Err(AnalyticsError::invalid_param(
                    param,
                    format!(
                        "{} outside [{}, {}]",
                        pct, SCENARIO_MIN_CHANGE_PCT, SCENARIO_MAX_CHANGE_PCT
                    ),
                ));
            }
        }
        Ok(())
    }

    pub fn label(&self) -> String {
        if self.is_identity() {
            "baseline".to_string()
        } else {
            format!(
                "price {:+}% / volume {:+}%",
                self.price_change_pct, self.volume_change_pct
            )
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    /// Trend value before the scenario is applied.
    pub baseline: f64,
    pub predicted: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ForecastResult {
    pub metric: Metric,
    pub scenario: Scenario,
    /// `"baseline"` or the applied price/volume adjustment.
    pub scenario_label: String,
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub points: Vec<ForecastPoint>,
}

/// Current and projected revenue under a scenario.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScenarioProjection {
    pub current: f64,
    pub projected: f64,
    pub difference: f64,
}

pub fn validate_horizon(horizon: u32) -> AnalyticsResult<()> {
    if !(FORECAST_MIN_HORIZON..=FORECAST_MAX_HORIZON).contains(&horizon) {
        return Err(AnalyticsError::HorizonOutOfRange {
            horizon,
            min: FORECAST_MIN_HORIZON,
            max: FORECAST_MAX_HORIZON,
        });
    }
    Ok(())
}

/// Extend the OLS trend of `metric` over `series` for `horizon_days` days.
///
/// Daily series get one point per day. Monthly series get one point per
/// month that starts within the horizon (one to three months). Point `k`
/// (1-based) sits `k` periods after the last bucket and is predicted at
/// index `n - 1 + k`, then scaled by the scenario.
pub fn forecast(
    series: &[TimeBucket],
    metric: Metric,
    horizon_days: u32,
    scenario: Scenario,
) -> AnalyticsResult<ForecastResult> {
    validate_horizon(horizon_days)?;
    scenario.validate()?;

    let values: Vec<f64> = series.iter().map(|b| b.value(metric)).collect();
    let (Some(fit), Some(last)) = (linear_fit(&values), series.last()) else {
        return Err(AnalyticsError::InsufficientData {
            operation: "forecast".into(),
            required: 2,
            actual: series.len(),
        });
    };

    let multiplier = scenario.multiplier_for(metric);
    let n = values.len();
    let steps = last.granularity.steps_within(last.period_start, horizon_days);
    let points = (1..=steps)
        .map(|step| {
            let baseline = fit.predict((n - 1) as f64 + step as f64);
            ForecastPoint {
                date: last.granularity.advance(last.period_start, step),
                baseline,
                predicted: baseline * multiplier,
            }
        })
        .collect();

    log::debug!(
        "forecast metric={} buckets={} horizon_days={} steps={} slope={:.4} r2={:.4} scenario={}",
        metric,
        n,
        horizon_days,
        steps,
        fit.slope,
        fit.r_squared,
        scenario.label()
    );

    Ok(ForecastResult {
        metric,
        scenario_label: scenario.label(),
        scenario,
        slope: fit.slope,
        intercept: fit.intercept,
        r_squared: fit.r_squared,
        points,
    })
}

/// Apply a scenario to a current revenue figure.
pub fn project_revenue(current: f64, scenario: Scenario) -> AnalyticsResult<ScenarioProjection> {
    scenario.validate()?;
    let projected = current * scenario.multiplier();
    Ok(ScenarioProjection {
        current,
        projected,
        difference: projected - current,
    })
}
