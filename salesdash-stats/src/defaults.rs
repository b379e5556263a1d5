//! Centralized defaults for the analytics components.
//!
//! Changing a value here affects both the pipeline components (in
//! `salesdash-pipeline`) and the request validation in `salesdash-bridge`.

/// Cumulative revenue share (percent) at or below which a product is tier A.
pub const ABC_A_CUTOFF_PCT: f64 = 70.0;

/// Cumulative revenue share (percent) at or below which a product is tier B.
pub const ABC_B_CUTOFF_PCT: f64 = 90.0;

/// Demand score weight for normalized sales volume.
pub const DEMAND_WEIGHT_SALES: f64 = 0.5;

/// Demand score weight for normalized order frequency.
pub const DEMAND_WEIGHT_FREQUENCY: f64 = 0.3;

/// Demand score weight for normalized quantity sold.
pub const DEMAND_WEIGHT_QUANTITY: f64 = 0.2;

/// Absolute z-score above which a bucket or record is anomalous.
pub const ANOMALY_Z_THRESHOLD: f64 = 2.0;

/// Shortest forecast horizon accepted, in days.
pub const FORECAST_MIN_HORIZON: u32 = 7;

/// Longest forecast horizon accepted, in days.
pub const FORECAST_MAX_HORIZON: u32 = 90;

/// Default forecast horizon used by the dashboard.
pub const FORECAST_DEFAULT_HORIZON: u32 = 30;

/// Lower bound for scenario price/volume adjustments (percent).
pub const SCENARIO_MIN_CHANGE_PCT: f64 = -50.0;

/// Upper bound for scenario price/volume adjustments (percent).
pub const SCENARIO_MAX_CHANGE_PCT: f64 = 200.0;

/// Natural cycle of daily data (one week).
pub const DAILY_CYCLE: usize = 7;

/// Natural cycle of monthly data (one year).
pub const MONTHLY_CYCLE: usize = 12;

/// Upper edges (percent, inclusive) of the discount bands. The last band is open.
pub const DISCOUNT_BAND_EDGES: [f64; 4] = [10.0, 20.0, 30.0, 50.0];

/// Default number of entries in top-K rankings.
pub const DEFAULT_TOP_K: usize = 10;

/// Equal-width bins of the order value distribution.
pub const ORDER_VALUE_HISTOGRAM_BINS: usize = 30;
