//! Sales analytics pipeline.
//!
//! A transaction table is narrowed by a `FilterSpec` and turned into the
//! dashboard views: KPIs, ABC tiers, time-series buckets and decomposition,
//! anomaly flags, demand rankings, forecasts and grouped breakdowns.
//! Every operation is a pure function of its inputs.

pub mod abc;
pub mod anomaly;
pub mod breakdown;
pub mod components;
pub mod demand;
pub mod error;
pub mod filter;
pub mod filter_engine;
pub mod forecast;
pub mod kpi;
pub mod pipelines;
pub mod selector;
pub mod time_series;
pub mod transaction_loader;
pub mod types;
pub mod util;

#[cfg(test)]
mod fixtures;

pub use error::{AnalyticsError, AnalyticsResult, LoadError};
pub use filter_engine::{filter, FilterEngine};
pub use pipelines::dashboard::{DashboardOptions, DashboardPipeline, DashboardReport};
pub use types::{
    DateRange, FilterSpec, Granularity, Metric, OrderStatus, Transaction, TransactionTable,
    ValueRange,
};
