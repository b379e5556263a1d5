use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use salesdash_stats::defaults::{DAILY_CYCLE, MONTHLY_CYCLE};
use salesdash_stats::math::{fnv1a_extend, fnv1a_hash};

use crate::error::{AnalyticsError, AnalyticsResult};

// ---------------------------------------------------------------------------
// Transaction types
// ---------------------------------------------------------------------------

/// Lifecycle state of an order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Delivered,
    Returned,
    Cancelled,
    Pending,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Delivered,
        OrderStatus::Returned,
        OrderStatus::Cancelled,
        OrderStatus::Pending,
    ];

    /// Case-insensitive parse of a status label.
    pub fn parse(label: &str) -> Option<OrderStatus> {
        match label.trim().to_lowercase().as_str() {
            "delivered" => Some(OrderStatus::Delivered),
            "returned" => Some(OrderStatus::Returned),
            "cancelled" | "canceled" => Some(OrderStatus::Cancelled),
            "pending" => Some(OrderStatus::Pending),
            _ => None,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Delivered => write!(f, "Delivered"),
            OrderStatus::Returned => write!(f, "Returned"),
            OrderStatus::Cancelled => write!(f, "Cancelled"),
            OrderStatus::Pending => write!(f, "Pending"),
        }
    }
}

/// One order line. Immutable once loaded.
///
/// Invariants (checked by the loader): `sales_amount >= 0`,
/// `quantity >= 1`, `0 <= discount_pct <= 100`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub order_id: String,
    pub order_date: NaiveDate,
    pub category: String,
    pub product_name: String,
    pub sales_amount: f64,
    pub profit: f64,
    pub quantity: u32,
    pub discount_pct: f64,
    pub status: OrderStatus,
    pub state: String,
    pub city: String,
    #[serde(default)]
    pub payment_method: String,
}

impl Transaction {
    /// Profit as a percentage of sales; 0 when there were no sales.
    pub fn profit_margin_pct(&self) -> f64 {
        if self.sales_amount == 0.0 {
            0.0
        } else {
            self.profit / self.sales_amount * 100.0
        }
    }

    fn fingerprint(&self, hash: u64) -> u64 {
        let mut h = hash;
        for text in [
            self.order_id.as_str(),
            self.category.as_str(),
            self.product_name.as_str(),
            self.state.as_str(),
            self.city.as_str(),
            self.payment_method.as_str(),
        ] {
            h = fnv1a_extend(h, text.as_bytes());
            h = fnv1a_extend(h, &[0x1f]);
        }
        h = fnv1a_extend(h, &self.order_date.num_days_from_ce().to_le_bytes());
        for number in [self.sales_amount, self.profit, self.discount_pct] {
            h = fnv1a_extend(h, &number.to_bits().to_le_bytes());
        }
        h = fnv1a_extend(h, &self.quantity.to_le_bytes());
        fnv1a_extend(h, &[self.status as u8])
    }
}

/// An immutable, cheaply clonable table of transactions.
///
/// `version` identifies the content: two tables with the same rows have the
/// same version, and a filtered table's version is derived from its source
/// version and the filter that produced it.
#[derive(Clone, Debug)]
pub struct TransactionTable {
    version: u64,
    rows: Arc<[Transaction]>,
}

impl TransactionTable {
    pub fn new(rows: Vec<Transaction>) -> Self {
        let version = rows
            .iter()
            .fold(fnv1a_hash(b"salesdash-table"), |h, row| row.fingerprint(h));
        Self {
            version,
            rows: rows.into(),
        }
    }

    /// A table derived from `parent` by an operation identified by `key`.
    pub(crate) fn derived(parent_version: u64, key: &str, rows: Vec<Transaction>) -> Self {
        let version = fnv1a_extend(
            fnv1a_extend(fnv1a_hash(&parent_version.to_le_bytes()), b"/"),
            key.as_bytes(),
        );
        Self {
            version,
            rows: rows.into(),
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn rows(&self) -> &[Transaction] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Transaction> {
        self.rows.iter()
    }

    /// Earliest and latest order date, `None` for an empty table.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.rows.iter().map(|r| r.order_date).min()?;
        let max = self.rows.iter().map(|r| r.order_date).max()?;
        Some((min, max))
    }
}

impl Default for TransactionTable {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

// ---------------------------------------------------------------------------
// Filter specification
// ---------------------------------------------------------------------------

/// Inclusive numeric range.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    fn validate(&self, field: &str) -> AnalyticsResult<()> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(AnalyticsError::invalid_filter(field, "bounds must be finite"));
        }
        if self.min > self.max {
            return Err(AnalyticsError::invalid_filter(
                field,
                format!("min {} exceeds max {}", self.min, self.max),
            ));
        }
        Ok(())
    }
}

/// Inclusive calendar date range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// User-selected filters. Every field is optional; the default filters
/// nothing. Empty sets and unset ranges are pass-through.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSpec {
    pub date_range: Option<DateRange>,
    pub states: BTreeSet<String>,
    pub cities: BTreeSet<String>,
    pub categories: BTreeSet<String>,
    /// Row profit margin in percent of sales.
    pub profit_margin: Option<ValueRange>,
    pub discount: Option<ValueRange>,
    pub quantity: Option<ValueRange>,
    pub sales_amount: Option<ValueRange>,
}

impl FilterSpec {
    /// Reject malformed ranges before any row is touched.
    pub fn validate(&self) -> AnalyticsResult<()> {
        if let Some(range) = &self.date_range {
            if range.start > range.end {
                return Err(AnalyticsError::invalid_filter(
                    "date_range",
                    format!("start {} is after end {}", range.start, range.end),
                ));
            }
        }
        let ranges = [
            ("profit_margin", &self.profit_margin),
            ("discount", &self.discount),
            ("quantity", &self.quantity),
            ("sales_amount", &self.sales_amount),
        ];
        for (field, range) in ranges {
            if let Some(range) = range {
                range.validate(field)?;
            }
        }
        Ok(())
    }

    /// True when no predicate is active.
    pub fn is_pass_through(&self) -> bool {
        *self == FilterSpec::default()
    }

    /// Canonical text form, stable across runs (sets are ordered).
    pub fn cache_key(&self) -> AnalyticsResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// ---------------------------------------------------------------------------
// Series parameters
// ---------------------------------------------------------------------------

/// Calendar period used to bucket transactions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Month,
}

impl Granularity {
    /// Length of the natural cycle in buckets (a week of days, a year of months).
    pub fn cycle(&self) -> usize {
        match self {
            Granularity::Day => DAILY_CYCLE,
            Granularity::Month => MONTHLY_CYCLE,
        }
    }

    /// First day of the period containing `date`.
    pub fn period_start(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Granularity::Day => date,
            Granularity::Month => date - Days::new(date.day0() as u64),
        }
    }

    /// Start of the period `steps` periods after `period_start`.
    pub fn advance(&self, period_start: NaiveDate, steps: u32) -> NaiveDate {
        match self {
            Granularity::Day => period_start + Days::new(steps as u64),
            Granularity::Month => period_start + Months::new(steps),
        }
    }

    /// Forecast steps covering `days` days after the period at
    /// `period_start`: one per day, or one per month that begins before the
    /// horizon's last day.
    pub fn steps_within(&self, period_start: NaiveDate, days: u32) -> u32 {
        match self {
            Granularity::Day => days,
            Granularity::Month => {
                let period_end = self.advance(period_start, 1) - Days::new(1);
                let horizon_end = period_end + Days::new(days as u64);
                let mut steps = 0;
                while self.advance(period_start, steps + 1) < horizon_end {
                    steps += 1;
                }
                steps
            }
        }
    }

    pub fn parse(label: &str) -> Option<Granularity> {
        match label.trim().to_lowercase().as_str() {
            "day" | "daily" => Some(Granularity::Day),
            "month" | "monthly" => Some(Granularity::Month),
            _ => None,
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Granularity::Day => write!(f, "day"),
            Granularity::Month => write!(f, "month"),
        }
    }
}

/// Which aggregated value a series operation reads from a bucket.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Sales,
    Profit,
    Quantity,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Sales => write!(f, "sales"),
            Metric::Profit => write!(f, "profit"),
            Metric::Quantity => write!(f, "quantity"),
        }
    }
}
