//! Scalar summary metrics over a transaction table.

use std::collections::HashSet;

use serde::Serialize;

use salesdash_stats::math::growth_pct;

use crate::types::{OrderStatus, TransactionTable};

/// Headline metrics of a table. Every ratio is 0 on an empty table.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct KpiResult {
    pub total_sales: f64,
    pub total_profit: f64,
    pub total_quantity: u64,
    pub record_count: usize,
    pub distinct_orders: usize,
    /// Total sales per distinct order.
    pub average_order_value: f64,
    /// Share of records delivered, in [0, 1].
    pub fulfillment_rate: f64,
    /// Share of records returned, in [0, 1].
    pub return_rate: f64,
    /// Share of records cancelled, in [0, 1].
    pub cancellation_rate: f64,
    /// Share of records still pending, in [0, 1].
    pub pending_rate: f64,
    /// Total profit as a percentage of total sales.
    pub profit_margin_pct: f64,
    pub average_profit: f64,
}

/// Growth of a filtered view against a baseline, in percent.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct KpiDelta {
    pub sales_growth_pct: f64,
    pub quantity_growth_pct: f64,
    pub profit_growth_pct: f64,
}

/// Compute the headline metrics of `table`.
pub fn aggregate(table: &TransactionTable) -> KpiResult {
    let mut total_sales = 0.0;
    let mut total_profit = 0.0;
    let mut total_quantity: u64 = 0;
    let mut status_counts = [0usize; 4];
    let mut orders: HashSet<&str> = HashSet::new();

    for row in table.iter() {
        total_sales += row.sales_amount;
        total_profit += row.profit;
        total_quantity += row.quantity as u64;
        status_counts[status_index(row.status)] += 1;
        orders.insert(row.order_id.as_str());
    }

    let record_count = table.len();
    let distinct_orders = orders.len();
    let rate = |status: OrderStatus| {
        ratio(status_counts[status_index(status)] as f64, record_count as f64)
    };

    KpiResult {
        total_sales,
        total_profit,
        total_quantity,
        record_count,
        distinct_orders,
        average_order_value: ratio(total_sales, distinct_orders as f64),
        fulfillment_rate: rate(OrderStatus::Delivered),
        return_rate: rate(OrderStatus::Returned),
        cancellation_rate: rate(OrderStatus::Cancelled),
        pending_rate: rate(OrderStatus::Pending),
        profit_margin_pct: ratio(total_profit, total_sales) * 100.0,
        average_profit: ratio(total_profit, record_count as f64),
    }
}

/// Compare a (filtered) result against a baseline such as the full table.
pub fn compare(current: &KpiResult, baseline: &KpiResult) -> KpiDelta {
    KpiDelta {
        sales_growth_pct: growth_pct(current.total_sales, baseline.total_sales),
        quantity_growth_pct: growth_pct(
            current.total_quantity as f64,
            baseline.total_quantity as f64,
        ),
        profit_growth_pct: growth_pct(current.total_profit, baseline.total_profit),
    }
}

fn status_index(status: OrderStatus) -> usize {
    match status {
        OrderStatus::Delivered => 0,
        OrderStatus::Returned => 1,
        OrderStatus::Cancelled => 2,
        OrderStatus::Pending => 3,
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}
