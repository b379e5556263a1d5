//! Grouped views: category profitability and mix, discount impact, payment
//! methods, day type, seasonal heatmap, weekly totals, order value
//! distribution, order status, returns and regional leaders.
//!
//! Every ranked list orders by value descending with ties broken by label
//! ascending.

use std::collections::BTreeMap;

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::Serialize;

use salesdash_stats::defaults::{DISCOUNT_BAND_EDGES, ORDER_VALUE_HISTOGRAM_BINS};

use crate::components::top_k_selector::TopKSelector;
use crate::selector::{Ranked, Selector};
use crate::types::{OrderStatus, Transaction, TransactionTable};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CategoryProfit {
    pub category: String,
    pub sales: f64,
    pub profit: f64,
    pub quantity: u64,
    pub margin_pct: f64,
}

impl Ranked for CategoryProfit {
    fn rank_value(&self) -> f64 {
        self.profit
    }
}

/// Average profit of the orders whose discount falls in `(lower, upper]`
/// (the first band also includes its lower edge).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DiscountBand {
    pub label: String,
    pub lower_pct: f64,
    pub upper_pct: f64,
    pub orders: usize,
    /// 0 when the band is empty.
    pub average_profit: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DayTypeSales {
    pub weekday_records: usize,
    pub weekday_average_sales: f64,
    pub weekend_records: usize,
    pub weekend_average_sales: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StatusShare {
    pub status: OrderStatus,
    pub count: usize,
    /// Fraction of records, in [0, 1].
    pub share: f64,
}

/// A label with a count or an amount.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Ranking {
    pub label: String,
    pub value: f64,
}

impl Ranked for Ranking {
    fn rank_value(&self) -> f64 {
        self.value
    }
}

/// Sales of one label and its fraction of all sales.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SalesShare {
    pub label: String,
    pub sales: f64,
    /// In [0, 1]; 0 when the table has no sales.
    pub share: f64,
}

impl Ranked for SalesShare {
    fn rank_value(&self) -> f64 {
        self.sales
    }
}

/// Mean sales of the records placed on one weekday of one calendar month.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HeatmapCell {
    /// `"Mon"` .. `"Sun"`
    pub weekday: String,
    /// 1 = January
    pub month: u32,
    pub records: usize,
    pub average_sales: f64,
}

/// Orders whose sales amount falls in `[lower, upper)`; the last bin also
/// holds its upper edge.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Sales of one ISO week.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WeeklySales {
    pub iso_year: i32,
    pub iso_week: u32,
    /// The Monday opening the week.
    pub week_start: NaiveDate,
    pub sales: f64,
    pub records: usize,
}

/// Every breakdown of one table.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Breakdown {
    pub categories: Vec<CategoryProfit>,
    pub category_mix: Vec<SalesShare>,
    pub sales_by_payment_method: Vec<SalesShare>,
    pub discount_bands: Vec<DiscountBand>,
    pub day_type: DayTypeSales,
    pub weekday_month_heatmap: Vec<HeatmapCell>,
    pub weekly_sales: Vec<WeeklySales>,
    pub order_value_histogram: Vec<HistogramBin>,
    pub status: Vec<StatusShare>,
    pub returns_by_category: Vec<Ranking>,
    pub top_returned_products: Vec<Ranking>,
    pub top_states_by_sales: Vec<Ranking>,
    pub top_cities_by_sales: Vec<Ranking>,
    pub top_cities_by_profit: Vec<Ranking>,
}

impl Breakdown {
    pub fn compute(table: &TransactionTable, top_k: usize) -> Self {
        Self {
            categories: category_profitability(table),
            category_mix: category_mix(table),
            sales_by_payment_method: sales_by_payment_method(table),
            discount_bands: discount_impact(table),
            day_type: weekday_vs_weekend(table),
            weekday_month_heatmap: weekday_month_heatmap(table),
            weekly_sales: weekly_sales(table),
            order_value_histogram: order_value_histogram(table, ORDER_VALUE_HISTOGRAM_BINS),
            status: status_distribution(table),
            returns_by_category: returns_by_category(table),
            top_returned_products: top_returned_products(table, top_k),
            top_states_by_sales: top_by(table, top_k, |r| r.state.as_str(), |r| r.sales_amount),
            top_cities_by_sales: top_by(table, top_k, |r| r.city.as_str(), |r| r.sales_amount),
            top_cities_by_profit: top_by(table, top_k, |r| r.city.as_str(), |r| r.profit),
        }
    }
}

/// Sales, profit, quantity and margin per category, most profitable first.
pub fn category_profitability(table: &TransactionTable) -> Vec<CategoryProfit> {
    let mut totals: BTreeMap<&str, (f64, f64, u64)> = BTreeMap::new();
    for row in table.iter() {
        let entry = totals.entry(row.category.as_str()).or_default();
        entry.0 += row.sales_amount;
        entry.1 += row.profit;
        entry.2 += row.quantity as u64;
    }
    let categories: Vec<CategoryProfit> = totals
        .into_iter()
        .map(|(category, (sales, profit, quantity))| CategoryProfit {
            category: category.to_string(),
            sales,
            profit,
            quantity,
            margin_pct: if sales == 0.0 { 0.0 } else { profit / sales * 100.0 },
        })
        .collect();
    TopKSelector::new(categories.len()).select(categories)
}

/// Share of sales per category, largest first.
pub fn category_mix(table: &TransactionTable) -> Vec<SalesShare> {
    sales_shares(table, |r| r.category.as_str())
}

/// Share of sales per payment method, largest first. Rows without a
/// payment method are grouped as `"Unspecified"`.
pub fn sales_by_payment_method(table: &TransactionTable) -> Vec<SalesShare> {
    sales_shares(table, |r| r.payment_method.as_str())
}

fn sales_shares<F>(table: &TransactionTable, key: F) -> Vec<SalesShare>
where
    F: Fn(&Transaction) -> &str,
{
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    let mut total = 0.0;
    for row in table.iter() {
        let label = match key(row).trim() {
            "" => "Unspecified",
            label => label,
        };
        *totals.entry(label).or_default() += row.sales_amount;
        total += row.sales_amount;
    }
    let shares: Vec<SalesShare> = totals
        .into_iter()
        .map(|(label, sales)| SalesShare {
            label: label.to_string(),
            sales,
            share: if total == 0.0 { 0.0 } else { sales / total },
        })
        .collect();
    TopKSelector::new(shares.len()).select(shares)
}

/// Average profit per discount band. Every band is reported, in band order.
pub fn discount_impact(table: &TransactionTable) -> Vec<DiscountBand> {
    let mut lowers = vec![0.0];
    lowers.extend(DISCOUNT_BAND_EDGES);
    let mut uppers: Vec<f64> = DISCOUNT_BAND_EDGES.to_vec();
    uppers.push(100.0);

    let mut sums = vec![0.0; lowers.len()];
    let mut counts = vec![0usize; lowers.len()];
    for row in table.iter() {
        let band = uppers
            .iter()
            .position(|upper| row.discount_pct <= *upper)
            .unwrap_or(uppers.len() - 1);
        sums[band] += row.profit;
        counts[band] += 1;
    }

    lowers
        .iter()
        .zip(&uppers)
        .enumerate()
        .map(|(i, (lower, upper))| DiscountBand {
            label: if i + 1 == lowers.len() {
                format!("{}%+", lower)
            } else {
                format!("{}-{}%", lower, upper)
            },
            lower_pct: *lower,
            upper_pct: *upper,
            orders: counts[i],
            average_profit: if counts[i] == 0 { 0.0 } else { sums[i] / counts[i] as f64 },
        })
        .collect()
}

/// Average sales per record on weekdays and on weekends.
pub fn weekday_vs_weekend(table: &TransactionTable) -> DayTypeSales {
    let (mut weekday_sum, mut weekend_sum) = (0.0, 0.0);
    let mut out = DayTypeSales::default();
    for row in table.iter() {
        if matches!(row.order_date.weekday(), Weekday::Sat | Weekday::Sun) {
            weekend_sum += row.sales_amount;
            out.weekend_records += 1;
        } else {
            weekday_sum += row.sales_amount;
            out.weekday_records += 1;
        }
    }
    if out.weekday_records > 0 {
        out.weekday_average_sales = weekday_sum / out.weekday_records as f64;
    }
    if out.weekend_records > 0 {
        out.weekend_average_sales = weekend_sum / out.weekend_records as f64;
    }
    out
}

/// Mean sales per (weekday, month) cell, Monday first then January first.
/// Cells without records are omitted.
pub fn weekday_month_heatmap(table: &TransactionTable) -> Vec<HeatmapCell> {
    let mut cells: BTreeMap<(u32, u32), (Weekday, f64, usize)> = BTreeMap::new();
    for row in table.iter() {
        let weekday = row.order_date.weekday();
        let key = (weekday.num_days_from_monday(), row.order_date.month());
        let cell = cells.entry(key).or_insert((weekday, 0.0, 0));
        cell.1 += row.sales_amount;
        cell.2 += 1;
    }
    cells
        .into_iter()
        .map(|((_, month), (weekday, sum, records))| HeatmapCell {
            weekday: weekday.to_string(),
            month,
            records,
            average_sales: sum / records as f64,
        })
        .collect()
}

/// Sales totals per ISO week, oldest first. Weeks without records are
/// omitted.
pub fn weekly_sales(table: &TransactionTable) -> Vec<WeeklySales> {
    let mut weeks: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for row in table.iter() {
        let offset = row.order_date.weekday().num_days_from_monday() as u64;
        let week = weeks.entry(row.order_date - Days::new(offset)).or_default();
        week.0 += row.sales_amount;
        week.1 += 1;
    }
    weeks
        .into_iter()
        .map(|(week_start, (sales, records))| {
            let iso = week_start.iso_week();
            WeeklySales {
                iso_year: iso.year(),
                iso_week: iso.week(),
                week_start,
                sales,
                records,
            }
        })
        .collect()
}

/// Equal-width histogram of order sales amounts over `[min, max]`.
///
/// An empty table or `bins == 0` gives no bins. When every amount is equal
/// a single bin holds all records.
pub fn order_value_histogram(table: &TransactionTable, bins: usize) -> Vec<HistogramBin> {
    let amounts: Vec<f64> = table.iter().map(|r| r.sales_amount).collect();
    let (Some(min), Some(max)) = (
        amounts.iter().copied().reduce(f64::min),
        amounts.iter().copied().reduce(f64::max),
    ) else {
        return Vec::new();
    };
    if bins == 0 {
        return Vec::new();
    }
    if max == min {
        return vec![HistogramBin {
            lower: min,
            upper: max,
            count: amounts.len(),
        }];
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for amount in &amounts {
        let idx = (((amount - min) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: min + i as f64 * width,
            upper: if i + 1 == bins { max } else { min + (i + 1) as f64 * width },
            count,
        })
        .collect()
}

/// Record count and share for every status, including absent ones.
pub fn status_distribution(table: &TransactionTable) -> Vec<StatusShare> {
    let total = table.len();
    OrderStatus::ALL
        .iter()
        .map(|status| {
            let count = table.iter().filter(|r| r.status == *status).count();
            StatusShare {
                status: *status,
                count,
                share: if total == 0 { 0.0 } else { count as f64 / total as f64 },
            }
        })
        .collect()
}

/// Returned records per category, most returns first.
pub fn returns_by_category(table: &TransactionTable) -> Vec<Ranking> {
    let returns = count_returns(table, |r| r.category.as_str());
    TopKSelector::new(returns.len()).select(returns)
}

/// The `k` products with the most returned records.
pub fn top_returned_products(table: &TransactionTable, k: usize) -> Vec<Ranking> {
    TopKSelector::new(k).select(count_returns(table, |r| r.product_name.as_str()))
}

fn count_returns<F>(table: &TransactionTable, key: F) -> Vec<Ranking>
where
    F: Fn(&Transaction) -> &str,
{
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for row in table.iter().filter(|r| r.status == OrderStatus::Returned) {
        *counts.entry(key(row)).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(label, n)| Ranking {
            label: label.to_string(),
            value: n as f64,
        })
        .collect()
}

fn top_by<K, V>(table: &TransactionTable, k: usize, key: K, value: V) -> Vec<Ranking>
where
    K: for<'a> Fn(&'a Transaction) -> &'a str,
    V: Fn(&Transaction) -> f64,
{
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for row in table.iter() {
        *totals.entry(key(row)).or_default() += value(row);
    }
    let ranked = totals
        .into_iter()
        .map(|(label, value)| Ranking {
            label: label.to_string(),
            value,
        })
        .collect();
    TopKSelector::new(k).select(ranked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{date, table, tx};

    #[test]
    fn discount_bands_are_right_inclusive() {
        let d = date(2024, 1, 1);
        let mut rows = vec![
            tx("O-1", d, "A", 100.0),
            tx("O-2", d, "A", 100.0),
            tx("O-3", d, "A", 100.0),
            tx("O-4", d, "A", 100.0),
        ];
        rows[0].discount_pct = 0.0;
        rows[1].discount_pct = 10.0;
        rows[2].discount_pct = 10.5;
        rows[3].discount_pct = 75.0;
        rows[3].profit = -30.0;

        let bands = discount_impact(&table(rows));
        assert_eq!(bands.len(), 5);
        assert_eq!(bands[0].label, "0-10%");
        assert_eq!(bands[0].orders, 2);
        assert_eq!(bands[1].orders, 1);
        assert_eq!(bands[2].orders, 0);
        assert_eq!(bands[2].average_profit, 0.0);
        assert_eq!(bands[4].label, "50%+");
        assert!((bands[4].average_profit - (-30.0)).abs() < 1e-9);
    }

    #[test]
    fn weekend_is_saturday_and_sunday() {
        // 2024-06-08 is a Saturday, 2024-06-10 a Monday
        let rows = vec![
            tx("O-1", date(2024, 6, 8), "A", 300.0),
            tx("O-2", date(2024, 6, 9), "A", 100.0),
            tx("O-3", date(2024, 6, 10), "A", 50.0),
        ];
        let split = weekday_vs_weekend(&table(rows));
        assert_eq!(split.weekend_records, 2);
        assert!((split.weekend_average_sales - 200.0).abs() < 1e-9);
        assert_eq!(split.weekday_records, 1);
        assert!((split.weekday_average_sales - 50.0).abs() < 1e-9);
    }

    #[test]
    fn returns_rank_by_count_then_label() {
        let d = date(2024, 1, 1);
        let mut rows = vec![
            tx("O-1", d, "Mug", 10.0),
            tx("O-2", d, "Mug", 10.0),
            tx("O-3", d, "Bowl", 10.0),
            tx("O-4", d, "Cup", 10.0),
            tx("O-5", d, "Plate", 10.0),
        ];
        for row in rows.iter_mut().take(4) {
            row.status = OrderStatus::Returned;
        }
        let top = top_returned_products(&table(rows), 2);
        let labels: Vec<&str> = top.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["Mug", "Bowl"]);
        assert_eq!(top[0].value, 2.0);
    }

    #[test]
    fn status_distribution_lists_every_status() {
        let d = date(2024, 1, 1);
        let mut rows = vec![tx("O-1", d, "A", 10.0), tx("O-2", d, "A", 10.0)];
        rows[1].status = OrderStatus::Pending;
        let dist = status_distribution(&table(rows));
        assert_eq!(dist.len(), 4);
        assert!((dist[0].share - 0.5).abs() < 1e-12);
        assert_eq!(dist[2].count, 0);
    }

    #[test]
    fn regional_leaders() {
        let d = date(2024, 1, 1);
        let mut rows = vec![
            tx("O-1", d, "A", 100.0),
            tx("O-2", d, "A", 400.0),
            tx("O-3", d, "A", 250.0),
        ];
        rows[1].city = "Mumbai".into();
        rows[1].state = "Maharashtra".into();
        rows[2].city = "Mysuru".into();
        let b = Breakdown::compute(&table(rows), 2);
        assert_eq!(b.top_cities_by_sales[0].label, "Mumbai");
        assert_eq!(b.top_cities_by_sales.len(), 2);
        assert_eq!(b.top_states_by_sales[0].label, "Maharashtra");
        assert!((b.top_states_by_sales[1].value - 350.0).abs() < 1e-9);
        assert_eq!(b.top_cities_by_profit[1].label, "Mysuru");
    }

    #[test]
    fn category_margin() {
        let d = date(2024, 1, 1);
        let mut rows = vec![tx("O-1", d, "A", 200.0), tx("O-2", d, "B", 100.0)];
        rows[1].category = "Books".into();
        rows[1].profit = 50.0;
        let cats = category_profitability(&table(rows));
        assert_eq!(cats[0].category, "Books");
        assert!((cats[0].margin_pct - 50.0).abs() < 1e-9);
        assert!((cats[1].margin_pct - 20.0).abs() < 1e-9);
    }

    #[test]
    fn payment_methods_share_sales() {
        let d = date(2024, 1, 1);
        let mut rows = vec![
            tx("O-1", d, "A", 300.0),
            tx("O-2", d, "A", 100.0),
            tx("O-3", d, "A", 600.0),
            tx("O-4", d, "A", 0.0),
        ];
        rows[1].payment_method = "Credit Card".into();
        rows[2].payment_method = "COD".into();
        rows[3].payment_method = String::new();

        let shares = sales_by_payment_method(&table(rows));
        let labels: Vec<&str> = shares.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["COD", "UPI", "Credit Card", "Unspecified"]);
        assert!((shares[0].share - 0.6).abs() < 1e-12);
        assert!((shares.iter().map(|s| s.share).sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn category_mix_without_sales_has_zero_shares() {
        let d = date(2024, 1, 1);
        let mut rows = vec![tx("O-1", d, "A", 0.0), tx("O-2", d, "B", 0.0)];
        rows[1].category = "Books".into();
        let mix = category_mix(&table(rows));
        assert_eq!(mix.len(), 2);
        assert!(mix.iter().all(|s| s.share == 0.0));
    }

    #[test]
    fn heatmap_averages_weekday_month_cells() {
        // 2024-06-03 and 2024-06-10 are Mondays, 2024-07-01 a Monday,
        // 2024-06-08 a Saturday
        let rows = vec![
            tx("O-1", date(2024, 6, 3), "A", 100.0),
            tx("O-2", date(2024, 6, 10), "A", 300.0),
            tx("O-3", date(2024, 7, 1), "A", 50.0),
            tx("O-4", date(2024, 6, 8), "A", 80.0),
        ];
        let cells = weekday_month_heatmap(&table(rows));
        assert_eq!(cells.len(), 3);
        assert_eq!((cells[0].weekday.as_str(), cells[0].month), ("Mon", 6));
        assert_eq!(cells[0].records, 2);
        assert!((cells[0].average_sales - 200.0).abs() < 1e-9);
        assert_eq!((cells[1].weekday.as_str(), cells[1].month), ("Mon", 7));
        assert_eq!((cells[2].weekday.as_str(), cells[2].month), ("Sat", 6));
    }

    #[test]
    fn weekly_sales_follow_iso_weeks() {
        // 2024-12-30 (Mon) opens ISO week 1 of 2025; 2025-01-05 is its Sunday
        let rows = vec![
            tx("O-1", date(2024, 12, 29), "A", 10.0),
            tx("O-2", date(2024, 12, 30), "A", 20.0),
            tx("O-3", date(2025, 1, 5), "A", 30.0),
        ];
        let weeks = weekly_sales(&table(rows));
        assert_eq!(weeks.len(), 2);
        assert_eq!((weeks[0].iso_year, weeks[0].iso_week), (2024, 52));
        assert_eq!(weeks[0].week_start, date(2024, 12, 23));
        assert_eq!((weeks[1].iso_year, weeks[1].iso_week), (2025, 1));
        assert_eq!(weeks[1].records, 2);
        assert!((weeks[1].sales - 50.0).abs() < 1e-9);
    }

    #[test]
    fn histogram_bins_cover_the_value_range() {
        let d = date(2024, 1, 1);
        let rows = [0.0, 10.0, 49.9, 50.0, 100.0]
            .iter()
            .enumerate()
            .map(|(i, v)| tx(&format!("O-{i}"), d, "A", *v))
            .collect();
        let bins = order_value_histogram(&table(rows), 4);
        assert_eq!(bins.len(), 4);
        let counts: Vec<usize> = bins.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![2, 1, 1, 1]);
        assert_eq!(bins[0].lower, 0.0);
        assert_eq!(bins[1].upper, 50.0);
        assert_eq!(bins[3].upper, 100.0);
    }

    #[test]
    fn histogram_of_equal_values_is_one_bin() {
        let d = date(2024, 1, 1);
        let rows = vec![tx("O-1", d, "A", 42.0), tx("O-2", d, "A", 42.0)];
        let bins = order_value_histogram(&table(rows), 30);
        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].count, 2);
        assert!(order_value_histogram(&table(Vec::new()), 30).is_empty());
    }

    #[test]
    fn empty_table_breakdown() {
        let b = Breakdown::compute(&table(Vec::new()), 5);
        assert!(b.categories.is_empty());
        assert!(b.discount_bands.iter().all(|band| band.orders == 0));
        assert_eq!(b.day_type, DayTypeSales::default());
        assert!(b.status.iter().all(|s| s.share == 0.0));
        assert!(b.sales_by_payment_method.is_empty());
        assert!(b.weekday_month_heatmap.is_empty());
        assert!(b.weekly_sales.is_empty());
        assert!(b.order_value_histogram.is_empty());
    }
}
