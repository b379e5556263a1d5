//! Composite demand ranking of products or cities.
//!
//! Each key gets three raw measures (sales volume, order frequency, quantity
//! sold). Every measure is min-max scaled to [0, 1] across keys and the
//! composite is their weighted sum. A measure with no spread contributes 0.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use salesdash_stats::defaults::{
    DEMAND_WEIGHT_FREQUENCY, DEMAND_WEIGHT_QUANTITY, DEMAND_WEIGHT_SALES,
};
use salesdash_stats::math::min_max_normalize;

use crate::components::top_k_selector::TopKSelector;
use crate::error::{AnalyticsError, AnalyticsResult};
use crate::selector::{Ranked, Selector};
use crate::types::{Transaction, TransactionTable};

/// What demand is ranked by.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DemandDimension {
    #[default]
    Product,
    City,
}

impl DemandDimension {
    fn key<'a>(&self, row: &'a Transaction) -> &'a str {
        match self {
            DemandDimension::Product => &row.product_name,
            DemandDimension::City => &row.city,
        }
    }
}

impl fmt::Display for DemandDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DemandDimension::Product => write!(f, "product"),
            DemandDimension::City => write!(f, "city"),
        }
    }
}

/// Weights of the normalized measures in the composite score.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DemandWeights {
    pub sales: f64,
    pub frequency: f64,
    pub quantity: f64,
}

impl Default for DemandWeights {
    fn default() -> Self {
        Self {
            sales: DEMAND_WEIGHT_SALES,
            frequency: DEMAND_WEIGHT_FREQUENCY,
            quantity: DEMAND_WEIGHT_QUANTITY,
        }
    }
}

impl DemandWeights {
    pub fn validate(&self) -> AnalyticsResult<()> {
        for (name, w) in [
            ("weights.sales", self.sales),
            ("weights.frequency", self.frequency),
            ("weights.quantity", self.quantity),
        ] {
            if !w.is_finite() || w < 0.0 {
                return Err(AnalyticsError::invalid_param(
                    name,
                    format!("must be a non-negative number, got {}", w),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DemandScore {
    pub key: String,
    pub sales: f64,
    /// Distinct orders containing the key.
    pub orders: usize,
    pub quantity: u64,
    pub score: f64,
}

impl Ranked for DemandScore {
    fn rank_value(&self) -> f64 {
        self.score
    }
}

#[derive(Default)]
struct KeyTotals<'a> {
    sales: f64,
    orders: BTreeSet<&'a str>,
    quantity: u64,
}

/// Score every distinct key of `dimension`, highest score first (ties by key).
pub fn score(
    table: &TransactionTable,
    dimension: DemandDimension,
    weights: &DemandWeights,
) -> AnalyticsResult<Vec<DemandScore>> {
    weights.validate()?;

    let mut totals: BTreeMap<&str, KeyTotals> = BTreeMap::new();
    for row in table.iter() {
        let entry = totals.entry(dimension.key(row)).or_default();
        entry.sales += row.sales_amount;
        entry.orders.insert(row.order_id.as_str());
        entry.quantity += row.quantity as u64;
    }

    let sales: Vec<f64> = totals.values().map(|t| t.sales).collect();
    let orders: Vec<f64> = totals.values().map(|t| t.orders.len() as f64).collect();
    let quantity: Vec<f64> = totals.values().map(|t| t.quantity as f64).collect();
    let (sales_n, orders_n, quantity_n) = (
        min_max_normalize(&sales),
        min_max_normalize(&orders),
        min_max_normalize(&quantity),
    );

    // Keys come out of the BTreeMap in ascending order; the stable sort in
    // the selector keeps that order among equal scores.
    let scored: Vec<DemandScore> = totals
        .into_iter()
        .enumerate()
        .map(|(i, (key, t))| DemandScore {
            key: key.to_string(),
            sales: t.sales,
            orders: t.orders.len(),
            quantity: t.quantity,
            score: weights.sales * sales_n[i]
                + weights.frequency * orders_n[i]
                + weights.quantity * quantity_n[i],
        })
        .collect();

    let ranked = TopKSelector::new(scored.len()).select(scored);
    log::debug!("demand dimension={} keys={}", dimension, ranked.len());
    Ok(ranked)
}

/// The `k` highest-scoring entries of an already ranked list.
pub fn top(scores: Vec<DemandScore>, k: usize) -> Vec<DemandScore> {
    TopKSelector::new(k).select(scores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{date, table, tx};

    #[test]
    fn composite_uses_default_weights() {
        let d = date(2024, 1, 1);
        let mut rows = vec![
            tx("O-1", d, "Kettle", 1000.0),
            tx("O-2", d, "Kettle", 1000.0),
            tx("O-3", d, "Toaster", 0.0),
            tx("O-4", d, "Mixer", 500.0),
        ];
        rows[0].quantity = 4;
        rows[3].quantity = 2;

        let scores = score(&table(rows), DemandDimension::Product, &DemandWeights::default()).unwrap();
        let keys: Vec<&str> = scores.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["Kettle", "Mixer", "Toaster"]);
        // Kettle: sales 1, orders 1, quantity 1
        assert!((scores[0].score - 1.0).abs() < 1e-12);
        // Mixer: sales 0.25, orders 0, quantity (2-1)/(5-1)=0.25
        assert!((scores[1].score - (0.5 * 0.25 + 0.2 * 0.25)).abs() < 1e-12);
        assert_eq!(scores[2].score, 0.0);
    }

    #[test]
    fn flat_dimension_contributes_nothing() {
        let d = date(2024, 1, 1);
        let rows = vec![
            tx("O-1", d, "A", 100.0),
            tx("O-2", d, "B", 300.0),
        ];
        let scores = score(&table(rows), DemandDimension::Product, &DemandWeights::default()).unwrap();
        // orders and quantity are equal across keys
        assert!((scores[0].score - 0.5).abs() < 1e-12);
        assert_eq!(scores[1].score, 0.0);
    }

    #[test]
    fn equal_scores_rank_by_key() {
        let d = date(2024, 1, 1);
        let rows = vec![
            tx("O-1", d, "Lamp", 100.0),
            tx("O-2", d, "Lamp", 100.0),
        ];
        let mut rows = rows;
        rows[0].city = "Pune".into();
        rows[1].city = "Agra".into();
        let scores = score(&table(rows), DemandDimension::City, &DemandWeights::default()).unwrap();
        let keys: Vec<&str> = scores.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["Agra", "Pune"]);
    }

    #[test]
    fn negative_weight_is_rejected() {
        let weights = DemandWeights {
            sales: -0.1,
            ..DemandWeights::default()
        };
        assert!(matches!(
            score(&table(Vec::new()), DemandDimension::Product, &weights),
            Err(AnalyticsError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn top_truncates() {
        let d = date(2024, 1, 1);
        let rows = (0..5).map(|i| tx(&format!("O-{i}"), d, &format!("P{i}"), 100.0 * (i + 1) as f64)).collect();
        let scores = score(&table(rows), DemandDimension::Product, &DemandWeights::default()).unwrap();
        let best = top(scores, 2);
        assert_eq!(best.len(), 2);
        assert_eq!(best[0].key, "P4");
    }
}
