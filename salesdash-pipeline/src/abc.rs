//! ABC (Pareto) classification of products by cumulative revenue share.
//!
//! Products are ranked by revenue (descending, ties by name ascending) and a
//! running cumulative share of total revenue decides the tier:
//! - A: cumulative share at or below 70%
//! - B: at or below 90%
//! - C: everything after that, and every product when total revenue is 0

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use salesdash_stats::defaults::{ABC_A_CUTOFF_PCT, ABC_B_CUTOFF_PCT};

use crate::types::TransactionTable;

/// Slack for float noise in the running percentage at a cutoff.
const CUTOFF_EPSILON: f64 = 1e-9;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum AbcClass {
    A,
    B,
    C,
}

impl AbcClass {
    pub fn recommendation(&self) -> Recommendation {
        match self {
            AbcClass::A => Recommendation::RestockImmediately,
            AbcClass::B => Recommendation::MaintainStock,
            AbcClass::C => Recommendation::MonitorOrClear,
        }
    }
}

impl fmt::Display for AbcClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbcClass::A => write!(f, "A"),
            AbcClass::B => write!(f, "B"),
            AbcClass::C => write!(f, "C"),
        }
    }
}

/// Stocking action suggested for a tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Recommendation {
    RestockImmediately,
    MaintainStock,
    MonitorOrClear,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recommendation::RestockImmediately => write!(f, "Restock immediately"),
            Recommendation::MaintainStock => write!(f, "Maintain stock"),
            Recommendation::MonitorOrClear => write!(f, "Monitor / clearance"),
        }
    }
}

/// One ranked product.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProductTier {
    pub product: String,
    pub revenue: f64,
    /// Number of records for the product.
    pub frequency: usize,
    pub average_profit: f64,
    /// Running share of total revenue up to and including this product.
    pub cumulative_pct: f64,
    pub class: AbcClass,
    pub recommendation: Recommendation,
}

/// Products in rank order, each assigned exactly one tier.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AbcAssignment {
    pub products: Vec<ProductTier>,
    pub total_revenue: f64,
}

impl AbcAssignment {
    pub fn tier_of(&self, product: &str) -> Option<AbcClass> {
        self.products
            .iter()
            .find(|p| p.product == product)
            .map(|p| p.class)
    }

    pub fn products_in(&self, class: AbcClass) -> impl Iterator<Item = &ProductTier> {
        self.products.iter().filter(move |p| p.class == class)
    }

    /// Share of total revenue (percent) held by the given tier.
    pub fn revenue_share_pct(&self, class: AbcClass) -> f64 {
        if self.total_revenue == 0.0 {
            return 0.0;
        }
        let revenue: f64 = self.products_in(class).map(|p| p.revenue).sum();
        revenue * 100.0 / self.total_revenue
    }
}

#[derive(Default)]
struct ProductTotals {
    revenue: f64,
    profit: f64,
    count: usize,
}

/// Classify every distinct product in `table`.
pub fn classify(table: &TransactionTable) -> AbcAssignment {
    // BTreeMap gives name-ascending order, which the stable sort below keeps
    // as the tie-break for equal revenue.
    let mut totals: BTreeMap<&str, ProductTotals> = BTreeMap::new();
    for row in table.iter() {
        let entry = totals.entry(row.product_name.as_str()).or_default();
        entry.revenue += row.sales_amount;
        entry.profit += row.profit;
        entry.count += 1;
    }

    let mut ranked: Vec<(&str, ProductTotals)> = totals.into_iter().collect();
    ranked.sort_by(|a, b| b.1.revenue.total_cmp(&a.1.revenue));

    let total_revenue: f64 = ranked.iter().map(|(_, t)| t.revenue).sum();
    let mut cumulative = 0.0;

    let products = ranked
        .into_iter()
        .map(|(name, t)| {
            cumulative += t.revenue;
            let (cumulative_pct, class) = if total_revenue > 0.0 {
                let pct = cumulative * 100.0 / total_revenue;
                (pct, tier_for(pct))
            } else {
                (0.0, AbcClass::C)
            };
            ProductTier {
                product: name.to_string(),
                revenue: t.revenue,
                frequency: t.count,
                average_profit: t.profit / t.count as f64,
                cumulative_pct,
                class,
                recommendation: class.recommendation(),
            }
        })
        .collect();

    AbcAssignment {
        products,
        total_revenue,
    }
}

fn tier_for(cumulative_pct: f64) -> AbcClass {
    if cumulative_pct <= ABC_A_CUTOFF_PCT + CUTOFF_EPSILON {
        AbcClass::A
    } else if cumulative_pct <= ABC_B_CUTOFF_PCT + CUTOFF_EPSILON {
        AbcClass::B
    } else {
        AbcClass::C
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{date, table, tx};

    #[test]
    fn cutoffs_follow_cumulative_share() {
        let d = date(2024, 1, 1);
        let t = table(vec![
            tx("O-1", d, "Drill", 500.0),
            tx("O-2", d, "Saw", 200.0),
            tx("O-3", d, "Hammer", 150.0),
            tx("O-4", d, "Nails", 50.0),
            tx("O-5", d, "Glue", 100.0),
        ]);
        let abc = classify(&t);
        // cumulative: Drill 50, Saw 70, Hammer 85, Glue 95, Nails 100
        let order: Vec<&str> = abc.products.iter().map(|p| p.product.as_str()).collect();
        assert_eq!(order, vec!["Drill", "Saw", "Hammer", "Glue", "Nails"]);
        assert_eq!(abc.tier_of("Drill"), Some(AbcClass::A));
        assert_eq!(abc.tier_of("Saw"), Some(AbcClass::A));
        assert_eq!(abc.tier_of("Hammer"), Some(AbcClass::B));
        assert_eq!(abc.tier_of("Glue"), Some(AbcClass::C));
        assert_eq!(abc.tier_of("Nails"), Some(AbcClass::C));
        assert!((abc.revenue_share_pct(AbcClass::A) - 70.0).abs() < 1e-9);
    }

    #[test]
    fn revenue_is_summed_per_product() {
        let d = date(2024, 1, 1);
        let t = table(vec![
            tx("O-1", d, "Drill", 100.0),
            tx("O-2", d, "Drill", 300.0),
            tx("O-3", d, "Saw", 100.0),
        ]);
        let abc = classify(&t);
        assert_eq!(abc.products[0].product, "Drill");
        assert!((abc.products[0].revenue - 400.0).abs() < 1e-9);
        assert_eq!(abc.products[0].frequency, 2);
        assert!((abc.products[0].average_profit - 40.0).abs() < 1e-9);
    }

    #[test]
    fn equal_revenue_ties_by_name() {
        let d = date(2024, 1, 1);
        let t = table(vec![
            tx("O-1", d, "Zeta", 100.0),
            tx("O-2", d, "Alpha", 100.0),
            tx("O-3", d, "Mid", 100.0),
        ]);
        let abc = classify(&t);
        let order: Vec<&str> = abc.products.iter().map(|p| p.product.as_str()).collect();
        assert_eq!(order, vec!["Alpha", "Mid", "Zeta"]);
    }

    #[test]
    fn zero_revenue_puts_everything_in_c() {
        let d = date(2024, 1, 1);
        let t = table(vec![tx("O-1", d, "Free", 0.0), tx("O-2", d, "Gift", 0.0)]);
        let abc = classify(&t);
        assert!(abc.products.iter().all(|p| p.class == AbcClass::C));
        assert_eq!(abc.revenue_share_pct(AbcClass::C), 0.0);
    }

    #[test]
    fn empty_table_has_no_products() {
        let abc = classify(&table(Vec::new()));
        assert!(abc.products.is_empty());
        assert_eq!(abc.tier_of("anything"), None);
    }

    #[test]
    fn recommendations_follow_class() {
        assert_eq!(AbcClass::A.recommendation(), Recommendation::RestockImmediately);
        assert_eq!(AbcClass::C.recommendation().to_string(), "Monitor / clearance");
    }
}
