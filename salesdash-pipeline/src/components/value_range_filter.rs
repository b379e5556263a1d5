use crate::filter::{Filter, FilterResult};
use crate::types::{FilterSpec, Transaction, ValueRange};

/// Which numeric measure a range filter bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RangeField {
    ProfitMargin,
    Discount,
    Quantity,
    SalesAmount,
}

/// Keeps rows whose measure lies inside the inclusive range.
pub struct ValueRangeFilter {
    pub field: RangeField,
}

impl ValueRangeFilter {
    pub fn new(field: RangeField) -> Self {
        Self { field }
    }

    fn range(&self, query: &FilterSpec) -> Option<ValueRange> {
        match self.field {
            RangeField::ProfitMargin => query.profit_margin,
            RangeField::Discount => query.discount,
            RangeField::Quantity => query.quantity,
            RangeField::SalesAmount => query.sales_amount,
        }
    }

    fn measure(&self, row: &Transaction) -> f64 {
        match self.field {
            RangeField::ProfitMargin => row.profit_margin_pct(),
            RangeField::Discount => row.discount_pct,
            RangeField::Quantity => row.quantity as f64,
            RangeField::SalesAmount => row.sales_amount,
        }
    }
}

impl Filter<FilterSpec, Transaction> for ValueRangeFilter {
    fn enable(&self, query: &FilterSpec) -> bool {
        self.range(query).is_some()
    }

    fn filter(
        &self,
        query: &FilterSpec,
        candidates: Vec<Transaction>,
    ) -> FilterResult<Transaction> {
        let Some(range) = self.range(query) else {
            return FilterResult {
                kept: candidates,
                removed: Vec::new(),
            };
        };
        let (kept, removed) = candidates
            .into_iter()
            .partition(|t| range.contains(self.measure(t)));
        FilterResult { kept, removed }
    }

    fn name(&self) -> &str {
        match self.field {
            RangeField::ProfitMargin => "ProfitMarginFilter",
            RangeField::Discount => "DiscountFilter",
            RangeField::Quantity => "QuantityFilter",
            RangeField::SalesAmount => "SalesAmountFilter",
        }
    }
}
