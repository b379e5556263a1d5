use crate::filter::{Filter, FilterResult};
use crate::types::{FilterSpec, Transaction};

/// Keeps orders placed inside the inclusive date range.
pub struct DateRangeFilter;

impl Filter<FilterSpec, Transaction> for DateRangeFilter {
    fn enable(&self, query: &FilterSpec) -> bool {
        query.date_range.is_some()
    }

    fn filter(
        &self,
        query: &FilterSpec,
        candidates: Vec<Transaction>,
    ) -> FilterResult<Transaction> {
        let Some(range) = query.date_range else {
            return FilterResult {
                kept: candidates,
                removed: Vec::new(),
            };
        };
        let (kept, removed) = candidates
            .into_iter()
            .partition(|t| range.contains(t.order_date));
        FilterResult { kept, removed }
    }
}
