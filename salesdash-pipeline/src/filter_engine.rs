//! Applies a `FilterSpec` to a transaction table.
//!
//! Each predicate is a `Filter` component; the engine runs the enabled ones
//! in sequence, so the result is the logical AND of every active predicate.
//! Disabled predicates (unset range, empty selection) are skipped.

use crate::components::date_range_filter::DateRangeFilter;
use crate::components::membership_filter::{MembershipField, MembershipFilter};
use crate::components::value_range_filter::{RangeField, ValueRangeFilter};
use crate::error::AnalyticsResult;
use crate::filter::Filter;
use crate::types::{FilterSpec, Transaction, TransactionTable};

pub struct FilterEngine {
    filters: Vec<Box<dyn Filter<FilterSpec, Transaction>>>,
}

impl FilterEngine {
    pub fn new() -> Self {
        let filters: Vec<Box<dyn Filter<FilterSpec, Transaction>>> = vec![
            Box::new(DateRangeFilter),
            Box::new(MembershipFilter::new(MembershipField::State)),
            Box::new(MembershipFilter::new(MembershipField::City)),
            Box::new(MembershipFilter::new(MembershipField::Category)),
            Box::new(ValueRangeFilter::new(RangeField::ProfitMargin)),
            Box::new(ValueRangeFilter::new(RangeField::Discount)),
            Box::new(ValueRangeFilter::new(RangeField::Quantity)),
            Box::new(ValueRangeFilter::new(RangeField::SalesAmount)),
        ];
        Self { filters }
    }

    pub fn filters(&self) -> &[Box<dyn Filter<FilterSpec, Transaction>>] {
        &self.filters
    }

    /// Produce the subset of `table` that satisfies every active predicate.
    ///
    /// The spec is validated first; a malformed spec never touches rows. An
    /// empty result is a valid outcome.
    pub fn apply(
        &self,
        table: &TransactionTable,
        spec: &FilterSpec,
    ) -> AnalyticsResult<TransactionTable> {
        spec.validate()?;
        if spec.is_pass_through() {
            return Ok(table.clone());
        }

        let key = spec.cache_key()?;
        let mut rows: Vec<Transaction> = table.rows().to_vec();
        for filter in self.filters.iter().filter(|f| f.enable(spec)) {
            let result = filter.filter(spec, rows);
            log::debug!(
                "filter={} kept={} removed={}",
                filter.name(),
                result.kept.len(),
                result.removed.len()
            );
            rows = result.kept;
        }

        log::info!(
            "filtered table version={:016x}: {} of {} rows kept",
            table.version(),
            rows.len(),
            table.len()
        );
        Ok(TransactionTable::derived(table.version(), &key, rows))
    }
}

impl Default for FilterEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Filter `table` with the default engine.
pub fn filter(table: &TransactionTable, spec: &FilterSpec) -> AnalyticsResult<TransactionTable> {
    FilterEngine::new().apply(table, spec)
}
