use std::collections::BTreeSet;

use crate::filter::{Filter, FilterResult};
use crate::types::{FilterSpec, Transaction};

/// Which text column a membership filter selects on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MembershipField {
    State,
    City,
    Category,
}

/// Keeps rows whose state, city or category is in the selected set.
///
/// An empty selection means "all" and disables the filter.
pub struct MembershipFilter {
    pub field: MembershipField,
}

impl MembershipFilter {
    pub fn new(field: MembershipField) -> Self {
        Self { field }
    }

    fn selection<'a>(&self, query: &'a FilterSpec) -> &'a BTreeSet<String> {
        match self.field {
            MembershipField::State => &query.states,
            MembershipField::City => &query.cities,
            MembershipField::Category => &query.categories,
        }
    }

    fn value<'a>(&self, row: &'a Transaction) -> &'a str {
        match self.field {
            MembershipField::State => &row.state,
            MembershipField::City => &row.city,
            MembershipField::Category => &row.category,
        }
    }
}

impl Filter<FilterSpec, Transaction> for MembershipFilter {
    fn enable(&self, query: &FilterSpec) -> bool {
        !self.selection(query).is_empty()
    }

    fn filter(
        &self,
        query: &FilterSpec,
        candidates: Vec<Transaction>,
    ) -> FilterResult<Transaction> {
        let selected = self.selection(query);
        let (kept, removed) = candidates
            .into_iter()
            .partition(|t| selected.contains(self.value(t)));
        FilterResult { kept, removed }
    }

    fn name(&self) -> &str {
        match self.field {
            MembershipField::State => "StateFilter",
            MembershipField::City => "CityFilter",
            MembershipField::Category => "CategoryFilter",
        }
    }
}
