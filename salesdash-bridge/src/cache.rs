//! Memoized analytics results for one session.
//!
//! Entries are valid for a single scope: one table version and one filter
//! spec. Moving to a new scope drops every entry, including the memoized
//! filtered table. Within a scope each distinct operation is computed at
//! most once.

use std::collections::HashMap;

use serde::Serialize;

use salesdash_pipeline::TransactionTable;

use crate::results::OperationResult;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Scope {
    table_version: u64,
    filter_key: String,
}

/// Hit/miss counters since the session started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub invalidations: u64,
    pub entries: usize,
}

#[derive(Debug, Default)]
pub struct AnalyticsCache {
    scope: Option<Scope>,
    filtered: Option<TransactionTable>,
    results: HashMap<String, OperationResult>,
    hits: u64,
    misses: u64,
    invalidations: u64,
}

impl AnalyticsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter the scope of `(table_version, filter_key)`, invalidating every
    /// entry if it differs from the current one. Returns true on invalidation.
    pub fn enter_scope(&mut self, table_version: u64, filter_key: &str) -> bool {
        let unchanged = self
            .scope
            .as_ref()
            .is_some_and(|s| s.table_version == table_version && s.filter_key == filter_key);
        if unchanged {
            return false;
        }
        let had_scope = self.scope.is_some();
        if had_scope {
            self.invalidate();
            log::debug!(
                "cache scope changed: version={:016x} filter={}",
                table_version,
                filter_key
            );
        }
        self.scope = Some(Scope {
            table_version,
            filter_key: filter_key.to_string(),
        });
        had_scope
    }

    /// Drop every entry and the scope itself.
    pub fn invalidate(&mut self) {
        if self.scope.is_some() || !self.results.is_empty() {
            self.invalidations += 1;
            log::info!("cache invalidated: {} entries dropped", self.results.len());
        }
        self.scope = None;
        self.filtered = None;
        self.results.clear();
    }

    pub fn filtered_table(&self) -> Option<&TransactionTable> {
        self.filtered.as_ref()
    }

    pub fn store_filtered_table(&mut self, table: TransactionTable) {
        self.filtered = Some(table);
    }

    /// Look up an operation result, counting the hit or miss.
    pub fn get(&mut self, operation_key: &str) -> Option<OperationResult> {
        match self.results.get(operation_key) {
            Some(result) => {
                self.hits += 1;
                Some(result.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, operation_key: String, result: OperationResult) {
        self.results.insert(operation_key, result);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            invalidations: self.invalidations,
            entries: self.results.len(),
        }
    }
}
