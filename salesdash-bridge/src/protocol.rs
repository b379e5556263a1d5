//! Session protocol: request parsing, execution, and response formatting.
//!
//! Every dashboard interaction is one explicit call:
//! 1. JSON text -> parse into a DashboardRequest (reject if invalid)
//! 2. Validate the filter and operation parameters
//! 3. Enter the cache scope of (table version, filter spec)
//! 4. Return the memoized result, or compute and memoize it
//! 5. Log the request for the audit trail

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use salesdash_pipeline::breakdown::Breakdown;
use salesdash_pipeline::pipelines::dashboard::DashboardPipeline;
use salesdash_pipeline::{abc, anomaly, demand, forecast, kpi, time_series};
use salesdash_pipeline::{AnalyticsError, FilterEngine, FilterSpec, TransactionTable};

use crate::cache::{AnalyticsCache, CacheStats};
use crate::error::{BridgeError, BridgeResult};
use crate::ops::AnalyticsOperation;
use crate::results::OperationResult;

/// A request from the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardRequest {
    /// Request ID for tracking.
    pub request_id: String,

    /// Filter applied before the operation. Absent means no filtering.
    #[serde(default)]
    pub filter: FilterSpec,

    /// The operation to perform.
    pub operation: AnalyticsOperation,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardResponse {
    /// Request ID (echoed back).
    pub request_id: String,

    pub operation: String,

    /// True when the result came from the session cache.
    pub cached: bool,

    /// Version of the session table the result was computed from.
    pub table_version: u64,

    pub result: OperationResult,
}

/// Audit log entry for a processed request.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub request_id: String,
    pub operation: String,
    pub success: bool,
    pub cache_hit: bool,
    pub error: Option<String>,
}

/// One user's analysis session over a single in-memory table.
pub struct Session {
    table: TransactionTable,
    engine: FilterEngine,
    cache: AnalyticsCache,

    /// Audit log of all processed requests.
    pub audit_log: Vec<AuditEntry>,

    /// Sequence counter for audit.
    step: u64,
}

impl Session {
    pub fn new(table: TransactionTable) -> Self {
        Session {
            table,
            engine: FilterEngine::new(),
            cache: AnalyticsCache::new(),
            audit_log: Vec::new(),
            step: 0,
        }
    }

    pub fn table(&self) -> &TransactionTable {
        &self.table
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Swap in a new table. Every memoized result is dropped.
    pub fn replace_table(&mut self, table: TransactionTable) {
        log::info!(
            "session table replaced: version {:016x} -> {:016x}, {} rows",
            self.table.version(),
            table.version(),
            table.len()
        );
        self.table = table;
        self.cache.invalidate();
    }

    /// Parse raw JSON into a validated DashboardRequest.
    pub fn parse_request(&self, raw_json: &str) -> BridgeResult<DashboardRequest> {
        let request: DashboardRequest = serde_json::from_str(raw_json).map_err(|e| {
            BridgeError::UnknownOperation(format!("Failed to parse request: {}", e))
        })?;

        request.filter.validate()?;
        self.validate_operation(&request.operation)?;

        Ok(request)
    }

    /// Validate operation parameters.
    pub fn validate_operation(&self, op: &AnalyticsOperation) -> BridgeResult<()> {
        let checked = match op {
            AnalyticsOperation::Anomalies { threshold, .. } => {
                anomaly::validate_threshold(*threshold)
            }
            AnalyticsOperation::Demand { weights, top_k, .. } => {
                if *top_k == Some(0) {
                    return Err(invalid(op, "top_k must be > 0"));
                }
                weights.validate()
            }
            AnalyticsOperation::Forecast {
                horizon, scenario, ..
            } => forecast::validate_horizon(*horizon).and_then(|_| scenario.validate()),
            AnalyticsOperation::Breakdown { top_k } => {
                if *top_k == 0 {
                    return Err(invalid(op, "top_k must be > 0"));
                }
                Ok(())
            }
            AnalyticsOperation::Dashboard { options } => options.validate(),
            AnalyticsOperation::Kpis
            | AnalyticsOperation::Abc
            | AnalyticsOperation::TimeSeries { .. } => Ok(()),
        };
        checked.map_err(|e| invalid(op, e.to_string()))
    }

    /// Process a request against the session table.
    ///
    /// Repeated requests within the same (table, filter) scope are answered
    /// from the cache. Failed computations are audited but never cached.
    pub fn process(&mut self, request: &DashboardRequest) -> BridgeResult<DashboardResponse> {
        self.step += 1;
        let outcome = self.execute(request);

        self.audit_log.push(AuditEntry {
            sequence: self.step,
            timestamp: Utc::now(),
            request_id: request.request_id.clone(),
            operation: request.operation.describe(),
            success: outcome.is_ok(),
            cache_hit: outcome.as_ref().map(|(_, hit)| *hit).unwrap_or(false),
            error: outcome.as_ref().err().map(|e| e.to_string()),
        });

        let (result, cached) = outcome?;
        Ok(DashboardResponse {
            request_id: request.request_id.clone(),
            operation: request.operation.name().to_string(),
            cached,
            table_version: self.table.version(),
            result,
        })
    }

    /// Parse, validate and process in one call.
    pub fn handle(&mut self, raw_json: &str) -> BridgeResult<DashboardResponse> {
        let request = self.parse_request(raw_json)?;
        self.process(&request)
    }

    fn execute(&mut self, request: &DashboardRequest) -> BridgeResult<(OperationResult, bool)> {
        request.filter.validate()?;
        self.validate_operation(&request.operation)?;

        let filter_key = request.filter.cache_key()?;
        self.cache.enter_scope(self.table.version(), &filter_key);

        let operation_key = serde_json::to_string(&request.operation)?;
        if let Some(hit) = self.cache.get(&operation_key) {
            log::debug!("cache hit: {} ({})", request.operation.name(), request.request_id);
            return Ok((hit, true));
        }

        let filtered = match self.cache.filtered_table() {
            Some(table) => table.clone(),
            None => {
                let table = self.engine.apply(&self.table, &request.filter)?;
                self.cache.store_filtered_table(table.clone());
                table
            }
        };

        let result = self.dispatch(&request.operation, &filtered)?;
        log::info!(
            "computed {} for {}: {}",
            request.operation.name(),
            request.request_id,
            result.summary()
        );
        self.cache.insert(operation_key, result.clone());
        Ok((result, false))
    }

    fn dispatch(
        &self,
        op: &AnalyticsOperation,
        filtered: &TransactionTable,
    ) -> Result<OperationResult, AnalyticsError> {
        Ok(match op {
            AnalyticsOperation::Kpis => {
                let kpis = kpi::aggregate(filtered);
                let delta = kpi::compare(&kpis, &kpi::aggregate(&self.table));
                OperationResult::KpiSummary { kpis, delta }
            }
            AnalyticsOperation::Abc => OperationResult::AbcTiers {
                assignment: abc::classify(filtered),
            },
            AnalyticsOperation::TimeSeries { granularity } => OperationResult::Series {
                analysis: time_series::analyze(filtered, *granularity),
            },
            AnalyticsOperation::Anomalies {
                granularity,
                metric,
                threshold,
            } => {
                let flags = match granularity {
                    Some(g) => {
                        let series = time_series::buckets(filtered, *g);
                        anomaly::detect(&series, *metric, *threshold)?
                    }
                    None => anomaly::detect_records(filtered, *threshold)?,
                };
                let flagged = flags.iter().filter(|f| f.is_anomalous).count();
                OperationResult::AnomalyFlags { flags, flagged }
            }
            AnalyticsOperation::Demand {
                dimension,
                weights,
                top_k,
            } => {
                let scores = demand::score(filtered, *dimension, weights)?;
                OperationResult::DemandRanking {
                    dimension: *dimension,
                    scores: match top_k {
                        Some(k) => demand::top(scores, *k),
                        None => scores,
                    },
                }
            }
            AnalyticsOperation::Forecast {
                granularity,
                metric,
                horizon,
                scenario,
            } => {
                let series = time_series::buckets(filtered, *granularity);
                let current = kpi::aggregate(filtered).total_sales;
                OperationResult::Projection {
                    forecast: forecast::forecast(&series, *metric, *horizon, *scenario)?,
                    revenue: forecast::project_revenue(current, *scenario)?,
                }
            }
            AnalyticsOperation::Breakdown { top_k } => OperationResult::Breakdowns {
                breakdown: Breakdown::compute(filtered, *top_k),
            },
            AnalyticsOperation::Dashboard { options } => {
                let report = DashboardPipeline::with_options(options.clone())
                    .report(&self.table, filtered)?;
                OperationResult::Dashboard {
                    report: Box::new(report),
                }
            }
        })
    }
}

fn invalid(op: &AnalyticsOperation, reason: impl Into<String>) -> BridgeError {
    BridgeError::InvalidParameter {
        op: op.name().into(),
        reason: reason.into(),
    }
}
