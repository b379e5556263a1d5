//! Dashboard bridge: the explicit request/response layer between a
//! presentation layer and the analytics pipeline.
//!
//! The presentation layer sends JSON. This bridge parses it into exactly
//! one of the valid analytics operations, validates the filter and the
//! parameters, answers from the session cache when it can, and returns a
//! structured result.
//!
//! - Every operation is an enum variant with validated parameters
//! - Every response is a structured type, not free-form text
//! - Invalid requests are rejected at parse time, before any computation
//! - Cached results are scoped to one table version and one filter spec

pub mod cache;
pub mod error;
pub mod ops;
pub mod protocol;
pub mod results;

pub use cache::{AnalyticsCache, CacheStats};
pub use error::{BridgeError, BridgeResult};
pub use ops::AnalyticsOperation;
pub use protocol::{AuditEntry, DashboardRequest, DashboardResponse, Session};
pub use results::OperationResult;
