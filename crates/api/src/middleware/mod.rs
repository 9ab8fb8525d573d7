//! HTTP middleware components.

pub mod auth;
pub mod logging;
pub mod metrics;
pub mod rate_limit;
pub mod trace_id;

pub use auth::require_admin;
pub use metrics::{init_metrics, metrics_handler, metrics_middleware};
pub use rate_limit::{rate_limit_middleware, GovernorStore, RateLimitStore, RateLimiterState};
pub use trace_id::{trace_id, REQUEST_ID_HEADER};
