//! Tower middleware layers for the operation pipeline.
//!
//! - [`timeout`]: Per-operation timeout enforcement
//! - [`timing`]: Entry and completion events with elapsed wall-clock time
//! - [`audit`]: Caller audit records for auditable operations
//! - [`metrics`]: Interception sink feeding `metrics` counters and histograms
//! - [`pipeline`]: Composes all layers into a single service stack

pub mod audit;
pub mod metrics;
pub mod pipeline;
pub mod timeout;
pub mod timing;

pub use audit::AuditLayer;
pub use metrics::MetricsSink;
pub use pipeline::build_operation_pipeline;
pub use timeout::TimeoutLayer;
pub use timing::TimingLayer;
