//! Metrics sink for interception events.
//!
//! Turns completion and audit events into `metrics` counters and histograms.
//! Without an installed recorder the macros are no-ops.

use fintrack_core::{InterceptionEvent, InterceptionSink};

/// Histogram of operation durations, labelled by signature and outcome.
pub const OPERATION_DURATION: &str = "fintrack_operation_duration_seconds";
/// Counter of completed operations, labelled by signature and outcome.
pub const OPERATIONS_TOTAL: &str = "fintrack_operations_total";
/// Counter of audit records, labelled by action.
pub const AUDIT_RECORDS_TOTAL: &str = "fintrack_audit_records_total";

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSink;

impl InterceptionSink for MetricsSink {
    fn record(&self, event: &InterceptionEvent) {
        match event {
            InterceptionEvent::Entered { .. } => {}
            InterceptionEvent::Audited(record) => {
                metrics::counter!(AUDIT_RECORDS_TOTAL, "action" => record.action.clone())
                    .increment(1);
            }
            InterceptionEvent::Completed(trace) => {
                let outcome = trace.outcome.as_str();
                metrics::histogram!(
                    OPERATION_DURATION,
                    "signature" => trace.signature.clone(),
                    "outcome" => outcome
                )
                .record(trace.elapsed.as_secs_f64());
                metrics::counter!(
                    OPERATIONS_TOTAL,
                    "signature" => trace.signature.clone(),
                    "outcome" => outcome
                )
                .increment(1);
            }
        }
    }
}
