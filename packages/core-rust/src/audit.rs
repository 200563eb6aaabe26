//! Interception records and the sinks that consume them.
//!
//! Records are ephemeral: each one is handed to an [`InterceptionSink`] as
//! soon as it is produced and never stored by the interceptors themselves.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

use crate::types::{CallerIdentity, Value};

/// Actor name recorded when no caller identity is set.
pub const ANONYMOUS_ACTOR: &str = "Anonymous";

/// Who performed which action with what arguments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditRecord {
    pub actor: String,
    pub action: String,
    pub arguments: Vec<Value>,
    pub recorded_at: DateTime<Utc>,
}

impl AuditRecord {
    /// Builds a record for `identity`, falling back to [`ANONYMOUS_ACTOR`].
    #[must_use]
    pub fn new(identity: Option<&CallerIdentity>, action: &str, arguments: Vec<Value>) -> Self {
        Self {
            actor: identity.map_or_else(
                || ANONYMOUS_ACTOR.to_string(),
                |identity| identity.handle().to_string(),
            ),
            action: action.to_string(),
            arguments,
            recorded_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.actor == ANONYMOUS_ACTOR
    }
}

/// How a timed invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Ok,
    Error,
    /// The future was dropped before it completed.
    Cancelled,
    /// The future panicked while being polled.
    Panicked,
}

impl Outcome {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Ok => "ok",
            Outcome::Error => "error",
            Outcome::Cancelled => "cancelled",
            Outcome::Panicked => "panicked",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timing measurement for one intercepted call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvocationTrace {
    pub signature: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub outcome: Outcome,
}

/// Everything the interceptors emit, in emission order per call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum InterceptionEvent {
    /// Timing interception began for `signature`.
    Entered {
        signature: String,
        started_at: DateTime<Utc>,
    },
    /// Audit interception fired, before the wrapped call ran.
    Audited(AuditRecord),
    /// Timing interception finished, whatever the outcome.
    Completed(InvocationTrace),
}

/// Destination for interception events.
///
/// Implementations must not fail or block for long: they run inline on the
/// intercepted call's path.
pub trait InterceptionSink: Send + Sync {
    fn record(&self, event: &InterceptionEvent);
}

impl<S: InterceptionSink + ?Sized> InterceptionSink for Arc<S> {
    fn record(&self, event: &InterceptionEvent) {
        (**self).record(event);
    }
}

/// Writes events as structured `tracing` records under the `fintrack::audit`
/// and `fintrack::timing` targets.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl InterceptionSink for TracingSink {
    fn record(&self, event: &InterceptionEvent) {
        match event {
            InterceptionEvent::Entered { signature, .. } => {
                tracing::debug!(target: "fintrack::timing", signature = %signature, "invocation started");
            }
            InterceptionEvent::Audited(record) => {
                let arguments = Value::Array(record.arguments.clone());
                tracing::info!(
                    target: "fintrack::audit",
                    actor = %record.actor,
                    action = %record.action,
                    arguments = %arguments,
                    recorded_at = %record.recorded_at,
                    "audit"
                );
            }
            InterceptionEvent::Completed(trace) => {
                #[allow(clippy::cast_possible_truncation)]
                let duration_ms = trace.elapsed.as_millis() as u64;
                tracing::info!(
                    target: "fintrack::timing",
                    signature = %trace.signature,
                    duration_ms = duration_ms,
                    outcome = trace.outcome.as_str(),
                    "invocation complete"
                );
            }
        }
    }
}

/// Keeps every event in memory. Used by tests and diagnostics endpoints.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<InterceptionEvent>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<InterceptionEvent> {
        self.events.lock().clone()
    }

    #[must_use]
    pub fn audit_records(&self) -> Vec<AuditRecord> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                InterceptionEvent::Audited(record) => Some(record.clone()),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn traces(&self) -> Vec<InvocationTrace> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                InterceptionEvent::Completed(trace) => Some(trace.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl InterceptionSink for RecordingSink {
    fn record(&self, event: &InterceptionEvent) {
        self.events.lock().push(event.clone());
    }
}

/// Forwards each event to several sinks in order.
#[derive(Clone, Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn InterceptionSink>>,
}

impl FanoutSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, sink: Arc<dyn InterceptionSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl fmt::Debug for FanoutSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FanoutSink")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl InterceptionSink for FanoutSink {
    fn record(&self, event: &InterceptionEvent) {
        for sink in &self.sinks {
            sink.record(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_without_identity_is_anonymous() {
        let record = AuditRecord::new(None, "create_transaction", vec![Value::Float(100.0)]);
        assert_eq!(record.actor, "Anonymous");
        assert!(record.is_anonymous());
    }

    #[test]
    fn record_is_stamped_when_built() {
        let before = Utc::now();
        let record = AuditRecord::new(None, "create_goal", Vec::new());
        assert!(record.recorded_at >= before);
        assert!(record.recorded_at <= Utc::now());
    }

    #[test]
    fn record_with_identity_uses_handle() {
        let alice = CallerIdentity::new("alice@example.com");
        let record = AuditRecord::new(Some(&alice), "login", Vec::new());
        assert_eq!(record.actor, "alice@example.com");
        assert!(!record.is_anonymous());
    }

    #[test]
    fn fanout_reaches_every_sink() {
        let first = Arc::new(RecordingSink::new());
        let second = Arc::new(RecordingSink::new());
        let fanout = FanoutSink::new()
            .with(first.clone())
            .with(second.clone())
            .with(Arc::new(TracingSink));

        let event = InterceptionEvent::Audited(AuditRecord::new(None, "x", Vec::new()));
        fanout.record(&event);

        assert_eq!(first.events(), vec![event.clone()]);
        assert_eq!(second.events(), vec![event]);
    }

    #[test]
    fn recording_sink_filters_by_kind() {
        let sink = RecordingSink::new();
        let now = Utc::now();
        sink.record(&InterceptionEvent::Entered {
            signature: "goals::list".to_string(),
            started_at: now,
        });
        sink.record(&InterceptionEvent::Completed(InvocationTrace {
            signature: "goals::list".to_string(),
            started_at: now,
            finished_at: now,
            elapsed: Duration::ZERO,
            outcome: Outcome::Ok,
        }));

        assert!(sink.audit_records().is_empty());
        assert_eq!(sink.traces().len(), 1);

        sink.clear();
        assert!(sink.events().is_empty());
    }

    #[test]
    fn events_serialize_with_tag() {
        let event = InterceptionEvent::Audited(AuditRecord::new(
            None,
            "create_goal",
            vec![Value::from("holiday")],
        ));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "audited");
        assert_eq!(json["actor"], "Anonymous");
        assert_eq!(json["arguments"][0], "holiday");
        assert!(json["recorded_at"].is_string());
    }
}
