//! Interception as plain higher-order async functions.
//!
//! [`timed`] and [`audited`] wrap any future; tower layers in the server
//! build on them, and business code that lives outside the operation
//! pipeline can call them directly. When both apply to one call, `timed` is
//! the outer wrapper:
//!
//! ```text
//! Entered -> Audited -> <wrapped call> -> Completed
//! ```

use std::future::Future;
use std::time::Instant;

use chrono::Utc;

use crate::audit::{AuditRecord, InterceptionEvent, InterceptionSink, InvocationTrace, Outcome};
use crate::context::IdentityContext;
use crate::types::Value;

/// Audit marker. The action label defaults to the empty string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Audited {
    pub action: &'static str,
}

impl Audited {
    #[must_use]
    pub const fn action(action: &'static str) -> Self {
        Self { action }
    }
}

/// Interception markers declared by a business operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Interception {
    pub audit: Option<Audited>,
    pub timed: bool,
}

impl Interception {
    /// No interception at all.
    pub const NONE: Self = Self {
        audit: None,
        timed: false,
    };

    /// Timing interception only.
    #[must_use]
    pub const fn timed() -> Self {
        Self {
            audit: None,
            timed: true,
        }
    }

    /// Adds audit interception with `action` as its label.
    #[must_use]
    pub const fn audited(self, action: &'static str) -> Self {
        Self {
            audit: Some(Audited::action(action)),
            timed: self.timed,
        }
    }
}

/// Implemented by requests that carry interception markers.
pub trait Intercepted {
    /// Which interceptors this request opts into.
    fn interception(&self) -> Interception;

    /// Human-readable call signature, e.g. `transactions::create`.
    fn signature(&self) -> String;

    /// Snapshot of the call's arguments for audit records.
    ///
    /// Secrets such as passwords must be left out.
    fn arguments(&self) -> Vec<Value>;
}

/// Emits one audit record for the current caller, then runs `fut`.
///
/// The record is produced when the returned future is first polled, so it
/// sees the identity of the execution context that actually runs the call.
/// The output of `fut` is returned unchanged.
pub async fn audited<S, F>(sink: &S, action: &str, arguments: Vec<Value>, fut: F) -> F::Output
where
    S: InterceptionSink + ?Sized,
    F: Future,
{
    let identity = IdentityContext::current();
    let record = AuditRecord::new(identity.as_ref(), action, arguments);
    sink.record(&InterceptionEvent::Audited(record));
    fut.await
}

/// Logs entry, runs `fut`, then logs completion with the elapsed time.
///
/// Completion is emitted exactly once: on success, on error, when the
/// returned future is dropped before finishing, and when `fut` panics. The
/// result of `fut`, error included, is returned unchanged.
pub async fn timed<S, F, T, E>(sink: &S, signature: impl Into<String>, fut: F) -> Result<T, E>
where
    S: InterceptionSink + ?Sized,
    F: Future<Output = Result<T, E>>,
{
    let signature = signature.into();
    let started_at = Utc::now();
    sink.record(&InterceptionEvent::Entered {
        signature: signature.clone(),
        started_at,
    });

    let guard = CompletionGuard {
        sink,
        signature: Some(signature),
        started_at,
        start: Instant::now(),
    };
    let result = fut.await;
    guard.finish(if result.is_ok() {
        Outcome::Ok
    } else {
        Outcome::Error
    });
    result
}

/// Emits the completion event when finished explicitly or when dropped.
struct CompletionGuard<'a, S: InterceptionSink + ?Sized> {
    sink: &'a S,
    signature: Option<String>,
    started_at: chrono::DateTime<Utc>,
    start: Instant,
}

impl<S: InterceptionSink + ?Sized> CompletionGuard<'_, S> {
    fn finish(mut self, outcome: Outcome) {
        self.emit(outcome);
    }

    fn emit(&mut self, outcome: Outcome) {
        let Some(signature) = self.signature.take() else {
            return;
        };
        let trace = InvocationTrace {
            signature,
            started_at: self.started_at,
            finished_at: Utc::now(),
            elapsed: self.start.elapsed(),
            outcome,
        };
        self.sink.record(&InterceptionEvent::Completed(trace));
    }
}

impl<S: InterceptionSink + ?Sized> Drop for CompletionGuard<'_, S> {
    fn drop(&mut self) {
        let outcome = if std::thread::panicking() {
            Outcome::Panicked
        } else {
            Outcome::Cancelled
        };
        self.emit(outcome);
    }
}
