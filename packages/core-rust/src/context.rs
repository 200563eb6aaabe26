//! Request-scoped caller identity.
//!
//! The identity slot is keyed per execution context:
//!
//! - inside [`IdentityContext::scope`], the slot belongs to that tokio task
//!   scope and is dropped when the scoped future finishes, fails, panics, or
//!   is cancelled;
//! - outside any scope, the slot belongs to the calling OS thread, and
//!   [`IdentityContext::enter`] provides a guard that releases it on drop.
//!
//! The thread slot is only used off the tokio runtime. Runtime worker
//! threads are shared by unrelated tasks, so there an unscoped caller reads
//! no identity and writes are ignored.
//!
//! Spawned tasks never inherit a scope implicitly. Use
//! [`IdentityContext::carry`] to hand the current identity to a spawned future.

use std::cell::RefCell;
use std::future::Future;

use crate::types::CallerIdentity;

tokio::task_local! {
    static TASK_IDENTITY: RefCell<Option<CallerIdentity>>;
}

thread_local! {
    static THREAD_IDENTITY: RefCell<Option<CallerIdentity>> = const { RefCell::new(None) };
}

/// Ambient access to the identity of the caller of the current operation.
pub struct IdentityContext;

impl IdentityContext {
    /// Runs `fut` inside a fresh identity scope seeded with `identity`.
    ///
    /// Everything `fut` does on this task (including `set_current` and
    /// `clear`) acts on the scope's own slot. The slot disappears with the
    /// scope, so nothing leaks to the next operation on the same worker.
    pub async fn scope<F>(identity: Option<CallerIdentity>, fut: F) -> F::Output
    where
        F: Future,
    {
        TASK_IDENTITY.scope(RefCell::new(identity), fut).await
    }

    /// Wraps `fut` in a scope seeded with a copy of the current identity.
    ///
    /// Intended for `tokio::spawn`: the spawned task observes the spawning
    /// operation's caller, and later changes on either side stay local.
    pub fn carry<F>(fut: F) -> impl Future<Output = F::Output>
    where
        F: Future,
    {
        let identity = Self::current();
        Self::scope(identity, fut)
    }

    /// Associates `identity` with the calling execution context.
    ///
    /// On a runtime thread outside any scope the call is ignored.
    pub fn set_current(identity: Option<CallerIdentity>) {
        let mut pending = Some(identity);
        let in_task = TASK_IDENTITY
            .try_with(|slot| *slot.borrow_mut() = pending.take().flatten())
            .is_ok();
        if in_task {
            return;
        }
        if on_runtime() {
            if pending.flatten().is_some() {
                tracing::warn!("identity set outside an identity scope on a runtime thread; ignored");
            }
            return;
        }
        THREAD_IDENTITY.with(|slot| *slot.borrow_mut() = pending.take().flatten());
    }

    /// Returns the identity of the calling execution context, if any.
    #[must_use]
    pub fn current() -> Option<CallerIdentity> {
        TASK_IDENTITY
            .try_with(|slot| slot.borrow().clone())
            .unwrap_or_else(|_| {
                if on_runtime() {
                    None
                } else {
                    THREAD_IDENTITY.with(|slot| slot.borrow().clone())
                }
            })
    }

    /// Removes the identity from the calling execution context.
    pub fn clear() {
        Self::set_current(None);
    }

    /// Returns `true` when the caller runs inside a task scope rather than
    /// on the thread-level slot.
    #[must_use]
    pub fn is_scoped() -> bool {
        TASK_IDENTITY.try_with(|_| ()).is_ok()
    }

    /// Sets `identity` for the calling execution context until the returned
    /// guard is dropped, then restores whatever was there before.
    #[must_use = "the identity is released as soon as the guard is dropped"]
    pub fn enter(identity: Option<CallerIdentity>) -> IdentityGuard {
        let previous = Self::current();
        Self::set_current(identity);
        IdentityGuard { previous }
    }
}

fn on_runtime() -> bool {
    tokio::runtime::Handle::try_current().is_ok()
}

/// RAII guard returned by [`IdentityContext::enter`].
///
/// Restores the previous identity on drop, including during unwinding.
#[derive(Debug)]
pub struct IdentityGuard {
    previous: Option<CallerIdentity>,
}

impl Drop for IdentityGuard {
    fn drop(&mut self) {
        IdentityContext::set_current(self.previous.take());
    }
}
