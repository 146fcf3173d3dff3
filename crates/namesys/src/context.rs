//! Cancellation and deadlines for operations that touch the routing
//! substrate.
//!
//! A [`Context`] is cheap to clone. Clones and derived children share one
//! cancellation flag; a child may carry a tighter deadline than its parent
//! but never a looser one.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::Instant;

/// Why a context finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoneReason {
    Cancelled,
    DeadlineExceeded,
}

#[derive(Debug, Default)]
struct Shared {
    cancelled: AtomicBool,
    notify: Notify,
}

/// Cancellation token with an optional deadline.
#[derive(Debug, Clone)]
pub struct Context {
    shared: Arc<Shared>,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never done unless explicitly cancelled.
    pub fn background() -> Self {
        Self {
            shared: Arc::new(Shared::default()),
            deadline: None,
        }
    }

    /// A fresh context that expires `timeout` from now. A timeout too large
    /// to represent as an instant means no deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            shared: Arc::new(Shared::default()),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    /// Derive a child sharing this context's cancellation whose deadline is
    /// the earlier of the parent's and `timeout` from now.
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let deadline = match (self.deadline, Instant::now().checked_add(timeout)) {
            (Some(parent), Some(own)) => Some(parent.min(own)),
            (parent, own) => parent.or(own),
        };
        Self {
            shared: Arc::clone(&self.shared),
            deadline,
        }
    }

    /// Cancel this context, its clones and every derived child.
    pub fn cancel(&self) {
        self.shared.cancelled.store(true, Ordering::Release);
        self.shared.notify.notify_waiters();
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline; `None` when there is no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Non-blocking check.
    pub fn err(&self) -> Option<DoneReason> {
        if self.shared.cancelled.load(Ordering::Acquire) {
            return Some(DoneReason::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(DoneReason::DeadlineExceeded),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Resolve once the context is cancelled or its deadline passes.
    pub async fn done(&self) -> DoneReason {
        loop {
            let notified = self.shared.notify.notified();
            tokio::pin!(notified);
            // Register before checking the flag so a concurrent cancel is not missed.
            notified.as_mut().enable();
            if let Some(reason) = self.err() {
                return reason;
            }
            match self.deadline {
                Some(deadline) => {
                    tokio::select! {
                        _ = &mut notified => {}
                        _ = tokio::time::sleep_until(deadline) => {
                            return DoneReason::DeadlineExceeded;
                        }
                    }
                }
                None => notified.as_mut().await,
            }
        }
    }

    /// Sleep for `duration`, returning early with the reason if the context
    /// finishes first.
    pub async fn sleep(&self, duration: Duration) -> Result<(), DoneReason> {
        tokio::select! {
            biased;
            reason = self.done() => Err(reason),
            _ = tokio::time::sleep(duration) => Ok(()),
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}
