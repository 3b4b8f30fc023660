//! Caller-owned request context.
//!
//! Every lifecycle operation receives a [`RequestContext`]. It carries the
//! caller's cancellation signal and an optional deadline; collaborators that
//! block on the network race their work against [`RequestContext::done`].

use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::Instant;
use uuid::Uuid;

/// Why a request stopped waiting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum Interrupt {
    #[error("request cancelled by caller")]
    Cancelled,

    #[error("request deadline exceeded")]
    DeadlineExceeded,
}

#[derive(Clone, Debug)]
pub struct RequestContext {
    request_id: Uuid,
    deadline: Option<Instant>,
    cancel: watch::Receiver<bool>,
}

/// Cancels every clone of the context it was created with.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl RequestContext {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self {
            request_id: Uuid::new_v4(),
            deadline: None,
            cancel: rx,
        }
    }

    /// A context plus the handle that cancels it.
    pub fn cancellable() -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        let ctx = Self {
            request_id: Uuid::new_v4(),
            deadline: None,
            cancel: rx,
        };
        (ctx, CancelHandle { tx })
    }

    /// Tighten the deadline to `timeout` from now. Never extends an earlier deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        self.deadline = Some(match self.deadline {
            Some(existing) if existing < candidate => existing,
            _ => candidate,
        });
        self
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Non-blocking check.
    pub fn interrupted(&self) -> Option<Interrupt> {
        if *self.cancel.borrow() {
            return Some(Interrupt::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(Interrupt::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolves once the caller cancels or the deadline passes.
    pub async fn done(&self) -> Interrupt {
        let mut cancel = self.cancel.clone();
        let cancelled = async move {
            loop {
                if *cancel.borrow_and_update() {
                    return;
                }
                // Sender gone without cancelling: this context can no longer be cancelled.
                if cancel.changed().await.is_err() {
                    std::future::pending::<()>().await;
                }
            }
        };

        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = cancelled => Interrupt::Cancelled,
                    _ = tokio::time::sleep_until(deadline) => Interrupt::DeadlineExceeded,
                }
            }
            None => {
                cancelled.await;
                Interrupt::Cancelled
            }
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::background()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn background_is_never_interrupted() {
        let ctx = RequestContext::background();
        assert_eq!(ctx.interrupted(), None);
        let waited = tokio::time::timeout(Duration::from_millis(20), ctx.done()).await;
        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn cancel_reaches_clones() {
        let (ctx, handle) = RequestContext::cancellable();
        let clone = ctx.clone();
        let waiter = tokio::spawn(async move { clone.done().await });

        handle.cancel();
        assert_eq!(waiter.await.unwrap(), Interrupt::Cancelled);
        assert_eq!(ctx.interrupted(), Some(Interrupt::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_fires() {
        let ctx = RequestContext::background().with_timeout(Duration::from_secs(5));
        assert_eq!(ctx.done().await, Interrupt::DeadlineExceeded);
        assert_eq!(ctx.interrupted(), Some(Interrupt::DeadlineExceeded));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_never_extends_deadline() {
        let ctx = RequestContext::background()
            .with_timeout(Duration::from_secs(1))
            .with_timeout(Duration::from_secs(60));
        let deadline = ctx.deadline().unwrap();
        assert!(deadline <= Instant::now() + Duration::from_secs(1));
    }
}
