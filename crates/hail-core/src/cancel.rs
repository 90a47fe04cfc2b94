//! Cooperative cancellation.

use std::sync::Arc;

use tokio::sync::watch;

/// A clonable handle that lets a caller abandon an in-flight call.
///
/// Cancellation is cooperative: triggering the token moves pending calls
/// that carry it into a terminal [`Cancelled`](crate::RpcError::Cancelled)
/// state. Triggering it after a call has already completed does not affect
/// the delivered result. Cancelling twice is a no-op.
#[derive(Clone, Debug)]
pub struct CancellationToken {
    inner: Arc<watch::Sender<bool>>,
}

impl CancellationToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { inner: Arc::new(tx) }
    }

    /// Trigger cancellation. All clones of this token observe it.
    pub fn cancel(&self) {
        self.inner.send_replace(true);
    }

    /// Whether the token has been triggered.
    pub fn is_cancelled(&self) -> bool {
        *self.inner.borrow()
    }

    /// Resolves once the token is triggered. If it already was, resolves
    /// immediately.
    pub async fn cancelled(&self) {
        let mut rx = self.inner.subscribe();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                // Sender gone without ever cancelling; nothing left to wait for.
                std::future::pending::<()>().await;
            }
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_untriggered() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn cancel_is_visible_to_clones_and_idempotent() {
        let token = CancellationToken::new();
        let clone = token.clone();
        token.cancel();
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_resolves_on_trigger() {
        let token = CancellationToken::new();
        let waiter = token.clone();
        let task = tokio::spawn(async move { waiter.cancelled().await });
        token.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn cancelled_resolves_immediately_when_already_triggered() {
        let token = CancellationToken::new();
        token.cancel();
        token.cancelled().await;
    }
}
