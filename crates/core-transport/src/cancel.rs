//! A minimal cooperative cancellation signal, propagated into every
//! suspension point the transport exposes: the outbound HTTP call, the
//! rate-limit backoff sleep, and the streaming copy in [`super::Client::get_stream`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Notify;

/// Cheap to clone; every clone shares the same underlying flag.
#[derive(Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once `cancel` has been called. Resolves immediately if it
    /// already has been.
    pub async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        self.notify.notified().await;
    }

    /// Sleep for `dur`, or return early (with `true`) if cancelled first.
    pub async fn sleep_or_cancelled(&self, dur: Duration) -> bool {
        tokio::select! {
            biased;
            _ = self.cancelled() => true,
            _ = tokio::time::sleep(dur) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancelled_resolves_immediately_after_cancel() {
        let token = CancellationToken::new();
        token.cancel();
        token.cancelled().await;
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn sleep_or_cancelled_returns_false_when_uncancelled() {
        let token = CancellationToken::new();
        let cancelled = token.sleep_or_cancelled(Duration::from_millis(1)).await;
        assert!(!cancelled);
    }

    #[tokio::test]
    async fn sleep_or_cancelled_returns_true_when_cancelled_first() {
        let token = CancellationToken::new();
        let waiter = token.clone();
        let handle = tokio::spawn(async move { waiter.sleep_or_cancelled(Duration::from_secs(30)).await });
        tokio::time::sleep(Duration::from_millis(5)).await;
        token.cancel();
        let cancelled = handle.await.unwrap();
        assert!(cancelled);
    }
}
