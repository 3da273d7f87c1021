//! Context implementation for request-scoped cancellation
//!
//! A Context is handed to every provider call. The server cancels the
//! shared context when Terraform asks the provider to stop, so long-running
//! work can bail out early.

use std::sync::Arc;
use tokio::sync::watch;

#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    done: watch::Receiver<bool>,
    done_tx: watch::Sender<bool>,
}

impl Context {
    pub fn new() -> Self {
        let (done_tx, done_rx) = watch::channel(false);

        Self {
            inner: Arc::new(ContextInner {
                done: done_rx,
                done_tx,
            }),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.done.borrow()
    }

    /// Returns a receiver that flips to `true` when work done on behalf of
    /// this context should stop
    pub fn done(&self) -> watch::Receiver<bool> {
        self.inner.done.clone()
    }

    /// Resolves once the context is cancelled
    pub async fn cancelled(&self) {
        let mut done = self.done();
        let _ = done.wait_for(|done| *done).await;
    }

    pub fn cancel(&self) {
        let _ = self.inner.done_tx.send(true);
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn context_manual_cancel() {
        let ctx = Context::new();

        assert!(!ctx.is_cancelled());

        ctx.cancel();

        assert!(ctx.is_cancelled());
    }

    #[tokio::test]
    async fn clones_observe_cancellation() {
        let ctx = Context::new();
        let clone = ctx.clone();
        let mut done = clone.done();

        ctx.cancel();
        tokio::time::timeout(Duration::from_secs(1), clone.cancelled())
            .await
            .expect("clone should observe cancellation");
        assert!(*done.borrow_and_update());
    }
}
