//! External stop signal.
//!
//! Built on a `tokio::sync::watch` channel holding a single `bool`. The
//! session selects on [`ShutdownListener::wait`] next to every blocking
//! receive, so a silent peer can never keep the server from stopping.

use std::sync::Arc;

use tokio::sync::watch;

/// The trigger side. Clone it into whatever watches for an operator
/// command (stdin, Ctrl-C, a test).
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Requests shutdown. Idempotent.
    pub fn trigger(&self) {
        if !self.tx.send_replace(true) {
            tracing::info!("shutdown requested");
        }
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// A new listener. Listeners created after the trigger see it at once.
    pub fn listener(&self) -> ShutdownListener {
        ShutdownListener {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// The waiting side, handed to [`GameSession::run`](crate::GameSession::run).
#[derive(Debug, Clone)]
pub struct ShutdownListener {
    rx: watch::Receiver<bool>,
}

impl ShutdownListener {
    /// A listener that never fires.
    pub fn never() -> Self {
        let (_, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once shutdown has been requested. Pends forever if every
    /// [`Shutdown`] handle was dropped without triggering.
    pub async fn wait(&mut self) {
        if self.rx.wait_for(|stopped| *stopped).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_wait_resolves_after_trigger() {
        let shutdown = Shutdown::new();
        let mut listener = shutdown.listener();
        assert!(!listener.is_triggered());

        let trigger = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.trigger();
        });

        tokio::time::timeout(Duration::from_secs(1), listener.wait())
            .await
            .expect("listener should fire");
        assert!(shutdown.is_triggered());
    }

    #[tokio::test]
    async fn test_late_listener_sees_earlier_trigger() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        shutdown.trigger();
        let mut listener = shutdown.listener();
        assert!(listener.is_triggered());
        tokio::time::timeout(Duration::from_millis(100), listener.wait())
            .await
            .expect("already triggered");
    }

    #[tokio::test]
    async fn test_never_does_not_fire() {
        let mut listener = ShutdownListener::never();
        let waited = tokio::time::timeout(Duration::from_millis(20), listener.wait()).await;
        assert!(waited.is_err());
    }
}
