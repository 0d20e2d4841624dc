use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info};

/// Cooperative stop request shared between the signal handlers and the
/// daemon loop.
///
/// Clones share state. A subscriber created after [`trigger`] still sees the
/// stop through [`is_shutting_down`], which [`wait`] checks first.
///
/// [`trigger`]: ShutdownSignal::trigger
/// [`is_shutting_down`]: ShutdownSignal::is_shutting_down
/// [`wait`]: ShutdownSignal::wait
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    tx: broadcast::Sender<()>,
    stopping: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            stopping: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.stopping.load(Ordering::Acquire)
    }

    /// Request a stop. Only the first call broadcasts.
    pub fn trigger(&self) {
        if self
            .stopping
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            info!("shutdown requested");
            let _ = self.tx.send(());
        } else {
            debug!("shutdown already requested");
        }
    }

    /// Resolves once a stop has been requested.
    pub async fn wait(&self) {
        let mut rx = self.subscribe();
        if self.is_shutting_down() {
            return;
        }
        // Lagged or closed both mean the sender fired or went away.
        let _ = rx.recv().await;
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}
