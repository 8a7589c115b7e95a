use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Pending operator shutdown request.
///
/// Raising only sets a flag. The flight loop consumes it once per tick, so
/// no cleanup ever runs from the interrupt context.
#[derive(Clone, Debug, Default)]
pub struct ShutdownSignal {
    pending: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.pending.store(true, Ordering::SeqCst);
    }

    /// Consume the pending request, returning whether one was raised.
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::SeqCst)
    }

    pub fn is_raised(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    /// Raise the signal on every Ctrl-C until the handler can no longer be installed.
    pub async fn watch_ctrl_c(self) {
        loop {
            if let Err(error) = tokio::signal::ctrl_c().await {
                log::error!("ctrl-c handler: {}", error);
                return;
            }
            log::info!("shutdown requested");
            self.raise();
        }
    }

    /// Spawn [`watch_ctrl_c`](Self::watch_ctrl_c) on a runtime.
    pub fn listen(&self, handle: &Handle) -> JoinHandle<()> {
        handle.spawn(self.clone().watch_ctrl_c())
    }
}

#[cfg(test)]
mod tests {
    use super::ShutdownSignal;

    #[test]
    fn take_consumes_once() {
        let signal = ShutdownSignal::new();
        assert!(!signal.take());

        signal.raise();
        signal.raise();
        assert!(signal.is_raised());
        assert!(signal.take());
        assert!(!signal.take());
    }

    #[test]
    fn clones_share_the_flag() {
        let signal = ShutdownSignal::new();
        let handler = signal.clone();

        std::thread::spawn(move || handler.raise()).join().unwrap();
        assert!(signal.take());
    }

    #[tokio::test]
    async fn raised_from_a_task() {
        let signal = ShutdownSignal::new();
        let task = signal.clone();

        tokio::spawn(async move { task.raise() }).await.unwrap();
        assert!(signal.take());
    }

    #[tokio::test]
    async fn listener_runs_until_aborted() {
        let signal = ShutdownSignal::new();
        let listener = signal.listen(&tokio::runtime::Handle::current());

        tokio::task::yield_now().await;
        assert!(!listener.is_finished());
        assert!(!signal.is_raised());

        listener.abort();
        assert!(listener.await.unwrap_err().is_cancelled());
    }
}
