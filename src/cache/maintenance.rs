use crate::cache::core::{CacheInner, ResultCache};
use crate::errors::VisionResult;
use std::sync::Weak;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::JoinHandle;
use std::time::Duration;

/// Periodic expiry sweep running on its own thread so no async runtime is required.
///
/// The thread holds only a weak reference to the cache; it exits when stopped
/// or once the cache itself has been dropped.
pub(crate) struct MaintenanceHandle {
    stop_tx: mpsc::Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl MaintenanceHandle {
    pub(crate) fn spawn(cache: Weak<CacheInner>, interval: Duration) -> VisionResult<Self> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let interval = interval.max(Duration::from_millis(10));
        let thread = std::thread::Builder::new()
            .name("visioncache-sweep".to_string())
            .spawn(move || {
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            let Some(inner) = cache.upgrade() else { break };
                            let report = ResultCache::from_inner(inner).run_maintenance();
                            if report.removed() > 0 {
                                log::debug!(
                                    "sweep removed {} expired, {} trimmed",
                                    report.expired_removed,
                                    report.trimmed
                                );
                            }
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                log::debug!("cache sweep stopped");
            })?;
        Ok(Self { stop_tx, thread: Some(thread) })
    }

    /// Signals the sweep to stop and waits for the thread to finish.
    pub(crate) fn stop(mut self) {
        let _ = self.stop_tx.send(());
        if let Some(t) = self.thread.take() {
            if t.thread().id() != std::thread::current().id() {
                let _ = t.join();
            }
        }
    }
}
