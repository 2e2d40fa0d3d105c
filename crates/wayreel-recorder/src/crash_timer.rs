//! PluginCrashTimer (spec §4.9.1): a one-shot watchdog armed at the start
//! of each cache-warm/record pass. If the pass runs past its deadline the
//! timer fires and the pass is abandoned; `crashed()` records whether that
//! happened so the iteration can mark the Snapshot ABORTED instead of
//! RECORDED.

use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::warn;

/// `base_plugin_crash_timeout + page_load_timeout + max_duration`, the
/// deadline a single pass gets before its legacy plugin processes are
/// presumed hung.
pub fn deadline(base_plugin_crash_timeout: Duration, page_load_timeout: Duration, max_duration: Duration) -> Duration {
    base_plugin_crash_timeout + page_load_timeout + max_duration
}

/// Kills the legacy plugin container and Java launcher processes. Pass
/// names come straight from the registry-mutation context that starts
/// them; real deployments configure the process names they run under.
#[async_trait::async_trait]
pub trait PluginKiller: Send + Sync {
    async fn kill_plugin_processes(&self);
}

pub struct NotConfigured;

#[async_trait::async_trait]
impl PluginKiller for NotConfigured {
    async fn kill_plugin_processes(&self) {}
}

/// Armed by calling [`PluginCrashTimer::arm`], which spawns a background
/// task that fires `killer.kill_plugin_processes()` if `cancel` isn't
/// dropped or signaled before `deadline` elapses.
pub struct PluginCrashTimer {
    cancel: Option<oneshot::Sender<()>>,
    crashed: std::sync::Arc<std::sync::atomic::AtomicBool>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl PluginCrashTimer {
    pub fn arm(deadline: Duration, killer: std::sync::Arc<dyn PluginKiller>) -> Self {
        let (tx, rx) = oneshot::channel();
        let crashed = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let crashed_handle = crashed.clone();
        let deadline_instant = Instant::now() + deadline;
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep_until(deadline_instant) => {
                    warn!("plugin crash timer fired, killing plugin processes");
                    crashed_handle.store(true, std::sync::atomic::Ordering::SeqCst);
                    killer.kill_plugin_processes().await;
                }
                _ = rx => {}
            }
        });
        Self { cancel: Some(tx), crashed, handle: Some(handle) }
    }

    /// Disarm the timer because the pass finished on its own. Idempotent.
    pub async fn disarm(&mut self) {
        if let Some(tx) = self.cancel.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }

    pub fn crashed(&self) -> bool {
        self.crashed.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadline_sums_the_three_budgets() {
        let d = deadline(Duration::from_secs(5), Duration::from_secs(10), Duration::from_secs(20));
        assert_eq!(d, Duration::from_secs(35));
    }

    #[tokio::test(start_paused = true)]
    async fn disarm_before_deadline_never_crashes() {
        struct CountingKiller(std::sync::Arc<std::sync::atomic::AtomicUsize>);
        #[async_trait::async_trait]
        impl PluginKiller for CountingKiller {
            async fn kill_plugin_processes(&self) {
                self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            }
        }
        let calls = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let mut timer = PluginCrashTimer::arm(Duration::from_secs(60), std::sync::Arc::new(CountingKiller(calls.clone())));
        timer.disarm().await;
        assert!(!timer.crashed());
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_elapsing_marks_crashed_and_kills() {
        struct CountingKiller(std::sync::Arc<std::sync::atomic::AtomicUsize>);
        #[async_trait::async_trait]
        impl PluginKiller for CountingKiller {
            async fn kill_plugin_processes(&self) {
                self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            }
        }
        let calls = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let mut timer = PluginCrashTimer::arm(Duration::from_millis(10), std::sync::Arc::new(CountingKiller(calls.clone())));
        tokio::time::advance(Duration::from_millis(20)).await;
        timer.disarm().await;
        assert!(timer.crashed());
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
