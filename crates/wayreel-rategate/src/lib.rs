//! C2 RateGate: moving-window rate limiters, one per external service
//! (spec §4.3). Unlike a token bucket, a moving window spreads N requests
//! fairly across the window instead of letting a burst drain the whole
//! allowance at once.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Which external service a call is about to hit. RateGate keeps one
/// independent window per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    Archive,
    Cdx,
    Save,
}

struct Window {
    amount: usize,
    window: Duration,
    timestamps: VecDeque<Instant>,
}

impl Window {
    fn new(amount: usize, window: Duration) -> Self {
        Self {
            amount,
            window,
            timestamps: VecDeque::with_capacity(amount),
        }
    }

    /// Drop timestamps older than the window, then report whether a slot is
    /// free right now.
    fn try_acquire(&mut self, now: Instant) -> bool {
        while let Some(&front) = self.timestamps.front() {
            if now.duration_since(front) >= self.window {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
        if self.timestamps.len() < self.amount {
            self.timestamps.push_back(now);
            true
        } else {
            false
        }
    }
}

/// Three independent moving-window limiters, one each for the archive host,
/// the CDX endpoint, and the save endpoint (spec §4.3).
pub struct RateGate {
    archive: Mutex<Window>,
    cdx: Mutex<Window>,
    save: Mutex<Window>,
    poll_interval: Duration,
}

/// `(amount, window_seconds)` for one limiter.
#[derive(Debug, Clone, Copy)]
pub struct WindowSpec {
    pub amount: usize,
    pub window_seconds: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct RateGateConfig {
    pub archive: WindowSpec,
    pub cdx: WindowSpec,
    pub save: WindowSpec,
    pub poll_interval_ms: u64,
}

impl Default for RateGateConfig {
    fn default() -> Self {
        Self {
            archive: WindowSpec { amount: 60, window_seconds: 60 },
            cdx: WindowSpec { amount: 40, window_seconds: 60 },
            save: WindowSpec { amount: 15, window_seconds: 60 },
            poll_interval_ms: 250,
        }
    }
}

impl RateGate {
    pub fn new(config: RateGateConfig) -> Self {
        Self {
            archive: Mutex::new(Window::new(config.archive.amount, Duration::from_secs(config.archive.window_seconds))),
            cdx: Mutex::new(Window::new(config.cdx.amount, Duration::from_secs(config.cdx.window_seconds))),
            save: Mutex::new(Window::new(config.save.amount, Duration::from_secs(config.save.window_seconds))),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        }
    }

    fn window(&self, kind: ServiceKind) -> &Mutex<Window> {
        match kind {
            ServiceKind::Archive => &self.archive,
            ServiceKind::Cdx => &self.cdx,
            ServiceKind::Save => &self.save,
        }
    }

    /// Block cooperatively until a token for `kind` is available. Callers
    /// MUST call this immediately before any outbound request to the
    /// respective service (spec §4.3).
    pub async fn wait(&self, kind: ServiceKind) {
        loop {
            let acquired = {
                let mut window = self.window(kind).lock();
                window.try_acquire(Instant::now())
            };
            if acquired {
                return;
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Non-blocking probe, used by tests and by callers that want to check
    /// capacity without committing to a wait.
    pub fn try_acquire(&self, kind: ServiceKind) -> bool {
        self.window(kind).lock().try_acquire(Instant::now())
    }
}
