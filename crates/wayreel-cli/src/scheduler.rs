//! The cron-style scheduler loop (spec §5): a worker wakes on a cron
//! schedule and runs a batch; shutdown is cooperative, checked between
//! iterations rather than forced mid-iteration (spec §9's "mid-iteration
//! Ctrl-C is explicitly unsafe").

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use cron::Schedule;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    pub cron_expr: String,
    pub max_iterations_per_wake: usize,
}

/// Set by the Ctrl-C handler installed in `main`. Checked between
/// iterations and between cron fires, never awaited mid-iteration.
pub fn install_shutdown_signal() -> Arc<AtomicBool> {
    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested, finishing the current iteration then exiting");
            flag.store(false, Ordering::SeqCst);
        }
    });
    running
}

/// Run `iteration` in a loop, cron-paced, until `running` goes false.
/// Each wake runs up to `max_iterations_per_wake` iterations or stops early
/// the first time `iteration` reports no work.
pub async fn run_cron_loop<F, Fut>(
    config: ScheduleConfig,
    running: Arc<AtomicBool>,
    mut iteration: F,
) -> anyhow::Result<()>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = anyhow::Result<bool>>,
{
    let schedule = Schedule::from_str(&config.cron_expr)
        .map_err(|e| anyhow::anyhow!("invalid cron expression {:?}: {e}", config.cron_expr))?;

    while running.load(Ordering::SeqCst) {
        let Some(next_fire) = schedule.upcoming(Utc).next() else {
            warn!("cron schedule has no further fire times, exiting");
            break;
        };
        let now = Utc::now();
        if next_fire > now {
            let delay = (next_fire - now).to_std().unwrap_or(std::time::Duration::ZERO);
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = wait_for_shutdown(&running) => break,
            }
        }
        if !running.load(Ordering::SeqCst) {
            break;
        }

        for _ in 0..config.max_iterations_per_wake {
            if !running.load(Ordering::SeqCst) {
                break;
            }
            let had_work = iteration().await?;
            if !had_work {
                break;
            }
        }
    }
    Ok(())
}

async fn wait_for_shutdown(running: &AtomicBool) {
    while running.load(Ordering::SeqCst) {
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    }
}

/// Run `iteration` exactly `count` times, stopping early on no-work — the
/// ad-hoc `max_iterations` batch path (spec §5), used when the CLI is
/// invoked with an explicit N instead of left to the scheduler.
pub async fn run_fixed_batch<F, Fut>(count: usize, mut iteration: F) -> anyhow::Result<()>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = anyhow::Result<bool>>,
{
    for _ in 0..count {
        if !iteration().await? {
            break;
        }
    }
    Ok(())
}
