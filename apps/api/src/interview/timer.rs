//! Per-question countdown.
//!
//! A timer is a spawned tokio task that ticks once per second and reports to a
//! [`CountdownListener`]. Each timer carries a ticket so the listener can drop
//! callbacks from a timer it has already replaced. `cancel` sets a flag and
//! aborts the task; once it returns no further callback is started.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

#[async_trait]
pub trait CountdownListener: Send + Sync {
    async fn on_tick(&self, ticket: u64, remaining: u32);
    async fn on_expiry(&self, ticket: u64);
}

pub struct CountdownTimer {
    ticket: u64,
    limit: u32,
    remaining: Arc<AtomicU32>,
    cancelled: Arc<AtomicBool>,
    expired: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl CountdownTimer {
    /// Starts counting down from `remaining` (capped at `limit`). A timer started
    /// at zero expires immediately.
    pub fn start(
        ticket: u64,
        limit: u32,
        remaining: u32,
        listener: Arc<dyn CountdownListener>,
    ) -> Self {
        let remaining = Arc::new(AtomicU32::new(remaining.min(limit)));
        let cancelled = Arc::new(AtomicBool::new(false));
        let expired = Arc::new(AtomicBool::new(false));

        let handle = tokio::spawn(run_countdown(
            ticket,
            remaining.clone(),
            cancelled.clone(),
            expired.clone(),
            listener,
        ));

        Self {
            ticket,
            limit,
            remaining,
            cancelled,
            expired,
            handle,
        }
    }

    /// Stops the countdown. Idempotent.
    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            debug!("Timer {} cancelled at {}s remaining", self.ticket, self.remaining());
        }
        self.handle.abort();
    }

    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn remaining(&self) -> u32 {
        self.remaining.load(Ordering::SeqCst)
    }

    /// Seconds used so far: `limit - remaining`.
    pub fn elapsed(&self) -> u32 {
        self.limit.saturating_sub(self.remaining())
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn has_expired(&self) -> bool {
        self.expired.load(Ordering::SeqCst)
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn run_countdown(
    ticket: u64,
    remaining: Arc<AtomicU32>,
    cancelled: Arc<AtomicBool>,
    expired: Arc<AtomicBool>,
    listener: Arc<dyn CountdownListener>,
) {
    let period = Duration::from_secs(1);
    let mut ticks = interval_at(Instant::now() + period, period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

    while remaining.load(Ordering::SeqCst) > 0 {
        ticks.tick().await;
        if cancelled.load(Ordering::SeqCst) {
            return;
        }
        // Only this task decrements, so the value is still > 0 here.
        let left = remaining.fetch_sub(1, Ordering::SeqCst) - 1;
        if left > 0 {
            listener.on_tick(ticket, left).await;
        }
    }

    if cancelled.load(Ordering::SeqCst) {
        return;
    }
    expired.store(true, Ordering::SeqCst);
    debug!("Timer {} expired", ticket);

    // Detached so that cancelling this timer from inside the expiry handler
    // cannot abort the handler itself.
    tokio::spawn(async move {
        listener.on_expiry(ticket).await;
    });
}

/// Formats seconds as `M:SS`.
pub fn format_time(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// True when less than a quarter of the limit is left.
pub fn is_time_critical(remaining: u32, limit: u32) -> bool {
    (remaining as u64) * 4 < limit as u64
}
