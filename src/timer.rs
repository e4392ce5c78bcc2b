//! Deferred re-entry into a connection's probe queue.
//!
//! A scheduler never runs connection code itself. When a delay elapses it
//! hands a [`TimerToken`] back to whoever drives the connection, and the
//! connection decides whether the token is still current. That keeps all
//! state mutation on the connection's own task and makes stray expirations
//! harmless.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

/// Identifies one armed probe timeout.
///
/// `epoch` names the stats activation that armed it; `seq` the probe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerToken {
    pub epoch: u64,
    pub seq: u64,
}

impl fmt::Display for TimerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.epoch, self.seq)
    }
}

/// Cancellation handle for a scheduled token.
pub struct TimerHandle {
    cancel: Box<dyn Fn() + Send + Sync>,
}

impl TimerHandle {
    pub fn new(cancel: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Box::new(cancel),
        }
    }

    /// Stop delivery of the token if it has not been delivered yet.
    pub fn cancel(self) {
        (self.cancel)();
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TimerHandle")
    }
}

/// `scheduleAfter(delay, callback)` for probe timeouts.
pub trait Scheduler: Send + Sync {
    fn schedule_after(&self, delay: Duration, token: TimerToken) -> TimerHandle;
}

// ============================================================================
// Tokio scheduler
// ============================================================================

/// Delivers expired tokens into an mpsc channel owned by the connection loop.
#[derive(Clone)]
pub struct TokioScheduler {
    tx: mpsc::UnboundedSender<TimerToken>,
    runtime: tokio::runtime::Handle,
}

impl TokioScheduler {
    /// Create a scheduler bound to the current tokio runtime.
    ///
    /// Must be called from within a runtime, like `tokio::spawn`.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TimerToken>) {
        Self::with_runtime(tokio::runtime::Handle::current())
    }

    pub fn with_runtime(
        runtime: tokio::runtime::Handle,
    ) -> (Self, mpsc::UnboundedReceiver<TimerToken>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, runtime }, rx)
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_after(&self, delay: Duration, token: TimerToken) -> TimerHandle {
        let tx = self.tx.clone();
        let task = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            // Receiver gone means the connection is closed; nothing to wake.
            let _ = tx.send(token);
        });
        let abort = task.abort_handle();
        TimerHandle::new(move || abort.abort())
    }
}

// ============================================================================
// Manual scheduler
// ============================================================================

#[derive(Debug)]
struct ManualTimer {
    token: TimerToken,
    delay: Duration,
    cancelled: Arc<AtomicBool>,
}

/// A scheduler whose timers only expire when told to.
///
/// Useful for hosts with their own event loop and for deterministic tests.
/// Only armed timers are kept; fired and cancelled ones are dropped on the
/// next call, so the list stays as short as the number of live timers.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    timers: Mutex<Vec<ManualTimer>>,
    scheduled: AtomicUsize,
    cancelled: Arc<AtomicUsize>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn live(&self) -> parking_lot::MutexGuard<'_, Vec<ManualTimer>> {
        let mut timers = self.timers.lock();
        timers.retain(|t| !t.cancelled.load(Ordering::Acquire));
        timers
    }

    /// Tokens that are armed: neither cancelled nor fired.
    pub fn armed(&self) -> Vec<TimerToken> {
        self.live().iter().map(|t| t.token).collect()
    }

    /// Expire the oldest armed timer and return its token for delivery.
    pub fn fire_next(&self) -> Option<TimerToken> {
        let mut timers = self.live();
        if timers.is_empty() {
            return None;
        }
        Some(timers.remove(0).token)
    }

    /// Timers currently held: armed ones only.
    pub fn len(&self) -> usize {
        self.live().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of timers ever scheduled.
    pub fn scheduled_count(&self) -> usize {
        self.scheduled.load(Ordering::Relaxed)
    }

    /// Number of timers cancelled before expiring.
    pub fn cancelled_count(&self) -> usize {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Delay requested for `token`, while it is armed.
    pub fn delay_of(&self, token: TimerToken) -> Option<Duration> {
        self.live()
            .iter()
            .find(|t| t.token == token)
            .map(|t| t.delay)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_after(&self, delay: Duration, token: TimerToken) -> TimerHandle {
        let flag = Arc::new(AtomicBool::new(false));
        self.live().push(ManualTimer {
            token,
            delay,
            cancelled: Arc::clone(&flag),
        });
        self.scheduled.fetch_add(1, Ordering::Relaxed);

        let cancelled = Arc::clone(&self.cancelled);
        TimerHandle::new(move || {
            if !flag.swap(true, Ordering::AcqRel) {
                cancelled.fetch_add(1, Ordering::Relaxed);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T1: TimerToken = TimerToken { epoch: 1, seq: 1 };
    const T2: TimerToken = TimerToken { epoch: 1, seq: 2 };

    #[test]
    fn manual_fires_in_schedule_order_and_skips_cancelled() {
        let sched = ManualScheduler::new();
        let h1 = sched.schedule_after(Duration::from_secs(5), T1);
        let _h2 = sched.schedule_after(Duration::from_secs(5), T2);

        h1.cancel();
        assert_eq!(sched.armed(), vec![T2]);
        assert_eq!(sched.fire_next(), Some(T2));
        assert_eq!(sched.fire_next(), None);
        assert_eq!(sched.cancelled_count(), 1);
        assert_eq!(sched.scheduled_count(), 2);
    }

    #[test]
    fn manual_drops_fired_and_cancelled_timers() {
        let sched = ManualScheduler::new();
        for seq in 1..=100 {
            let token = TimerToken { epoch: 1, seq };
            let handle = sched.schedule_after(Duration::from_secs(5), token);
            if seq % 2 == 0 {
                assert_eq!(sched.fire_next(), Some(token));
            } else {
                handle.cancel();
            }
        }
        assert!(sched.is_empty());
        assert_eq!(sched.scheduled_count(), 100);
        assert_eq!(sched.cancelled_count(), 50);

        let _live = sched.schedule_after(Duration::from_secs(5), T1);
        assert_eq!(sched.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_delivers_after_delay() {
        let (sched, mut rx) = TokioScheduler::new();
        let _h = sched.schedule_after(Duration::from_millis(5000), T1);

        tokio::time::sleep(Duration::from_millis(4999)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(rx.recv().await, Some(T1));
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_cancel_suppresses_delivery() {
        let (sched, mut rx) = TokioScheduler::new();
        sched.schedule_after(Duration::from_millis(100), T1).cancel();

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(rx.try_recv().is_err());
    }
}
