//! Per-connection stats state.
//!
//! A `ConnectionContext` exists only while the stats feature is active on a
//! connection. It exclusively owns the probe table and queue; everything
//! else reaches them through the operations below.

use super::correlator::{self, Reply};
use super::probe::{ProbeStatus, ProbeTable, UnknownCause};
use super::queue::{Advanced, Enqueued, ProbeIo, ProbeQueue};
use super::snapshot::{StatsSnapshot, compute_snapshot};
use crate::casemap::Normalizer;
use crate::config::ProbeConfig;
use crate::timer::TimerToken;
use std::time::Duration;
use tracing::debug;

pub struct ConnectionContext {
    epoch: u64,
    live: bool,
    unknown_label: String,
    table: ProbeTable,
    queue: ProbeQueue,
}

impl ConnectionContext {
    /// Create the context for one activation, identified by `epoch`.
    pub fn new(epoch: u64, config: &ProbeConfig, normalize: Normalizer) -> Self {
        Self {
            epoch,
            live: true,
            unknown_label: config.unknown_label.clone(),
            table: ProbeTable::new(normalize),
            queue: ProbeQueue::new(epoch, Duration::from_millis(config.timeout_ms)),
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    pub fn table(&self) -> &ProbeTable {
        &self.table
    }

    pub fn queue(&self) -> &ProbeQueue {
        &self.queue
    }

    pub fn unknown_label(&self) -> &str {
        &self.unknown_label
    }

    /// Track `nick`, probing it now or once the in-flight probe settles.
    pub fn enqueue(&mut self, nick: &str, io: ProbeIo<'_>) -> Enqueued {
        if !self.live {
            return Enqueued::Ignored;
        }
        self.queue.enqueue(&mut self.table, nick, io)
    }

    pub fn advance(&mut self, io: ProbeIo<'_>) -> Advanced {
        if !self.live {
            return Advanced::Idle;
        }
        self.queue.advance(&mut self.table, io)
    }

    /// Handle an expired probe timer.
    ///
    /// Returns false for stale tokens: a torn-down context, a previous
    /// activation, or a probe that was already answered.
    pub fn on_timer(&mut self, token: TimerToken, io: ProbeIo<'_>) -> bool {
        if !self.live {
            return false;
        }
        let Some(key) = self.queue.take_expired(token) else {
            return false;
        };

        if self
            .table
            .settle(&key, ProbeStatus::Unknown(UnknownCause::TimedOut))
        {
            crate::metrics::record_probe_result(UnknownCause::TimedOut.as_str());
            debug!(target_key = %key, %token, "VERSION probe timed out");
        }
        self.queue.advance(&mut self.table, io);
        true
    }

    /// Settle the probe for `origin` from a CTCP reply carried by `carrier`.
    pub fn on_response(
        &mut self,
        origin: &str,
        carrier: &str,
        reply: Reply<'_>,
        io: ProbeIo<'_>,
    ) -> bool {
        if !self.live {
            return false;
        }
        correlator::on_response(&mut self.table, &mut self.queue, origin, carrier, reply, io)
    }

    /// Aggregate the current results. Pure read.
    pub fn snapshot(&self) -> StatsSnapshot {
        compute_snapshot(&self.table, &self.unknown_label)
    }

    /// Cancel the armed timer and drop all queued work.
    ///
    /// After this every operation is a no-op.
    pub fn deactivate(&mut self) {
        self.live = false;
        self.queue.shutdown();
    }
}

impl std::fmt::Debug for ConnectionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionContext")
            .field("epoch", &self.epoch)
            .field("live", &self.live)
            .field("entries", &self.table.len())
            .field("queue", &self.queue)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::casemap::Casemapping;
    use crate::outbound::ChannelOutbound;
    use crate::timer::ManualScheduler;

    fn context() -> ConnectionContext {
        ConnectionContext::new(3, &ProbeConfig::default(), Casemapping::Rfc1459.normalizer())
    }

    #[test]
    fn timeout_marks_unknown_and_moves_on() {
        let (outbound, _rx) = ChannelOutbound::new();
        let scheduler = ManualScheduler::new();
        let io = ProbeIo::new(&outbound, &scheduler);
        let mut ctx = context();

        ctx.enqueue("A", io);
        ctx.enqueue("B", io);
        let token = scheduler.fire_next().unwrap();

        assert!(ctx.on_timer(token, io));
        assert_eq!(
            ctx.table().get("a").unwrap().state.status,
            ProbeStatus::Unknown(UnknownCause::TimedOut)
        );
        assert_eq!(ctx.queue().in_flight(), Some("b"));
        // The same token again is stale.
        assert!(!ctx.on_timer(token, io));
        assert_eq!(ctx.table().pending_count(), 1);
    }

    #[test]
    fn deactivated_context_ignores_everything() {
        let (outbound, _rx) = ChannelOutbound::new();
        let scheduler = ManualScheduler::new();
        let io = ProbeIo::new(&outbound, &scheduler);
        let mut ctx = context();

        ctx.enqueue("A", io);
        let token = ctx.queue().armed_token().unwrap();
        ctx.deactivate();

        assert!(!ctx.is_live());
        assert!(scheduler.armed().is_empty());
        assert!(!ctx.on_timer(token, io));
        assert_eq!(ctx.enqueue("B", io), Enqueued::Ignored);
        assert!(!ctx.on_response("A", "NOTICE", Reply::Version(Some("x")), io));
    }
}
