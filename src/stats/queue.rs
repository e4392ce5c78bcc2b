//! Single-flight probe queue.
//!
//! At most one probe per connection is outstanding. Everything else waits in
//! a FIFO backlog and is issued either when the outstanding probe is
//! answered or when its timeout fires, whichever comes first.

use super::probe::ProbeTable;
use crate::outbound::Outbound;
use crate::timer::{Scheduler, TimerHandle, TimerToken};
use std::collections::{HashSet, VecDeque};
use std::time::Duration;
use tracing::{debug, warn};

/// Collaborators a probe needs: somewhere to send it and a clock.
#[derive(Clone, Copy)]
pub struct ProbeIo<'a> {
    pub outbound: &'a dyn Outbound,
    pub scheduler: &'a dyn Scheduler,
}

impl<'a> ProbeIo<'a> {
    pub fn new(outbound: &'a dyn Outbound, scheduler: &'a dyn Scheduler) -> Self {
        Self {
            outbound,
            scheduler,
        }
    }
}

/// Result of [`ProbeQueue::enqueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueued {
    /// Probe sent immediately.
    Issued,
    /// Waiting behind the in-flight probe.
    Backlogged,
    /// Already probed, pending or waiting in the backlog.
    AlreadyTracked,
    /// Empty identity.
    Ignored,
}

/// Result of [`ProbeQueue::advance`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advanced {
    /// The next backlog entry was probed.
    Issued(String),
    /// Backlog exhausted; the queue is idle.
    Idle,
    /// The in-flight probe is still pending; nothing was done.
    Busy,
}

#[derive(Debug)]
struct Waiting {
    key: String,
    nick: String,
}

#[derive(Debug)]
struct ArmedTimer {
    seq: u64,
    handle: TimerHandle,
}

#[derive(Debug)]
pub struct ProbeQueue {
    epoch: u64,
    timeout: Duration,
    /// Folded key of the outstanding probe.
    in_flight: Option<String>,
    backlog: VecDeque<Waiting>,
    /// Folded keys currently in `backlog`.
    queued: HashSet<String>,
    timer: Option<ArmedTimer>,
    next_seq: u64,
}

impl ProbeQueue {
    pub fn new(epoch: u64, timeout: Duration) -> Self {
        Self {
            epoch,
            timeout,
            in_flight: None,
            backlog: VecDeque::new(),
            queued: HashSet::new(),
            timer: None,
            next_seq: 1,
        }
    }

    /// Queue `nick` for probing, or probe it right away if nothing is in flight.
    pub fn enqueue(&mut self, table: &mut ProbeTable, nick: &str, io: ProbeIo<'_>) -> Enqueued {
        let nick = nick.trim();
        if nick.is_empty() {
            return Enqueued::Ignored;
        }

        let key = table.key(nick);
        if table.contains_key(&key) || self.queued.contains(&key) {
            return Enqueued::AlreadyTracked;
        }

        if self.in_flight.is_none() && self.timer.is_none() {
            self.issue(table, key, nick, io);
            return Enqueued::Issued;
        }

        debug!(target_nick = %nick, backlog = self.backlog.len() + 1, "Probe backlogged");
        self.queued.insert(key.clone());
        self.backlog.push_back(Waiting {
            key,
            nick: nick.to_owned(),
        });
        Enqueued::Backlogged
    }

    /// Move on to the next backlog entry.
    ///
    /// A no-op while the in-flight probe is still pending, so calling it
    /// twice for the same settled probe never issues two probes.
    pub fn advance(&mut self, table: &mut ProbeTable, io: ProbeIo<'_>) -> Advanced {
        if let Some(key) = &self.in_flight
            && table.get_key(key).is_some_and(|e| e.state.is_pending())
        {
            return Advanced::Busy;
        }

        if let Some(armed) = self.timer.take() {
            armed.handle.cancel();
        }
        self.in_flight = None;

        while let Some(next) = self.backlog.pop_front() {
            self.queued.remove(&next.key);
            if table.contains_key(&next.key) {
                debug!(target_nick = %next.nick, "Skipping already probed backlog entry");
                continue;
            }
            let nick = next.nick.clone();
            self.issue(table, next.key, &next.nick, io);
            return Advanced::Issued(nick);
        }

        debug!(epoch = self.epoch, "Probe queue idle");
        Advanced::Idle
    }

    /// Accept an expired timer token.
    ///
    /// Returns the folded key of the probe it was guarding, or `None` when
    /// the token is not the currently armed one (already advanced, or from
    /// another activation).
    pub fn take_expired(&mut self, token: TimerToken) -> Option<String> {
        if token.epoch != self.epoch {
            return None;
        }
        match &self.timer {
            Some(armed) if armed.seq == token.seq => {}
            _ => return None,
        }
        // Fired timers need no cancellation.
        self.timer = None;
        self.in_flight.clone()
    }

    /// Cancel any armed timer and forget all queued work.
    pub fn shutdown(&mut self) {
        if let Some(armed) = self.timer.take() {
            armed.handle.cancel();
        }
        self.in_flight = None;
        self.backlog.clear();
        self.queued.clear();
    }

    pub fn in_flight(&self) -> Option<&str> {
        self.in_flight.as_deref()
    }

    pub fn backlog_len(&self) -> usize {
        self.backlog.len()
    }

    /// Raw nicknames waiting, in issue order.
    pub fn backlog(&self) -> impl Iterator<Item = &str> {
        self.backlog.iter().map(|w| w.nick.as_str())
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight.is_none() && self.timer.is_none()
    }

    /// Token of the armed timeout, if any.
    pub fn armed_token(&self) -> Option<TimerToken> {
        self.timer.as_ref().map(|armed| TimerToken {
            epoch: self.epoch,
            seq: armed.seq,
        })
    }

    fn issue(&mut self, table: &mut ProbeTable, key: String, nick: &str, io: ProbeIo<'_>) {
        table.insert_pending(key.clone(), nick);

        // A failed send still arms the timer; the probe then times out as unknown.
        if let Err(e) = io.outbound.send_identity_query(nick) {
            warn!(target_nick = %nick, error = %e, "Failed to send VERSION probe");
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        let token = TimerToken {
            epoch: self.epoch,
            seq,
        };
        let handle = io.scheduler.schedule_after(self.timeout, token);
        self.timer = Some(ArmedTimer { seq, handle });
        self.in_flight = Some(key);

        crate::metrics::record_probe_issued();
        debug!(target_nick = %nick, %token, "VERSION probe issued");
    }
}

impl Drop for ProbeQueue {
    fn drop(&mut self) {
        if let Some(armed) = self.timer.take() {
            armed.handle.cancel();
        }
    }
}
