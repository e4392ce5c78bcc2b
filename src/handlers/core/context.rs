//! Handler context passed to every handler invocation.
//!
//! A `Context` binds one inbound message to the connection it arrived on:
//! the account identity, the connection's stats context (when the feature
//! is active) and the collaborators used for side effects.

use crate::outbound::Outbound;
use crate::stats::{ConnectionContext, ProbeIo};
use crate::timer::Scheduler;

/// Handler context for one connection.
pub struct Context<'a> {
    /// Account name, e.g. `nick@irc.libera.chat`.
    pub account: &'a str,
    /// Our current nickname on this connection.
    pub nick: &'a str,
    /// Stats state; `None` while the stats feature is inactive.
    pub stats: Option<&'a mut ConnectionContext>,
    /// Sink for outgoing lines and local system messages.
    pub outbound: &'a dyn Outbound,
    /// Timer source for probe timeouts.
    pub scheduler: &'a dyn Scheduler,
}

impl<'a> Context<'a> {
    pub fn new(
        account: &'a str,
        nick: &'a str,
        stats: Option<&'a mut ConnectionContext>,
        outbound: &'a dyn Outbound,
        scheduler: &'a dyn Scheduler,
    ) -> Self {
        Self {
            account,
            nick,
            stats,
            outbound,
            scheduler,
        }
    }

    /// The read-only facts enablement predicates are evaluated against.
    #[inline]
    pub fn view(&self) -> ConnectionView<'a> {
        ConnectionView {
            account: self.account,
            stats_active: self.stats.as_ref().is_some_and(|s| s.is_live()),
        }
    }

    /// Borrow the stats context together with its probe collaborators.
    pub fn stats_mut(&mut self) -> Option<(&mut ConnectionContext, ProbeIo<'a>)> {
        let io = ProbeIo::new(self.outbound, self.scheduler);
        self.stats.as_deref_mut().map(|stats| (stats, io))
    }
}

/// What an [`Enabled`](super::Enabled) predicate may look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionView<'a> {
    pub account: &'a str,
    /// A live stats context is attached to the connection.
    pub stats_active: bool,
}
