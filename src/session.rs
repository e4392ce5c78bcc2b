//! Per-connection glue between the host client and the extension layer.
//!
//! A [`Session`] is owned by the connection's event loop. Inbound messages,
//! conversation commands and timer expirations all arrive through it on
//! that one task, so the stats context is only ever touched serially.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info, warn};

use crate::casemap::Casemapping;
use crate::commands::StatsCommand;
use crate::config::{Config, ProbeConfig};
use crate::handlers::stats::MEMBERSHIP_PREFIXES;
use crate::handlers::{Context, DispatchOutcome, Dispatcher};
use crate::message::InboundMessage;
use crate::outbound::{Outbound, Outgoing};
use crate::stats::{ConnectionContext, ProbeIo, StatsSnapshot, report};
use crate::timer::{Scheduler, TimerToken};

/// Activation counter shared by every session in the process, so a token
/// minted for one activation can never match another.
static NEXT_EPOCH: AtomicU64 = AtomicU64::new(1);

pub struct Session {
    account: String,
    nick: String,
    casemapping: Casemapping,
    probe: ProbeConfig,
    dispatcher: Arc<Dispatcher>,
    outbound: Arc<dyn Outbound>,
    scheduler: Arc<dyn Scheduler>,
    roster: Roster,
    stats: Option<ConnectionContext>,
}

impl Session {
    pub fn new(
        config: &Config,
        dispatcher: Arc<Dispatcher>,
        outbound: Arc<dyn Outbound>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        let casemapping = config.connection.casemapping;
        let mut session = Self {
            account: config.connection.account.clone(),
            nick: config.connection.nick.clone(),
            casemapping,
            probe: config.probe.clone(),
            dispatcher,
            outbound,
            scheduler,
            roster: Roster::new(casemapping),
            stats: None,
        };
        if config.probe.enabled_on_connect {
            session.start_stats();
        }
        session
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    /// Our current nickname.
    pub fn nick(&self) -> &str {
        &self.nick
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn is_stats_active(&self) -> bool {
        self.stats.is_some()
    }

    pub fn stats(&self) -> Option<&ConnectionContext> {
        self.stats.as_ref()
    }

    /// Run one inbound message through the handler chains.
    ///
    /// The host runs its built-in processing when the returned outcome
    /// says so.
    pub fn handle_message(&mut self, msg: &InboundMessage) -> DispatchOutcome {
        let outcome = {
            let mut ctx = Context::new(
                &self.account,
                &self.nick,
                self.stats.as_mut(),
                self.outbound.as_ref(),
                self.scheduler.as_ref(),
            );
            self.dispatcher.dispatch(&mut ctx, msg)
        };

        self.track_nick(msg);
        self.roster.observe(msg, &self.nick);
        outcome
    }

    fn track_nick(&mut self, msg: &InboundMessage) {
        match msg.command.as_str() {
            "001" => {
                if let Some(nick) = msg.param(0) {
                    self.nick = nick.to_owned();
                }
            }
            "NICK" => {
                if self.casemapping.fold(&msg.origin) == self.casemapping.fold(&self.nick)
                    && let Some(new_nick) = msg.param(0)
                {
                    debug!(old = %self.nick, new = %new_nick, "Own nick changed");
                    self.nick = new_nick.to_owned();
                }
            }
            _ => {}
        }
    }

    /// Begin collecting, probing everyone currently visible in a joined
    /// channel. Returns false if already active.
    pub fn start_stats(&mut self) -> bool {
        if self.stats.is_some() {
            return false;
        }
        let epoch = NEXT_EPOCH.fetch_add(1, Ordering::Relaxed);
        let mut stats = ConnectionContext::new(epoch, &self.probe, self.casemapping.normalizer());

        let io = ProbeIo::new(self.outbound.as_ref(), self.scheduler.as_ref());
        let participants = self.roster.participants(&self.nick);
        for nick in &participants {
            stats.enqueue(nick, io);
        }

        info!(
            account = %self.account,
            epoch,
            participants = participants.len(),
            "Stats collection started"
        );
        self.stats = Some(stats);
        true
    }

    /// Stop collecting and discard all state. Returns false if inactive.
    pub fn stop_stats(&mut self) -> bool {
        let Some(mut stats) = self.stats.take() else {
            return false;
        };
        stats.deactivate();
        info!(account = %self.account, epoch = stats.epoch(), "Stats collection stopped");
        true
    }

    /// Deliver an expired probe timer. Returns false if it was stale.
    pub fn on_timer(&mut self, token: TimerToken) -> bool {
        let span = crate::telemetry::spans::probe_timer(&self.account, &token);
        let _enter = span.enter();

        let io = ProbeIo::new(self.outbound.as_ref(), self.scheduler.as_ref());
        let fired = match self.stats.as_mut() {
            Some(stats) if stats.epoch() == token.epoch => stats.on_timer(token, io),
            _ => false,
        };
        if !fired {
            debug!("Ignoring stale probe timer");
            crate::metrics::record_stale_timer();
        }
        fired
    }

    pub fn snapshot(&self) -> Option<StatsSnapshot> {
        self.stats.as_ref().map(ConnectionContext::snapshot)
    }

    /// Execute a conversation command typed into `conversation`.
    pub fn run_command(&mut self, command: StatsCommand, conversation: &str) -> bool {
        match command {
            StatsCommand::Start => self.start_stats(),
            StatsCommand::Stop => self.stop_stats(),
            StatsCommand::Report => {
                let Some(snapshot) = self.snapshot() else {
                    return false;
                };
                let text = report::render(&snapshot);
                if let Err(e) = self.outbound.send(Outgoing::system(conversation, text)) {
                    warn!(error = %e, "Failed to write stats report");
                }
                true
            }
        }
    }

    /// Tear down per-connection state.
    pub fn close(&mut self) {
        self.stop_stats();
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("account", &self.account)
            .field("nick", &self.nick)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

/// Who is in the channels we have joined, as seen on the wire.
#[derive(Debug)]
pub struct Roster {
    casemapping: Casemapping,
    /// Folded channel name to folded nick to display nick.
    channels: HashMap<String, HashMap<String, String>>,
}

impl Roster {
    pub fn new(casemapping: Casemapping) -> Self {
        Self {
            casemapping,
            channels: HashMap::new(),
        }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Everyone visible in any joined channel except `me`, once each.
    pub fn participants(&self, me: &str) -> Vec<String> {
        let me = self.casemapping.fold(me);
        let mut seen: HashMap<&str, &str> = HashMap::new();
        for members in self.channels.values() {
            for (key, nick) in members {
                if *key != me {
                    seen.entry(key.as_str()).or_insert(nick.as_str());
                }
            }
        }
        let mut out: Vec<String> = seen.into_values().map(str::to_owned).collect();
        out.sort();
        out
    }

    fn observe(&mut self, msg: &InboundMessage, me: &str) {
        let casemapping = self.casemapping;
        let fold = move |s: &str| casemapping.fold(s);
        let is_me = |nick: &str| fold(nick) == fold(me);

        match msg.command.as_str() {
            "JOIN" => {
                let Some(channel) = msg.param(0) else { return };
                let joined_self = is_me(&msg.origin);
                let (chan_key, nick_key) = (fold(channel), fold(&msg.origin));
                if joined_self {
                    self.channels.entry(chan_key.clone()).or_default();
                }
                if let Some(members) = self.channels.get_mut(&chan_key) {
                    members.insert(nick_key, msg.origin.clone());
                }
            }
            "353" if msg.params.len() >= 3 => {
                let channel = &msg.params[msg.params.len() - 2];
                let Some(names) = msg.trailing() else { return };
                let entries: Vec<(String, String)> = names
                    .split_whitespace()
                    .map(|n| n.trim_start_matches(MEMBERSHIP_PREFIXES))
                    .filter(|n| !n.is_empty())
                    .map(|n| (fold(n), n.to_owned()))
                    .collect();
                self.channels.entry(fold(channel)).or_default().extend(entries);
            }
            "PART" => {
                let Some(channel) = msg.param(0) else { return };
                let (chan_key, nick_key, parted_self) =
                    (fold(channel), fold(&msg.origin), is_me(&msg.origin));
                if parted_self {
                    self.channels.remove(&chan_key);
                } else if let Some(members) = self.channels.get_mut(&chan_key) {
                    members.remove(&nick_key);
                }
            }
            "KICK" => {
                let (Some(channel), Some(victim)) = (msg.param(0), msg.param(1)) else {
                    return;
                };
                let (chan_key, nick_key, kicked_self) = (fold(channel), fold(victim), is_me(victim));
                if kicked_self {
                    self.channels.remove(&chan_key);
                } else if let Some(members) = self.channels.get_mut(&chan_key) {
                    members.remove(&nick_key);
                }
            }
            "QUIT" => {
                let key = fold(&msg.origin);
                for members in self.channels.values_mut() {
                    members.remove(&key);
                }
            }
            "NICK" => {
                let Some(new_nick) = msg.param(0) else { return };
                let (old_key, new_key) = (fold(&msg.origin), fold(new_nick));
                for members in self.channels.values_mut() {
                    if members.remove(&old_key).is_some() {
                        members.insert(new_key.clone(), new_nick.to_owned());
                    }
                }
            }
            _ => {}
        }
    }
}
