//! Integration test common infrastructure.
//!
//! Provides a recording outbound sink, session builders, and helpers for
//! feeding raw lines through a session.

#![allow(dead_code)]

use parking_lot::Mutex;
use slirc_stats::config::Config;
use slirc_stats::error::SendError;
use slirc_stats::handlers::{self, DispatchOutcome, Dispatcher};
use slirc_stats::outbound::{Outbound, Outgoing};
use slirc_stats::session::Session;
use slirc_stats::timer::ManualScheduler;
use std::sync::Arc;

/// Outbound sink that keeps everything it was asked to send.
#[derive(Default)]
pub struct RecordingOutbound {
    sent: Mutex<Vec<Outgoing>>,
}

impl RecordingOutbound {
    /// Take everything recorded so far.
    pub fn take(&self) -> Vec<Outgoing> {
        std::mem::take(&mut *self.sent.lock())
    }

    /// Targets of the VERSION probes recorded so far, in order.
    pub fn take_probes(&self) -> Vec<String> {
        self.take()
            .into_iter()
            .filter_map(|item| match item {
                Outgoing::Line(line) => line
                    .strip_prefix("PRIVMSG ")
                    .and_then(|rest| rest.strip_suffix(" :\x01VERSION\x01"))
                    .map(str::to_owned),
                Outgoing::System { .. } => None,
            })
            .collect()
    }
}

impl Outbound for RecordingOutbound {
    fn send(&self, item: Outgoing) -> Result<(), SendError> {
        self.sent.lock().push(item);
        Ok(())
    }
}

pub const ACCOUNT: &str = "me@irc.example";

pub fn config(extra: &str) -> Config {
    Config::parse(&format!(
        "[connection]\naccount = \"{ACCOUNT}\"\nnick = \"me\"\n{extra}"
    ))
    .expect("test config parses")
}

/// A session with the default handlers and a manual clock.
pub struct TestSession {
    pub session: Session,
    pub outbound: Arc<RecordingOutbound>,
    pub scheduler: Arc<ManualScheduler>,
    pub dispatcher: Arc<Dispatcher>,
}

impl TestSession {
    pub fn new(extra: &str) -> Self {
        let config = config(extra);
        let dispatcher = Arc::new(Dispatcher::new());
        handlers::register_defaults(&dispatcher, &config).expect("defaults register");
        let outbound = Arc::new(RecordingOutbound::default());
        let scheduler = Arc::new(ManualScheduler::new());
        let session = Session::new(
            &config,
            Arc::clone(&dispatcher),
            outbound.clone(),
            scheduler.clone(),
        );
        Self {
            session,
            outbound,
            scheduler,
            dispatcher,
        }
    }

    /// A session with stats collection already running.
    pub fn active() -> Self {
        Self::new("[probe]\nenabled_on_connect = true\n")
    }

    pub fn feed(&mut self, line: &str) -> DispatchOutcome {
        let msg = line.parse().expect("test line parses");
        self.session.handle_message(&msg)
    }

    /// Fire the oldest armed timer through the session.
    pub fn fire_timer(&mut self) -> bool {
        match self.scheduler.fire_next() {
            Some(token) => self.session.on_timer(token),
            None => false,
        }
    }

    /// Deliver a CTCP VERSION reply from `nick`.
    pub fn version_reply(&mut self, nick: &str, version: &str) -> DispatchOutcome {
        self.feed(&format!(
            ":{nick}!u@host NOTICE me :\x01VERSION {version}\x01"
        ))
    }
}
