//! Chain dispatch with fallthrough/stop semantics.
//!
//! The IRC chain runs first, keyed by the message command. If nothing there
//! fully handles the message and it carries a CTCP payload, the CTCP chain
//! runs, keyed by the CTCP command. A handler that errors or panics is
//! recorded as a [`HandlerFault`] and counts as a fallthrough.

use super::context::Context;
use super::registry::{HandlerRegistry, ResolvedHandler};
use super::traits::Outcome;
use crate::error::{FaultCause, HandlerFault};
use crate::message::InboundMessage;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, warn};

/// Result of dispatching one message.
#[derive(Debug, Default)]
pub struct DispatchOutcome {
    /// Name of the handler that fully handled the message, if any.
    pub handled_by: Option<String>,
    /// Number of handler invocations.
    pub invoked: usize,
    /// Handlers that failed and were skipped.
    pub faults: Vec<HandlerFault>,
}

impl DispatchOutcome {
    /// Whether any handler signaled "fully handled".
    #[inline]
    pub fn handled(&self) -> bool {
        self.handled_by.is_some()
    }

    /// Whether the host should run its built-in processing.
    #[inline]
    pub fn runs_default(&self) -> bool {
        !self.handled()
    }
}

/// The IRC and CTCP handler registries of one client.
#[derive(Debug)]
pub struct Dispatcher {
    irc: HandlerRegistry,
    ctcp: HandlerRegistry,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            irc: HandlerRegistry::new("irc"),
            ctcp: HandlerRegistry::new("ctcp"),
        }
    }

    /// Handlers keyed by IRC command or numeric.
    pub fn irc(&self) -> &HandlerRegistry {
        &self.irc
    }

    /// Handlers keyed by CTCP command.
    pub fn ctcp(&self) -> &HandlerRegistry {
        &self.ctcp
    }

    /// Run `msg` through the handler chains for its connection.
    pub fn dispatch(&self, ctx: &mut Context<'_>, msg: &InboundMessage) -> DispatchOutcome {
        let span = crate::telemetry::spans::dispatch(ctx.account, &msg.command, &msg.origin);
        let _enter = span.enter();

        let mut outcome = DispatchOutcome::default();

        let chain = self.irc.resolve(&msg.command, &ctx.view());
        run_chain(&chain, &msg.command, ctx, msg, &mut outcome);

        if !outcome.handled()
            && let Some(ctcp) = &msg.ctcp
        {
            let chain = self.ctcp.resolve(&ctcp.command, &ctx.view());
            run_chain(&chain, &ctcp.command, ctx, msg, &mut outcome);
        }

        crate::metrics::record_dispatch(&msg.command, outcome.handled());
        debug!(
            invoked = outcome.invoked,
            handled_by = outcome.handled_by.as_deref(),
            faults = outcome.faults.len(),
            "Dispatch complete"
        );
        outcome
    }
}

fn run_chain(
    chain: &[ResolvedHandler],
    command: &str,
    ctx: &mut Context<'_>,
    msg: &InboundMessage,
    outcome: &mut DispatchOutcome,
) {
    for resolved in chain {
        outcome.invoked += 1;

        let result = panic::catch_unwind(AssertUnwindSafe(|| resolved.handler().handle(ctx, msg)));
        let cause = match result {
            Ok(Ok(Outcome::Handled)) => {
                debug!(handler = resolved.name(), command, "Handled");
                outcome.handled_by = Some(resolved.name().to_owned());
                return;
            }
            Ok(Ok(Outcome::Fallthrough)) => continue,
            Ok(Err(e)) => FaultCause::Error(e),
            Err(payload) => FaultCause::Panic(panic_message(payload.as_ref())),
        };

        let fault = HandlerFault {
            handler: resolved.name().to_owned(),
            command: command.to_owned(),
            cause,
        };
        warn!(
            handler = %fault.handler,
            command = %fault.command,
            error = %fault.cause,
            "Handler fault isolated"
        );
        crate::metrics::record_handler_fault(&fault.handler, fault.cause.error_code());
        outcome.faults.push(fault);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
