//! Identify to services when a connection is welcomed.

use crate::config::IdentifyBlock;
use crate::error::HandlerResult;
use crate::handlers::{Context, Enabled, Handler, HandlerDescriptor, Outcome, Priority};
use crate::message::InboundMessage;
use crate::outbound::Outgoing;
use tracing::info;

pub const NAME: &str = "Auto Identify";

/// RPL_WELCOME.
pub const RPL_WELCOME: &str = "001";

/// Runs ahead of the extras so the password goes out before anything else
/// reacts to the welcome.
pub const PRIORITY: Priority = Priority(Priority::DEFAULT.0 + 10);

/// Sends `IDENTIFY` for the block matching the connection's account.
pub struct IdentifyHandler {
    blocks: Vec<IdentifyBlock>,
}

impl IdentifyHandler {
    pub fn new(blocks: Vec<IdentifyBlock>) -> Self {
        Self { blocks }
    }
}

impl Handler for IdentifyHandler {
    fn handle(&self, ctx: &mut Context<'_>, _msg: &InboundMessage) -> HandlerResult {
        if let Some(block) = self
            .blocks
            .iter()
            .find(|b| b.account.eq_ignore_ascii_case(ctx.account))
        {
            info!(account = %ctx.account, service = %block.service, "Identifying to services");
            ctx.outbound.send(Outgoing::Line(block.identify_line()))?;
        }
        // The client still needs to see its welcome.
        Ok(Outcome::Fallthrough)
    }
}

/// `None` when no account has an identify block.
pub fn descriptor(blocks: &[IdentifyBlock]) -> Option<HandlerDescriptor> {
    if blocks.is_empty() {
        return None;
    }
    let accounts = blocks.iter().map(|b| b.account.clone()).collect();
    Some(
        HandlerDescriptor::new(NAME, PRIORITY)
            .enabled(Enabled::Accounts(accounts))
            .on(RPL_WELCOME, IdentifyHandler::new(blocks.to_vec())),
    )
}
