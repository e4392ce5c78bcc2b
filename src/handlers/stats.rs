//! Stats handlers: probe triggers and VERSION reply correlation.
//!
//! Both descriptors are enabled only while stats collection is active on
//! the connection. Triggers always fall through so the client's own JOIN,
//! NAMES and NICK processing still runs.

use crate::ctcp;
use crate::error::HandlerResult;
use crate::handlers::{ConnectionView, Context, Enabled, HandlerDescriptor, Outcome, Priority};
use crate::message::InboundMessage;
use crate::stats::Reply;
use std::sync::Arc;

/// Name of the IRC-namespace trigger descriptor.
pub const TRIGGERS: &str = "IRC Stats";

/// Name of the CTCP-namespace reply descriptor.
pub const REPLIES: &str = "CTCP Stats";

/// RPL_NAMREPLY.
pub const RPL_NAMREPLY: &str = "353";

/// Channel membership prefixes that may precede a nick in RPL_NAMREPLY.
pub(crate) const MEMBERSHIP_PREFIXES: &[char] = &['~', '&', '@', '%', '+'];

/// Enabled only while collection is running on the connection.
pub fn while_active() -> Enabled {
    Enabled::When(Arc::new(|view: &ConnectionView<'_>| view.stats_active))
}

/// Triggers: JOIN, RPL_NAMREPLY and NICK queue nicks for probing.
pub fn triggers(priority: Priority) -> HandlerDescriptor {
    HandlerDescriptor::new(TRIGGERS, priority)
        .enabled(while_active())
        .on_fn("JOIN", on_join)
        .on_fn(RPL_NAMREPLY, on_namreply)
        .on_fn("NICK", on_nick)
}

/// Replies: CTCP VERSION and ERRMSG settle outstanding probes.
pub fn replies(priority: Priority) -> HandlerDescriptor {
    HandlerDescriptor::new(REPLIES, priority)
        .enabled(while_active())
        .on_fn(ctcp::VERSION, on_version)
        .on_fn(ctcp::ERRMSG, on_errmsg)
}

/// Queue `nicks`, never probing ourselves.
fn enqueue<'n>(ctx: &mut Context<'_>, nicks: impl IntoIterator<Item = &'n str>) {
    let me = ctx.nick;
    if let Some((stats, io)) = ctx.stats_mut() {
        let me = stats.table().key(me);
        for nick in nicks {
            if stats.table().key(nick) != me {
                stats.enqueue(nick, io);
            }
        }
    }
}

fn on_join(ctx: &mut Context<'_>, msg: &InboundMessage) -> HandlerResult {
    enqueue(ctx, [msg.origin.as_str()]);
    Ok(Outcome::Fallthrough)
}

/// `353 <me> [symbol] <channel> :[prefix]nick [prefix]nick ...`
///
/// Older servers omit the symbol, so the names are taken from the last
/// parameter rather than a fixed index.
fn on_namreply(ctx: &mut Context<'_>, msg: &InboundMessage) -> HandlerResult {
    if msg.params.len() >= 3
        && let Some(names) = msg.trailing()
    {
        enqueue(
            ctx,
            names
                .split_whitespace()
                .map(|n| n.trim_start_matches(MEMBERSHIP_PREFIXES)),
        );
    }
    Ok(Outcome::Fallthrough)
}

/// Whether `nick` is us. During our own NICK, `ctx.nick` is still the old nick.
fn is_me(ctx: &Context<'_>, nick: &str) -> bool {
    ctx.stats
        .as_deref()
        .is_some_and(|s| s.table().key(nick) == s.table().key(ctx.nick))
}

/// The old nick keeps its entry; the new one is probed as a new identity.
fn on_nick(ctx: &mut Context<'_>, msg: &InboundMessage) -> HandlerResult {
    if is_me(ctx, &msg.origin) {
        return Ok(Outcome::Fallthrough);
    }
    if let Some(new_nick) = msg.param(0) {
        enqueue(ctx, [new_nick]);
    }
    Ok(Outcome::Fallthrough)
}

fn on_version(ctx: &mut Context<'_>, msg: &InboundMessage) -> HandlerResult {
    let param = msg.ctcp.as_ref().and_then(|c| c.param.as_deref());
    settle(ctx, msg, Reply::Version(param))
}

fn on_errmsg(ctx: &mut Context<'_>, msg: &InboundMessage) -> HandlerResult {
    let param = msg.ctcp.as_ref().and_then(|c| c.param.as_deref());
    settle(ctx, msg, Reply::Error(param))
}

fn settle(ctx: &mut Context<'_>, msg: &InboundMessage, reply: Reply<'_>) -> HandlerResult {
    let handled = match ctx.stats_mut() {
        Some((stats, io)) => stats.on_response(&msg.origin, &msg.command, reply, io),
        None => false,
    };
    Ok(Outcome::from(handled))
}
