//! Numerics the client core leaves unhandled.

use crate::error::{HandlerError, HandlerResult};
use crate::handlers::{Context, HandlerDescriptor, Outcome, Priority};
use crate::message::InboundMessage;
use crate::outbound::Outgoing;
use chrono::DateTime;

pub const NAME: &str = "IRC Extras";

/// RPL_TOPICWHOTIME (nonstandard but ubiquitous).
pub const RPL_TOPICWHOTIME: &str = "333";

pub fn descriptor(priority: Priority) -> HandlerDescriptor {
    HandlerDescriptor::new(NAME, priority).on_fn(RPL_TOPICWHOTIME, on_topic_who_time)
}

/// `333 <me> <channel> <setter> <unix-time>`
fn on_topic_who_time(ctx: &mut Context<'_>, msg: &InboundMessage) -> HandlerResult {
    let param = |index| {
        msg.param(index).ok_or_else(|| HandlerError::MissingParam {
            command: msg.command.clone(),
            index,
        })
    };
    let channel = param(1)?;
    let setter = param(2)?;
    let raw_time = param(3)?;

    let set_at = raw_time
        .parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .ok_or_else(|| HandlerError::Malformed {
            field: "topic time",
            value: raw_time.to_owned(),
        })?;

    // The setter may be a full mask; show only the nick.
    let setter = setter.split('!').next().unwrap_or(setter);
    ctx.outbound.send(Outgoing::system(
        channel,
        format!(
            "Topic for {channel} set by {setter} on {}",
            set_at.format("%Y-%m-%d %H:%M:%S UTC")
        ),
    ))?;
    Ok(Outcome::Handled)
}
