//! Handler trait and chain outcome.

use super::context::Context;
use crate::error::HandlerResult;
use crate::message::InboundMessage;

/// What a handler decided about a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Fully consumed: stop the chain and suppress default processing.
    Handled,
    /// Not acted upon (or default processing must still run): continue.
    Fallthrough,
}

impl Outcome {
    #[inline]
    pub fn is_handled(self) -> bool {
        matches!(self, Self::Handled)
    }
}

impl From<bool> for Outcome {
    fn from(handled: bool) -> Self {
        if handled {
            Self::Handled
        } else {
            Self::Fallthrough
        }
    }
}

/// A handler for one protocol (or CTCP) command.
///
/// Handlers are shared by every connection and must not keep per-connection
/// state of their own; that lives in the [`Context`].
pub trait Handler: Send + Sync {
    fn handle(&self, ctx: &mut Context<'_>, msg: &InboundMessage) -> HandlerResult;
}

/// Adapter so plain functions and closures can sit in a command table.
pub(crate) struct FnHandler<F>(pub(crate) F);

impl<F> Handler for FnHandler<F>
where
    F: Fn(&mut Context<'_>, &InboundMessage) -> HandlerResult + Send + Sync,
{
    fn handle(&self, ctx: &mut Context<'_>, msg: &InboundMessage) -> HandlerResult {
        (self.0)(ctx, msg)
    }
}
