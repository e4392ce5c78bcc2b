//! Outbound side effects towards the host connection.
//!
//! Handlers never write to a socket directly. They push [`Outgoing`] items
//! through an [`Outbound`] sink that the host drains, mirroring how server
//! handlers push replies into a per-client channel.

use crate::ctcp::Ctcp;
use crate::error::SendError;
use tokio::sync::mpsc;

/// Something the host should do on behalf of a handler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outgoing {
    /// A raw protocol line, without CRLF.
    Line(String),
    /// A local system message written into a conversation (never sent).
    System { target: String, text: String },
}

impl Outgoing {
    /// `PRIVMSG <target> :<text>`.
    pub fn privmsg(target: &str, text: &str) -> Self {
        Self::Line(format!("PRIVMSG {target} :{text}"))
    }

    /// A CTCP query, carried in a PRIVMSG.
    pub fn ctcp_query(target: &str, ctcp: &Ctcp) -> Self {
        Self::privmsg(target, &ctcp.to_string())
    }

    pub fn system(target: &str, text: impl Into<String>) -> Self {
        Self::System {
            target: target.to_owned(),
            text: text.into(),
        }
    }
}

/// Sink for outbound side effects of one connection.
pub trait Outbound: Send + Sync {
    fn send(&self, item: Outgoing) -> Result<(), SendError>;

    /// Emit a CTCP VERSION probe to `target`.
    fn send_identity_query(&self, target: &str) -> Result<(), SendError> {
        self.send(Outgoing::ctcp_query(target, &Ctcp::version_query()))
    }
}

/// [`Outbound`] backed by an unbounded tokio channel.
#[derive(Clone, Debug)]
pub struct ChannelOutbound {
    tx: mpsc::UnboundedSender<Outgoing>,
}

impl ChannelOutbound {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Outgoing>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Outbound for ChannelOutbound {
    fn send(&self, item: Outgoing) -> Result<(), SendError> {
        self.tx.send(item).map_err(|_| SendError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_query_is_ctcp_privmsg() {
        let (out, mut rx) = ChannelOutbound::new();
        out.send_identity_query("alice").unwrap();
        assert_eq!(
            rx.try_recv().unwrap(),
            Outgoing::Line("PRIVMSG alice :\x01VERSION\x01".into())
        );
    }

    #[test]
    fn closed_channel_reports_send_error() {
        let (out, rx) = ChannelOutbound::new();
        drop(rx);
        assert_eq!(out.send_identity_query("alice"), Err(SendError));
    }
}
