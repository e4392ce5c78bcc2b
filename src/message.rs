//! Inbound protocol messages as seen by handlers.
//!
//! Hosts normally hand over already-parsed messages. [`InboundMessage`] also
//! implements [`FromStr`] for a raw RFC 1459 line so transcripts can be
//! replayed without a full protocol stack; tags are accepted and dropped.

use crate::ctcp::Ctcp;
use crate::error::ParseError;
use std::str::FromStr;

/// A parsed inbound message. Read-only to handlers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundMessage {
    /// Uppercased command or three-digit numeric.
    pub command: String,
    /// Sender nickname (or server name); empty when the line had no prefix.
    pub origin: String,
    pub params: Vec<String>,
    /// CTCP payload carried in a PRIVMSG/NOTICE body.
    pub ctcp: Option<Ctcp>,
}

impl InboundMessage {
    pub fn new(command: &str, origin: &str, params: Vec<String>) -> Self {
        let command = command.to_ascii_uppercase();
        let ctcp = extract_ctcp(&command, &params);
        Self {
            command,
            origin: origin.to_owned(),
            params,
            ctcp,
        }
    }

    /// Parameter at `index`, if present.
    #[inline]
    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }

    /// The final parameter (the trailing text for most commands).
    #[inline]
    pub fn trailing(&self) -> Option<&str> {
        self.params.last().map(String::as_str)
    }
}

fn extract_ctcp(command: &str, params: &[String]) -> Option<Ctcp> {
    match command {
        "PRIVMSG" | "NOTICE" if params.len() >= 2 => Ctcp::parse(&params[params.len() - 1]),
        _ => None,
    }
}

impl FromStr for InboundMessage {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut rest = line.trim_end_matches(['\r', '\n']);
        if rest.trim().is_empty() {
            return Err(ParseError::Empty);
        }

        if let Some(tagged) = rest.strip_prefix('@') {
            rest = tagged.split_once(' ').map_or("", |(_, r)| r);
        }
        rest = rest.trim_start_matches(' ');

        let mut origin = "";
        if let Some(prefixed) = rest.strip_prefix(':') {
            let (prefix, r) = prefixed.split_once(' ').unwrap_or((prefixed, ""));
            origin = prefix.split(['!', '@']).next().unwrap_or(prefix);
            rest = r.trim_start_matches(' ');
        }

        let (command, mut rest) = rest.split_once(' ').unwrap_or((rest, ""));
        if command.is_empty() {
            return Err(ParseError::MissingCommand(line.to_owned()));
        }

        let mut params = Vec::new();
        loop {
            rest = rest.trim_start_matches(' ');
            if rest.is_empty() {
                break;
            }
            if let Some(trailing) = rest.strip_prefix(':') {
                params.push(trailing.to_owned());
                break;
            }
            let (param, r) = rest.split_once(' ').unwrap_or((rest, ""));
            params.push(param.to_owned());
            rest = r;
        }

        Ok(Self::new(command, origin, params))
    }
}
