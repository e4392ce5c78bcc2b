//! CTCP (Client-to-Client Protocol) payloads.
//!
//! CTCP rides inside PRIVMSG (queries) and NOTICE (replies) bodies, framed
//! by `\x01`. Only the framing is handled here; interpretation of a given
//! CTCP command belongs to the handler registered for it.
//!
//! # Reference
//! - CTCP specification: <https://modern.ircdocs.horse/ctcp.html>

use std::fmt;

/// The CTCP delimiter character (`\x01`).
pub const CTCP_DELIM: char = '\x01';

/// CTCP command used for client identity probes.
pub const VERSION: &str = "VERSION";

/// CTCP command some clients use to report a failed query.
pub const ERRMSG: &str = "ERRMSG";

/// A CTCP payload extracted from a message body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ctcp {
    /// Uppercased CTCP command (`VERSION`, `ERRMSG`, ...).
    pub command: String,
    /// Everything after the first space, if non-empty.
    pub param: Option<String>,
}

impl Ctcp {
    pub fn new(command: &str, param: Option<&str>) -> Self {
        Self {
            command: command.to_ascii_uppercase(),
            param: param.map(str::to_owned),
        }
    }

    /// Parse a PRIVMSG/NOTICE body.
    ///
    /// Returns `None` when the body is not CTCP-framed or carries no command.
    /// A missing trailing delimiter is tolerated, as many clients omit it.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.strip_prefix(CTCP_DELIM)?;
        let text = text.strip_suffix(CTCP_DELIM).unwrap_or(text);

        let (command, param) = match text.split_once(' ') {
            Some((command, rest)) => (command, Some(rest).filter(|p| !p.is_empty())),
            None => (text, None),
        };
        if command.is_empty() {
            return None;
        }

        Some(Self::new(command, param))
    }

    /// The CTCP VERSION query sent to probe a peer.
    pub fn version_query() -> Self {
        Self::new(VERSION, None)
    }
}

impl fmt::Display for Ctcp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.param {
            Some(param) => write!(f, "{CTCP_DELIM}{} {param}{CTCP_DELIM}", self.command),
            None => write!(f, "{CTCP_DELIM}{}{CTCP_DELIM}", self.command),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_version_reply() {
        let ctcp = Ctcp::parse("\x01VERSION HexChat 2.16.1 / Linux\x01").unwrap();
        assert_eq!(ctcp.command, "VERSION");
        assert_eq!(ctcp.param.as_deref(), Some("HexChat 2.16.1 / Linux"));
    }

    #[test]
    fn parse_uppercases_command_and_tolerates_missing_trailer() {
        let ctcp = Ctcp::parse("\x01version irssi").unwrap();
        assert_eq!(ctcp.command, "VERSION");
        assert_eq!(ctcp.param.as_deref(), Some("irssi"));
    }

    #[test]
    fn parse_rejects_plain_text_and_empty_frames() {
        assert!(Ctcp::parse("hello").is_none());
        assert!(Ctcp::parse("\x01\x01").is_none());
        assert!(Ctcp::parse("\x01 foo\x01").is_none());
    }

    #[test]
    fn bare_query_has_no_param() {
        let ctcp = Ctcp::parse("\x01VERSION \x01").unwrap();
        assert_eq!(ctcp.param, None);
        assert_eq!(Ctcp::version_query().to_string(), "\x01VERSION\x01");
    }
}
