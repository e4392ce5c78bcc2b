//! Matching CTCP VERSION replies against outstanding probes.
//!
//! Only a reply to a probe we are actually waiting on is consumed. Anything
//! else (unsolicited replies, duplicates, late replies after a timeout,
//! queries from peers) is left for default processing.

use super::probe::{ProbeStatus, ProbeTable, UnknownCause};
use super::queue::{ProbeIo, ProbeQueue};
use crate::ctcp;
use crate::error::ResponseError;
use tracing::{debug, warn};

/// A CTCP reply relevant to version probing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply<'a> {
    /// `VERSION <payload>`.
    Version(Option<&'a str>),
    /// `ERRMSG <query> :<reason>`.
    Error(Option<&'a str>),
}

/// Validate a VERSION payload into the string stored as the result.
pub fn parse_version(payload: Option<&str>) -> Result<String, ResponseError> {
    let version = payload.map(str::trim).unwrap_or_default();
    if version.is_empty() {
        return Err(ResponseError::Empty);
    }
    if version.chars().any(char::is_control) {
        return Err(ResponseError::ControlCharacters);
    }
    Ok(version.to_owned())
}

/// Whether an ERRMSG concerns a VERSION query.
///
/// ERRMSG echoes the failed query first; an ERRMSG without one is taken at
/// face value.
fn errmsg_is_for_version(param: Option<&str>) -> bool {
    match param.and_then(|p| p.split_whitespace().next()) {
        Some(query) => query.trim_start_matches(ctcp::CTCP_DELIM).eq_ignore_ascii_case(ctcp::VERSION),
        None => true,
    }
}

/// Settle the probe for `origin` from a reply carried by `carrier`.
///
/// Returns true when the reply was ours and has been consumed.
pub fn on_response(
    table: &mut ProbeTable,
    queue: &mut ProbeQueue,
    origin: &str,
    carrier: &str,
    reply: Reply<'_>,
    io: ProbeIo<'_>,
) -> bool {
    // Replies travel in NOTICE. A PRIVMSG-carried CTCP is a peer's query.
    if !carrier.eq_ignore_ascii_case("NOTICE") {
        return false;
    }
    if let Reply::Error(param) = reply
        && !errmsg_is_for_version(param)
    {
        debug!(origin, ?param, "ERRMSG for another query ignored");
        return false;
    }

    let key = table.key(origin);
    if !table.get_key(&key).is_some_and(|e| e.state.is_pending()) {
        return false;
    }

    let status = match reply {
        Reply::Version(payload) => match parse_version(payload) {
            Ok(version) => ProbeStatus::Resolved(version),
            Err(e) => {
                warn!(origin, error = %e, "Malformed VERSION reply");
                ProbeStatus::Unknown(UnknownCause::Malformed)
            }
        },
        Reply::Error(_) => ProbeStatus::Unknown(UnknownCause::ErrorReply),
    };
    crate::metrics::record_probe_result(match &status {
        ProbeStatus::Unknown(cause) => cause.as_str(),
        _ => "version",
    });
    debug!(origin, ?status, "Probe answered");
    table.settle(&key, status);

    if queue.in_flight() == Some(key.as_str()) {
        queue.advance(table, io);
    }
    true
}
