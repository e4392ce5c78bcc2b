//! Per-target probe results, keyed by folded nickname.

use crate::casemap::Normalizer;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::collections::hash_map;
use std::fmt;

/// Why a probe ended without a usable version string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnknownCause {
    /// The peer answered with a CTCP ERRMSG.
    ErrorReply,
    /// No answer within the probe timeout.
    TimedOut,
    /// The reply could not be interpreted.
    Malformed,
}

impl UnknownCause {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ErrorReply => "error_reply",
            Self::TimedOut => "timeout",
            Self::Malformed => "malformed",
        }
    }
}

impl fmt::Display for UnknownCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeStatus {
    /// Query sent, no answer yet.
    Pending,
    /// The peer reported this version string.
    Resolved(String),
    Unknown(UnknownCause),
}

/// State of one probed identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeState {
    pub status: ProbeStatus,
    pub requested_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl ProbeState {
    pub fn pending() -> Self {
        Self {
            status: ProbeStatus::Pending,
            requested_at: Utc::now(),
            resolved_at: None,
        }
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        matches!(self.status, ProbeStatus::Pending)
    }

    /// The reported version, if one was received.
    pub fn version(&self) -> Option<&str> {
        match &self.status {
            ProbeStatus::Resolved(v) => Some(v),
            _ => None,
        }
    }
}

/// A table entry: the spelling first seen plus its state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeEntry {
    pub nick: String,
    pub state: ProbeState,
}

/// Probe states of one connection.
///
/// Keys are produced by the connection's normalizer, so `Alice` and `alice`
/// (or `[a]` and `{a}` under rfc1459) share a single entry.
pub struct ProbeTable {
    normalize: Normalizer,
    entries: HashMap<String, ProbeEntry>,
}

impl ProbeTable {
    pub fn new(normalize: Normalizer) -> Self {
        Self {
            normalize,
            entries: HashMap::new(),
        }
    }

    /// Folded lookup key for a raw nickname.
    #[inline]
    pub fn key(&self, nick: &str) -> String {
        (self.normalize)(nick)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Look up by raw nickname.
    pub fn get(&self, nick: &str) -> Option<&ProbeEntry> {
        self.entries.get(&self.key(nick))
    }

    pub fn get_key(&self, key: &str) -> Option<&ProbeEntry> {
        self.entries.get(key)
    }

    /// Start tracking `key` as pending. Returns false if already tracked.
    pub(crate) fn insert_pending(&mut self, key: String, nick: &str) -> bool {
        match self.entries.entry(key) {
            hash_map::Entry::Occupied(_) => false,
            hash_map::Entry::Vacant(slot) => {
                slot.insert(ProbeEntry {
                    nick: nick.to_owned(),
                    state: ProbeState::pending(),
                });
                true
            }
        }
    }

    /// Settle a pending entry. Returns false if `key` is absent or settled.
    pub(crate) fn settle(&mut self, key: &str, status: ProbeStatus) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) if entry.state.is_pending() => {
                entry.state.status = status;
                entry.state.resolved_at = Some(Utc::now());
                true
            }
            _ => false,
        }
    }

    pub fn pending_count(&self) -> usize {
        self.entries.values().filter(|e| e.state.is_pending()).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ProbeEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn values(&self) -> impl Iterator<Item = &ProbeEntry> {
        self.entries.values()
    }
}

impl fmt::Debug for ProbeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProbeTable")
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::casemap::Casemapping;

    #[test]
    fn spellings_collapse_to_one_entry() {
        let mut table = ProbeTable::new(Casemapping::Rfc1459.normalizer());
        assert!(table.insert_pending(table.key("[Bob]"), "[Bob]"));
        assert!(!table.insert_pending(table.key("{bob}"), "{bob}"));

        assert_eq!(table.len(), 1);
        assert_eq!(table.get("{BOB}").unwrap().nick, "[Bob]");
    }

    #[test]
    fn settle_only_touches_pending_entries() {
        let mut table = ProbeTable::new(Casemapping::Ascii.normalizer());
        table.insert_pending("alice".into(), "Alice");

        assert!(table.settle("alice", ProbeStatus::Resolved("irssi 1.4".into())));
        assert!(!table.settle("alice", ProbeStatus::Unknown(UnknownCause::TimedOut)));
        assert!(!table.settle("nobody", ProbeStatus::Unknown(UnknownCause::TimedOut)));

        let state = &table.get("ALICE").unwrap().state;
        assert_eq!(state.version(), Some("irssi 1.4"));
        assert!(state.resolved_at.is_some());
        assert_eq!(table.pending_count(), 0);
    }
}
