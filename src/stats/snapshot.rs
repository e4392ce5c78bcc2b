//! Aggregate counts over a probe table.

use super::probe::{ProbeStatus, ProbeTable};
use std::collections::HashMap;

/// Point-in-time aggregate of one connection's probe results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Settled probes (answered, errored or timed out).
    pub total: usize,
    /// Probes still waiting for an answer.
    pub pending: usize,
    pub by_version: HashMap<String, usize>,
    /// Keyed by the first word of the version string.
    pub by_family: HashMap<String, usize>,
}

impl StatsSnapshot {
    /// Entries scanned: `total + pending`.
    pub fn size(&self) -> usize {
        self.total + self.pending
    }

    /// Versions by descending count, ties alphabetically.
    pub fn versions_ranked(&self) -> Vec<(&str, usize)> {
        ranked(&self.by_version)
    }

    /// Families by descending count, ties alphabetically.
    pub fn families_ranked(&self) -> Vec<(&str, usize)> {
        ranked(&self.by_family)
    }
}

fn ranked(counts: &HashMap<String, usize>) -> Vec<(&str, usize)> {
    let mut rows: Vec<_> = counts.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    rows
}

/// Product family of a version string, e.g. `HexChat` for `HexChat 2.16.1`.
pub fn family(version: &str) -> &str {
    version.split_whitespace().next().unwrap_or(version)
}

/// Fold `table` into counts. Never mutates the table.
///
/// Unknown results are counted under `unknown_label` in both maps.
pub fn compute_snapshot(table: &ProbeTable, unknown_label: &str) -> StatsSnapshot {
    let mut snapshot = StatsSnapshot::default();

    for entry in table.values() {
        let version = match &entry.state.status {
            ProbeStatus::Pending => {
                snapshot.pending += 1;
                continue;
            }
            ProbeStatus::Resolved(version) => version.as_str(),
            ProbeStatus::Unknown(_) => unknown_label,
        };

        snapshot.total += 1;
        *snapshot.by_version.entry(version.to_owned()).or_default() += 1;
        *snapshot.by_family.entry(family(version).to_owned()).or_default() += 1;
    }

    snapshot
}
