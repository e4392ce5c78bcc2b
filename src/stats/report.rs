//! Plain-text rendering of a snapshot, as written by `/stats`.

use super::snapshot::StatsSnapshot;
use std::fmt::Write;

/// Render `snapshot` as a multi-line system message.
pub fn render(snapshot: &StatsSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Total hits: {}", snapshot.total);
    let _ = writeln!(out, "Waiting for: {}", snapshot.pending);

    for (version, count) in snapshot.versions_ranked() {
        let _ = writeln!(
            out,
            "'{version}': {:.1}% ({count})",
            percentage(count, snapshot.total)
        );
    }
    out
}

fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 * 100.0 / total as f64
    }
}
