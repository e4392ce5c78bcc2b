//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

use crate::handlers::Priority;

// =============================================================================
// Probe Defaults
// =============================================================================

/// Time a peer gets to answer a VERSION probe before the next one goes out.
pub fn default_probe_timeout_ms() -> u64 {
    5_000
}

pub fn default_unknown_label() -> String {
    "unknown".to_string()
}

// =============================================================================
// Dispatch Defaults
// =============================================================================

pub fn default_stats_priority() -> i32 {
    Priority::HIGH.0
}

pub fn default_extras_priority() -> i32 {
    (Priority::DEFAULT + 5).0
}

// =============================================================================
// Identify Defaults
// =============================================================================

pub fn default_identify_service() -> String {
    "NickServ".to_string()
}
