//! VERSION polling and handler priority configuration.

use super::defaults::{
    default_extras_priority, default_probe_timeout_ms, default_stats_priority,
    default_unknown_label,
};
use crate::handlers::Priority;
use serde::Deserialize;

/// Probe queue configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeConfig {
    /// Probe timeout in milliseconds (default: 5000).
    #[serde(default = "default_probe_timeout_ms")]
    pub timeout_ms: u64,
    /// Label counted for peers that errored, timed out or sent garbage.
    #[serde(default = "default_unknown_label")]
    pub unknown_label: String,
    /// Start collecting as soon as the session is created.
    #[serde(default)]
    pub enabled_on_connect: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_probe_timeout_ms(),
            unknown_label: default_unknown_label(),
            enabled_on_connect: false,
        }
    }
}

/// Handler chain priorities.
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    /// Priority of the stats trigger and reply handlers (default: 100).
    #[serde(default = "default_stats_priority")]
    pub stats_priority: i32,
    /// Priority of the numeric extras handlers (default: 5).
    #[serde(default = "default_extras_priority")]
    pub extras_priority: i32,
}

impl DispatchConfig {
    pub fn stats_priority(&self) -> Priority {
        Priority(self.stats_priority)
    }

    pub fn extras_priority(&self) -> Priority {
        Priority(self.extras_priority)
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            stats_priority: default_stats_priority(),
            extras_priority: default_extras_priority(),
        }
    }
}
