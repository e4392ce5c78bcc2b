//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: the top-level `Config` and connection identity
//! - [`probe`]: VERSION polling and handler priority settings
//! - [`identify`]: auto-identify blocks for the `001` handler
//! - [`validation`]: startup checks that report every problem at once

mod defaults;
mod identify;
mod probe;
mod types;
pub mod validation;

pub use identify::IdentifyBlock;
pub use probe::{DispatchConfig, ProbeConfig};
pub use types::{Config, ConfigError, ConnectionConfig};
pub use validation::{ValidationError, validate};
