//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("connection.account is required")]
    MissingAccount,
    #[error("connection.nick is required")]
    MissingNick,
    #[error("probe.timeout_ms must be greater than zero")]
    ZeroProbeTimeout,
    #[error("probe.unknown_label must not be blank")]
    BlankUnknownLabel,
    #[error("auto_identify block for {0:?} has an empty password")]
    EmptyIdentifyPassword(String),
    #[error("auto_identify block for {0:?} has an invalid service nick")]
    InvalidIdentifyService(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    // Required fields
    if config.connection.account.trim().is_empty() {
        errors.push(ValidationError::MissingAccount);
    }
    if config.connection.nick.trim().is_empty() {
        errors.push(ValidationError::MissingNick);
    }

    // Probe settings
    if config.probe.timeout_ms == 0 {
        errors.push(ValidationError::ZeroProbeTimeout);
    }
    if config.probe.unknown_label.trim().is_empty() {
        errors.push(ValidationError::BlankUnknownLabel);
    }

    // Identify blocks go out verbatim as a PRIVMSG line.
    for block in &config.auto_identify {
        if block.password.is_empty() {
            errors.push(ValidationError::EmptyIdentifyPassword(block.account.clone()));
        }
        if block.service.is_empty() || block.service.contains([' ', ':', '\r', '\n']) {
            errors.push(ValidationError::InvalidIdentifyService(block.account.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
