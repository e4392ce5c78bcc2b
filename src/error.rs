//! Unified error handling for slirc-stats.
//!
//! Every fault here is contained at the boundary where it occurs: a failing
//! handler becomes a [`HandlerFault`] record, a bad reply becomes an
//! "unknown" probe result. Nothing propagates far enough to close the
//! hosting connection.

use thiserror::Error;

// ============================================================================
// Registry Errors
// ============================================================================

/// Handler registration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("handler already registered: {name}")]
    DuplicateHandler { name: String },
}

// ============================================================================
// Handler Errors (command processing)
// ============================================================================

/// Errors a handler may return instead of an [`Outcome`](crate::Outcome).
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("missing parameter {index} for {command}")]
    MissingParam { command: String, index: usize },

    #[error("malformed {field}: {value:?}")]
    Malformed { field: &'static str, value: String },

    #[error("send error: {0}")]
    Send(#[from] SendError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingParam { .. } => "missing_param",
            Self::Malformed { .. } => "malformed",
            Self::Send(_) => "send_error",
            Self::Internal(_) => "internal_error",
        }
    }
}

/// Result type for command handlers.
pub type HandlerResult = Result<crate::handlers::Outcome, HandlerError>;

/// Why a handler invocation was isolated.
#[derive(Debug, Error)]
pub enum FaultCause {
    #[error(transparent)]
    Error(#[from] HandlerError),

    #[error("panicked: {0}")]
    Panic(String),
}

impl FaultCause {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Error(e) => e.error_code(),
            Self::Panic(_) => "panic",
        }
    }
}

/// A handler invocation that failed and was treated as a fallthrough.
#[derive(Debug, Error)]
#[error("handler {handler:?} faulted on {command}: {cause}")]
pub struct HandlerFault {
    pub handler: String,
    pub command: String,
    #[source]
    pub cause: FaultCause,
}

// ============================================================================
// Probe Errors
// ============================================================================

/// A reply payload that could not be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResponseError {
    #[error("empty VERSION reply")]
    Empty,

    #[error("VERSION reply contains control characters")]
    ControlCharacters,
}

/// The outbound channel towards the connection is gone.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("outbound channel closed")]
pub struct SendError;

// ============================================================================
// Line Parsing Errors
// ============================================================================

/// Raw line and slash command parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty line")]
    Empty,

    #[error("missing command in {0:?}")]
    MissingCommand(String),

    #[error("unknown command {0}")]
    UnknownCommand(String),
}
