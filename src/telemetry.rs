//! Telemetry utilities: standardized spans for connection-level work.

/// Standardized span constructors for IRC observability.
pub mod spans {
    use tracing::{Span, debug_span, info_span};

    /// Create a span for a client connection.
    pub fn connection(account: &str) -> Span {
        info_span!("connection", account = %account)
    }

    /// Create a span for dispatching one inbound message.
    pub fn dispatch(account: &str, command: &str, origin: &str) -> Span {
        debug_span!("irc.dispatch", account = %account, command = %command, origin = %origin)
    }

    /// Create a span for handling a probe timer expiration.
    pub fn probe_timer(account: &str, token: &crate::timer::TimerToken) -> Span {
        debug_span!("irc.probe_timer", account = %account, token = %token)
    }
}
