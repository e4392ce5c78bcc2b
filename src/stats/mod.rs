//! CTCP VERSION polling.
//!
//! - [`probe`]: probe states keyed by folded nickname
//! - [`queue`]: single-flight queue with FIFO backlog and timeout backstop
//! - [`correlator`]: matching replies to outstanding probes
//! - [`snapshot`]: aggregate counts by version and family
//! - [`context`]: the per-connection owner of all of the above

pub mod context;
pub mod correlator;
pub mod probe;
pub mod queue;
pub mod report;
pub mod snapshot;

pub use context::ConnectionContext;
pub use correlator::Reply;
pub use probe::{ProbeEntry, ProbeState, ProbeStatus, ProbeTable, UnknownCause};
pub use queue::{Advanced, Enqueued, ProbeIo, ProbeQueue};
pub use snapshot::{StatsSnapshot, compute_snapshot, family};
