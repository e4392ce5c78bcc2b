//! slirc-stats - Straylight IRC client extensions.
//!
//! An extension layer that sits between a chat client's protocol parser and
//! its built-in command processing:
//!
//! - [`handlers`]: priority-ordered handler chains with fallthrough/stop
//!   semantics and per-handler fault isolation.
//! - [`stats`]: the CTCP VERSION polling engine (single-flight probe queue,
//!   response correlation, aggregate snapshots).
//! - [`session`]: per-connection glue that owns the stats context and feeds
//!   timer expirations back into the connection's event loop.

pub mod casemap;
pub mod commands;
pub mod config;
pub mod ctcp;
pub mod error;
pub mod handlers;
pub mod message;
pub mod metrics;
pub mod outbound;
pub mod session;
pub mod stats;
pub mod telemetry;
pub mod timer;

pub use casemap::Casemapping;
pub use config::Config;
pub use error::{HandlerError, HandlerFault, RegistryError};
pub use handlers::{Dispatcher, HandlerDescriptor, HandlerRegistry, Outcome, Priority};
pub use message::InboundMessage;
pub use session::Session;
pub use stats::{ConnectionContext, StatsSnapshot};
