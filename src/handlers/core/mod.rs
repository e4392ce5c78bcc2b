//! Core handler infrastructure.
//!
//! - [`registry`]: handler descriptors and per-namespace registries
//! - [`dispatch`]: the IRC/CTCP chain runner with fault isolation
//! - [`context`]: the per-connection context handed to each handler
//! - [`traits`]: the `Handler` trait and chain `Outcome`

pub mod context;
pub mod dispatch;
pub mod registry;
pub mod traits;

pub use context::{ConnectionView, Context};
pub use dispatch::{DispatchOutcome, Dispatcher};
pub use registry::{Enabled, HandlerDescriptor, HandlerRegistry, Priority, ResolvedHandler};
pub use traits::{Handler, Outcome};
