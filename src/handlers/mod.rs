//! Client-side message handlers.
//!
//! Handlers are grouped into named descriptors and registered into the IRC
//! or CTCP registry of a [`Dispatcher`]. Each inbound message walks the
//! matching chain in priority order until a handler reports it as fully
//! handled.

pub mod core;
pub mod extras;
pub mod identify;
pub mod stats;

pub use self::core::{
    ConnectionView, Context, DispatchOutcome, Dispatcher, Enabled, Handler, HandlerDescriptor,
    HandlerRegistry, Outcome, Priority, ResolvedHandler,
};

use crate::config::Config;
use crate::error::RegistryError;
use tracing::info;

/// Register the bundled descriptors.
///
/// On a name clash the descriptors registered so far are left in place;
/// [`unregister_defaults`] removes them.
pub fn register_defaults(dispatcher: &Dispatcher, config: &Config) -> Result<(), RegistryError> {
    let stats_priority = config.dispatch.stats_priority();

    dispatcher.irc().register(stats::triggers(stats_priority))?;
    dispatcher.ctcp().register(stats::replies(stats_priority))?;
    dispatcher
        .irc()
        .register(extras::descriptor(config.dispatch.extras_priority()))?;
    if let Some(identify) = identify::descriptor(&config.auto_identify) {
        dispatcher.irc().register(identify)?;
    }

    info!(
        irc = dispatcher.irc().len(),
        ctcp = dispatcher.ctcp().len(),
        "Registered default handlers"
    );
    Ok(())
}

/// Remove the bundled descriptors. Safe to call repeatedly.
pub fn unregister_defaults(dispatcher: &Dispatcher) {
    dispatcher.irc().unregister(stats::TRIGGERS);
    dispatcher.ctcp().unregister(stats::REPLIES);
    dispatcher.irc().unregister(extras::NAME);
    dispatcher.irc().unregister(identify::NAME);
}
