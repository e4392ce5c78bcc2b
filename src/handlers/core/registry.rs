//! Handler descriptors and the per-namespace registry.
//!
//! Several descriptors may claim the same command. Resolution is done fresh
//! on every call: a descriptor's enablement is re-evaluated against the
//! connection each time, so toggling a feature takes effect on the very next
//! message.

use super::context::{ConnectionView, Context};
use super::traits::{FnHandler, Handler};
use crate::error::{HandlerResult, RegistryError};
use crate::message::InboundMessage;
use parking_lot::RwLock;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::fmt;
use std::ops::Add;
use std::sync::Arc;
use tracing::{debug, info};

/// Handler priority. Higher runs first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(pub i32);

impl Priority {
    pub const LOW: Priority = Priority(-100);
    pub const DEFAULT: Priority = Priority(0);
    pub const HIGH: Priority = Priority(100);
}

impl Add<i32> for Priority {
    type Output = Priority;

    fn add(self, rhs: i32) -> Priority {
        Priority(self.0.saturating_add(rhs))
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// When a descriptor takes part in dispatch.
#[derive(Clone, Default)]
pub enum Enabled {
    #[default]
    Always,
    /// Only on the listed accounts (ASCII case-insensitive).
    Accounts(Vec<String>),
    /// Arbitrary predicate over the connection.
    When(Arc<dyn Fn(&ConnectionView<'_>) -> bool + Send + Sync>),
}

impl Enabled {
    pub fn evaluate(&self, view: &ConnectionView<'_>) -> bool {
        match self {
            Self::Always => true,
            Self::Accounts(accounts) => accounts
                .iter()
                .any(|a| a.eq_ignore_ascii_case(view.account)),
            Self::When(predicate) => predicate(view),
        }
    }
}

impl fmt::Debug for Enabled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => f.write_str("Always"),
            Self::Accounts(a) => f.debug_tuple("Accounts").field(a).finish(),
            Self::When(_) => f.write_str("When(..)"),
        }
    }
}

/// A named bundle of command handlers sharing one priority.
pub struct HandlerDescriptor {
    name: String,
    priority: Priority,
    enabled: Enabled,
    commands: HashMap<String, Arc<dyn Handler>>,
}

impl HandlerDescriptor {
    pub fn new(name: impl Into<String>, priority: Priority) -> Self {
        Self {
            name: name.into(),
            priority,
            enabled: Enabled::Always,
            commands: HashMap::new(),
        }
    }

    pub fn enabled(mut self, enabled: Enabled) -> Self {
        self.enabled = enabled;
        self
    }

    /// Route `command` to a handler object.
    pub fn on(mut self, command: &str, handler: impl Handler + 'static) -> Self {
        self.commands
            .insert(command.to_ascii_uppercase(), Arc::new(handler));
        self
    }

    /// Route `command` to a function or closure.
    pub fn on_fn<F>(self, command: &str, f: F) -> Self
    where
        F: Fn(&mut Context<'_>, &InboundMessage) -> HandlerResult + Send + Sync + 'static,
    {
        self.on(command, FnHandler(f))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn is_enabled(&self, view: &ConnectionView<'_>) -> bool {
        self.enabled.evaluate(view)
    }

    /// Commands this descriptor handles, uppercased.
    pub fn commands(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    fn handler(&self, command: &str) -> Option<&Arc<dyn Handler>> {
        self.commands.get(command)
    }
}

impl fmt::Debug for HandlerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerDescriptor")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("enabled", &self.enabled)
            .field("commands", &self.commands.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A handler picked for one dispatch, in invocation order.
#[derive(Clone)]
pub struct ResolvedHandler {
    descriptor: Arc<HandlerDescriptor>,
    handler: Arc<dyn Handler>,
}

impl ResolvedHandler {
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    pub fn priority(&self) -> Priority {
        self.descriptor.priority()
    }

    pub fn handler(&self) -> &dyn Handler {
        self.handler.as_ref()
    }
}

impl fmt::Debug for ResolvedHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedHandler")
            .field("name", &self.name())
            .field("priority", &self.priority())
            .finish()
    }
}

#[derive(Default)]
struct Inner {
    /// Kept in registration order; stable sorting preserves it on ties.
    descriptors: Vec<Arc<HandlerDescriptor>>,
}

/// Registry of handler descriptors for one command namespace.
///
/// Shared by all connections of a client; registration and resolution may
/// happen from different connection tasks.
pub struct HandlerRegistry {
    namespace: &'static str,
    inner: RwLock<Inner>,
}

impl HandlerRegistry {
    pub fn new(namespace: &'static str) -> Self {
        Self {
            namespace,
            inner: RwLock::new(Inner::default()),
        }
    }

    pub fn namespace(&self) -> &'static str {
        self.namespace
    }

    /// Register a descriptor. Names are unique within the registry.
    pub fn register(&self, descriptor: HandlerDescriptor) -> Result<(), RegistryError> {
        let mut inner = self.inner.write();
        if inner.descriptors.iter().any(|d| d.name == descriptor.name) {
            return Err(RegistryError::DuplicateHandler {
                name: descriptor.name,
            });
        }

        info!(
            namespace = self.namespace,
            handler = %descriptor.name,
            priority = %descriptor.priority,
            "Registered handler"
        );
        inner.descriptors.push(Arc::new(descriptor));
        Ok(())
    }

    /// Remove a descriptor and all its command entries.
    ///
    /// Unknown names are a no-op; returns whether anything was removed.
    pub fn unregister(&self, name: &str) -> bool {
        let mut inner = self.inner.write();
        let before = inner.descriptors.len();
        inner.descriptors.retain(|d| d.name != name);
        let removed = inner.descriptors.len() != before;
        if removed {
            info!(namespace = self.namespace, handler = %name, "Unregistered handler");
        } else {
            debug!(namespace = self.namespace, handler = %name, "Unregister of unknown handler ignored");
        }
        removed
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.inner.read().descriptors.iter().any(|d| d.name == name)
    }

    pub fn len(&self) -> usize {
        self.inner.read().descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Handlers for `command` whose descriptor is enabled for `view`,
    /// highest priority first, ties in registration order.
    pub fn resolve(&self, command: &str, view: &ConnectionView<'_>) -> Vec<ResolvedHandler> {
        let command = command.to_ascii_uppercase();
        let inner = self.inner.read();
        let mut resolved: Vec<ResolvedHandler> = inner
            .descriptors
            .iter()
            .filter_map(|d| {
                let handler = d.handler(&command)?;
                d.is_enabled(view).then(|| ResolvedHandler {
                    descriptor: Arc::clone(d),
                    handler: Arc::clone(handler),
                })
            })
            .collect();
        drop(inner);

        resolved.sort_by_key(|r| Reverse(r.priority()));
        resolved
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("namespace", &self.namespace)
            .field("descriptors", &self.len())
            .finish()
    }
}
