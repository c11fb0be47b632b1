//! Registry change notifications.

use std::fmt;
use std::sync::{Arc, Weak};

use crate::key::CapabilityId;
use super::ServiceInstance;

/// A change of the registry's served capabilities.
#[derive(Debug, Clone)]
pub enum RegistryEvent {
    /// A service started serving `capability`
    Registered {
        capability: CapabilityId,
        instance: ServiceInstance,
    },
    /// A service stopped serving `capability`
    Withdrawn {
        capability: CapabilityId,
        instance: ServiceInstance,
    },
}

impl RegistryEvent {
    /// The capability that changed.
    pub fn capability(&self) -> CapabilityId {
        match self {
            RegistryEvent::Registered { capability, .. } => *capability,
            RegistryEvent::Withdrawn { capability, .. } => *capability,
        }
    }

    /// The service the event is about.
    pub fn instance(&self) -> &ServiceInstance {
        match self {
            RegistryEvent::Registered { instance, .. } => instance,
            RegistryEvent::Withdrawn { instance, .. } => instance,
        }
    }

    pub fn is_registered(&self) -> bool {
        matches!(self, RegistryEvent::Registered { .. })
    }
}

/// Receives [`RegistryEvent`]s from a [`ServiceRegistry`].
///
/// Observers are held weakly: once the last `Arc` to an observer is dropped
/// its subscription disappears on the next broadcast.
///
/// Callbacks run synchronously on the thread that changed the registry and
/// no registry lock is held while they run, so an observer may register or
/// withdraw services itself.
///
/// [`ServiceRegistry`]: super::ServiceRegistry
pub trait RegistryObserver: Send + Sync {
    fn on_registry_event(&self, event: &RegistryEvent);
}

/// Handle returned by the subscribe methods, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub(crate) u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subscription#{}", self.0)
    }
}

type EventCallback = Arc<dyn Fn(&RegistryEvent) + Send + Sync>;

pub(crate) enum Listener {
    Observer(Weak<dyn RegistryObserver>),
    Callback(EventCallback),
}

/// Listener resolved to a strong reference for the duration of a broadcast.
pub(crate) enum ActiveListener {
    Observer(Arc<dyn RegistryObserver>),
    Callback(EventCallback),
}

impl ActiveListener {
    pub(crate) fn notify(&self, event: &RegistryEvent) {
        match self {
            ActiveListener::Observer(observer) => observer.on_registry_event(event),
            ActiveListener::Callback(callback) => callback(event),
        }
    }
}

/// Subscribers in subscription order.
#[derive(Default)]
pub(crate) struct Subscribers {
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
}

impl Subscribers {
    pub(crate) fn add_observer(&mut self, observer: Weak<dyn RegistryObserver>) -> SubscriptionId {
        self.push(Listener::Observer(observer))
    }

    pub(crate) fn add_callback(&mut self, callback: EventCallback) -> SubscriptionId {
        self.push(Listener::Callback(callback))
    }

    fn push(&mut self, listener: Listener) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.listeners.push((id, listener));
        id
    }

    /// Takes the listener out so the caller can drop it after unlocking.
    pub(crate) fn remove(&mut self, id: SubscriptionId) -> Option<Listener> {
        let pos = self.listeners.iter().position(|(existing, _)| *existing == id)?;
        Some(self.listeners.remove(pos).1)
    }

    /// Drops expired observers and returns strong references to the rest.
    pub(crate) fn snapshot(&mut self) -> Vec<ActiveListener> {
        let mut active = Vec::with_capacity(self.listeners.len());
        self.listeners.retain(|(_, listener)| match listener {
            Listener::Observer(weak) => match weak.upgrade() {
                Some(observer) => {
                    active.push(ActiveListener::Observer(observer));
                    true
                }
                None => false,
            },
            Listener::Callback(callback) => {
                active.push(ActiveListener::Callback(callback.clone()));
                true
            }
        });
        active
    }

    pub(crate) fn len(&mut self) -> usize {
        self.listeners.retain(|(_, listener)| match listener {
            Listener::Observer(weak) => weak.strong_count() > 0,
            Listener::Callback(_) => true,
        });
        self.listeners.len()
    }
}
