//! Service registry: which capability is currently served by which instance.
//!
//! The registry never owns a service. It keeps a weak reference per
//! capability and broadcasts a [`RegistryEvent`] on every successful
//! registration or withdrawal.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, info};

use crate::error::{LocatorError, LocatorResult};
use crate::key::{key_of, CapabilityId};

mod events;
mod instance;

pub use events::{RegistryEvent, RegistryObserver, SubscriptionId};
pub use instance::ServiceInstance;

use events::Subscribers;
use instance::{erase_weak, ErasedWeak};
pub(crate) use instance::address_of;

/// Session-scoped map from capability to a weakly held service.
///
/// `ServiceRegistry` is a cheap, clonable handle; clones share the same
/// entries and subscribers. Create one per session and pass it to every
/// provider and resolver that needs it.
///
/// # Examples
///
/// ```rust
/// use ferrous_locator::{LocatorError, ServiceRegistry};
/// use std::sync::Arc;
///
/// trait Audio: Send + Sync {
///     fn play(&self, cue: &str) -> String;
/// }
///
/// struct Mixer;
/// impl Audio for Mixer {
///     fn play(&self, cue: &str) -> String { format!("playing {}", cue) }
/// }
///
/// let registry = ServiceRegistry::new();
/// let mixer: Arc<dyn Audio> = Arc::new(Mixer);
///
/// registry.register_service::<dyn Audio>(&mixer).unwrap();
/// assert!(registry.is_service_registered::<dyn Audio>());
///
/// let audio = registry.get_service::<dyn Audio>().unwrap();
/// assert_eq!(audio.play("intro"), "playing intro");
///
/// // One service per capability
/// let second: Arc<dyn Audio> = Arc::new(Mixer);
/// assert!(matches!(
///     registry.register_service::<dyn Audio>(&second),
///     Err(LocatorError::AlreadyRegistered(_))
/// ));
///
/// registry.withdraw_service::<dyn Audio>(&mixer).unwrap();
/// assert!(registry.get_service::<dyn Audio>().is_none());
/// ```
#[derive(Clone, Default)]
pub struct ServiceRegistry {
    inner: Arc<RegistryInner>,
}

#[derive(Default)]
struct RegistryInner {
    services: Mutex<ServiceTable>,
    subscribers: Mutex<Subscribers>,
}

#[derive(Default)]
struct ServiceTable {
    entries: HashMap<CapabilityId, ServiceEntry>,
    next_seq: u64,
}

struct ServiceEntry {
    weak: Box<dyn ErasedWeak>,
    type_name: &'static str,
    // Registration order, for stable diagnostics
    seq: u64,
}

/// Point-in-time view of one registry entry.
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub capability: CapabilityId,
    /// Name of the type the service was registered as
    pub type_name: &'static str,
    /// Whether the service is still alive
    pub alive: bool,
}

impl ServiceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `instance` as the service for `capability`.
    ///
    /// Fails without touching the registry if the capability is already
    /// served. On success all subscribers are notified, in subscription order,
    /// before this call returns.
    pub fn register<T>(&self, capability: CapabilityId, instance: &Arc<T>) -> LocatorResult<()>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        {
            let mut table = self.inner.services.lock();
            if table.entries.contains_key(&capability) {
                drop(table);
                error!(
                    capability = capability.type_name(),
                    "register: service for capability is already registered"
                );
                return Err(LocatorError::AlreadyRegistered(capability));
            }
            table.next_seq += 1;
            let entry = ServiceEntry {
                weak: erase_weak(instance),
                type_name: std::any::type_name::<T>(),
                seq: table.next_seq,
            };
            table.entries.insert(capability, entry);
        }

        let instance = ServiceInstance::new(Arc::clone(instance));
        info!(
            capability = capability.type_name(),
            instance = instance.type_name(),
            "service registered"
        );
        self.broadcast(RegistryEvent::Registered { capability, instance });
        Ok(())
    }

    /// Withdraws the service serving `capability`.
    ///
    /// Fails if nothing is registered for the capability. The entry is
    /// removed regardless of which instance currently serves it; `instance`
    /// is reported to subscribers as the withdrawn service.
    pub fn withdraw<T>(&self, capability: CapabilityId, instance: &Arc<T>) -> LocatorResult<()>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let removed = self.inner.services.lock().entries.remove(&capability);
        if removed.is_none() {
            error!(
                capability = capability.type_name(),
                "withdraw: no service is registered for capability"
            );
            return Err(LocatorError::NotRegistered(capability));
        }

        let instance = ServiceInstance::new(Arc::clone(instance));
        info!(
            capability = capability.type_name(),
            instance = instance.type_name(),
            "service withdrawn"
        );
        self.broadcast(RegistryEvent::Withdrawn { capability, instance });
        Ok(())
    }

    /// True if an entry exists for `capability`, even if its service has
    /// since been dropped.
    pub fn is_registered(&self, capability: CapabilityId) -> bool {
        self.inner.services.lock().entries.contains_key(&capability)
    }

    /// The live service for `capability`.
    ///
    /// Returns `None` both for capabilities that were never registered and
    /// for entries whose service has been dropped.
    pub fn get(&self, capability: CapabilityId) -> Option<ServiceInstance> {
        self.inner
            .services
            .lock()
            .entries
            .get(&capability)
            .and_then(|entry| entry.weak.upgrade())
    }

    /// Registers `instance` under the capability `key_of::<T>()`.
    pub fn register_service<T>(&self, instance: &Arc<T>) -> LocatorResult<()>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.register(key_of::<T>(), instance)
    }

    /// Withdraws the service registered under `key_of::<T>()`.
    pub fn withdraw_service<T>(&self, instance: &Arc<T>) -> LocatorResult<()>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.withdraw(key_of::<T>(), instance)
    }

    pub fn is_service_registered<T: ?Sized + 'static>(&self) -> bool {
        self.is_registered(key_of::<T>())
    }

    /// The live service registered under `key_of::<T>()`, as `Arc<T>`.
    ///
    /// Also `None` if the service was registered as a different type than
    /// `T` through the untyped [`register`](Self::register).
    pub fn get_service<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.get(key_of::<T>())?.downcast::<T>()
    }

    /// Subscribes an observer, held weakly.
    pub fn subscribe<O>(&self, observer: &Arc<O>) -> SubscriptionId
    where
        O: RegistryObserver + 'static,
    {
        let observer: Arc<dyn RegistryObserver> = observer.clone();
        self.inner.subscribers.lock().add_observer(Arc::downgrade(&observer))
    }

    /// Subscribes a callback, held until [`unsubscribe`](Self::unsubscribe).
    pub fn subscribe_fn<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&RegistryEvent) + Send + Sync + 'static,
    {
        self.inner.subscribers.lock().add_callback(Arc::new(callback))
    }

    /// Removes a subscription. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.inner.subscribers.lock().remove(id);
        removed.is_some()
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().len()
    }

    /// Drops every entry without notifying subscribers. Used at session end.
    pub fn clear(&self) {
        let mut table = self.inner.services.lock();
        let count = table.entries.len();
        table.entries.clear();
        drop(table);
        debug!(count, "service registry cleared");
    }

    /// Number of entries, including ones whose service has been dropped.
    pub fn len(&self) -> usize {
        self.inner.services.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered capabilities in registration order.
    pub fn capabilities(&self) -> Vec<CapabilityId> {
        self.entries().into_iter().map(|entry| entry.capability).collect()
    }

    /// Snapshot of every entry in registration order.
    pub fn entries(&self) -> Vec<RegistryEntry> {
        let table = self.inner.services.lock();
        let mut entries: Vec<(u64, RegistryEntry)> = table
            .entries
            .iter()
            .map(|(capability, entry)| {
                (
                    entry.seq,
                    RegistryEntry {
                        capability: *capability,
                        type_name: entry.type_name,
                        alive: entry.weak.is_alive(),
                    },
                )
            })
            .collect();
        drop(table);
        entries.sort_by_key(|(seq, _)| *seq);
        entries.into_iter().map(|(_, entry)| entry).collect()
    }

    /// True if both handles share the same registry.
    pub fn ptr_eq(&self, other: &ServiceRegistry) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn broadcast(&self, event: RegistryEvent) {
        // Listeners may re-enter the registry, so no lock is held while they run.
        let listeners = self.inner.subscribers.lock().snapshot();
        for listener in &listeners {
            listener.notify(&event);
        }
    }
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("services", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    trait Audio: Send + Sync {}
    trait Saves: Send + Sync {}
    struct Mixer;
    impl Audio for Mixer {}
    struct SaveSlots;
    impl Saves for SaveSlots {}

    #[test]
    fn test_register_and_get() {
        let registry = ServiceRegistry::new();
        let mixer: Arc<dyn Audio> = Arc::new(Mixer);

        assert!(!registry.is_service_registered::<dyn Audio>());
        registry.register_service::<dyn Audio>(&mixer).unwrap();

        assert!(registry.is_service_registered::<dyn Audio>());
        let got = registry.get(key_of::<dyn Audio>()).unwrap();
        assert!(got.is_same(&mixer));
    }

    #[test]
    fn test_duplicate_register_keeps_first() {
        let registry = ServiceRegistry::new();
        let first: Arc<dyn Audio> = Arc::new(Mixer);
        let second: Arc<dyn Audio> = Arc::new(Mixer);

        registry.register_service::<dyn Audio>(&first).unwrap();
        let err = registry.register_service::<dyn Audio>(&second).unwrap_err();

        assert_eq!(err, LocatorError::AlreadyRegistered(key_of::<dyn Audio>()));
        assert!(registry.get(key_of::<dyn Audio>()).unwrap().is_same(&first));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_expired_service_reads_as_absent() {
        let registry = ServiceRegistry::new();
        let mixer: Arc<dyn Audio> = Arc::new(Mixer);
        registry.register_service::<dyn Audio>(&mixer).unwrap();

        drop(mixer);
        assert!(registry.get(key_of::<dyn Audio>()).is_none());
        assert!(registry.is_service_registered::<dyn Audio>());
        assert!(!registry.entries()[0].alive);
    }

    #[test]
    fn test_entries_in_registration_order() {
        let registry = ServiceRegistry::new();
        let saves: Arc<dyn Saves> = Arc::new(SaveSlots);
        let mixer: Arc<dyn Audio> = Arc::new(Mixer);
        registry.register_service::<dyn Saves>(&saves).unwrap();
        registry.register_service::<dyn Audio>(&mixer).unwrap();

        assert_eq!(
            registry.capabilities(),
            vec![key_of::<dyn Saves>(), key_of::<dyn Audio>()]
        );
    }

    #[test]
    fn test_events_not_sent_for_rejected_calls() {
        let registry = ServiceRegistry::new();
        let events = Arc::new(AtomicUsize::new(0));
        let counter = events.clone();
        registry.subscribe_fn(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let mixer: Arc<dyn Audio> = Arc::new(Mixer);
        assert!(registry.withdraw_service::<dyn Audio>(&mixer).is_err());
        registry.register_service::<dyn Audio>(&mixer).unwrap();
        assert!(registry.register_service::<dyn Audio>(&mixer).is_err());

        assert_eq!(events.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clear_is_silent() {
        let registry = ServiceRegistry::new();
        let events = Arc::new(AtomicUsize::new(0));
        let counter = events.clone();
        registry.subscribe_fn(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let mixer: Arc<dyn Audio> = Arc::new(Mixer);
        registry.register_service::<dyn Audio>(&mixer).unwrap();
        registry.clear();

        assert!(registry.is_empty());
        assert_eq!(events.load(Ordering::SeqCst), 1);
    }
}
