//! Deferred dependency injection driven by registry changes.
//!
//! A [`DependencyResolver`] keeps a queue of consumers whose required
//! capabilities are not all registered yet. Every consumer (de)registration
//! and every registry event triggers a sweep over the queue; a consumer whose
//! full requirement set is available receives a [`DependencyContainer`] once
//! and leaves the queue for good.
//!
//! Consumer states:
//!
//! - **Pending**: registered, requirements not all met.
//! - **Resolved**: injected and removed. Never re-evaluated, even if a
//!   dependency is withdrawn later.
//! - **Abandoned**: removed without injection because the consumer was
//!   dropped, unregistered, or has no config entry.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, error, trace};

use crate::config::{ConsumerIdentity, DependencyConfig};
use crate::container::DependencyContainer;
use crate::error::LocatorError;
use crate::key::{key_of, CapabilityId};
use crate::observer::{AbandonReason, Observers, ResolverObserver};
use crate::registry::{address_of, RegistryEvent, RegistryObserver, ServiceRegistry, SubscriptionId};

mod consumer;
mod pending;

pub use consumer::DependencyConsumer;

use pending::{PendingConsumer, PendingQueue};

/// Drives pending consumers to full dependency satisfaction.
///
/// `DependencyResolver` is a clonable handle. It subscribes to its registry
/// on creation and stays subscribed until [`detach`](Self::detach) is called
/// or the last handle is dropped.
///
/// # Examples
///
/// ```rust
/// use ferrous_locator::{
///     DependencyConfig, DependencyConsumer, DependencyContainer, DependencyList,
///     DependencyResolver, ServiceRegistry,
/// };
/// use std::sync::{Arc, OnceLock};
///
/// trait Audio: Send + Sync {}
/// trait Saves: Send + Sync {}
/// struct Mixer;
/// impl Audio for Mixer {}
/// struct SaveSlots;
/// impl Saves for SaveSlots {}
///
/// #[derive(Default)]
/// struct Hud {
///     deps: OnceLock<DependencyContainer>,
/// }
/// impl DependencyConsumer for Hud {
///     fn inject_dependencies(&self, dependencies: DependencyContainer) {
///         let _ = self.deps.set(dependencies);
///     }
/// }
///
/// let config = DependencyConfig::builder()
///     .add::<Hud>(DependencyList::new().depends_on::<dyn Audio>().depends_on::<dyn Saves>())
///     .build()
///     .unwrap();
/// let registry = ServiceRegistry::new();
/// let resolver = DependencyResolver::new(registry.clone(), config);
///
/// let hud = Arc::new(Hud::default());
/// resolver.register_for_dependencies(&hud);
///
/// let mixer: Arc<dyn Audio> = Arc::new(Mixer);
/// registry.register_service::<dyn Audio>(&mixer).unwrap();
/// assert!(hud.deps.get().is_none());
///
/// let saves: Arc<dyn Saves> = Arc::new(SaveSlots);
/// registry.register_service::<dyn Saves>(&saves).unwrap();
/// assert_eq!(hud.deps.get().unwrap().len(), 2);
/// assert_eq!(resolver.pending_count(), 0);
/// ```
#[derive(Clone)]
pub struct DependencyResolver {
    inner: Arc<ResolverInner>,
}

pub(crate) struct ResolverInner {
    registry: ServiceRegistry,
    config: Arc<DependencyConfig>,
    pending: Mutex<PendingQueue>,
    observers: Mutex<Observers>,
    subscription: Mutex<Option<SubscriptionId>>,
}

/// Point-in-time view of one pending consumer.
#[derive(Debug, Clone)]
pub struct PendingEntry {
    pub consumer: ConsumerIdentity,
    /// False if the consumer was dropped and awaits cleanup by the next sweep
    pub alive: bool,
    /// Requirements not currently available; `None` if no config entry matches
    pub missing: Option<Vec<CapabilityId>>,
}

impl DependencyResolver {
    /// Creates a resolver bound to `registry` and subscribes to its events.
    pub fn new(registry: ServiceRegistry, config: impl Into<Arc<DependencyConfig>>) -> Self {
        let inner = Arc::new(ResolverInner {
            registry,
            config: config.into(),
            pending: Mutex::new(PendingQueue::default()),
            observers: Mutex::new(Observers::default()),
            subscription: Mutex::new(None),
        });
        let id = inner.registry.subscribe(&inner);
        *inner.subscription.lock() = Some(id);
        debug!(config = inner.config.name(), "dependency resolver attached to registry");
        Self { inner }
    }

    /// Queues `consumer` and sweeps the pending set.
    ///
    /// Registering a consumer that is already pending only sweeps again.
    pub fn register_for_dependencies<C: DependencyConsumer>(&self, consumer: &Arc<C>) {
        let identity = ConsumerIdentity::new(key_of::<C>(), consumer.type_tags());
        let weak: Weak<dyn DependencyConsumer> = Arc::downgrade(consumer) as Weak<dyn DependencyConsumer>;
        let entry = PendingConsumer {
            identity,
            consumer: weak,
            addr: address_of(consumer),
        };
        if self.inner.pending.lock().insert(entry) {
            trace!(consumer = std::any::type_name::<C>(), "registered for dependencies");
        }
        self.inner.process_pending();
    }

    /// Removes `consumer` from the pending set and sweeps the rest.
    ///
    /// Returns false, without sweeping, if the consumer was not pending.
    pub fn unregister_for_dependencies<C>(&self, consumer: &Arc<C>) -> bool
    where
        C: ?Sized + DependencyConsumer,
    {
        let removed = self.inner.pending.lock().remove(address_of(consumer));
        let Some(entry) = removed else {
            return false;
        };
        trace!(consumer = %entry.identity, "unregistered for dependencies");
        self.inner.notify_abandoned(&entry, AbandonReason::Unregistered);
        self.inner.process_pending();
        true
    }

    /// Sweeps the pending set now.
    pub fn process_pending(&self) {
        self.inner.process_pending();
    }

    /// True if `consumer` is waiting for dependencies.
    pub fn is_pending<C: ?Sized>(&self, consumer: &Arc<C>) -> bool {
        self.inner.pending.lock().contains(address_of(consumer))
    }

    /// Number of queued consumers, including dropped ones not yet swept.
    pub fn pending_count(&self) -> usize {
        self.inner.pending.lock().len()
    }

    /// Snapshot of the pending set with what each consumer still lacks.
    pub fn pending_entries(&self) -> Vec<PendingEntry> {
        let snapshot = self.inner.pending.lock().snapshot();
        snapshot
            .into_iter()
            .map(|entry| {
                let missing = self.inner.config.requirements_for(&entry.identity).map(|deps| {
                    deps.iter()
                        .filter(|capability| self.inner.registry.get(**capability).is_none())
                        .copied()
                        .collect()
                });
                PendingEntry {
                    alive: entry.consumer.strong_count() > 0,
                    consumer: entry.identity,
                    missing,
                }
            })
            .collect()
    }

    /// Adds an observer notified of resolution outcomes.
    pub fn add_observer(&self, observer: Arc<dyn ResolverObserver>) {
        self.inner.observers.lock().add(observer);
    }

    /// Stops reacting to registry events. Consumer (de)registration still sweeps.
    ///
    /// Returns false if already detached.
    pub fn detach(&self) -> bool {
        self.inner.detach()
    }

    pub fn is_attached(&self) -> bool {
        self.inner.subscription.lock().is_some()
    }

    /// Drops every pending consumer without injecting it.
    pub fn clear_pending(&self) {
        self.inner.pending.lock().clear();
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.inner.registry
    }

    pub fn config(&self) -> &Arc<DependencyConfig> {
        &self.inner.config
    }
}

impl std::fmt::Debug for DependencyResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyResolver")
            .field("config", &self.inner.config.name())
            .field("pending", &self.pending_count())
            .field("attached", &self.is_attached())
            .finish()
    }
}

impl ResolverInner {
    fn process_pending(&self) {
        // Injection may add or remove consumers, so sweep over a copy.
        let snapshot = self.pending.lock().snapshot();
        for entry in &snapshot {
            self.process_consumer(entry);
        }
    }

    fn process_consumer(&self, entry: &PendingConsumer) {
        // Removed by an earlier injection of this sweep, or by a nested sweep
        if !self.pending.lock().contains(entry.addr) {
            return;
        }

        let Some(consumer) = entry.consumer.upgrade() else {
            if self.pending.lock().remove(entry.addr).is_some() {
                trace!(consumer = %entry.identity, "dropping expired consumer");
                self.notify_abandoned(entry, AbandonReason::Expired);
            }
            return;
        };

        debug!(consumer = %entry.identity, "checking pending dependencies");
        let Some(requirements) = self.config.requirements_for(&entry.identity) else {
            if self.pending.lock().remove(entry.addr).is_some() {
                let err = LocatorError::MissingConfig(entry.identity.concrete());
                error!(
                    config = self.config.name(),
                    "{}; consumer will never be injected",
                    err
                );
                self.notify_abandoned(entry, AbandonReason::MissingConfig);
            }
            return;
        };

        let mut container = DependencyContainer::with_capacity(requirements.len());
        let mut missing = Vec::new();
        for capability in requirements {
            match self.registry.get(*capability) {
                Some(instance) => {
                    debug!(capability = capability.type_name(), "  <+> available");
                    container.insert(*capability, instance);
                }
                None => {
                    debug!(capability = capability.type_name(), "  <-> unavailable");
                    missing.push(*capability);
                }
            }
        }

        if !missing.is_empty() {
            debug!(consumer = %entry.identity, missing = missing.len(), "not all dependencies available yet");
            let observers = self.observers.lock().clone();
            observers.still_pending(&entry.identity.concrete(), &missing);
            return;
        }

        // Claim before injecting so no other sweep can deliver twice.
        if self.pending.lock().remove(entry.addr).is_none() {
            return;
        }
        debug!(consumer = %entry.identity, "all dependencies available, injecting");
        consumer.inject_dependencies(container);

        let observers = self.observers.lock().clone();
        if observers.has_observers() {
            observers.resolved(&entry.identity.concrete(), requirements.as_slice());
        }
    }

    fn notify_abandoned(&self, entry: &PendingConsumer, reason: AbandonReason) {
        let observers = self.observers.lock().clone();
        observers.abandoned(&entry.identity.concrete(), reason);
    }

    fn detach(&self) -> bool {
        let Some(id) = self.subscription.lock().take() else {
            return false;
        };
        self.registry.unsubscribe(id);
        debug!(config = self.config.name(), "dependency resolver detached from registry");
        true
    }
}

impl RegistryObserver for ResolverInner {
    fn on_registry_event(&self, event: &RegistryEvent) {
        trace!(
            capability = event.capability().type_name(),
            registered = event.is_registered(),
            "registry changed, sweeping pending consumers"
        );
        self.process_pending();
    }
}

impl Drop for ResolverInner {
    fn drop(&mut self) {
        if let Some(id) = self.subscription.get_mut().take() {
            self.registry.unsubscribe(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DependencyList;
    use std::sync::atomic::{AtomicUsize, Ordering};

    trait Audio: Send + Sync {}
    struct Mixer;
    impl Audio for Mixer {}

    #[derive(Default)]
    struct Hud {
        injections: AtomicUsize,
    }
    impl DependencyConsumer for Hud {
        fn inject_dependencies(&self, _dependencies: DependencyContainer) {
            self.injections.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn resolver() -> (ServiceRegistry, DependencyResolver) {
        let config = DependencyConfig::builder()
            .add::<Hud>(DependencyList::new().depends_on::<dyn Audio>())
            .build()
            .unwrap();
        let registry = ServiceRegistry::new();
        let resolver = DependencyResolver::new(registry.clone(), config);
        (registry, resolver)
    }

    #[test]
    fn test_subscribes_on_creation_and_detaches() {
        let (registry, resolver) = resolver();
        assert_eq!(registry.subscriber_count(), 1);
        assert!(resolver.is_attached());

        assert!(resolver.detach());
        assert!(!resolver.detach());
        assert_eq!(registry.subscriber_count(), 0);
    }

    #[test]
    fn test_dropping_last_handle_unsubscribes() {
        let (registry, resolver) = resolver();
        let clone = resolver.clone();
        drop(resolver);
        assert_eq!(registry.subscriber_count(), 1);
        drop(clone);
        assert_eq!(registry.subscriber_count(), 0);
    }

    #[test]
    fn test_expired_consumer_is_dropped_on_sweep() {
        let (_registry, resolver) = resolver();
        let hud = Arc::new(Hud::default());
        resolver.register_for_dependencies(&hud);
        assert_eq!(resolver.pending_count(), 1);

        drop(hud);
        assert_eq!(resolver.pending_count(), 1);
        resolver.process_pending();
        assert_eq!(resolver.pending_count(), 0);
    }

    #[test]
    fn test_pending_entries_report_missing() {
        let (_registry, resolver) = resolver();
        let hud = Arc::new(Hud::default());
        resolver.register_for_dependencies(&hud);

        let entries = resolver.pending_entries();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].alive);
        assert_eq!(entries[0].missing.as_deref(), Some(&[key_of::<dyn Audio>()][..]));
    }

    #[test]
    fn test_detached_resolver_ignores_registry() {
        let (registry, resolver) = resolver();
        let hud = Arc::new(Hud::default());
        resolver.register_for_dependencies(&hud);
        resolver.detach();

        let mixer: Arc<dyn Audio> = Arc::new(Mixer);
        registry.register_service::<dyn Audio>(&mixer).unwrap();
        assert_eq!(hud.injections.load(Ordering::SeqCst), 0);

        // A manual sweep still resolves
        resolver.process_pending();
        assert_eq!(hud.injections.load(Ordering::SeqCst), 1);
    }
}
