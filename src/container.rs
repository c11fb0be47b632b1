//! The value handed to a consumer when all of its dependencies are available.

use std::collections::HashMap;
use std::sync::Arc;

use crate::key::{key_of, CapabilityId};
use crate::registry::ServiceInstance;

/// Resolved dependencies of one consumer, keyed by capability.
///
/// Built by the resolver for a single injection and covering exactly the
/// consumer's configured requirements. The resolver keeps no copy.
///
/// # Examples
///
/// ```rust
/// use ferrous_locator::{DependencyContainer, ServiceInstance, key_of};
/// use std::sync::Arc;
///
/// trait Audio: Send + Sync {
///     fn volume(&self) -> u8;
/// }
/// struct Mixer;
/// impl Audio for Mixer {
///     fn volume(&self) -> u8 { 3 }
/// }
///
/// let mixer: Arc<dyn Audio> = Arc::new(Mixer);
/// let mut container = DependencyContainer::new();
/// container.insert(key_of::<dyn Audio>(), ServiceInstance::new(mixer));
///
/// assert_eq!(container.get::<dyn Audio>().unwrap().volume(), 3);
/// assert_eq!(container.get_required::<dyn Audio>().volume(), 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DependencyContainer {
    services: HashMap<CapabilityId, ServiceInstance>,
}

impl DependencyContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            services: HashMap::with_capacity(capacity),
        }
    }

    pub fn insert(&mut self, capability: CapabilityId, instance: ServiceInstance) {
        self.services.insert(capability, instance);
    }

    /// The dependency registered under `key_of::<T>()`, as `Arc<T>`.
    pub fn get<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.services.get(&key_of::<T>())?.downcast::<T>()
    }

    /// Like [`get`](Self::get), for dependencies the consumer's config lists.
    ///
    /// # Panics
    ///
    /// Panics if `T` is not in the container or was registered as another type.
    pub fn get_required<T>(&self) -> Arc<T>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        match self.get::<T>() {
            Some(service) => service,
            None => panic!(
                "dependency {} is not in the container",
                std::any::type_name::<T>()
            ),
        }
    }

    /// The untyped handle for `capability`.
    pub fn instance(&self, capability: &CapabilityId) -> Option<&ServiceInstance> {
        self.services.get(capability)
    }

    pub fn contains(&self, capability: &CapabilityId) -> bool {
        self.services.contains_key(capability)
    }

    pub fn capabilities(&self) -> impl Iterator<Item = &CapabilityId> {
        self.services.keys()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
