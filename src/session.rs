//! Per-session ownership of the registry and resolver.

use std::sync::Arc;

use tracing::info;

use crate::config::DependencyConfig;
use crate::registry::ServiceRegistry;
use crate::resolver::DependencyResolver;

/// Owns the [`ServiceRegistry`] and [`DependencyResolver`] of one running
/// session (one game instance, one test world, ...).
///
/// Ending the session detaches the resolver, drops its pending consumers and
/// clears every registry entry. Dropping the session ends it.
///
/// # Examples
///
/// ```rust
/// use ferrous_locator::{DependencyConfig, Session};
/// use std::sync::Arc;
///
/// trait Audio: Send + Sync {}
/// struct Mixer;
/// impl Audio for Mixer {}
///
/// let mut session = Session::new(DependencyConfig::default());
/// let mixer: Arc<dyn Audio> = Arc::new(Mixer);
/// session.registry().register_service::<dyn Audio>(&mixer).unwrap();
/// assert_eq!(session.registry().len(), 1);
///
/// let registry = session.registry().clone();
/// session.end();
/// assert!(registry.is_empty());
/// ```
#[derive(Debug)]
pub struct Session {
    registry: ServiceRegistry,
    resolver: DependencyResolver,
    ended: bool,
}

impl Session {
    /// Starts a session with a fresh registry.
    pub fn new(config: impl Into<Arc<DependencyConfig>>) -> Self {
        Self::with_registry(ServiceRegistry::new(), config)
    }

    /// Starts a session around an existing registry.
    pub fn with_registry(registry: ServiceRegistry, config: impl Into<Arc<DependencyConfig>>) -> Self {
        let resolver = DependencyResolver::new(registry.clone(), config);
        info!(config = resolver.config().name(), "session started");
        Self {
            registry,
            resolver,
            ended: false,
        }
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    pub fn resolver(&self) -> &DependencyResolver {
        &self.resolver
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Tears the session down. Calling it again does nothing.
    pub fn end(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;
        self.resolver.detach();
        self.resolver.clear_pending();
        self.registry.clear();
        info!("session ended");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.end();
    }
}
