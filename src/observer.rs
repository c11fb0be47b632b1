//! Observers for dependency resolution outcomes.
//!
//! The resolver logs through `tracing` on its own. Observers are for callers
//! that want to react to outcomes programmatically: counting resolutions in
//! tests, surfacing abandoned consumers in a debug overlay, and so on.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{error, info};

use crate::key::{CapabilityId, TypeKey};

/// Why a consumer left the pending set without being injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbandonReason {
    /// The consumer was dropped while pending
    Expired,
    /// The consumer unregistered itself (or was unregistered)
    Unregistered,
    /// No config entry matches the consumer's type
    MissingConfig,
}

impl fmt::Display for AbandonReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            AbandonReason::Expired => "expired",
            AbandonReason::Unregistered => "unregistered",
            AbandonReason::MissingConfig => "missing config",
        };
        f.write_str(reason)
    }
}

/// Observer trait for resolver outcomes.
///
/// Calls are made synchronously during a sweep with no resolver lock held.
/// Keep implementations lightweight.
///
/// # Examples
///
/// ```
/// use ferrous_locator::{AbandonReason, CapabilityId, ResolverObserver, TypeKey};
/// use std::sync::Mutex;
///
/// #[derive(Default)]
/// struct Journal {
///     lines: Mutex<Vec<String>>,
/// }
///
/// impl ResolverObserver for Journal {
///     fn resolved(&self, consumer: &TypeKey, dependencies: &[CapabilityId]) {
///         self.lines.lock().unwrap().push(format!(
///             "{} <- {} deps", consumer.short_name(), dependencies.len()
///         ));
///     }
///
///     fn abandoned(&self, consumer: &TypeKey, reason: AbandonReason) {
///         self.lines.lock().unwrap().push(format!("{} abandoned: {}", consumer.short_name(), reason));
///     }
/// }
/// ```
pub trait ResolverObserver: Send + Sync {
    /// A consumer received its dependencies.
    fn resolved(&self, consumer: &TypeKey, dependencies: &[CapabilityId]);

    /// A consumer was removed from the pending set without injection.
    fn abandoned(&self, consumer: &TypeKey, reason: AbandonReason);

    /// A consumer was checked and is still missing `missing`.
    fn still_pending(&self, consumer: &TypeKey, missing: &[CapabilityId]) {
        let _ = (consumer, missing);
    }
}

/// Container for registered observers.
#[derive(Default, Clone)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn ResolverObserver>>,
}

impl Observers {
    pub(crate) fn add(&mut self, observer: Arc<dyn ResolverObserver>) {
        self.observers.push(observer);
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    pub(crate) fn resolved(&self, consumer: &TypeKey, dependencies: &[CapabilityId]) {
        for observer in &self.observers {
            observer.resolved(consumer, dependencies);
        }
    }

    pub(crate) fn abandoned(&self, consumer: &TypeKey, reason: AbandonReason) {
        for observer in &self.observers {
            observer.abandoned(consumer, reason);
        }
    }

    pub(crate) fn still_pending(&self, consumer: &TypeKey, missing: &[CapabilityId]) {
        for observer in &self.observers {
            observer.still_pending(consumer, missing);
        }
    }
}

/// Built-in observer that reports outcomes through `tracing` at info level,
/// and abandonment for a missing config at error level.
///
/// ```
/// use ferrous_locator::{DependencyConfig, DependencyResolver, LoggingObserver, ServiceRegistry};
/// use std::sync::Arc;
///
/// let resolver = DependencyResolver::new(ServiceRegistry::new(), DependencyConfig::default());
/// resolver.add_observer(Arc::new(LoggingObserver::with_prefix("[menus]")));
/// ```
pub struct LoggingObserver {
    prefix: String,
}

impl LoggingObserver {
    pub fn new() -> Self {
        Self {
            prefix: "[ferrous-locator]".to_string(),
        }
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for LoggingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolverObserver for LoggingObserver {
    fn resolved(&self, consumer: &TypeKey, dependencies: &[CapabilityId]) {
        info!(
            "{} Injected {} with {} dependencies",
            self.prefix,
            consumer,
            dependencies.len()
        );
    }

    fn abandoned(&self, consumer: &TypeKey, reason: AbandonReason) {
        match reason {
            AbandonReason::MissingConfig => {
                error!("{} Abandoned {}: {}", self.prefix, consumer, reason)
            }
            _ => info!("{} Abandoned {}: {}", self.prefix, consumer, reason),
        }
    }
}

/// Observer that counts outcomes.
///
/// ```
/// use ferrous_locator::{AbandonReason, MetricsObserver, ResolverObserver, key_of};
///
/// struct Hud;
/// let metrics = MetricsObserver::new();
/// metrics.resolved(&key_of::<Hud>(), &[]);
/// metrics.abandoned(&key_of::<Hud>(), AbandonReason::MissingConfig);
///
/// assert_eq!(metrics.resolved_count(), 1);
/// assert_eq!(metrics.missing_config_count(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MetricsObserver {
    resolved: AtomicU64,
    abandoned: AtomicU64,
    missing_config: AtomicU64,
    pending_checks: AtomicU64,
}

impl MetricsObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of injections observed.
    pub fn resolved_count(&self) -> u64 {
        self.resolved.load(Ordering::Relaxed)
    }

    /// Number of consumers abandoned for any reason.
    pub fn abandoned_count(&self) -> u64 {
        self.abandoned.load(Ordering::Relaxed)
    }

    /// Number of consumers abandoned because no config entry matched.
    pub fn missing_config_count(&self) -> u64 {
        self.missing_config.load(Ordering::Relaxed)
    }

    /// Number of checks that left a consumer pending.
    pub fn pending_check_count(&self) -> u64 {
        self.pending_checks.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.resolved.store(0, Ordering::Relaxed);
        self.abandoned.store(0, Ordering::Relaxed);
        self.missing_config.store(0, Ordering::Relaxed);
        self.pending_checks.store(0, Ordering::Relaxed);
    }
}

impl ResolverObserver for MetricsObserver {
    fn resolved(&self, _consumer: &TypeKey, _dependencies: &[CapabilityId]) {
        self.resolved.fetch_add(1, Ordering::Relaxed);
    }

    fn abandoned(&self, _consumer: &TypeKey, reason: AbandonReason) {
        self.abandoned.fetch_add(1, Ordering::Relaxed);
        if reason == AbandonReason::MissingConfig {
            self.missing_config.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn still_pending(&self, _consumer: &TypeKey, _missing: &[CapabilityId]) {
        self.pending_checks.fetch_add(1, Ordering::Relaxed);
    }
}
