//! The consumer side of dependency injection.

use crate::container::DependencyContainer;
use crate::key::TypeKey;

/// An object that needs a set of capabilities before it can operate.
///
/// The set is not declared here but in the [`DependencyConfig`], keyed by
/// the consumer's concrete type or by one of its [`type_tags`]. Once every
/// required capability is registered, [`inject_dependencies`] is called
/// exactly once.
///
/// # Examples
///
/// ```rust
/// use ferrous_locator::{key_of, DependencyConsumer, DependencyContainer, TypeKey};
/// use std::sync::{Arc, OnceLock};
///
/// trait Audio: Send + Sync {}
/// trait Widget {}
///
/// #[derive(Default)]
/// struct Hud {
///     audio: OnceLock<Arc<dyn Audio>>,
/// }
///
/// impl DependencyConsumer for Hud {
///     fn inject_dependencies(&self, dependencies: DependencyContainer) {
///         let _ = self.audio.set(dependencies.get_required::<dyn Audio>());
///     }
///
///     fn type_tags(&self) -> Vec<TypeKey> {
///         vec![key_of::<dyn Widget>()]
///     }
/// }
/// ```
///
/// [`DependencyConfig`]: crate::DependencyConfig
/// [`type_tags`]: DependencyConsumer::type_tags
/// [`inject_dependencies`]: DependencyConsumer::inject_dependencies
pub trait DependencyConsumer: Send + Sync + 'static {
    /// Receives the resolved dependencies. Called at most once per registration.
    ///
    /// May register or unregister consumers (including itself) and may
    /// register or withdraw services.
    fn inject_dependencies(&self, dependencies: DependencyContainer);

    /// Additional type identities this consumer answers to in config lookup,
    /// such as a shared base kind or an interface it implements.
    ///
    /// Read once, when the consumer registers.
    fn type_tags(&self) -> Vec<TypeKey> {
        Vec::new()
    }
}
