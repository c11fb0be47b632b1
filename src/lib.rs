//! # ferrous-locator
//!
//! Session-scoped service locator with deferred, all-or-nothing dependency injection.
//!
//! ## Features
//!
//! - **Capability keyed registry**: one weakly held service per capability (usually a `dyn Trait`)
//! - **Change notifications**: subscribers hear about every registration and withdrawal
//! - **Deferred injection**: consumers wait until every capability they need is registered
//! - **Exactly once**: a consumer receives its dependencies a single time, as one container
//! - **Re-entrancy safe**: injection may register, unregister, or withdraw anything
//! - **No ownership cycles**: neither the registry nor the resolver keeps anything alive
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_locator::{
//!     DependencyConfig, DependencyConsumer, DependencyContainer, DependencyList, Session,
//! };
//! use std::sync::{Arc, OnceLock};
//!
//! // Capabilities
//! trait Audio: Send + Sync {
//!     fn play(&self, cue: &str) -> String;
//! }
//! trait Saves: Send + Sync {
//!     fn slot_count(&self) -> usize;
//! }
//!
//! // Providers
//! struct Mixer;
//! impl Audio for Mixer {
//!     fn play(&self, cue: &str) -> String { format!("playing {}", cue) }
//! }
//! struct SaveSlots;
//! impl Saves for SaveSlots {
//!     fn slot_count(&self) -> usize { 3 }
//! }
//!
//! // A consumer
//! #[derive(Default)]
//! struct PauseMenu {
//!     audio: OnceLock<Arc<dyn Audio>>,
//!     saves: OnceLock<Arc<dyn Saves>>,
//! }
//!
//! impl DependencyConsumer for PauseMenu {
//!     fn inject_dependencies(&self, dependencies: DependencyContainer) {
//!         let _ = self.audio.set(dependencies.get_required::<dyn Audio>());
//!         let _ = self.saves.set(dependencies.get_required::<dyn Saves>());
//!     }
//! }
//!
//! let config = DependencyConfig::builder()
//!     .add::<PauseMenu>(
//!         DependencyList::new()
//!             .depends_on::<dyn Audio>()
//!             .depends_on::<dyn Saves>(),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let session = Session::new(config);
//!
//! // The consumer may register before its dependencies exist
//! let menu = Arc::new(PauseMenu::default());
//! session.resolver().register_for_dependencies(&menu);
//!
//! let mixer: Arc<dyn Audio> = Arc::new(Mixer);
//! session.registry().register_service::<dyn Audio>(&mixer).unwrap();
//! assert!(menu.audio.get().is_none()); // still waiting for Saves
//!
//! let saves: Arc<dyn Saves> = Arc::new(SaveSlots);
//! session.registry().register_service::<dyn Saves>(&saves).unwrap();
//!
//! assert_eq!(menu.audio.get().unwrap().play("open"), "playing open");
//! assert_eq!(menu.saves.get().unwrap().slot_count(), 3);
//! ```
//!
//! ## Threading
//!
//! Everything is `Send + Sync` and guarded by short-lived locks, but the
//! intended use is a single control thread (a game loop). Locks are never
//! held while subscriber or injection callbacks run.

// Module declarations
pub mod config;
pub mod container;
pub mod diagnostics;
pub mod error;
pub mod key;
pub mod observer;
pub mod registry;
pub mod resolver;
pub mod session;

// Re-export core types
pub use config::{
    ConfigEntry, ConsumerIdentity, DependencyConfig, DependencyConfigBuilder, DependencyList,
    TypeCatalog, TypeKind,
};
pub use container::DependencyContainer;
pub use diagnostics::{ConsumerReport, RegistryReport, ResolverReport, ServiceReport};
pub use error::{ConfigError, ConfigErrors, LocatorError, LocatorResult};
pub use key::{key_of, CapabilityId, TypeKey};
pub use observer::{AbandonReason, LoggingObserver, MetricsObserver, ResolverObserver};
pub use registry::{
    RegistryEntry, RegistryEvent, RegistryObserver, ServiceInstance, ServiceRegistry,
    SubscriptionId,
};
pub use resolver::{DependencyConsumer, DependencyResolver, PendingEntry};
pub use session::Session;
