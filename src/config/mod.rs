//! Static table of which capabilities each consumer type requires.
//!
//! A [`DependencyConfig`] is built once, validated, and then shared read-only
//! (usually as `Arc<DependencyConfig>`) by every resolver of a session.
//!
//! # Lookup policy
//!
//! [`DependencyConfig::requirements_for`] returns the **first** entry, in
//! declaration order, whose key is the consumer's concrete type or one of the
//! type tags the consumer declares. It is not a most-specific match: if an
//! entry for a shared tag is declared before an entry for a concrete type,
//! consumers of that type receive the tag's requirements. Declare specific
//! entries first.

use std::collections::HashSet;
use std::fmt;

use crate::error::{ConfigError, ConfigErrors};
use crate::key::{key_of, CapabilityId, TypeKey};

mod catalog;
#[cfg(feature = "config")]
mod loader;

pub use catalog::{TypeCatalog, TypeKind};

/// Ordered, duplicate-free list of required capabilities.
///
/// ```rust
/// use ferrous_locator::{key_of, DependencyList};
///
/// trait Audio: Send + Sync {}
/// trait Saves: Send + Sync {}
///
/// let deps = DependencyList::new()
///     .depends_on::<dyn Audio>()
///     .depends_on::<dyn Saves>()
///     .depends_on::<dyn Audio>();
///
/// assert_eq!(deps.as_slice(), &[key_of::<dyn Audio>(), key_of::<dyn Saves>()]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyList {
    entries: Vec<CapabilityId>,
}

impl DependencyList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `key_of::<T>()` unless it is already listed.
    pub fn depends_on<T: ?Sized + 'static>(self) -> Self {
        self.depends_on_key(key_of::<T>())
    }

    /// Adds `capability` unless it is already listed.
    pub fn depends_on_key(mut self, capability: CapabilityId) -> Self {
        self.push(capability);
        self
    }

    /// Appends `capability`; returns false if it was already listed.
    pub fn push(&mut self, capability: CapabilityId) -> bool {
        if self.entries.contains(&capability) {
            return false;
        }
        self.entries.push(capability);
        true
    }

    pub fn contains(&self, capability: &CapabilityId) -> bool {
        self.entries.contains(capability)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CapabilityId> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[CapabilityId] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a DependencyList {
    type Item = &'a CapabilityId;
    type IntoIter = std::slice::Iter<'a, CapabilityId>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<CapabilityId> for DependencyList {
    fn from_iter<I: IntoIterator<Item = CapabilityId>>(iter: I) -> Self {
        let mut list = DependencyList::new();
        for capability in iter {
            list.push(capability);
        }
        list
    }
}

/// Type identity of a consumer as seen by config lookup: its concrete type
/// plus every tag (base type or interface) it declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerIdentity {
    concrete: TypeKey,
    tags: Vec<TypeKey>,
}

impl ConsumerIdentity {
    pub fn new(concrete: TypeKey, tags: Vec<TypeKey>) -> Self {
        Self { concrete, tags }
    }

    /// Identity of `T` with no extra tags.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::new(key_of::<T>(), Vec::new())
    }

    pub fn with_tag<T: ?Sized + 'static>(mut self) -> Self {
        self.tags.push(key_of::<T>());
        self
    }

    pub fn concrete(&self) -> TypeKey {
        self.concrete
    }

    pub fn tags(&self) -> &[TypeKey] {
        &self.tags
    }

    /// True if `key` is the concrete type or one of the tags.
    pub fn matches(&self, key: &TypeKey) -> bool {
        self.concrete == *key || self.tags.contains(key)
    }
}

impl fmt::Display for ConsumerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.concrete.type_name())
    }
}

/// One `consumer -> requirements` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEntry {
    pub consumer: TypeKey,
    pub dependencies: DependencyList,
}

/// Read-only table mapping consumer types to their required capabilities.
///
/// # Examples
///
/// ```rust
/// use ferrous_locator::{ConsumerIdentity, DependencyConfig, DependencyList, key_of};
///
/// trait Audio: Send + Sync {}
/// trait Saves: Send + Sync {}
/// struct Hud;
/// struct PauseMenu;
///
/// let config = DependencyConfig::builder()
///     .add::<Hud>(DependencyList::new().depends_on::<dyn Audio>())
///     .add::<PauseMenu>(
///         DependencyList::new()
///             .depends_on::<dyn Audio>()
///             .depends_on::<dyn Saves>(),
///     )
///     .build()
///     .unwrap();
///
/// let menu = config.requirements_for(&ConsumerIdentity::of::<PauseMenu>()).unwrap();
/// assert_eq!(menu.len(), 2);
/// assert!(config.requirements_for(&ConsumerIdentity::of::<String>()).is_none());
/// ```
#[derive(Debug, Clone)]
pub struct DependencyConfig {
    name: String,
    entries: Vec<ConfigEntry>,
}

impl Default for DependencyConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_CONFIG_NAME.to_string(),
            entries: Vec::new(),
        }
    }
}

const DEFAULT_CONFIG_NAME: &str = "DependencyConfig";

impl DependencyConfig {
    pub fn builder() -> DependencyConfigBuilder {
        DependencyConfigBuilder::new()
    }

    /// Name used in log and error output.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Requirements of the first entry matching `consumer`, in declaration order.
    pub fn requirements_for(&self, consumer: &ConsumerIdentity) -> Option<&DependencyList> {
        self.entries
            .iter()
            .find(|entry| consumer.matches(&entry.consumer))
            .map(|entry| &entry.dependencies)
    }

    /// Entries in declaration order.
    pub fn entries(&self) -> &[ConfigEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Checks invariants that the builder cannot enforce while adding rows.
    pub fn validate(&self) -> Result<(), ConfigErrors> {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();
        for (index, entry) in self.entries.iter().enumerate() {
            if !seen.insert(entry.consumer) {
                errors.push(ConfigError::DuplicateConsumer {
                    index,
                    consumer: entry.consumer.type_name().to_string(),
                });
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigErrors(errors))
        }
    }
}

/// Builder for [`DependencyConfig`].
#[derive(Debug, Default)]
pub struct DependencyConfigBuilder {
    name: Option<String>,
    entries: Vec<ConfigEntry>,
}

impl DependencyConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Declares the requirements of consumer type (or tag) `T`.
    pub fn add<T: ?Sized + 'static>(self, dependencies: DependencyList) -> Self {
        self.add_key(key_of::<T>(), dependencies)
    }

    pub fn add_key(mut self, consumer: TypeKey, dependencies: DependencyList) -> Self {
        self.entries.push(ConfigEntry { consumer, dependencies });
        self
    }

    /// Validates and builds the config.
    pub fn build(self) -> Result<DependencyConfig, ConfigErrors> {
        let config = DependencyConfig {
            name: self.name.unwrap_or_else(|| DEFAULT_CONFIG_NAME.to_string()),
            entries: self.entries,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Audio: Send + Sync {}
    trait Saves: Send + Sync {}
    trait Widget {}
    struct Hud;
    struct Minimap;

    #[test]
    fn test_first_match_wins_over_specific() {
        let config = DependencyConfig::builder()
            .add::<dyn Widget>(DependencyList::new().depends_on::<dyn Audio>())
            .add::<Hud>(DependencyList::new().depends_on::<dyn Saves>())
            .build()
            .unwrap();

        let hud = ConsumerIdentity::of::<Hud>().with_tag::<dyn Widget>();
        let deps = config.requirements_for(&hud).unwrap();
        assert_eq!(deps.as_slice(), &[key_of::<dyn Audio>()]);
    }

    #[test]
    fn test_specific_first_is_used() {
        let config = DependencyConfig::builder()
            .add::<Hud>(DependencyList::new().depends_on::<dyn Saves>())
            .add::<dyn Widget>(DependencyList::new().depends_on::<dyn Audio>())
            .build()
            .unwrap();

        let hud = ConsumerIdentity::of::<Hud>().with_tag::<dyn Widget>();
        let minimap = ConsumerIdentity::of::<Minimap>().with_tag::<dyn Widget>();
        assert_eq!(config.requirements_for(&hud).unwrap().as_slice(), &[key_of::<dyn Saves>()]);
        assert_eq!(config.requirements_for(&minimap).unwrap().as_slice(), &[key_of::<dyn Audio>()]);
    }

    #[test]
    fn test_duplicate_consumer_rejected() {
        let errors = DependencyConfig::builder()
            .add::<Hud>(DependencyList::new())
            .add::<Hud>(DependencyList::new().depends_on::<dyn Audio>())
            .build()
            .unwrap_err();

        assert_eq!(errors.len(), 1);
        assert!(matches!(errors.errors()[0], ConfigError::DuplicateConsumer { index: 1, .. }));
    }

    #[test]
    fn test_empty_requirement_list_is_valid() {
        let config = DependencyConfig::builder()
            .add::<Hud>(DependencyList::new())
            .build()
            .unwrap();
        assert!(config.requirements_for(&ConsumerIdentity::of::<Hud>()).unwrap().is_empty());
    }

    #[test]
    fn test_list_from_iter_dedups() {
        let list: DependencyList = vec![key_of::<dyn Audio>(), key_of::<dyn Audio>(), key_of::<dyn Saves>()]
            .into_iter()
            .collect();
        assert_eq!(list.len(), 2);
    }
}
