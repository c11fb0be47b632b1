//! Name → type lookup used to resolve externally authored configs.

use std::collections::HashMap;

use crate::key::{key_of, TypeKey};

/// What a catalog name may be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    /// A capability (service interface); valid as a requirement and as a key
    Capability,
    /// A consumer type; valid only as a config key
    Consumer,
}

/// Explicit registry of the types an external config may name.
///
/// Rust has no runtime reflection, so every type a config file refers to
/// must be registered here under a stable name before the config is loaded.
///
/// ```rust
/// use ferrous_locator::{key_of, TypeCatalog, TypeKind};
///
/// trait Audio: Send + Sync {}
/// struct Hud;
///
/// let catalog = TypeCatalog::new()
///     .capability::<dyn Audio>("Audio")
///     .consumer::<Hud>("Hud");
///
/// assert_eq!(catalog.resolve("Audio"), Some((key_of::<dyn Audio>(), TypeKind::Capability)));
/// assert_eq!(catalog.name_of(&key_of::<Hud>()), Some("Hud"));
/// assert!(catalog.resolve("Minimap").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    by_name: HashMap<String, (TypeKey, TypeKind)>,
    names: HashMap<TypeKey, String>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers capability type `T` under `name`.
    pub fn capability<T: ?Sized + 'static>(self, name: impl Into<String>) -> Self {
        self.with(name.into(), key_of::<T>(), TypeKind::Capability)
    }

    /// Registers consumer type `T` under `name`.
    pub fn consumer<T: ?Sized + 'static>(self, name: impl Into<String>) -> Self {
        self.with(name.into(), key_of::<T>(), TypeKind::Consumer)
    }

    /// Registers `key` under `name`; a later registration of the same name replaces it.
    pub fn with(mut self, name: String, key: TypeKey, kind: TypeKind) -> Self {
        if let Some((previous, _)) = self.by_name.insert(name.clone(), (key, kind)) {
            if previous != key && self.names.get(&previous) == Some(&name) {
                // Fall back to another name still mapped to the old key
                let alias = self
                    .by_name
                    .iter()
                    .find(|(_, (other, _))| *other == previous)
                    .map(|(alias, _)| alias.clone());
                match alias {
                    Some(alias) => self.names.insert(previous, alias),
                    None => self.names.remove(&previous),
                };
            }
        }
        self.names.insert(key, name);
        self
    }

    pub fn resolve(&self, name: &str) -> Option<(TypeKey, TypeKind)> {
        self.by_name.get(name).copied()
    }

    pub fn name_of(&self, key: &TypeKey) -> Option<&str> {
        self.names.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Audio: Send + Sync {}
    trait Music: Send + Sync {}

    #[test]
    fn test_repointed_alias_keeps_other_name() {
        let catalog = TypeCatalog::new()
            .capability::<dyn Audio>("Audio")
            .capability::<dyn Audio>("Sound")
            .capability::<dyn Music>("Sound");

        assert_eq!(catalog.resolve("Audio"), Some((key_of::<dyn Audio>(), TypeKind::Capability)));
        assert_eq!(catalog.name_of(&key_of::<dyn Audio>()), Some("Audio"));
        assert_eq!(catalog.name_of(&key_of::<dyn Music>()), Some("Sound"));
    }

    #[test]
    fn test_repointed_only_name_forgets_key() {
        let catalog = TypeCatalog::new()
            .capability::<dyn Audio>("Sound")
            .capability::<dyn Music>("Sound");

        assert_eq!(catalog.len(), 1);
        assert!(catalog.name_of(&key_of::<dyn Audio>()).is_none());
    }
}
