//! JSON form of a [`DependencyConfig`].
//!
//! ```json
//! {
//!   "name": "MainMenuDependencies",
//!   "dependencies": [
//!     { "consumer": "Hud", "requires": ["Audio", "Saves"] }
//!   ]
//! }
//! ```
//!
//! Entry order is significant: lookup is first-match.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{ConfigEntry, DependencyConfig, DependencyList, TypeCatalog, TypeKind, DEFAULT_CONFIG_NAME};
use crate::error::{ConfigError, ConfigErrors};

#[derive(Debug, Serialize, Deserialize)]
struct ConfigDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default)]
    dependencies: Vec<EntryDocument>,
}

#[derive(Debug, Serialize, Deserialize)]
struct EntryDocument {
    consumer: String,
    #[serde(default)]
    requires: Vec<String>,
}

impl DependencyConfig {
    /// Loads a config from JSON, resolving every type name through `catalog`.
    ///
    /// All problems are collected and returned together; nothing is deferred
    /// to resolution time.
    ///
    /// ```rust
    /// use ferrous_locator::{ConsumerIdentity, DependencyConfig, TypeCatalog, key_of};
    ///
    /// trait Audio: Send + Sync {}
    /// struct Hud;
    ///
    /// let catalog = TypeCatalog::new()
    ///     .capability::<dyn Audio>("Audio")
    ///     .consumer::<Hud>("Hud");
    ///
    /// let config = DependencyConfig::from_json(
    ///     r#"{ "dependencies": [ { "consumer": "Hud", "requires": ["Audio"] } ] }"#,
    ///     &catalog,
    /// ).unwrap();
    ///
    /// let deps = config.requirements_for(&ConsumerIdentity::of::<Hud>()).unwrap();
    /// assert_eq!(deps.as_slice(), &[key_of::<dyn Audio>()]);
    ///
    /// let errors = DependencyConfig::from_json(
    ///     r#"{ "dependencies": [ { "consumer": "Hud", "requires": ["Physics"] } ] }"#,
    ///     &catalog,
    /// ).unwrap_err();
    /// assert_eq!(errors.len(), 1);
    /// ```
    pub fn from_json(json: &str, catalog: &TypeCatalog) -> Result<Self, ConfigErrors> {
        let document: ConfigDocument =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::from_document(document, catalog)
    }

    /// Writes the config as JSON, naming types through `catalog`.
    pub fn to_json(&self, catalog: &TypeCatalog) -> Result<String, ConfigErrors> {
        let mut errors = Vec::new();
        let mut dependencies = Vec::with_capacity(self.entries.len());

        for (index, entry) in self.entries.iter().enumerate() {
            let consumer = match catalog.name_of(&entry.consumer) {
                Some(name) => name.to_string(),
                None => {
                    errors.push(ConfigError::UnknownConsumer {
                        index,
                        name: entry.consumer.type_name().to_string(),
                    });
                    continue;
                }
            };
            let mut requires = Vec::with_capacity(entry.dependencies.len());
            for capability in &entry.dependencies {
                match catalog.name_of(capability) {
                    Some(name) => requires.push(name.to_string()),
                    None => errors.push(ConfigError::UnknownCapability {
                        index,
                        name: capability.type_name().to_string(),
                    }),
                }
            }
            dependencies.push(EntryDocument { consumer, requires });
        }

        if !errors.is_empty() {
            return Err(ConfigErrors(errors));
        }

        let document = ConfigDocument {
            name: Some(self.name.clone()),
            dependencies,
        };
        serde_json::to_string_pretty(&document)
            .map_err(|e| ConfigErrors::from(ConfigError::Serialize(e.to_string())))
    }

    fn from_document(document: ConfigDocument, catalog: &TypeCatalog) -> Result<Self, ConfigErrors> {
        let mut errors = Vec::new();
        let mut entries = Vec::with_capacity(document.dependencies.len());
        let mut seen = HashSet::new();

        for (index, raw) in document.dependencies.into_iter().enumerate() {
            let consumer = match catalog.resolve(&raw.consumer) {
                Some((key, _)) => {
                    if !seen.insert(key) {
                        errors.push(ConfigError::DuplicateConsumer {
                            index,
                            consumer: raw.consumer.clone(),
                        });
                    }
                    Some(key)
                }
                None => {
                    errors.push(ConfigError::UnknownConsumer { index, name: raw.consumer.clone() });
                    None
                }
            };

            let mut dependencies = DependencyList::new();
            for name in &raw.requires {
                match catalog.resolve(name) {
                    Some((key, TypeKind::Capability)) => {
                        if !dependencies.push(key) {
                            errors.push(ConfigError::DuplicateRequirement {
                                index,
                                consumer: raw.consumer.clone(),
                                capability: name.clone(),
                            });
                        }
                    }
                    Some((_, TypeKind::Consumer)) => {
                        errors.push(ConfigError::NotACapability { index, name: name.clone() });
                    }
                    None => {
                        errors.push(ConfigError::UnknownCapability { index, name: name.clone() });
                    }
                }
            }

            if let Some(consumer) = consumer {
                entries.push(ConfigEntry { consumer, dependencies });
            }
        }

        if !errors.is_empty() {
            return Err(ConfigErrors(errors));
        }
        Ok(DependencyConfig {
            name: document.name.unwrap_or_else(|| DEFAULT_CONFIG_NAME.to_string()),
            entries,
        })
    }
}
