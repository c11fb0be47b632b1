//! Error types for the service registry, the dependency config and the resolver.

use std::fmt;

use crate::key::{CapabilityId, TypeKey};

/// Errors reported by registry and resolver operations.
///
/// None of these are fatal: the failing operation is rejected, the error is
/// logged at the call site and returned so the caller may react.
///
/// # Examples
///
/// ```rust
/// use ferrous_locator::{key_of, LocatorError, ServiceRegistry};
/// use std::sync::Arc;
///
/// trait Audio: Send + Sync {}
/// struct Mixer;
/// impl Audio for Mixer {}
///
/// let registry = ServiceRegistry::new();
/// let mixer: Arc<dyn Audio> = Arc::new(Mixer);
/// match registry.withdraw_service::<dyn Audio>(&mixer) {
///     Err(LocatorError::NotRegistered(capability)) => {
///         assert_eq!(capability, key_of::<dyn Audio>());
///     }
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocatorError {
    /// A service is already registered for this capability
    AlreadyRegistered(CapabilityId),
    /// No service is registered for this capability
    NotRegistered(CapabilityId),
    /// The dependency config has no entry matching this consumer type
    MissingConfig(TypeKey),
}

impl fmt::Display for LocatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocatorError::AlreadyRegistered(capability) => {
                write!(f, "Service already registered: {}", capability)
            }
            LocatorError::NotRegistered(capability) => {
                write!(f, "Service not registered: {}", capability)
            }
            LocatorError::MissingConfig(consumer) => {
                write!(f, "No dependency config entry for: {}", consumer)
            }
        }
    }
}

impl std::error::Error for LocatorError {}

/// Result type for registry operations.
pub type LocatorResult<T> = Result<T, LocatorError>;

/// A single problem found while building or loading a [`DependencyConfig`].
///
/// `index` is the position of the offending entry in declaration order.
///
/// [`DependencyConfig`]: crate::DependencyConfig
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The config could not be parsed at all
    Parse(String),
    /// The config could not be written out
    Serialize(String),
    /// A consumer type name is not known to the type catalog
    UnknownConsumer { index: usize, name: String },
    /// A required capability name is not known to the type catalog
    UnknownCapability { index: usize, name: String },
    /// A required type is known but is not a capability
    NotACapability { index: usize, name: String },
    /// The same consumer key appears in more than one entry
    DuplicateConsumer { index: usize, consumer: String },
    /// The same capability is listed twice for one consumer
    DuplicateRequirement { index: usize, consumer: String, capability: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Parse(msg) => write!(f, "Invalid dependency config: {}", msg),
            ConfigError::Serialize(msg) => write!(f, "Could not write dependency config: {}", msg),
            ConfigError::UnknownConsumer { index, name } => {
                write!(f, "Invalid class at index {}: unknown consumer type '{}'", index, name)
            }
            ConfigError::UnknownCapability { index, name } => {
                write!(f, "Invalid dependency class at index {}: unknown capability '{}'", index, name)
            }
            ConfigError::NotACapability { index, name } => {
                write!(f, "Invalid dependency class at index {}: '{}' is not a capability", index, name)
            }
            ConfigError::DuplicateConsumer { index, consumer } => {
                write!(f, "Duplicate consumer entry at index {}: {}", index, consumer)
            }
            ConfigError::DuplicateRequirement { index, consumer, capability } => {
                write!(
                    f,
                    "Duplicate dependency for {} at index {}: {}",
                    consumer, index, capability
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Every problem found in one config, in the order they were detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigErrors(pub Vec<ConfigError>);

impl ConfigErrors {
    /// The individual errors.
    pub fn errors(&self) -> &[ConfigError] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ConfigErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} config error(s)", self.0.len())?;
        for error in &self.0 {
            write!(f, "\n  - {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigErrors {}

impl From<ConfigError> for ConfigErrors {
    fn from(error: ConfigError) -> Self {
        ConfigErrors(vec![error])
    }
}
