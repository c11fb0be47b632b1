//! Type identity tokens used for capabilities and consumer types.

use std::any::TypeId;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Stable identity of a Rust type, used both as the key of a registered
/// capability and as the key of a consumer entry in a [`DependencyConfig`].
///
/// Equality, ordering and hashing only look at the [`TypeId`]; the type name
/// is carried along for diagnostics and log output.
///
/// Capabilities are usually trait objects:
///
/// ```rust
/// use ferrous_locator::{key_of, CapabilityId};
///
/// trait Audio: Send + Sync {}
/// trait Saves: Send + Sync {}
///
/// let audio: CapabilityId = key_of::<dyn Audio>();
/// assert_eq!(audio, key_of::<dyn Audio>());
/// assert_ne!(audio, key_of::<dyn Saves>());
/// assert!(audio.type_name().contains("Audio"));
/// ```
///
/// [`DependencyConfig`]: crate::DependencyConfig
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

/// A [`TypeKey`] naming a capability (interface) a service provides.
pub type CapabilityId = TypeKey;

impl TypeKey {
    /// Key for `T`, which may be unsized (`dyn Trait`).
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The underlying [`TypeId`].
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Full type name as reported by [`std::any::type_name`].
    pub fn type_name(&self) -> &'static str {
        self.name
    }

    /// Last path segment of the type name, without `dyn ` and generics.
    ///
    /// ```rust
    /// use ferrous_locator::key_of;
    ///
    /// trait Audio: Send + Sync {}
    /// assert_eq!(key_of::<dyn Audio>().short_name(), "Audio");
    /// assert_eq!(key_of::<String>().short_name(), "String");
    /// ```
    pub fn short_name(&self) -> &'static str {
        let name = self.name.strip_prefix("dyn ").unwrap_or(self.name);
        let name = match name.find('<') {
            Some(pos) => &name[..pos],
            None => name,
        };
        name.rsplit("::").next().unwrap_or(name)
    }
}

impl PartialEq for TypeKey {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl PartialOrd for TypeKey {
    #[inline(always)]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeKey {
    #[inline(always)]
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

// TypeId only, the name is diagnostic
impl Hash for TypeKey {
    #[inline(always)]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeKey").field(&self.name).finish()
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Helper for creating type keys.
#[inline(always)]
pub fn key_of<T: ?Sized + 'static>() -> TypeKey {
    TypeKey::of::<T>()
}
