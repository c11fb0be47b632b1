//! Type-erased service handles.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};

/// Strong, type-erased handle to a registered service.
///
/// Produced by upgrading a registry entry. Holding one keeps the service
/// alive, so handles are meant to be short-lived: downcast to the typed
/// `Arc` you need and drop the handle.
///
/// # Examples
///
/// ```rust
/// use ferrous_locator::ServiceInstance;
/// use std::sync::Arc;
///
/// trait Audio: Send + Sync {
///     fn volume(&self) -> u8;
/// }
/// struct Mixer;
/// impl Audio for Mixer {
///     fn volume(&self) -> u8 { 7 }
/// }
///
/// let mixer: Arc<dyn Audio> = Arc::new(Mixer);
/// let handle = ServiceInstance::new(mixer.clone());
///
/// assert!(handle.is_same(&mixer));
/// assert_eq!(handle.downcast::<dyn Audio>().unwrap().volume(), 7);
/// assert!(handle.downcast::<String>().is_none());
/// ```
#[derive(Clone)]
pub struct ServiceInstance {
    // Always an `Arc<T>` for the `T` given to `new`
    erased: Arc<dyn Any + Send + Sync>,
    addr: usize,
    type_name: &'static str,
}

impl ServiceInstance {
    /// Wraps a typed service.
    pub fn new<T>(instance: Arc<T>) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let addr = address_of(&instance);
        Self {
            erased: Arc::new(instance),
            addr,
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Recovers the typed `Arc<T>`, if `T` is the type the service was
    /// registered as.
    pub fn downcast<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.erased.downcast_ref::<Arc<T>>().cloned()
    }

    /// Address of the service object, stable while the service is alive.
    #[inline]
    pub fn addr(&self) -> usize {
        self.addr
    }

    /// Name of the type the service was registered as.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// True if both handles point at the same service object.
    #[inline]
    pub fn ptr_eq(&self, other: &ServiceInstance) -> bool {
        self.addr == other.addr
    }

    /// True if this handle points at the object behind `other`.
    #[inline]
    pub fn is_same<T: ?Sized>(&self, other: &Arc<T>) -> bool {
        self.addr == address_of(other)
    }
}

impl fmt::Debug for ServiceInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceInstance")
            .field("type_name", &self.type_name)
            .field("addr", &format_args!("{:#x}", self.addr))
            .finish()
    }
}

/// Data address of the object behind an `Arc`, ignoring any vtable.
#[inline]
pub(crate) fn address_of<T: ?Sized>(arc: &Arc<T>) -> usize {
    Arc::as_ptr(arc) as *const () as usize
}

/// Non-owning reference to a service whose concrete `Arc` type is erased.
pub(crate) trait ErasedWeak: Send + Sync {
    fn upgrade(&self) -> Option<ServiceInstance>;
    fn is_alive(&self) -> bool;
}

struct TypedWeak<T: ?Sized>(Weak<T>);

impl<T> ErasedWeak for TypedWeak<T>
where
    T: ?Sized + Send + Sync + 'static,
{
    fn upgrade(&self) -> Option<ServiceInstance> {
        self.0.upgrade().map(ServiceInstance::new)
    }

    fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

pub(crate) fn erase_weak<T>(instance: &Arc<T>) -> Box<dyn ErasedWeak>
where
    T: ?Sized + Send + Sync + 'static,
{
    Box::new(TypedWeak(Arc::downgrade(instance)))
}
