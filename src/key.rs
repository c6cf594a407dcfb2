//! Contract and service key types for the IoC container.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Identity of a type that callers request services by.
///
/// A contract is either a concrete type (`Database`) or a trait object
/// (`dyn Logger`). Only the `TypeId` takes part in equality and hashing;
/// the name is carried for diagnostics.
///
/// # Examples
///
/// ```rust
/// use ioc_container::Contract;
///
/// trait Logger: Send + Sync {}
///
/// let a = Contract::of::<dyn Logger>();
/// let b = Contract::of::<dyn Logger>();
/// assert_eq!(a, b);
/// assert_ne!(a, Contract::of::<String>());
/// assert!(a.name().contains("Logger"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Contract {
    id: TypeId,
    name: &'static str,
}

impl Contract {
    /// Contract for `C`, sized or not.
    #[inline(always)]
    pub fn of<C: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<C>(),
            name: std::any::type_name::<C>(),
        }
    }

    /// The `TypeId` backing this contract.
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// The type name, for display.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

// TypeId-only comparison, the name is diagnostics only
impl PartialEq for Contract {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Contract {}

impl Hash for Contract {
    #[inline(always)]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Object-safe view of an arbitrary comparable key value.
trait KeyValue: Any + fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn eq_value(&self, other: &dyn KeyValue) -> bool;
    fn hash_value(&self, state: &mut dyn Hasher);
}

impl<T> KeyValue for T
where
    T: Any + fmt::Debug + Eq + Hash + Send + Sync,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_value(&self, other: &dyn KeyValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .map_or(false, |other| self == other)
    }

    fn hash_value(&self, mut state: &mut dyn Hasher) {
        TypeId::of::<T>().hash(&mut state);
        self.hash(&mut state);
    }
}

/// Optional secondary key that splits one contract into several buckets.
///
/// A key holds any `Eq + Hash + Debug` value, or nothing at all. The absent
/// key ([`ServiceKey::NONE`]) is a bucket identity of its own: a service
/// registered without a key is not visible under any named key and vice versa.
///
/// String keys are normalised to `String`, so `"a"` and `String::from("a")`
/// name the same bucket.
///
/// # Examples
///
/// ```rust
/// use ioc_container::ServiceKey;
///
/// assert_eq!(ServiceKey::from("cache"), ServiceKey::from(String::from("cache")));
/// assert_ne!(ServiceKey::from("cache"), ServiceKey::NONE);
/// assert_ne!(ServiceKey::from(1u32), ServiceKey::from(1u64));
/// assert!(ServiceKey::NONE.is_none());
/// assert_eq!(ServiceKey::from(None::<&str>), ServiceKey::NONE);
/// ```
#[derive(Clone, Default)]
pub struct ServiceKey(Option<Arc<dyn KeyValue>>);

impl ServiceKey {
    /// The absent key.
    pub const NONE: ServiceKey = ServiceKey(None);

    /// Wraps an arbitrary comparable value.
    ///
    /// A `&'static str` is stored as a `String`, the same as `From<&str>`.
    pub fn new<K>(value: K) -> Self
    where
        K: Any + fmt::Debug + Eq + Hash + Send + Sync,
    {
        let erased: &dyn Any = &value;
        if let Some(text) = erased.downcast_ref::<&'static str>() {
            return Self(Some(Arc::new((*text).to_owned())));
        }
        Self(Some(Arc::new(value)))
    }

    /// Whether this is the absent key.
    pub fn is_none(&self) -> bool {
        self.0.is_none()
    }

    /// Borrows the key as `K` if that is what it holds.
    pub fn downcast_ref<K: Any>(&self) -> Option<&K> {
        self.0.as_deref().and_then(|value| value.as_any().downcast_ref::<K>())
    }

    /// Borrows a string key.
    pub fn as_str(&self) -> Option<&str> {
        self.downcast_ref::<String>().map(String::as_str)
    }
}

impl PartialEq for ServiceKey {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (None, None) => true,
            (Some(a), Some(b)) => a.eq_value(b.as_ref()),
            _ => false,
        }
    }
}

impl Eq for ServiceKey {}

impl Hash for ServiceKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &self.0 {
            None => 0u8.hash(state),
            Some(value) => {
                1u8.hash(state);
                value.hash_value(state);
            }
        }
    }
}

impl fmt::Debug for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            None => f.write_str("ServiceKey(none)"),
            Some(value) => write!(f, "ServiceKey({:?})", value),
        }
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.0, self.as_str()) {
            (None, _) => f.write_str("<none>"),
            (_, Some(name)) => f.write_str(name),
            (Some(value), None) => write!(f, "{:?}", value),
        }
    }
}

impl From<&str> for ServiceKey {
    fn from(value: &str) -> Self {
        Self::new(value.to_owned())
    }
}

impl From<String> for ServiceKey {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&String> for ServiceKey {
    fn from(value: &String) -> Self {
        Self::new(value.clone())
    }
}

impl From<&ServiceKey> for ServiceKey {
    fn from(value: &ServiceKey) -> Self {
        value.clone()
    }
}

impl<K: Into<ServiceKey>> From<Option<K>> for ServiceKey {
    fn from(value: Option<K>) -> Self {
        value.map_or(ServiceKey::NONE, Into::into)
    }
}

macro_rules! integer_keys {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for ServiceKey {
                fn from(value: $ty) -> Self {
                    Self::new(value)
                }
            }
        )*
    };
}

integer_keys!(i32, i64, u32, u64, usize);
