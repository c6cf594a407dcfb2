//! The container: registration table plus resolution engine.
//!
//! This module contains the Container type. Registration operations live in
//! [`registrator`], factories see the container through [`ResolverContext`].

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::ContainerOptions;
use crate::descriptors::ServiceDescriptor;
use crate::error::{DiError, DiResult};
use crate::internal::StackGuard;
use crate::key::{Contract, ServiceKey};
use crate::registration::{Registration, RegistrationTable};
use crate::reuse::IfUnresolved;
use crate::traits::ResolverCore;

pub mod context;
mod registrator;

pub use context::ResolverContext;

/// Inversion-of-control container.
///
/// Holds an append-only table of registrations bucketed by
/// `(contract, service key)`. A single-result resolve succeeds only when its
/// bucket holds exactly one registration: an empty bucket and an ambiguous
/// one are the same failure. Use [`Resolver::resolve_many`] to get all of
/// them, in registration order.
///
/// All operations take `&self`. Reads run concurrently; the first resolve
/// of a singleton blocks other first resolves of the same registration until
/// its factory returns, so the factory runs exactly once per container.
///
/// # Cloning
///
/// `clone()` copies the registrations (same factories, keys, reuse and
/// ordinals) into an independent container whose singletons all start
/// unrealized. Registering or unregistering on either side is invisible to
/// the other.
///
/// # Examples
///
/// ```
/// use ioc_container::{implements, Container, Inject, Resolver, ReuseType, ServiceKey};
/// use std::sync::Arc;
///
/// trait Named: Send + Sync {
///     fn name(&self) -> &str;
/// }
///
/// struct FooTransient;
/// impl Named for FooTransient { fn name(&self) -> &str { "Transient" } }
/// impl Inject for FooTransient {
///     type Dependencies = ();
///     fn inject(_: ()) -> Self { FooTransient }
/// }
///
/// struct FooSingleton;
/// impl Named for FooSingleton { fn name(&self) -> &str { "Singleton" } }
/// impl Inject for FooSingleton {
///     type Dependencies = ();
///     fn inject(_: ()) -> Self { FooSingleton }
/// }
///
/// implements!(FooTransient: dyn Named);
/// implements!(FooSingleton: dyn Named);
///
/// let container = Container::new();
/// container.register::<dyn Named, FooTransient>(ReuseType::Transient, ServiceKey::NONE);
/// container.register::<dyn Named, FooSingleton>(ReuseType::Singleton, ServiceKey::NONE);
///
/// let names: Vec<String> = container
///     .resolve_many::<dyn Named>()
///     .map(|n| n.unwrap().name().to_string())
///     .collect();
/// assert_eq!(names, ["Transient", "Singleton"]);
///
/// let err = container.resolve::<dyn Named>().err().unwrap();
/// assert!(matches!(err, ioc_container::DiError::Unresolved { count: 2, .. }));
/// ```
///
/// [`Resolver::resolve_many`]: crate::Resolver::resolve_many
pub struct Container {
    table: RwLock<RegistrationTable>,
    options: ContainerOptions,
}

impl Container {
    /// Empty container with default options.
    pub fn new() -> Self {
        Self::with_options(ContainerOptions::default())
    }

    pub fn with_options(options: ContainerOptions) -> Self {
        Self {
            table: RwLock::new(RegistrationTable::new()),
            options,
        }
    }

    pub fn options(&self) -> &ContainerOptions {
        &self.options
    }

    /// Total number of registrations across all buckets.
    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of registrations in the `(C, key)` bucket.
    pub fn count<C: ?Sized + 'static>(&self, key: impl Into<ServiceKey>) -> usize {
        self.table.read().bucket(Contract::of::<C>(), &key.into()).len()
    }

    /// Whether a single resolve of `(C, key)` would find its registration.
    pub fn is_resolvable<C: ?Sized + 'static>(&self, key: impl Into<ServiceKey>) -> bool {
        self.count::<C>(key) == 1
    }

    /// Every registration, in ordinal order.
    pub fn descriptors(&self) -> Vec<ServiceDescriptor> {
        self.table
            .read()
            .all()
            .iter()
            .map(ServiceDescriptor::from_registration)
            .collect()
    }

    fn resolve_registration(&self, registration: &Registration) -> DiResult<Arc<dyn Any + Send + Sync>> {
        let instance = match registration.activation.cached() {
            Some(instance) => instance.clone(),
            None => {
                let _guard = StackGuard::enter(
                    registration.activation_id(),
                    registration.implementation().name(),
                    &self.options,
                )?;
                registration.activation.materialize(&ResolverContext::new(self))?
            }
        };
        (registration.upcast)(instance)
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Container {
    fn clone(&self) -> Self {
        let table = self.table.read().clone_unrealized();
        tracing::debug!(registrations = table.len(), "cloned container");
        Self {
            table: RwLock::new(table),
            options: self.options,
        }
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("registrations", &self.len())
            .field("options", &self.options)
            .finish()
    }
}

impl ResolverCore for Container {
    fn resolve_any(
        &self,
        contract: Contract,
        key: &ServiceKey,
        if_unresolved: IfUnresolved,
    ) -> DiResult<Option<Arc<dyn Any + Send + Sync>>> {
        // The read lock is released before any factory runs so factories may
        // resolve, and register, through the same container.
        let (single, count) = {
            let table = self.table.read();
            let bucket = table.bucket(contract, key);
            let single = match bucket {
                [only] => Some(only.clone()),
                _ => None,
            };
            (single, bucket.len())
        };
        tracing::trace!(%contract, %key, count, "resolve");

        if let Some(registration) = single {
            return self.resolve_registration(&registration).map(Some);
        }
        match if_unresolved {
            IfUnresolved::Throw => Err(DiError::Unresolved {
                contract: contract.name(),
                key: key.clone(),
                count,
            }),
            IfUnresolved::ReturnDefault => {
                if count > 1 {
                    tracing::warn!(%contract, %key, count, "ambiguous registration, returning none");
                }
                Ok(None)
            }
        }
    }

    fn registrations(&self, contract: Contract, key: &ServiceKey) -> Vec<Registration> {
        self.table.read().bucket(contract, key).to_vec()
    }

    fn materialize(&self, registration: &Registration) -> DiResult<Arc<dyn Any + Send + Sync>> {
        self.resolve_registration(registration)
    }
}
