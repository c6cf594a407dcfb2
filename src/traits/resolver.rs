//! Resolver traits for service resolution.

use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::{Contract, ServiceKey};
use crate::registration::{unerase, Registration};
use crate::reuse::IfUnresolved;

/// Core resolver trait for object-safe service resolution.
///
/// This trait provides the fundamental resolution capabilities that are
/// object-safe (can be used as trait objects). Instances cross it type-erased
/// as `Arc<dyn Any>` holding an `Arc<C>` for the requested contract `C`.
///
/// Most users should use the [`Resolver`] trait instead, which provides
/// typed generic methods built on top of this trait.
pub trait ResolverCore: Send + Sync {
    /// Resolves the single registration of `(contract, key)`.
    ///
    /// When the bucket holds zero or several registrations the result depends
    /// on `if_unresolved`: [`IfUnresolved::Throw`] fails with
    /// [`DiError::Unresolved`], [`IfUnresolved::ReturnDefault`] yields `Ok(None)`.
    /// Errors raised while building the instance are returned either way.
    fn resolve_any(
        &self,
        contract: Contract,
        key: &ServiceKey,
        if_unresolved: IfUnresolved,
    ) -> DiResult<Option<Arc<dyn Any + Send + Sync>>>;

    /// Snapshot of the `(contract, key)` bucket in ascending ordinal order.
    fn registrations(&self, contract: Contract, key: &ServiceKey) -> Vec<Registration>;

    /// Builds (or fetches the cached singleton of) one registration.
    fn materialize(&self, registration: &Registration) -> DiResult<Arc<dyn Any + Send + Sync>>;
}

/// High-level resolver interface with generic methods for type-safe resolution.
///
/// Implemented for everything that implements [`ResolverCore`]: the
/// [`Container`](crate::Container) itself and the
/// [`ResolverContext`](crate::ResolverContext) handed to factories.
///
/// # Examples
///
/// ```
/// use ioc_container::{Container, IfUnresolved, Resolver, ReuseType, ServiceKey};
/// use std::sync::Arc;
///
/// trait Plugin: Send + Sync {
///     fn name(&self) -> &str;
/// }
///
/// struct PluginA;
/// impl Plugin for PluginA {
///     fn name(&self) -> &str { "A" }
/// }
///
/// struct PluginB;
/// impl Plugin for PluginB {
///     fn name(&self) -> &str { "B" }
/// }
///
/// let container = Container::new();
/// container.register_instance::<dyn Plugin>(Arc::new(PluginA), ServiceKey::NONE);
/// container.register_instance::<dyn Plugin>(Arc::new(PluginB), ServiceKey::NONE);
///
/// // Two registrations: a single resolve is ambiguous...
/// assert!(container.resolve::<dyn Plugin>().is_err());
/// assert!(container.try_resolve::<dyn Plugin>(ServiceKey::NONE).unwrap().is_none());
///
/// // ...but resolving all of them yields both, in registration order.
/// let names: Vec<String> = container
///     .resolve_many::<dyn Plugin>()
///     .map(|p| p.unwrap().name().to_string())
///     .collect();
/// assert_eq!(names, ["A", "B"]);
/// ```
pub trait Resolver: ResolverCore {
    /// The full resolve: contract, miss policy and key.
    ///
    /// `Ok(None)` only ever comes back for [`IfUnresolved::ReturnDefault`].
    fn resolve_with<C>(
        &self,
        if_unresolved: IfUnresolved,
        key: impl Into<ServiceKey>,
    ) -> DiResult<Option<Arc<C>>>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        let key = key.into();
        match self.resolve_any(Contract::of::<C>(), &key, if_unresolved)? {
            Some(any) => unerase::<C>(any).map(Some),
            None => Ok(None),
        }
    }

    /// Resolves `C` under the absent key, failing unless exactly one is registered.
    fn resolve<C>(&self) -> DiResult<Arc<C>>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        self.resolve_keyed::<C>(ServiceKey::NONE)
    }

    /// Resolves `C` under `key`, failing unless exactly one is registered.
    ///
    /// ```
    /// use ioc_container::{Container, Resolver, ServiceKey};
    /// use std::sync::Arc;
    ///
    /// trait IsolationPolicy: Send + Sync {
    ///     fn scope(&self) -> &str;
    /// }
    ///
    /// struct PerUser;
    /// impl IsolationPolicy for PerUser {
    ///     fn scope(&self) -> &str { "user" }
    /// }
    ///
    /// let container = Container::new();
    /// container.register_instance::<dyn IsolationPolicy>(Arc::new(PerUser), "per-user");
    ///
    /// let policy = container.resolve_keyed::<dyn IsolationPolicy>("per-user").unwrap();
    /// assert_eq!(policy.scope(), "user");
    /// assert!(container.resolve::<dyn IsolationPolicy>().is_err());
    /// ```
    fn resolve_keyed<C>(&self, key: impl Into<ServiceKey>) -> DiResult<Arc<C>>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        let key = key.into();
        self.resolve_with::<C>(IfUnresolved::Throw, key.clone())?
            .ok_or_else(|| DiError::Unresolved {
                contract: std::any::type_name::<C>(),
                key,
                count: 0,
            })
    }

    /// Resolves `C` under `key`, `None` unless exactly one is registered.
    fn try_resolve<C>(&self, key: impl Into<ServiceKey>) -> DiResult<Option<Arc<C>>>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        self.resolve_with::<C>(IfUnresolved::ReturnDefault, key)
    }

    /// Resolves `C` under the absent key, panicking on failure.
    ///
    /// # Panics
    ///
    /// Panics if the service cannot be resolved (missing, ambiguous,
    /// circular, or its factory failed).
    fn resolve_required<C>(&self) -> Arc<C>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        self.resolve::<C>()
            .unwrap_or_else(|e| panic!("Failed to resolve {}: {}", std::any::type_name::<C>(), e))
    }

    /// Lazily resolves every registration of `C` under the absent key.
    fn resolve_many<C>(&self) -> ResolveMany<'_, C>
    where
        C: ?Sized + Send + Sync + 'static,
        Self: Sized,
    {
        self.resolve_many_keyed::<C>(ServiceKey::NONE)
    }

    /// Lazily resolves every registration of `C` under `key`.
    ///
    /// The bucket is read when this is called; each instance is built when
    /// the iterator reaches it. An empty bucket yields an empty iterator.
    fn resolve_many_keyed<C>(&self, key: impl Into<ServiceKey>) -> ResolveMany<'_, C>
    where
        C: ?Sized + Send + Sync + 'static,
        Self: Sized,
    {
        let key = key.into();
        let pending = self.registrations(Contract::of::<C>(), &key);
        tracing::trace!(contract = std::any::type_name::<C>(), %key, count = pending.len(), "resolve many");
        ResolveMany {
            core: self,
            pending: pending.into_iter(),
            _contract: PhantomData,
        }
    }

    /// Every registration of `C` under `key`, built eagerly.
    ///
    /// Stops at the first failing factory.
    fn resolve_all<C>(&self, key: impl Into<ServiceKey>) -> DiResult<Vec<Arc<C>>>
    where
        C: ?Sized + Send + Sync + 'static,
        Self: Sized,
    {
        self.resolve_many_keyed::<C>(key).collect()
    }
}

impl<R: ResolverCore + ?Sized> Resolver for R {}

/// Lazy sequence of instances, one per registration, in registration order.
///
/// Returned by [`Resolver::resolve_many`] and [`Resolver::resolve_many_keyed`].
pub struct ResolveMany<'a, C: ?Sized> {
    core: &'a dyn ResolverCore,
    pending: std::vec::IntoIter<Registration>,
    _contract: PhantomData<fn() -> Arc<C>>,
}

impl<'a, C> Iterator for ResolveMany<'a, C>
where
    C: ?Sized + Send + Sync + 'static,
{
    type Item = DiResult<Arc<C>>;

    fn next(&mut self) -> Option<Self::Item> {
        let registration = self.pending.next()?;
        Some(self.core.materialize(&registration).and_then(unerase::<C>))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.pending.size_hint()
    }
}

impl<'a, C> ExactSizeIterator for ResolveMany<'a, C> where C: ?Sized + Send + Sync + 'static {}

impl<'a, C: ?Sized> std::fmt::Debug for ResolveMany<'a, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolveMany")
            .field("contract", &std::any::type_name::<C>())
            .field("remaining", &self.pending.len())
            .finish()
    }
}
