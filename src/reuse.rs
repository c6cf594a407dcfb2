//! Reuse policies and the per-container instance slot.

use once_cell::sync::OnceCell;

use crate::container::ResolverContext;
use crate::error::DiResult;
use crate::key::Contract;
use crate::registration::{AnyArc, Factory};

/// Reuse policy controlling instance caching behavior
///
/// # Examples
///
/// ```rust
/// use ioc_container::{Container, Resolver, ReuseType, ServiceKey};
/// use std::sync::Arc;
///
/// struct Clock;
///
/// let container = Container::new();
/// container.register_delegate::<Clock, _>(|_| Ok(Arc::new(Clock)), ReuseType::Singleton, ServiceKey::NONE);
///
/// let a = container.resolve::<Clock>().unwrap();
/// let b = container.resolve::<Clock>().unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReuseType {
    /// New instance per resolution, never cached
    #[default]
    Transient,
    /// Created once per container on first resolution, then shared
    ///
    /// The slot belongs to the container that owns the registration.
    /// Cloning a container gives the clone its own, unrealized slot.
    Singleton,
}

/// What `Resolve` does when the bucket does not hold exactly one registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IfUnresolved {
    /// Fail with [`DiError::Unresolved`](crate::DiError::Unresolved)
    #[default]
    Throw,
    /// Return `None`
    ReturnDefault,
}

/// A factory bound to a reuse policy.
///
/// One activation may back several registrations (every contract produced
/// by a single `register_many` or export marker), which is how a singleton
/// resolved through different contracts stays one instance.
pub(crate) struct Activation {
    implementation: Contract,
    reuse: ReuseType,
    factory: Factory,
    slot: OnceCell<AnyArc>,
}

impl Activation {
    pub(crate) fn new(implementation: Contract, reuse: ReuseType, factory: Factory) -> Self {
        Self {
            implementation,
            reuse,
            factory,
            slot: OnceCell::new(),
        }
    }

    /// Same factory and policy, unrealized slot.
    pub(crate) fn unrealized(&self) -> Self {
        Self::new(self.implementation, self.reuse, self.factory.clone())
    }

    pub(crate) fn implementation(&self) -> Contract {
        self.implementation
    }

    pub(crate) fn reuse(&self) -> ReuseType {
        self.reuse
    }

    /// The realized singleton, if any.
    #[inline(always)]
    pub(crate) fn cached(&self) -> Option<&AnyArc> {
        self.slot.get()
    }

    /// Runs the factory according to the reuse policy.
    ///
    /// Concurrent first calls on a singleton block on the slot while one of
    /// them runs the factory; a failed factory leaves the slot empty.
    pub(crate) fn materialize(&self, ctx: &ResolverContext<'_>) -> DiResult<AnyArc> {
        match self.reuse {
            ReuseType::Transient => (self.factory)(ctx),
            ReuseType::Singleton => self
                .slot
                .get_or_try_init(|| (self.factory)(ctx))
                .map(AnyArc::clone),
        }
    }
}
