//! Resolver context for factories.
//!
//! This module contains the ResolverContext type which provides
//! the interface for factory functions to resolve dependencies.

use std::any::Any;
use std::sync::Arc;

use crate::error::DiResult;
use crate::key::{Contract, ServiceKey};
use crate::registration::Registration;
use crate::reuse::IfUnresolved;
use crate::traits::ResolverCore;

/// Context passed to factory functions for resolving dependencies.
///
/// It wraps the container that is resolving right now, which is not
/// necessarily the one the factory was registered on: a factory copied into
/// a clone or an override resolves its dependencies from that clone.
///
/// # Examples
///
/// ```
/// use ioc_container::{Container, Resolver, ReuseType, ServiceKey};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct UserService { db: Arc<Database> }
///
/// let container = Container::new();
/// container.register_instance(Arc::new(Database { url: "postgres://localhost".to_string() }), ServiceKey::NONE);
/// container.register_delegate::<UserService, _>(
///     |ctx| Ok(Arc::new(UserService { db: ctx.resolve::<Database>()? })),
///     ReuseType::Transient,
///     ServiceKey::NONE,
/// );
///
/// let users = container.resolve::<UserService>().unwrap();
/// assert_eq!(users.db.url, "postgres://localhost");
/// ```
pub struct ResolverContext<'a> {
    resolver: &'a dyn ResolverCore,
}

impl<'a> ResolverContext<'a> {
    pub(crate) fn new(resolver: &'a dyn ResolverCore) -> Self {
        Self { resolver }
    }
}

impl<'a> ResolverCore for ResolverContext<'a> {
    fn resolve_any(
        &self,
        contract: Contract,
        key: &ServiceKey,
        if_unresolved: IfUnresolved,
    ) -> DiResult<Option<Arc<dyn Any + Send + Sync>>> {
        self.resolver.resolve_any(contract, key, if_unresolved)
    }

    fn registrations(&self, contract: Contract, key: &ServiceKey) -> Vec<Registration> {
        self.resolver.registrations(contract, key)
    }

    fn materialize(&self, registration: &Registration) -> DiResult<Arc<dyn Any + Send + Sync>> {
        self.resolver.materialize(registration)
    }
}
