//! Constructor injection.
//!
//! A type opts in by implementing [`Inject`]: it names its constructor
//! parameters as a tuple of [`Dependency`] values and builds itself from
//! them. The container resolves every parameter through the container doing
//! the resolving, then passes the instance on to the reuse policy.
//!
//! | Parameter            | Resolved with                                   |
//! |----------------------|-------------------------------------------------|
//! | `Arc<C>`             | single resolve, fails unless exactly one        |
//! | `Option<Arc<C>>`     | single resolve, `None` unless exactly one       |
//! | `Vec<Arc<C>>`        | every registration, in registration order       |
//! | `Keyed<C, K>`        | single resolve under the key `K::KEY`           |

use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::Arc;

use crate::container::ResolverContext;
use crate::error::DiResult;
use crate::key::ServiceKey;
use crate::registration::{erase, AnyArc, Factory};
use crate::traits::Resolver;

/// A type the container can construct.
///
/// # Examples
///
/// ```rust
/// use ioc_container::{Container, Inject, Resolver, ReuseType, ServiceKey};
/// use std::sync::Arc;
///
/// struct Config { name: &'static str }
/// struct Greeter { config: Arc<Config>, plugins: Vec<Arc<Config>> }
///
/// impl Inject for Greeter {
///     type Dependencies = (Arc<Config>, Vec<Arc<Config>>);
///     fn inject((config, plugins): Self::Dependencies) -> Self {
///         Greeter { config, plugins }
///     }
/// }
///
/// let container = Container::new();
/// container.register_instance(Arc::new(Config { name: "main" }), ServiceKey::NONE);
/// container.register::<Greeter, Greeter>(ReuseType::Transient, ServiceKey::NONE);
///
/// let greeter = container.resolve::<Greeter>().unwrap();
/// assert_eq!(greeter.config.name, "main");
/// assert_eq!(greeter.plugins.len(), 1);
/// ```
pub trait Inject: Send + Sync + Sized + 'static {
    type Dependencies: Dependencies;

    fn inject(dependencies: Self::Dependencies) -> Self;
}

/// One constructor parameter.
pub trait Dependency: Sized {
    fn resolve(ctx: &ResolverContext<'_>) -> DiResult<Self>;
}

impl<C> Dependency for Arc<C>
where
    C: ?Sized + Send + Sync + 'static,
{
    fn resolve(ctx: &ResolverContext<'_>) -> DiResult<Self> {
        ctx.resolve::<C>()
    }
}

impl<C> Dependency for Option<Arc<C>>
where
    C: ?Sized + Send + Sync + 'static,
{
    fn resolve(ctx: &ResolverContext<'_>) -> DiResult<Self> {
        ctx.try_resolve::<C>(ServiceKey::NONE)
    }
}

impl<C> Dependency for Vec<Arc<C>>
where
    C: ?Sized + Send + Sync + 'static,
{
    fn resolve(ctx: &ResolverContext<'_>) -> DiResult<Self> {
        ctx.resolve_all::<C>(ServiceKey::NONE)
    }
}

/// Names the string key a [`Keyed`] parameter resolves under.
pub trait KeyName: 'static {
    const KEY: &'static str;
}

/// A parameter resolved under a fixed string key.
///
/// ```rust
/// use ioc_container::{Container, Inject, KeyName, Keyed, Resolver, ReuseType, ServiceKey};
/// use std::sync::Arc;
///
/// struct Primary;
/// impl KeyName for Primary {
///     const KEY: &'static str = "primary";
/// }
///
/// struct Pool(&'static str);
/// struct Repository { pool: Keyed<Pool, Primary> }
///
/// impl Inject for Repository {
///     type Dependencies = (Keyed<Pool, Primary>,);
///     fn inject((pool,): Self::Dependencies) -> Self {
///         Repository { pool }
///     }
/// }
///
/// let container = Container::new();
/// container.register_instance(Arc::new(Pool("main")), "primary");
/// container.register_instance(Arc::new(Pool("replica")), "replica");
/// container.register::<Repository, Repository>(ReuseType::Transient, ServiceKey::NONE);
///
/// assert_eq!(container.resolve::<Repository>().unwrap().pool.0, "main");
/// ```
pub struct Keyed<C: ?Sized, K> {
    inner: Arc<C>,
    _key: PhantomData<fn() -> K>,
}

impl<C: ?Sized, K> Keyed<C, K> {
    pub fn into_inner(self) -> Arc<C> {
        self.inner
    }
}

impl<C: ?Sized, K> Deref for Keyed<C, K> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.inner
    }
}

impl<C: ?Sized, K> Clone for Keyed<C, K> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _key: PhantomData,
        }
    }
}

impl<C: ?Sized, K: KeyName> fmt::Debug for Keyed<C, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keyed")
            .field("contract", &std::any::type_name::<C>())
            .field("key", &K::KEY)
            .finish()
    }
}

impl<C, K> Dependency for Keyed<C, K>
where
    C: ?Sized + Send + Sync + 'static,
    K: KeyName,
{
    fn resolve(ctx: &ResolverContext<'_>) -> DiResult<Self> {
        Ok(Self {
            inner: ctx.resolve_keyed::<C>(K::KEY)?,
            _key: PhantomData,
        })
    }
}

/// The full parameter list, resolved left to right.
pub trait Dependencies: Sized {
    fn resolve(ctx: &ResolverContext<'_>) -> DiResult<Self>;
}

macro_rules! tuple_dependencies {
    ($($dep:ident),*) => {
        impl<$($dep: Dependency),*> Dependencies for ($($dep,)*) {
            #[allow(unused_variables)]
            fn resolve(ctx: &ResolverContext<'_>) -> DiResult<Self> {
                Ok(($(<$dep as Dependency>::resolve(ctx)?,)*))
            }
        }
    };
}

tuple_dependencies!();
tuple_dependencies!(A);
tuple_dependencies!(A, B);
tuple_dependencies!(A, B, C);
tuple_dependencies!(A, B, C, D);
tuple_dependencies!(A, B, C, D, E);
tuple_dependencies!(A, B, C, D, E, F);
tuple_dependencies!(A, B, C, D, E, F, G);
tuple_dependencies!(A, B, C, D, E, F, G, H);

/// The constructor-injecting factory for `T`.
pub(crate) fn build_factory<T: Inject>() -> Factory {
    Arc::new(|ctx: &ResolverContext<'_>| -> DiResult<AnyArc> {
        let dependencies = <T::Dependencies as Dependencies>::resolve(ctx)?;
        Ok(erase(Arc::new(T::inject(dependencies))))
    })
}
