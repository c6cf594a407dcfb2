//! Declarative export metadata and the scanner that turns it into registrations.
//!
//! A type describes itself once through [`Exported::describe`]: which contracts
//! it can be used as (itself, the interfaces it implements, the ancestors it
//! stands in for) and how it wants to be exported. Two marker shapes exist:
//!
//! - [`ExportMany`]: export under every contract the type declares, minus an
//!   exclusion list and minus non-public contracts unless allowed;
//! - [`Export`]: export under exactly one `(key, contract)` pair. Repeatable.
//!
//! [`scan`] is a pure function from [`TypeMetadata`] to [`RegistrationIntent`]s.
//! [`ExportedType`] bundles that metadata with the upcasts and the constructor
//! the container needs to act on the intents.

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::inject::{build_factory, Inject};
use crate::key::{Contract, ServiceKey};
use crate::registration::{identity, upcast_via, Factory, Upcast};
use crate::reuse::ReuseType;

/// `Self` can be handed out as a `C`.
///
/// Every type implements it for itself. Trait-object contracts are declared
/// with the [`implements!`](crate::implements) macro or by hand:
///
/// ```rust
/// use ioc_container::Implements;
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// struct English;
/// impl Greeter for English {
///     fn greet(&self) -> String { "hello".into() }
/// }
///
/// impl Implements<dyn Greeter> for English {
///     fn upcast(this: Arc<Self>) -> Arc<dyn Greeter> { this }
/// }
///
/// let greeter = <English as Implements<dyn Greeter>>::upcast(Arc::new(English));
/// assert_eq!(greeter.greet(), "hello");
/// ```
pub trait Implements<C: ?Sized>: Send + Sync + 'static {
    fn upcast(this: Arc<Self>) -> Arc<C>;
}

impl<T: Send + Sync + 'static> Implements<T> for T {
    #[inline(always)]
    fn upcast(this: Arc<Self>) -> Arc<T> {
        this
    }
}

/// Declares trait-object contracts a type implements.
///
/// ```rust
/// use ioc_container::implements;
///
/// trait Named: Send + Sync {}
/// trait Counted: Send + Sync {}
///
/// struct Widget;
/// impl Named for Widget {}
/// impl Counted for Widget {}
///
/// implements!(Widget: dyn Named, dyn Counted);
/// ```
#[macro_export]
macro_rules! implements {
    ($ty:ty : $($contract:ty),+ $(,)?) => {
        $(
            impl $crate::Implements<$contract> for $ty {
                #[inline(always)]
                fn upcast(this: ::std::sync::Arc<Self>) -> ::std::sync::Arc<$contract> {
                    this
                }
            }
        )+
    };
}

/// How a service type relates to the implementation declaring it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    /// The implementation type itself
    Itself,
    /// An interface (trait) it implements
    Interface,
    /// An ancestor it stands in for, such as an abstract base
    Ancestor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    #[default]
    Public,
    /// Only exported by broad markers that opt in with `non_public`
    NonPublic,
}

/// One contract an implementation declares it can be used as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceTypeInfo {
    pub contract: Contract,
    pub relation: Relation,
    pub visibility: Visibility,
}

/// Broad marker: export under every declared contract.
///
/// ```rust
/// use ioc_container::ExportMany;
///
/// trait Other: Send + Sync {}
///
/// let marker = ExportMany::new().keyed("b").except::<dyn Other>();
/// assert_eq!(marker.contract_key, "b".into());
/// assert_eq!(marker.except.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ExportMany {
    pub contract_key: ServiceKey,
    pub except: Vec<Contract>,
    pub non_public: bool,
    pub clear_exists: bool,
}

impl ExportMany {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keyed(mut self, key: impl Into<ServiceKey>) -> Self {
        self.contract_key = key.into();
        self
    }

    /// Leaves `C` out of the exported set.
    pub fn except<C: ?Sized + 'static>(mut self) -> Self {
        self.except.push(Contract::of::<C>());
        self
    }

    /// Includes contracts declared [`Visibility::NonPublic`].
    pub fn non_public(mut self) -> Self {
        self.non_public = true;
        self
    }

    /// Removes the target buckets before adding, replacing what was there.
    pub fn clear_exists(mut self) -> Self {
        self.clear_exists = true;
        self
    }
}

/// Explicit marker: export under one `(key, contract)` pair.
///
/// The contract is filled in by [`TypeDescriptor::export`] or
/// [`TypeDescriptor::export_self`].
#[derive(Debug, Clone, Default)]
pub struct Export {
    pub contract_key: ServiceKey,
    pub clear_exists: bool,
}

impl Export {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keyed(mut self, key: impl Into<ServiceKey>) -> Self {
        self.contract_key = key.into();
        self
    }

    /// Removes the target bucket before adding, replacing what was there.
    pub fn clear_exists(mut self) -> Self {
        self.clear_exists = true;
        self
    }
}

#[derive(Debug, Clone)]
pub enum ExportMarker {
    Many(ExportMany),
    One { marker: Export, contract: Contract },
}

/// Everything the scanner reads about one implementation type.
#[derive(Debug, Clone)]
pub struct TypeMetadata {
    pub implementation: Contract,
    /// The type itself first, then every declared contract in declaration order;
    /// see [`implemented_contracts`] for the exported order
    pub service_types: Vec<ServiceTypeInfo>,
    pub markers: Vec<ExportMarker>,
    /// Applies to every marker; `Transient` unless marked singleton
    pub reuse: ReuseType,
}

impl TypeMetadata {
    /// Metadata that only knows the type itself.
    pub fn new(implementation: Contract) -> Self {
        Self {
            implementation,
            service_types: vec![ServiceTypeInfo {
                contract: implementation,
                relation: Relation::Itself,
                visibility: Visibility::Public,
            }],
            markers: Vec::new(),
            reuse: ReuseType::Transient,
        }
    }

    /// Whether any export marker is present.
    pub fn is_exported(&self) -> bool {
        !self.markers.is_empty()
    }
}

/// One registration the scanner asks for.
///
/// Intents with the same `group` come from the same marker and share one
/// factory, so a singleton resolved through any of them is one instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationIntent {
    pub contract: Contract,
    pub key: ServiceKey,
    pub reuse: ReuseType,
    pub clear_exists: bool,
    pub group: usize,
}

/// Contracts `metadata` declares: interfaces, then the type itself, then
/// ancestors, each group in declaration order. Non-public ones are skipped
/// unless `non_public`.
pub fn implemented_contracts(metadata: &TypeMetadata, non_public: bool) -> Vec<Contract> {
    let mut seen = Vec::with_capacity(metadata.service_types.len());
    for relation in [Relation::Interface, Relation::Itself, Relation::Ancestor] {
        for info in metadata.service_types.iter().filter(|info| info.relation == relation) {
            if info.visibility == Visibility::NonPublic && !non_public {
                continue;
            }
            if !seen.contains(&info.contract) {
                seen.push(info.contract);
            }
        }
    }
    seen
}

/// Translates export markers into registration intents. Performs no mutation.
///
/// ```rust
/// use ioc_container::metadata::{scan, ExportMany, ExportMarker, Relation, ServiceTypeInfo, TypeMetadata, Visibility};
/// use ioc_container::Contract;
///
/// trait Service: Send + Sync {}
/// trait Base: Send + Sync {}
/// trait Other: Send + Sync {}
/// struct Impl;
///
/// let mut metadata = TypeMetadata::new(Contract::of::<Impl>());
/// for (contract, relation) in [
///     (Contract::of::<dyn Service>(), Relation::Interface),
///     (Contract::of::<dyn Other>(), Relation::Interface),
///     (Contract::of::<dyn Base>(), Relation::Ancestor),
/// ] {
///     metadata.service_types.push(ServiceTypeInfo { contract, relation, visibility: Visibility::Public });
/// }
/// metadata.markers.push(ExportMarker::Many(
///     ExportMany::new().keyed("b").except::<Impl>().except::<dyn Other>(),
/// ));
///
/// let contracts: Vec<Contract> = scan(&metadata).into_iter().map(|i| i.contract).collect();
/// assert_eq!(contracts, [Contract::of::<dyn Service>(), Contract::of::<dyn Base>()]);
/// ```
pub fn scan(metadata: &TypeMetadata) -> Vec<RegistrationIntent> {
    let mut intents = Vec::new();
    for (group, marker) in metadata.markers.iter().enumerate() {
        match marker {
            ExportMarker::Many(many) => {
                intents.extend(
                    implemented_contracts(metadata, many.non_public)
                        .into_iter()
                        .filter(|contract| !many.except.contains(contract))
                        .map(|contract| RegistrationIntent {
                            contract,
                            key: many.contract_key.clone(),
                            reuse: metadata.reuse,
                            clear_exists: many.clear_exists,
                            group,
                        }),
                );
            }
            ExportMarker::One { marker, contract } => intents.push(RegistrationIntent {
                contract: *contract,
                key: marker.contract_key.clone(),
                reuse: metadata.reuse,
                clear_exists: marker.clear_exists,
                group,
            }),
        }
    }
    intents
}

/// Builder handed to [`Exported::describe`].
///
/// Declaring a contract requires `T: Implements<C>`, which also records the
/// upcast the container uses to hand a `T` out as a `C`.
pub struct TypeDescriptor<T> {
    metadata: TypeMetadata,
    casts: HashMap<Contract, Upcast>,
    _type: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> TypeDescriptor<T> {
    pub(crate) fn new() -> Self {
        let mut casts = HashMap::new();
        casts.insert(Contract::of::<T>(), identity());
        Self {
            metadata: TypeMetadata::new(Contract::of::<T>()),
            casts,
            _type: PhantomData,
        }
    }

    fn declare<C>(&mut self, relation: Relation, visibility: Visibility) -> &mut Self
    where
        C: ?Sized + Send + Sync + 'static,
        T: Implements<C>,
    {
        let contract = Contract::of::<C>();
        self.casts.entry(contract).or_insert_with(upcast_via::<T, C>);
        self.metadata.service_types.push(ServiceTypeInfo {
            contract,
            relation,
            visibility,
        });
        self
    }

    pub fn interface<C>(&mut self) -> &mut Self
    where
        C: ?Sized + Send + Sync + 'static,
        T: Implements<C>,
    {
        self.declare::<C>(Relation::Interface, Visibility::Public)
    }

    pub fn non_public_interface<C>(&mut self) -> &mut Self
    where
        C: ?Sized + Send + Sync + 'static,
        T: Implements<C>,
    {
        self.declare::<C>(Relation::Interface, Visibility::NonPublic)
    }

    pub fn ancestor<C>(&mut self) -> &mut Self
    where
        C: ?Sized + Send + Sync + 'static,
        T: Implements<C>,
    {
        self.declare::<C>(Relation::Ancestor, Visibility::Public)
    }

    pub fn non_public_ancestor<C>(&mut self) -> &mut Self
    where
        C: ?Sized + Send + Sync + 'static,
        T: Implements<C>,
    {
        self.declare::<C>(Relation::Ancestor, Visibility::NonPublic)
    }

    /// Marks the type itself non-public.
    pub fn non_public(&mut self) -> &mut Self {
        for info in &mut self.metadata.service_types {
            if info.relation == Relation::Itself {
                info.visibility = Visibility::NonPublic;
            }
        }
        self
    }

    pub fn export_many(&mut self, marker: ExportMany) -> &mut Self {
        self.metadata.markers.push(ExportMarker::Many(marker));
        self
    }

    /// Exports under exactly `(marker.contract_key, C)`.
    pub fn export<C>(&mut self, marker: Export) -> &mut Self
    where
        C: ?Sized + Send + Sync + 'static,
        T: Implements<C>,
    {
        let contract = Contract::of::<C>();
        self.casts.entry(contract).or_insert_with(upcast_via::<T, C>);
        self.metadata.markers.push(ExportMarker::One { marker, contract });
        self
    }

    /// Exports under `(marker.contract_key, T)`.
    pub fn export_self(&mut self, marker: Export) -> &mut Self {
        self.export::<T>(marker)
    }

    pub fn singleton(&mut self) -> &mut Self {
        self.reuse(ReuseType::Singleton)
    }

    pub fn reuse(&mut self, reuse: ReuseType) -> &mut Self {
        self.metadata.reuse = reuse;
        self
    }
}

/// A type that carries its own export metadata.
///
/// ```rust
/// use ioc_container::{implements, Container, ExportMany, Exported, ExportedType, Resolver, TypeDescriptor};
///
/// trait Notifier: Send + Sync {}
/// trait Channel: Send + Sync {}
///
/// struct Email;
/// impl Notifier for Email {}
/// impl Channel for Email {}
/// implements!(Email: dyn Notifier, dyn Channel);
///
/// impl ioc_container::Inject for Email {
///     type Dependencies = ();
///     fn inject(_: ()) -> Self { Email }
/// }
///
/// impl Exported for Email {
///     fn describe(d: &mut TypeDescriptor<Self>) {
///         d.interface::<dyn Notifier>()
///             .interface::<dyn Channel>()
///             .export_many(ExportMany::new().keyed("mail").except::<dyn Channel>())
///             .singleton();
///     }
/// }
///
/// let container = Container::new();
/// container.register_exports(&[ExportedType::of::<Email>()]).unwrap();
/// assert!(container.resolve_keyed::<dyn Notifier>("mail").is_ok());
/// assert!(container.try_resolve::<dyn Channel>("mail").unwrap().is_none());
/// ```
pub trait Exported: Inject {
    fn describe(descriptor: &mut TypeDescriptor<Self>);
}

/// Type-erased handle to an [`Exported`] type, or to any injectable type
/// described ad hoc.
#[derive(Clone)]
pub struct ExportedType {
    pub(crate) metadata: TypeMetadata,
    pub(crate) casts: Arc<HashMap<Contract, Upcast>>,
    pub(crate) factory: Factory,
}

impl ExportedType {
    pub fn of<T: Exported>() -> Self {
        Self::describe_with::<T, _>(T::describe)
    }

    /// Describes an injectable type without an [`Exported`] impl.
    pub fn describe_with<T, F>(describe: F) -> Self
    where
        T: Inject,
        F: FnOnce(&mut TypeDescriptor<T>),
    {
        let mut descriptor = TypeDescriptor::<T>::new();
        describe(&mut descriptor);
        Self {
            metadata: descriptor.metadata,
            casts: Arc::new(descriptor.casts),
            factory: build_factory::<T>(),
        }
    }

    pub fn metadata(&self) -> &TypeMetadata {
        &self.metadata
    }

    pub(crate) fn cast(&self, contract: Contract) -> Option<Upcast> {
        self.casts.get(&contract).cloned()
    }
}

impl fmt::Debug for ExportedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportedType")
            .field("implementation", &self.metadata.implementation.name())
            .field("markers", &self.metadata.markers.len())
            .finish()
    }
}
