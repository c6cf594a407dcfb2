//! # ioc-container
//!
//! Inversion-of-control container with keyed buckets, strict single
//! resolution and thread-scoped overrides.
//!
//! ## Features
//!
//! - **Ambiguity is failure**: a single resolve succeeds only when exactly one
//!   registration matches; ask for all of them with `resolve_many`
//! - **Reuse policies**: Transient and Singleton, singletons built exactly once per container
//! - **Service keys**: any comparable value splits a contract into buckets
//! - **Export metadata**: types declare their contracts once and are registered from it
//! - **Constructor injection**: `Arc<C>`, `Option<Arc<C>>`, `Vec<Arc<C>>` and keyed parameters
//! - **Independent clones**: a clone copies registrations, never realized singletons
//! - **Thread-scoped overrides**: per-thread stack of cloned containers, released by guard
//! - **Circular dependency detection**: fails with the full path instead of deadlocking
//!
//! ## Quick Start
//!
//! ```rust
//! use ioc_container::{Container, Inject, Resolver, ReuseType, ServiceKey};
//! use std::sync::Arc;
//!
//! trait Store: Send + Sync {
//!     fn url(&self) -> &str;
//! }
//!
//! struct Database {
//!     connection_string: String,
//! }
//! impl Store for Database {
//!     fn url(&self) -> &str { &self.connection_string }
//! }
//!
//! struct UserService {
//!     store: Arc<dyn Store>,
//! }
//! impl Inject for UserService {
//!     type Dependencies = (Arc<dyn Store>,);
//!     fn inject((store,): Self::Dependencies) -> Self {
//!         UserService { store }
//!     }
//! }
//!
//! let container = Container::new();
//! container.register_instance::<dyn Store>(
//!     Arc::new(Database { connection_string: "postgres://localhost".to_string() }),
//!     ServiceKey::NONE,
//! );
//! container.register::<UserService, UserService>(ReuseType::Singleton, ServiceKey::NONE);
//!
//! let users = container.resolve::<UserService>().unwrap();
//! assert_eq!(users.store.url(), "postgres://localhost");
//! assert!(Arc::ptr_eq(&users, &container.resolve::<UserService>().unwrap()));
//! ```
//!
//! ## Declared exports
//!
//! ```rust
//! use ioc_container::{implements, Container, ExportMany, Exported, ExportedType, Inject, Resolver, TypeDescriptor};
//!
//! trait Service: Send + Sync {}
//! trait Base: Send + Sync {}
//! trait Other: Send + Sync {}
//!
//! struct Impl;
//! impl Service for Impl {}
//! impl Base for Impl {}
//! impl Other for Impl {}
//! implements!(Impl: dyn Service, dyn Base, dyn Other);
//!
//! impl Inject for Impl {
//!     type Dependencies = ();
//!     fn inject(_: ()) -> Self { Impl }
//! }
//!
//! impl Exported for Impl {
//!     fn describe(d: &mut TypeDescriptor<Self>) {
//!         d.interface::<dyn Service>()
//!             .interface::<dyn Other>()
//!             .ancestor::<dyn Base>()
//!             .export_many(ExportMany::new().keyed("b").except::<dyn Other>());
//!     }
//! }
//!
//! let container = Container::new();
//! container.register_exports(&[ExportedType::of::<Impl>()]).unwrap();
//! assert!(container.resolve_keyed::<dyn Service>("b").is_ok());
//! assert!(container.resolve_keyed::<dyn Base>("b").is_ok());
//! assert!(container.try_resolve::<dyn Other>("b").unwrap().is_none());
//! ```
//!
//! ## Overrides
//!
//! [`ambient::current`] is the container the calling thread sees.
//! [`ambient::override_ioc`] swaps in a private clone until the guard drops;
//! see the [`ambient`] module.

// Module declarations
pub mod ambient;
pub mod config;
pub mod container;
pub mod descriptors;
pub mod error;
pub mod harness;
pub mod inject;
pub mod key;
pub mod metadata;
pub mod reuse;
pub mod traits;

mod internal;
mod registration;

pub use ambient::OverrideGuard;
pub use config::ContainerOptions;
pub use container::{Container, ResolverContext};
pub use descriptors::ServiceDescriptor;
pub use error::{DiError, DiResult};
pub use inject::{Dependencies, Dependency, Inject, KeyName, Keyed};
pub use key::{Contract, ServiceKey};
pub use metadata::{Export, ExportMany, Exported, ExportedType, Implements, TypeDescriptor};
pub use registration::Registration;
pub use reuse::{IfUnresolved, ReuseType};
pub use traits::{ResolveMany, Resolver, ResolverCore};
