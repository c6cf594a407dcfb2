//! Core traits for the IoC container.

mod resolver;

pub use resolver::{ResolveMany, Resolver, ResolverCore};
