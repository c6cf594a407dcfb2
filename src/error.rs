//! Error types for the IoC container.

use std::borrow::Borrow;

use thiserror::Error;

use crate::key::ServiceKey;

/// Container errors
///
/// Represents the failure conditions that can occur while resolving services
/// or while pushing and popping thread-scoped overrides.
///
/// # Examples
///
/// ```rust
/// use ioc_container::{Container, DiError, Resolver};
///
/// trait Mailer: Send + Sync {}
///
/// let container = Container::new();
/// match container.resolve::<dyn Mailer>() {
///     Err(DiError::Unresolved { count, .. }) => assert_eq!(count, 0),
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, Clone, Error)]
pub enum DiError {
    /// The bucket for `(contract, key)` did not hold exactly one registration.
    ///
    /// `count == 0` means nothing is registered, `count > 1` means the
    /// request is ambiguous. Both are the same kind of failure.
    #[error("{} registered to type {contract} and service key {key}", unresolved_reason(.count))]
    Unresolved {
        contract: &'static str,
        key: ServiceKey,
        count: usize,
    },
    /// Type downcast failed
    #[error("Type mismatch for: {0}")]
    TypeMismatch(&'static str),
    /// An explicit contract list named a contract the implementation does not declare
    #[error("{implementation} does not implement {contract}")]
    NotImplemented {
        implementation: &'static str,
        contract: &'static str,
    },
    /// Circular dependency detected (includes path)
    #[error("Circular dependency: {}", join_path(.0))]
    Circular(Vec<&'static str>),
    /// Maximum recursion depth exceeded
    #[error("Max depth {0} exceeded")]
    DepthExceeded(usize),
    /// Popped an override while none was pushed on this thread
    #[error("no container override is active on this thread")]
    OverrideNotActive,
    /// Popped an override that is not the innermost one
    #[error("container override popped out of order: expected depth {expected}, found {actual}")]
    OverrideOutOfOrder { expected: usize, actual: usize },
}

fn unresolved_reason(count: impl Borrow<usize>) -> &'static str {
    if *count.borrow() == 0 {
        "no factory"
    } else {
        "more than one factory"
    }
}

fn join_path(path: &[&'static str]) -> String {
    path.join(" -> ")
}

impl DiError {
    /// Whether this is a resolution failure (missing or ambiguous registration).
    pub fn is_unresolved(&self) -> bool {
        matches!(self, DiError::Unresolved { .. })
    }
}

/// Result type for container operations
///
/// A convenience alias for `Result<T, DiError>` used throughout the crate.
///
/// # Examples
///
/// ```rust
/// use ioc_container::{DiError, DiResult};
///
/// fn failing_operation() -> DiResult<()> {
///     Err(DiError::DepthExceeded(8))
/// }
///
/// assert!(failing_operation().is_err());
/// ```
pub type DiResult<T> = Result<T, DiError>;
