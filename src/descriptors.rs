//! Service descriptors for introspection and diagnostics.

use crate::key::{Contract, ServiceKey};
use crate::registration::Registration;
use crate::reuse::ReuseType;

/// Service descriptor for introspection and diagnostics
///
/// A detached snapshot of one registration. Holding descriptors keeps no
/// factory or instance alive.
///
/// # Examples
///
/// ```rust
/// use ioc_container::{Container, ReuseType, ServiceKey};
/// use std::sync::Arc;
///
/// trait Logger: Send + Sync {}
/// struct ConsoleLogger;
/// impl Logger for ConsoleLogger {}
///
/// let container = Container::new();
/// container.register_instance::<dyn Logger>(Arc::new(ConsoleLogger), ServiceKey::NONE);
/// container.register_delegate::<u32, _>(|_| Ok(Arc::new(7)), ReuseType::Transient, "answer");
///
/// let descriptors = container.descriptors();
/// assert_eq!(descriptors.len(), 2);
/// assert!(descriptors[0].type_name().contains("Logger"));
/// assert_eq!(descriptors[0].reuse, ReuseType::Singleton);
/// assert_eq!(descriptors[1].service_name(), Some("answer"));
/// assert!(descriptors[0].ordinal < descriptors[1].ordinal);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    /// The contract callers resolve
    pub contract: Contract,
    /// The service key of the bucket
    pub key: ServiceKey,
    pub reuse: ReuseType,
    /// Insertion ordinal
    pub ordinal: u64,
    /// The type the factory builds
    pub implementation: Contract,
}

impl ServiceDescriptor {
    pub(crate) fn from_registration(registration: &Registration) -> Self {
        Self {
            contract: registration.contract(),
            key: registration.key().clone(),
            reuse: registration.reuse(),
            ordinal: registration.ordinal(),
            implementation: registration.implementation(),
        }
    }

    /// Contract type name.
    pub fn type_name(&self) -> &'static str {
        self.contract.name()
    }

    /// The key, if it is a string.
    pub fn service_name(&self) -> Option<&str> {
        self.key.as_str()
    }

    pub fn is_keyed(&self) -> bool {
        !self.key.is_none()
    }

    pub fn implementation_name(&self) -> &'static str {
        self.implementation.name()
    }
}
