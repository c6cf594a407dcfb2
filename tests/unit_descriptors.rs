/// Unit tests for ServiceDescriptor methods

use ioc_container::{Container, Contract, ReuseType, ServiceDescriptor, ServiceKey};
use std::sync::Arc;

trait Logger: Send + Sync {}
struct ConsoleLogger;
impl Logger for ConsoleLogger {}

fn descriptor(key: ServiceKey) -> ServiceDescriptor {
    ServiceDescriptor {
        contract: Contract::of::<String>(),
        key,
        reuse: ReuseType::Singleton,
        ordinal: 0,
        implementation: Contract::of::<String>(),
    }
}

#[test]
fn test_service_descriptor_service_name_unnamed() {
    let descriptor = descriptor(ServiceKey::NONE);
    assert_eq!(descriptor.service_name(), None);
    assert!(!descriptor.is_keyed());
}

#[test]
fn test_service_descriptor_service_name_named() {
    let descriptor = descriptor(ServiceKey::from("database_port"));
    assert_eq!(descriptor.service_name(), Some("database_port"));
    assert!(descriptor.is_keyed());
}

#[test]
fn test_service_descriptor_integer_key_has_no_name() {
    let descriptor = descriptor(ServiceKey::from(5u32));
    assert_eq!(descriptor.service_name(), None);
    assert!(descriptor.is_keyed());
}

#[test]
fn test_service_descriptor_names() {
    let descriptor = descriptor(ServiceKey::NONE);
    assert_eq!(descriptor.type_name(), std::any::type_name::<String>());
    assert_eq!(descriptor.implementation_name(), std::any::type_name::<String>());
}

#[test]
fn test_descriptors_reflect_registrations() {
    let container = Container::new();
    container.register_instance::<dyn Logger>(Arc::new(ConsoleLogger), ServiceKey::NONE);
    container.register_delegate::<u32, _>(|_| Ok(Arc::new(1)), ReuseType::Transient, "port");

    let descriptors = container.descriptors();
    assert_eq!(descriptors.len(), 2);

    assert_eq!(descriptors[0].contract, Contract::of::<dyn Logger>());
    assert_eq!(descriptors[0].reuse, ReuseType::Singleton);
    assert!(!descriptors[0].is_keyed());

    assert_eq!(descriptors[1].contract, Contract::of::<u32>());
    assert_eq!(descriptors[1].reuse, ReuseType::Transient);
    assert_eq!(descriptors[1].service_name(), Some("port"));
    assert!(descriptors[0].ordinal < descriptors[1].ordinal);
}

#[test]
fn test_descriptors_survive_unregister() {
    let container = Container::new();
    container.register_instance(Arc::new(1u8), ServiceKey::NONE);
    let snapshot = container.descriptors();
    container.unregister_all();
    assert_eq!(snapshot.len(), 1);
    assert!(container.descriptors().is_empty());
}
