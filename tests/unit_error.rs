/// Unit tests for DiError and DiResult types

use ioc_container::{DiError, DiResult, ServiceKey};
use std::error::Error;

#[test]
fn test_error_display_unresolved_missing() {
    let error = DiError::Unresolved {
        contract: "app::Mailer",
        key: ServiceKey::NONE,
        count: 0,
    };
    assert_eq!(
        error.to_string(),
        "no factory registered to type app::Mailer and service key <none>"
    );
}

#[test]
fn test_error_display_unresolved_ambiguous() {
    let error = DiError::Unresolved {
        contract: "app::Mailer",
        key: ServiceKey::from("smtp"),
        count: 3,
    };
    assert_eq!(
        error.to_string(),
        "more than one factory registered to type app::Mailer and service key smtp"
    );
}

#[test]
fn test_error_display_integer_key() {
    let error = DiError::Unresolved {
        contract: "u8",
        key: ServiceKey::from(42u32),
        count: 0,
    };
    assert!(error.to_string().ends_with("service key 42"));
}

#[test]
fn test_error_display_type_mismatch() {
    let error = DiError::TypeMismatch("std::string::String");
    assert_eq!(error.to_string(), "Type mismatch for: std::string::String");
}

#[test]
fn test_error_display_not_implemented() {
    let error = DiError::NotImplemented {
        implementation: "app::Smtp",
        contract: "dyn app::Queue",
    };
    assert_eq!(error.to_string(), "app::Smtp does not implement dyn app::Queue");
}

#[test]
fn test_error_display_circular() {
    let error = DiError::Circular(vec!["ServiceA", "ServiceB", "ServiceA"]);
    assert_eq!(error.to_string(), "Circular dependency: ServiceA -> ServiceB -> ServiceA");
}

#[test]
fn test_error_display_depth_exceeded() {
    let error = DiError::DepthExceeded(1024);
    assert_eq!(error.to_string(), "Max depth 1024 exceeded");
}

#[test]
fn test_error_display_overrides() {
    assert_eq!(
        DiError::OverrideNotActive.to_string(),
        "no container override is active on this thread"
    );
    assert_eq!(
        DiError::OverrideOutOfOrder { expected: 3, actual: 1 }.to_string(),
        "container override popped out of order: expected depth 3, found 1"
    );
}

#[test]
fn test_is_unresolved() {
    assert!(DiError::Unresolved {
        contract: "u8",
        key: ServiceKey::NONE,
        count: 2,
    }
    .is_unresolved());
    assert!(!DiError::DepthExceeded(1).is_unresolved());
    assert!(!DiError::Circular(vec![]).is_unresolved());
}

#[test]
fn test_error_trait_and_result_alias() {
    fn fails() -> DiResult<u8> {
        Err(DiError::TypeMismatch("u8"))
    }

    let error = fails().unwrap_err();
    assert!(error.source().is_none());
    let boxed: Box<dyn Error + Send + Sync> = Box::new(error.clone());
    assert_eq!(boxed.to_string(), error.to_string());
}
