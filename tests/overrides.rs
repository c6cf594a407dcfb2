/// Thread-scoped override tests
///
/// Overrides live in a thread-local stack, so most tests here only touch
/// their own thread's view. Tests that register into the shared base
/// container are serialized.
use ioc_container::{ambient, DiError, Resolver, ServiceKey};
use serial_test::serial;
use std::sync::{Arc, Barrier};
use std::thread;

#[derive(Debug)]
struct Clock(&'static str);

fn clock() -> Option<&'static str> {
    ambient::current()
        .try_resolve::<Clock>(ServiceKey::NONE)
        .unwrap()
        .map(|c| c.0)
}

#[test]
fn test_nested_overrides_restore_in_order() {
    assert_eq!(ambient::override_depth(), 0);
    {
        let outer = ambient::override_ioc();
        outer.container().register_instance(Arc::new(Clock("outer")), ServiceKey::NONE);
        assert_eq!(clock(), Some("outer"));
        {
            let inner = ambient::override_ioc();
            assert_eq!(inner.depth(), 2);
            // the inner clone starts with everything the outer one had
            assert_eq!(clock(), Some("outer"));
            inner.container().unregister::<Clock>(ServiceKey::NONE);
            inner.container().register_instance(Arc::new(Clock("inner")), ServiceKey::NONE);
            assert_eq!(clock(), Some("inner"));
        }
        assert_eq!(clock(), Some("outer"));
        assert_eq!(outer.container().count::<Clock>(ServiceKey::NONE), 1);
    }
    assert_eq!(ambient::override_depth(), 0);
    assert_eq!(clock(), None);
}

#[test]
fn test_override_is_invisible_to_other_threads() {
    let guard = ambient::override_ioc();
    guard.container().register_instance(Arc::new(Clock("private")), ServiceKey::NONE);

    let seen_elsewhere = thread::spawn(|| {
        (
            ambient::override_depth(),
            ambient::current().try_resolve::<Clock>(ServiceKey::NONE).unwrap().is_some(),
        )
    })
    .join()
    .unwrap();

    assert_eq!(seen_elsewhere, (0, false));
    assert_eq!(clock(), Some("private"));
}

#[test]
fn test_threads_override_independently() {
    let barrier = Arc::new(Barrier::new(4));
    let handles: Vec<_> = ["a", "b", "c", "d"]
        .into_iter()
        .map(|name| {
            let barrier = barrier.clone();
            thread::spawn(move || {
                let guard = ambient::override_ioc();
                guard.container().register_instance(Arc::new(Clock(name)), ServiceKey::NONE);
                barrier.wait();
                let seen = clock();
                drop(guard);
                (name, seen, clock())
            })
        })
        .collect();

    for handle in handles {
        let (name, during, after) = handle.join().unwrap();
        assert_eq!(during, Some(name));
        assert_eq!(after, None);
    }
}

#[test]
fn test_with_override_releases_on_return() {
    let seen = ambient::with_override(|container| {
        container.register_instance(Arc::new(Clock("scoped")), ServiceKey::NONE);
        assert_eq!(ambient::override_depth(), 1);
        clock()
    });
    assert_eq!(seen, Some("scoped"));
    assert_eq!(ambient::override_depth(), 0);
    assert_eq!(clock(), None);
}

#[test]
fn test_with_override_releases_on_panic() {
    let result = std::panic::catch_unwind(|| {
        ambient::with_override(|container| {
            container.register_instance(Arc::new(Clock("doomed")), ServiceKey::NONE);
            panic!("body failed");
        })
    });
    assert!(result.is_err());
    assert_eq!(ambient::override_depth(), 0);
    assert_eq!(clock(), None);
}

#[test]
fn test_explicit_pop() {
    let guard = ambient::override_ioc();
    guard.container().register_instance(Arc::new(Clock("popped")), ServiceKey::NONE);
    guard.pop().unwrap();
    assert_eq!(ambient::override_depth(), 0);
    assert_eq!(clock(), None);
}

#[test]
fn test_pop_out_of_order_reports_depths() {
    let outer = ambient::override_ioc();
    let inner = ambient::override_ioc();
    let outer = match outer.pop() {
        Err((guard, DiError::OverrideOutOfOrder { expected, actual })) => {
            assert_eq!(expected, 2);
            assert_eq!(actual, 1);
            guard
        }
        other => panic!("unexpected {:?}", other),
    };
    // the failed pop left both frames in place
    assert_eq!(ambient::override_depth(), 2);
    inner.pop().unwrap();
    assert_eq!(ambient::override_depth(), 1);
    outer.pop().unwrap();
    assert_eq!(ambient::override_depth(), 0);
}

#[test]
fn test_failed_pop_does_not_leak_registrations() {
    let outer = ambient::override_ioc();
    outer.container().register_instance(Arc::new(Clock("leaked")), ServiceKey::NONE);
    let inner = ambient::override_ioc();

    let (outer, _) = outer.pop().unwrap_err();
    inner.pop().unwrap();
    assert_eq!(clock(), Some("leaked"));
    drop(outer);

    assert_eq!(ambient::override_depth(), 0);
    assert_eq!(clock(), None);
}

#[test]
#[should_panic(expected = "popped out of order")]
fn test_drop_out_of_order_panics() {
    let outer = ambient::override_ioc();
    let _inner = ambient::override_ioc();
    drop(outer);
}

#[test]
fn test_unwinding_through_guards_restores_stack() {
    let result = thread::spawn(|| {
        let unwound = std::panic::catch_unwind(|| {
            let _outer = ambient::override_ioc();
            let _inner = ambient::override_ioc();
            panic!("boom");
        });
        (unwound.is_err(), ambient::override_depth())
    })
    .join()
    .unwrap();
    assert_eq!(result, (true, 0));
}

#[test]
#[serial]
fn test_override_starts_from_base() {
    let base = ambient::base();
    base.register_instance(Arc::new(Clock("base")), "serial-base");
    {
        let guard = ambient::override_ioc();
        assert!(!Arc::ptr_eq(guard.container(), &base));
        assert_eq!(guard.container().resolve_keyed::<Clock>("serial-base").unwrap().0, "base");
        guard.container().unregister::<Clock>("serial-base");
        assert!(base.resolve_keyed::<Clock>("serial-base").is_ok());
    }
    assert!(Arc::ptr_eq(&ambient::current(), &base));
    base.unregister::<Clock>("serial-base");
}

#[test]
#[serial]
fn test_override_does_not_see_later_base_registrations() {
    let base = ambient::base();
    let guard = ambient::override_ioc();
    base.register_instance(Arc::new(Clock("late")), "serial-late");
    assert!(guard
        .container()
        .try_resolve::<Clock>("serial-late")
        .unwrap()
        .is_none());
    drop(guard);
    assert!(ambient::current().resolve_keyed::<Clock>("serial-late").is_ok());
    base.unregister::<Clock>("serial-late");
}
