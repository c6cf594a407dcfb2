use ioc_container::harness::{fail, run_isolated, run_parallel, skip, TestCase, TestOutcome};
use ioc_container::{ambient, Resolver, ServiceKey};
use std::sync::Arc;

struct Fixture(&'static str);

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn test_registrations_do_not_leak_between_runs() {
    init_tracing();
    let first = run_isolated("registers", |container| {
        container.register_instance(Arc::new(Fixture("first")), ServiceKey::NONE);
        assert_eq!(container.resolve::<Fixture>()?.0, "first");
        Ok(())
    });
    let second = run_isolated("observes", |container| {
        if container.try_resolve::<Fixture>(ServiceKey::NONE)?.is_some() {
            return fail("fixture leaked from an earlier run");
        }
        Ok(())
    });
    assert_eq!(first, TestOutcome::Passed);
    assert_eq!(second, TestOutcome::Passed);
    assert_eq!(ambient::override_depth(), 0);
}

#[test]
fn test_body_sees_its_override_as_current() {
    let outcome = run_isolated("current", |container| {
        container.register_instance(Arc::new(Fixture("mine")), ServiceKey::NONE);
        if ambient::current().resolve::<Fixture>()?.0 != "mine" {
            return fail("ambient container is not the override");
        }
        Ok(())
    });
    assert!(outcome.is_passed());
}

#[test]
fn test_outcome_kinds() {
    assert_eq!(
        run_isolated("fails", |_| fail("bad state")),
        TestOutcome::Failed("bad state".into())
    );
    assert_eq!(
        run_isolated("skips", |_| skip("no network")),
        TestOutcome::Skipped("no network".into())
    );
    let formatted = run_isolated("panics", |_| panic!("value was {}", 3));
    assert_eq!(formatted, TestOutcome::Failed("value was 3".into()));
    assert_eq!(formatted.to_string(), "failed: value was 3");
}

#[test]
fn test_run_inside_existing_override_inherits_it() {
    let guard = ambient::override_ioc();
    guard.container().register_instance(Arc::new(Fixture("outer")), ServiceKey::NONE);

    let outcome = run_isolated("inherits", |container| {
        if container.resolve::<Fixture>()?.0 != "outer" {
            return fail("outer override not visible");
        }
        container.unregister::<Fixture>(ServiceKey::NONE);
        Ok(())
    });

    assert!(outcome.is_passed());
    assert_eq!(guard.container().resolve::<Fixture>().unwrap().0, "outer");
    assert_eq!(ambient::override_depth(), 1);
}

#[test]
fn test_run_parallel_isolates_cases() {
    init_tracing();
    let mut cases: Vec<TestCase> = (0..12)
        .map(|i| {
            TestCase::new(format!("case-{}", i), move |container| {
                container.register_instance(Arc::new(i as u32), ServiceKey::NONE);
                std::thread::yield_now();
                let seen = *container.resolve::<u32>()?;
                if seen != i as u32 {
                    return fail(format!("saw {} instead of {}", seen, i));
                }
                Ok(())
            })
        })
        .collect();
    cases.push(TestCase::new("skipped", |_| skip("not today")));
    cases.push(TestCase::new("failing", |_| fail("expected")));
    assert_eq!(cases[0].name(), "case-0");

    let report = run_parallel(cases, 4);

    assert_eq!(report.results.len(), 14);
    assert_eq!(report.passed(), 12);
    assert_eq!(report.skipped(), 1);
    assert_eq!(report.failed(), 1);
    assert!(!report.is_success());
    assert_eq!(report.results[0].0, "case-0");
    assert_eq!(report.results[13].0, "failing");
    assert_eq!(report.outcome("skipped"), Some(&TestOutcome::Skipped("not today".into())));
    assert_eq!(report.outcome("missing"), None);
}

#[test]
fn test_run_parallel_with_no_cases() {
    let report = run_parallel(Vec::new(), 8);
    assert!(report.results.is_empty());
    assert!(report.is_success());
}
