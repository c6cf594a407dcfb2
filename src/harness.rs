//! Isolated test execution on top of the override stack.
//!
//! Each test body runs inside its own override, so the services it registers
//! or replaces are invisible to tests running concurrently on other threads
//! and are discarded when the body returns, fails or panics. Outcomes are
//! values: a body returns `Err(TestSignal::Skipped(..))` to skip rather than
//! unwinding.
//!
//! ```rust
//! use ioc_container::harness::{run_isolated, skip, TestOutcome};
//! use ioc_container::{Resolver, ServiceKey};
//! use std::sync::Arc;
//!
//! let outcome = run_isolated("registers a stub", |container| {
//!     container.register_instance(Arc::new(42u32), ServiceKey::NONE);
//!     assert_eq!(*container.resolve::<u32>()?, 42);
//!     Ok(())
//! });
//! assert_eq!(outcome, TestOutcome::Passed);
//!
//! let outcome = run_isolated("not on this platform", |_| skip("needs a database"));
//! assert_eq!(outcome, TestOutcome::Skipped("needs a database".into()));
//! ```

use std::any::Any;
use std::collections::VecDeque;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use parking_lot::Mutex;

use crate::ambient;
use crate::container::Container;
use crate::error::DiError;

/// How a single test ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestOutcome {
    Passed,
    Failed(String),
    Skipped(String),
}

impl TestOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, TestOutcome::Passed)
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestOutcome::Passed => f.write_str("passed"),
            TestOutcome::Failed(reason) => write!(f, "failed: {}", reason),
            TestOutcome::Skipped(reason) => write!(f, "skipped: {}", reason),
        }
    }
}

/// Early exit from a test body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestSignal {
    Failed(String),
    Skipped(String),
}

impl From<DiError> for TestSignal {
    fn from(err: DiError) -> Self {
        TestSignal::Failed(err.to_string())
    }
}

pub type TestResult = Result<(), TestSignal>;

pub fn skip(reason: impl Into<String>) -> TestResult {
    Err(TestSignal::Skipped(reason.into()))
}

pub fn fail(reason: impl Into<String>) -> TestResult {
    Err(TestSignal::Failed(reason.into()))
}

/// Runs `body` against a fresh override of this thread's current container.
///
/// The override is released before this returns, whatever the body did.
/// A panic becomes [`TestOutcome::Failed`] carrying the panic message; an
/// override the body pushed and leaked also fails the test.
pub fn run_isolated<F>(name: &str, body: F) -> TestOutcome
where
    F: FnOnce(&Container) -> TestResult,
{
    let span = tracing::info_span!("test", name);
    let _entered = span.enter();

    let guard = ambient::override_ioc();
    let result = panic::catch_unwind(AssertUnwindSafe(|| body(guard.container())));
    let released = guard.pop_or_unwind();

    let outcome = match (result, released) {
        (Err(payload), _) => TestOutcome::Failed(panic_message(payload.as_ref())),
        (Ok(_), Err(err)) => TestOutcome::Failed(format!("override leaked by test body: {}", err)),
        (Ok(Ok(())), Ok(())) => TestOutcome::Passed,
        (Ok(Err(TestSignal::Failed(reason))), Ok(())) => TestOutcome::Failed(reason),
        (Ok(Err(TestSignal::Skipped(reason))), Ok(())) => TestOutcome::Skipped(reason),
    };
    tracing::info!(%outcome, "test finished");
    outcome
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "test panicked".to_string()
    }
}

/// A named test body for [`run_parallel`].
pub struct TestCase {
    name: String,
    body: Box<dyn FnOnce(&Container) -> TestResult + Send>,
}

impl TestCase {
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: FnOnce(&Container) -> TestResult + Send + 'static,
    {
        Self {
            name: name.into(),
            body: Box::new(body),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase").field("name", &self.name).finish()
    }
}

/// Outcomes of a [`run_parallel`] call, in the order the cases were given.
#[derive(Debug, Clone, Default)]
pub struct TestReport {
    pub results: Vec<(String, TestOutcome)>,
}

impl TestReport {
    pub fn passed(&self) -> usize {
        self.count(|o| matches!(o, TestOutcome::Passed))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, TestOutcome::Failed(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, TestOutcome::Skipped(_)))
    }

    /// No case failed.
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn outcome(&self, name: &str) -> Option<&TestOutcome> {
        self.results
            .iter()
            .find(|(case, _)| case == name)
            .map(|(_, outcome)| outcome)
    }

    fn count(&self, pred: impl Fn(&TestOutcome) -> bool) -> usize {
        self.results.iter().filter(|(_, o)| pred(o)).count()
    }
}

/// Runs every case on up to `workers` threads, each case in its own override.
///
/// Worker threads start from the base container.
pub fn run_parallel(cases: Vec<TestCase>, workers: usize) -> TestReport {
    let total = cases.len();
    let workers = workers.clamp(1, total.max(1));
    let queue = Mutex::new(cases.into_iter().enumerate().collect::<VecDeque<_>>());
    let finished = Mutex::new(Vec::with_capacity(total));

    std::thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| loop {
                let next = queue.lock().pop_front();
                let Some((index, case)) = next else {
                    break;
                };
                let outcome = run_isolated(&case.name, case.body);
                finished.lock().push((index, case.name, outcome));
            });
        }
    });

    let mut finished = finished.into_inner();
    finished.sort_by_key(|(index, _, _)| *index);
    let report = TestReport {
        results: finished
            .into_iter()
            .map(|(_, name, outcome)| (name, outcome))
            .collect(),
    };
    tracing::info!(
        passed = report.passed(),
        failed = report.failed(),
        skipped = report.skipped(),
        "test run finished"
    );
    report
}
