//! Test suite runner.
//!
//! A [`TestSuite`] is a named list of test cases sharing one fixture state
//! `S`. The suite runs an optional global setup once, then for every test
//! its setup hook, the body and its teardown hook, and finally the global
//! teardown. Each body runs with panics caught, so a failed expectation on a
//! mock fails that test only.
//!
//! ```
//! use comms_mock::bus::{Handle, I2cPort};
//! use comms_mock::error::HarnessError;
//! use comms_mock::i2c::{Mock as I2cMock, Transaction as I2cTransaction};
//! use comms_mock::runner::{TestCase, TestStatus, TestSuite};
//!
//! #[derive(Default)]
//! struct Fixture {
//!     i2c: Option<I2cMock>,
//! }
//!
//! fn setup(f: &mut Fixture) -> Result<(), HarnessError> {
//!     f.i2c = Some(I2cMock::new(&[]));
//!     Ok(())
//! }
//!
//! fn teardown(f: &mut Fixture) -> Result<(), HarnessError> {
//!     if let Some(mut i2c) = f.i2c.take() {
//!         i2c.done();
//!     }
//!     Ok(())
//! }
//!
//! fn reset_command(f: &mut Fixture) {
//!     let i2c = f.i2c.as_mut().unwrap();
//!     i2c.update_expectations(&[I2cTransaction::write(0x01, vec![])]);
//!     i2c.write(Handle(1), 0x01, &[]).unwrap();
//! }
//!
//! fn wrong_command(f: &mut Fixture) {
//!     let i2c = f.i2c.as_mut().unwrap();
//!     i2c.update_expectations(&[I2cTransaction::write(0x01, vec![])]);
//!     i2c.write(Handle(1), 0x02, &[]).unwrap();
//! }
//!
//! let result = TestSuite::new("example")
//!     .test(TestCase::new("reset_command", reset_command).fixture(setup, teardown))
//!     .test(TestCase::new("wrong_command", wrong_command).fixture(setup, teardown))
//!     .run();
//!
//! assert_eq!(result.passed, 1);
//! assert!(matches!(result.results[1].status, TestStatus::Failed(_)));
//! assert_eq!(result.exit_code(), 1);
//! ```

use std::{
    any::Any,
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::Once,
    time::{Duration, Instant},
};

use crate::error::HarnessError;

/// A setup or teardown hook.
pub type Hook<S> = fn(&mut S) -> Result<(), HarnessError>;

/// A test body. Fails by panicking.
pub type Body<S> = fn(&mut S);

/// Panic payload used by [`skip`].
#[derive(Debug)]
struct Skip(String);

/// Stop the running test and report it as skipped.
///
/// Only meaningful inside a test body run by a [`TestSuite`].
pub fn skip(reason: impl Into<String>) -> ! {
    panic::panic_any(Skip(reason.into()))
}

static SKIP_HOOK: Once = Once::new();

/// Keep [`skip`] out of the panic output.
///
/// Wraps the panic hook installed at the time of the first suite run. The
/// hook is process wide and suites may run on several threads at once, so
/// it stays installed instead of being swapped per run.
fn silence_skips() {
    SKIP_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if info.payload().downcast_ref::<Skip>().is_none() {
                previous(info);
            }
        }));
    });
}

/// Outcome of a single test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestStatus {
    /// The body returned normally
    Passed,
    /// The body panicked, e.g. on a mismatched expectation
    Failed(String),
    /// The body called [`skip`]
    Skipped(String),
    /// A setup or teardown hook failed
    Error(String),
}

/// Result of a single test.
#[derive(Debug, Clone)]
pub struct TestResult {
    /// Test name
    pub name: String,
    /// Outcome
    pub status: TestStatus,
    /// Wall time spent in setup, body and teardown
    pub duration: Duration,
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            TestStatus::Passed => write!(f, "[       OK ] {}", self.name)?,
            TestStatus::Failed(msg) => write!(f, "[  FAILED  ] {}: {}", self.name, msg)?,
            TestStatus::Skipped(msg) => write!(f, "[  SKIPPED ] {}: {}", self.name, msg)?,
            TestStatus::Error(msg) => write!(f, "[  ERROR   ] {}: {}", self.name, msg)?,
        }
        write!(f, " ({:?})", self.duration)
    }
}

/// Result of a whole suite.
#[derive(Debug, Clone)]
pub struct TestSuiteResult {
    /// Suite name
    pub name: String,
    /// Per-test results, in execution order
    pub results: Vec<TestResult>,
    /// Number of passed tests
    pub passed: usize,
    /// Number of failed tests
    pub failed: usize,
    /// Number of skipped tests
    pub skipped: usize,
    /// Number of tests whose hooks failed
    pub errors: usize,
    /// Set when the global teardown failed
    pub teardown_error: Option<String>,
    /// Wall time of the whole run
    pub total_duration: Duration,
}

impl TestSuiteResult {
    fn new(name: &str, results: Vec<TestResult>, total_duration: Duration) -> Self {
        let count = |pred: fn(&TestStatus) -> bool| results.iter().filter(|r| pred(&r.status)).count();
        TestSuiteResult {
            name: name.to_string(),
            passed: count(|s| matches!(s, TestStatus::Passed)),
            failed: count(|s| matches!(s, TestStatus::Failed(_))),
            skipped: count(|s| matches!(s, TestStatus::Skipped(_))),
            errors: count(|s| matches!(s, TestStatus::Error(_))),
            results,
            teardown_error: None,
            total_duration,
        }
    }

    /// Number of tests in the suite.
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// True if no test failed or errored and the global teardown succeeded.
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.errors == 0 && self.teardown_error.is_none()
    }

    /// Process exit code: the number of failed and errored tests.
    pub fn exit_code(&self) -> i32 {
        let bad = self.failed + self.errors + usize::from(self.teardown_error.is_some());
        i32::try_from(bad).unwrap_or(i32::MAX)
    }
}

impl fmt::Display for TestSuiteResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[==========] {}: {} test(s) run", self.name, self.total())?;
        for result in &self.results {
            writeln!(f, "{}", result)?;
        }
        if let Some(e) = &self.teardown_error {
            writeln!(f, "[  ERROR   ] global teardown: {}", e)?;
        }
        write!(
            f,
            "[==========] passed: {}, failed: {}, skipped: {}, errors: {} ({:?})",
            self.passed, self.failed, self.skipped, self.errors, self.total_duration
        )
    }
}

/// A named test body with optional per-test hooks.
pub struct TestCase<S> {
    name: String,
    body: Body<S>,
    setup: Option<Hook<S>>,
    teardown: Option<Hook<S>>,
}

impl<S> TestCase<S> {
    /// Create a test case without hooks.
    pub fn new(name: impl Into<String>, body: Body<S>) -> Self {
        TestCase {
            name: name.into(),
            body,
            setup: None,
            teardown: None,
        }
    }

    /// Run `setup` before and `teardown` after the body.
    pub fn fixture(mut self, setup: Hook<S>, teardown: Hook<S>) -> Self {
        self.setup = Some(setup);
        self.teardown = Some(teardown);
        self
    }

    /// Run `setup` before the body.
    pub fn setup(mut self, setup: Hook<S>) -> Self {
        self.setup = Some(setup);
        self
    }

    /// Run `teardown` after the body.
    pub fn teardown(mut self, teardown: Hook<S>) -> Self {
        self.teardown = Some(teardown);
        self
    }

    /// Test name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A list of test cases sharing fixture state `S`.
pub struct TestSuite<S> {
    name: String,
    tests: Vec<TestCase<S>>,
    global_setup: Option<Hook<S>>,
    global_teardown: Option<Hook<S>>,
}

impl<S: Default> TestSuite<S> {
    /// Create an empty suite.
    pub fn new(name: impl Into<String>) -> Self {
        TestSuite {
            name: name.into(),
            tests: Vec::new(),
            global_setup: None,
            global_teardown: None,
        }
    }

    /// Run `hook` once before any test.
    pub fn global_setup(mut self, hook: Hook<S>) -> Self {
        self.global_setup = Some(hook);
        self
    }

    /// Run `hook` once after all tests.
    pub fn global_teardown(mut self, hook: Hook<S>) -> Self {
        self.global_teardown = Some(hook);
        self
    }

    /// Append a test case.
    pub fn test(mut self, test: TestCase<S>) -> Self {
        self.tests.push(test);
        self
    }

    /// Append several test cases.
    pub fn tests<I>(mut self, tests: I) -> Self
    where
        I: IntoIterator<Item = TestCase<S>>,
    {
        self.tests.extend(tests);
        self
    }

    /// Number of registered tests.
    pub fn len(&self) -> usize {
        self.tests.len()
    }

    /// True if no test is registered.
    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Run every test in registration order.
    pub fn run(self) -> TestSuiteResult {
        silence_skips();
        let start = Instant::now();
        let mut state = S::default();
        log::info!("[==========] running {} test(s) from {}", self.tests.len(), self.name);

        if let Some(setup) = self.global_setup {
            if let Err(e) = run_hook(setup, &mut state, "global setup") {
                log::error!("{}", e);
                let results = self
                    .tests
                    .iter()
                    .map(|t| TestResult {
                        name: t.name.clone(),
                        status: TestStatus::Error(e.to_string()),
                        duration: Duration::ZERO,
                    })
                    .collect();
                release(state);
                return TestSuiteResult::new(&self.name, results, start.elapsed());
            }
        }

        let results: Vec<TestResult> = self
            .tests
            .iter()
            .map(|test| run_one(test, &mut state))
            .collect();

        let teardown_error = self
            .global_teardown
            .and_then(|teardown| run_hook(teardown, &mut state, "global teardown").err())
            .map(|e| {
                log::error!("{}", e);
                e.to_string()
            });
        release(state);

        let mut result = TestSuiteResult::new(&self.name, results, start.elapsed());
        result.teardown_error = teardown_error;
        log::info!(
            "[==========] {}: passed {}, failed {}, skipped {}, errors {}",
            result.name,
            result.passed,
            result.failed,
            result.skipped,
            result.errors
        );
        result
    }
}

fn run_one<S>(test: &TestCase<S>, state: &mut S) -> TestResult {
    let start = Instant::now();
    log::info!("[ RUN      ] {}", test.name);

    let status = match test.setup.map(|h| run_hook(h, state, "test setup")) {
        Some(Err(e)) => TestStatus::Error(e.to_string()),
        _ => {
            let body = test.body;
            let status = match panic::catch_unwind(AssertUnwindSafe(|| body(state))) {
                Ok(()) => TestStatus::Passed,
                Err(payload) => match payload.downcast::<Skip>() {
                    Ok(skip) => TestStatus::Skipped(skip.0),
                    Err(payload) => TestStatus::Failed(panic_message(payload.as_ref())),
                },
            };
            match test.teardown.map(|h| run_hook(h, state, "test teardown")) {
                Some(Err(e)) if status == TestStatus::Passed => TestStatus::Error(e.to_string()),
                _ => status,
            }
        }
    };

    let result = TestResult {
        name: test.name.clone(),
        status,
        duration: start.elapsed(),
    };
    match result.status {
        TestStatus::Passed | TestStatus::Skipped(_) => log::info!("{}", result),
        _ => log::warn!("{}", result),
    }
    result
}

/// Run a hook, turning a panic inside it into an error.
fn run_hook<S>(hook: Hook<S>, state: &mut S, stage: &'static str) -> Result<(), HarnessError> {
    match panic::catch_unwind(AssertUnwindSafe(|| hook(state))) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(HarnessError::Fixture { reason, .. })) => Err(HarnessError::fixture(stage, reason)),
        Ok(Err(e)) => Err(HarnessError::fixture(stage, e.to_string())),
        Err(payload) => Err(HarnessError::fixture(stage, panic_message(payload.as_ref()))),
    }
}

/// Drop the fixture state. Mocks left in it may panic on drop when their
/// expectations were never checked; report that instead of aborting.
fn release<S>(state: S) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(move || drop(state))) {
        log::warn!(
            "fixture state panicked on drop: {}",
            panic_message(payload.as_ref())
        );
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "test panicked".to_string()
    }
}
