//! Common functionality used by the bus mocks.

use std::{
    collections::VecDeque,
    fmt::Debug,
    sync::{Arc, Mutex},
    thread,
};

use crate::counter::{CallCounter, Function};

/// Generic mock implementation.
///
/// ⚠️ **Do not use this directly as end user! This is only a building block
/// for creating mocks.**
///
/// Holds an ordered queue of expected transactions and the call counter the
/// mock reports intercepted calls to. Mismatches between expectations and
/// actual calls cause runtime assertions to assist in locating the source of
/// the fault.
///
/// The state lives behind `Arc<Mutex<...>>`, so a clone of the mock can be
/// used to check the expectations of the original instance after it has been
/// moved into the driver under test.
#[derive(Debug)]
pub struct Generic<T: Clone + Debug + PartialEq> {
    expected: Arc<Mutex<VecDeque<T>>>,
    done_called: Arc<Mutex<DoneCallDetector>>,
    counter: CallCounter,
}

impl<'a, T: 'a> Generic<T>
where
    T: Clone + Debug + PartialEq,
{
    /// Create a new mock with its own call counter.
    pub fn new<E>(expected: E) -> Generic<T>
    where
        E: IntoIterator<Item = &'a T>,
    {
        Self::with_counter(expected, CallCounter::new())
    }

    /// Create a new mock that records calls in an existing counter.
    ///
    /// Use this to let several mocks share one counter table.
    pub fn with_counter<E>(expected: E, counter: CallCounter) -> Generic<T>
    where
        E: IntoIterator<Item = &'a T>,
    {
        let mut g = Generic {
            expected: Arc::new(Mutex::new(VecDeque::new())),
            done_called: Arc::new(Mutex::new(DoneCallDetector::new())),
            counter,
        };

        g.replace(expected);

        g
    }

    /// Update expectations on the mock.
    ///
    /// First it is ensured that the existing expectations are all consumed
    /// by calling [`done()`](#method.done) internally (if not called
    /// already). Afterwards, the new expectations are set.
    pub fn update_expectations<E>(&mut self, expected: E)
    where
        E: IntoIterator<Item = &'a T>,
    {
        self.done_impl(false);
        self.replace(expected);
    }

    fn replace<E>(&mut self, expected: E)
    where
        E: IntoIterator<Item = &'a T>,
    {
        let v: VecDeque<T> = expected.into_iter().cloned().collect();

        let mut expected = self.expected.lock().unwrap();
        let mut done_called = self.done_called.lock().unwrap();
        *expected = v;
        done_called.reset();
    }

    /// Reset the call counter.
    ///
    /// Call this in the per-test setup hook.
    pub fn init(&self) {
        self.counter.reset();
    }

    /// Assert that all expectations on the mock have been consumed.
    pub fn done(&mut self) {
        self.done_impl(true);
    }

    /// Alias of [`done()`](#method.done), for use in teardown hooks.
    pub fn cleanup(&mut self) {
        self.done();
    }

    fn done_impl(&mut self, panic_if_already_done: bool) {
        self.done_called
            .lock()
            .unwrap()
            .mark_as_called(panic_if_already_done);

        let e = self.expected.lock().unwrap();
        assert!(e.is_empty(), "Not all expectations consumed");
    }

    /// Number of expectations not yet consumed.
    pub fn pending(&self) -> usize {
        self.expected.lock().unwrap().len()
    }

    /// The call counter this mock reports to.
    pub fn counter(&self) -> CallCounter {
        self.counter.clone()
    }

    /// Record a call of `function` and pop the expectation it must match.
    ///
    /// Panics if no expectation is pending. The call is counted either way.
    pub(crate) fn intercept(&mut self, function: Function) -> T {
        self.counter.record(function);
        let next = self.next();
        log::trace!("intercepted {} (expectation: {:?})", function, next);
        next.unwrap_or_else(|| panic!("no pending expectation for {} call", function))
    }
}

/// Clone allows a single mock to be duplicated for control and evaluation
impl<T> Clone for Generic<T>
where
    T: Clone + Debug + PartialEq,
{
    fn clone(&self) -> Self {
        Generic {
            expected: self.expected.clone(),
            done_called: self.done_called.clone(),
            counter: self.counter.clone(),
        }
    }
}

/// Iterator impl for use in mock impls
impl<T> Iterator for Generic<T>
where
    T: Clone + Debug + PartialEq,
{
    type Item = T;
    fn next(&mut self) -> Option<Self::Item> {
        self.expected.lock().unwrap().pop_front()
    }
}

/// Struct used to detect whether or not the `.done()` method was called.
#[derive(Debug)]
pub(crate) struct DoneCallDetector {
    called: bool,
}

impl DoneCallDetector {
    pub(crate) fn new() -> Self {
        Self { called: false }
    }

    /// Mark the `.done()` method as called.
    ///
    /// Note: When calling this method twice with `panic_if_already_done`
    /// set, an assertion failure will be triggered.
    pub(crate) fn mark_as_called(&mut self, panic_if_already_done: bool) {
        if panic_if_already_done {
            assert!(!self.called, "The `.done()` method was called twice!");
        }
        self.called = true;
    }

    /// Reset the detector.
    pub(crate) fn reset(&mut self) {
        self.called = false;
    }
}

impl Drop for DoneCallDetector {
    fn drop(&mut self) {
        // Ensure that the `.done()` method was called on the mock before
        // dropping.
        if !self.called && !thread::panicking() {
            let msg = "WARNING: A bus mock was dropped without calling the \
                       `.done()` method. Unchecked expectations would be \
                       silently ignored.";

            // Note: We cannot use the print macros here, since they get
            // captured by the Cargo test runner. Instead, write to stderr
            // directly.
            use std::io::Write;
            let mut stderr = std::io::stderr();
            stderr.write_all(b"\x1b[31m").ok();
            stderr.write_all(msg.as_bytes()).ok();
            stderr.write_all(b"\x1b[m\n").ok();
            stderr.flush().ok();

            // Panic. This probably results in an abort:
            // https://doc.rust-lang.org/std/ops/trait.Drop.html#panics
            panic!("{}", msg);
        }
    }
}
