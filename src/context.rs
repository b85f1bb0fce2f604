use crate::test_framework::{TestError, TestResult};
use itertools::Itertools;
use log::{debug, error};
use std::thread;

/// Handle on the running test, through which checks report failures.
///
/// Contexts are owned by the test and only borrowed by the checks.
pub trait TestContext {
    /// Mark the test failed and stop it.
    ///
    /// Implementations either return the error, so the test body can stop
    /// with `?`, or never return at all.
    fn fail_now(&mut self, error: TestError) -> TestResult;

    /// Mark the test failed and let it keep running.
    fn fail(&mut self, error: TestError);

    /// Whether any failure, fatal or not, was reported so far.
    fn failed(&self) -> bool;

    /// Name used to prefix diagnostics
    fn name(&self) -> &str {
        "test"
    }
}

fn join_failures(failures: &[TestError]) -> String {
    failures.iter().map(ToString::to_string).join("\n")
}

/// Context for tests returning [`TestResult`].
///
/// Fatal failures come back as `Err` and stop the test body through `?`.
/// The first one is also kept, so [`Recorder::finish`] still reports it when
/// the `Err` was discarded. Non fatal ones are kept until `finish`; a
/// recorder dropped with pending failures panics so they can't go unnoticed.
#[derive(Debug)]
pub struct Recorder {
    name: String,
    pending: Vec<TestError>,
    fatal: Option<TestError>,
}

impl Recorder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pending: Vec::new(),
            fatal: None,
        }
    }

    /// Non fatal failures reported so far
    pub fn pending(&self) -> &[TestError] {
        &self.pending
    }

    /// End the test: `Err` with the fatal failure, if any, followed by every
    /// non fatal one.
    pub fn finish(mut self) -> TestResult {
        let failures: Vec<TestError> = self
            .fatal
            .take()
            .into_iter()
            .chain(std::mem::take(&mut self.pending))
            .collect();
        match failures.first() {
            None => Ok(()),
            Some(first) => Err(TestError::at(first.location, join_failures(&failures))),
        }
    }
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new(thread::current().name().unwrap_or("test"))
    }
}

impl TestContext for Recorder {
    fn fail_now(&mut self, error: TestError) -> TestResult {
        if self.fatal.is_none() {
            self.fatal = Some(error.clone());
        }
        Err(error)
    }

    fn fail(&mut self, error: TestError) {
        self.pending.push(error);
    }

    fn failed(&self) -> bool {
        self.fatal.is_some() || !self.pending.is_empty()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let failures = join_failures(&self.pending);
        if self.fatal.is_some() || thread::panicking() {
            // the test already fails, don't panic again
            error!("[{}] unreported failures:\n{failures}", self.name);
        } else {
            panic!("[{}] unreported failures:\n{failures}", self.name);
        }
    }
}

/// Context for plain `#[test]` functions: a fatal failure panics right away,
/// non fatal ones panic when the context is dropped.
#[derive(Debug)]
pub struct Strict {
    name: String,
    pending: Vec<TestError>,
}

impl Strict {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pending: Vec::new(),
        }
    }
}

impl Default for Strict {
    fn default() -> Self {
        Self::new(thread::current().name().unwrap_or("test"))
    }
}

impl TestContext for Strict {
    fn fail_now(&mut self, error: TestError) -> TestResult {
        panic!("{error:?}")
    }

    fn fail(&mut self, error: TestError) {
        debug!("[{}] failure recorded, test continues", self.name);
        self.pending.push(error);
    }

    fn failed(&self) -> bool {
        !self.pending.is_empty()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for Strict {
    fn drop(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let failures = join_failures(&self.pending);
        if thread::panicking() {
            error!("[{}] unreported failures:\n{failures}", self.name);
            return;
        }
        panic!("Test failure: {failures}");
    }
}
