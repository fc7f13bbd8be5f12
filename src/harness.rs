use crate::error::{Error, Result};
use crate::gpu::GpuContext;
use std::fmt;
use tracing::{info, warn};

/// Iterations a single case may take before it is considered stuck.
pub const MAX_ITERATIONS: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IterateResult {
    Continue,
    Done(Verdict),
}

/// A unit of conformance checking run against a context `C`.
///
/// Driven as `init`, then `iterate` until a verdict, then `deinit`, which
/// runs even when an earlier step failed.
pub trait TestCase<C = GpuContext> {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Prepares resources. [`Error::NotSupported`] skips the case.
    fn init(&mut self, context: &C) -> Result<()>;

    fn iterate(&mut self, context: &C) -> Result<IterateResult>;

    fn deinit(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestStatus {
    Pass,
    Fail(String),
    NotSupported(String),
}

impl TestStatus {
    fn from_error(err: Error) -> Self {
        match err {
            Error::NotSupported(reason) => TestStatus::NotSupported(reason),
            other => TestStatus::Fail(other.to_string()),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, TestStatus::Fail(_))
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestStatus::Pass => f.write_str("Pass"),
            TestStatus::Fail(reason) => write!(f, "Fail ({reason})"),
            TestStatus::NotSupported(reason) => write!(f, "NotSupported ({reason})"),
        }
    }
}

/// Runs one case to completion.
pub fn run_case<C>(case: &mut dyn TestCase<C>, context: &C) -> TestStatus {
    info!("[{}] {}", case.name(), case.description());

    let status = match case.init(context) {
        Ok(()) => drive(case, context),
        Err(err) => TestStatus::from_error(err),
    };
    case.deinit();

    match &status {
        TestStatus::Fail(_) => warn!("[{}] {status}", case.name()),
        _ => info!("[{}] {status}", case.name()),
    }
    status
}

fn drive<C>(case: &mut dyn TestCase<C>, context: &C) -> TestStatus {
    for _ in 0..MAX_ITERATIONS {
        match case.iterate(context) {
            Ok(IterateResult::Continue) => continue,
            Ok(IterateResult::Done(Verdict::Pass)) => return TestStatus::Pass,
            Ok(IterateResult::Done(Verdict::Fail(reason))) => return TestStatus::Fail(reason),
            Err(err) => return TestStatus::from_error(err),
        }
    }
    TestStatus::Fail(format!("no verdict after {MAX_ITERATIONS} iterations"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseResult {
    pub name: String,
    pub status: TestStatus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub passed: usize,
    pub failed: usize,
    pub not_supported: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} passed, {} failed, {} not supported",
            self.passed, self.failed, self.not_supported
        )
    }
}

/// Collects the statuses of a sequence of cases.
#[derive(Debug, Default)]
pub struct TestRunner {
    pub results: Vec<CaseResult>,
}

impl TestRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn run<C>(&mut self, case: &mut dyn TestCase<C>, context: &C) -> &TestStatus {
        let status = run_case(case, context);
        self.results.push(CaseResult {
            name: case.name().to_string(),
            status,
        });
        &self.results[self.results.len() - 1].status
    }

    pub fn run_all<C>(&mut self, cases: &mut [Box<dyn TestCase<C>>], context: &C) {
        for case in cases.iter_mut() {
            self.run(case.as_mut(), context);
        }
    }

    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary::default();
        for result in &self.results {
            match result.status {
                TestStatus::Pass => summary.passed += 1,
                TestStatus::Fail(_) => summary.failed += 1,
                TestStatus::NotSupported(_) => summary.not_supported += 1,
            }
        }
        summary
    }

    /// Human-readable descriptions of every failed case. Empty when all cases
    /// passed or were skipped.
    pub fn failures(&self) -> Vec<String> {
        self.results
            .iter()
            .filter_map(|result| match &result.status {
                TestStatus::Fail(reason) => Some(format!("[{}] {reason}", result.name)),
                _ => None,
            })
            .collect()
    }
}
