//! Three-valued check outcomes and the suite report.
//!
//! A running check returns [`Check`]; `?` propagates an [`Interrupt`] that
//! either skips the scenario, fails an assertion, or carries a harness error.
//! [`TestOutcome`] is what the check reports once it stops.

use crate::error::HarnessError;
use serde::Serialize;
use std::fmt;
use strum::{Display, EnumIter, IntoEnumIterator};

/// Final verdict of one check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum TestOutcome {
    Pass,
    Fail(String),
    Skip(String),
}

impl TestOutcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, TestOutcome::Pass)
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, TestOutcome::Fail(_))
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, TestOutcome::Skip(_))
    }

    pub fn status(&self) -> OutcomeStatus {
        match self {
            TestOutcome::Pass => OutcomeStatus::Pass,
            TestOutcome::Fail(_) => OutcomeStatus::Fail,
            TestOutcome::Skip(_) => OutcomeStatus::Skip,
        }
    }

    /// Panic on failure so a `#[test]` wrapper reports it; skips only warn
    #[track_caller]
    pub fn assert_not_failed(&self) {
        match self {
            TestOutcome::Pass => {}
            TestOutcome::Skip(reason) => tracing::warn!(reason = %reason, "check skipped"),
            TestOutcome::Fail(reason) => panic!("{}", reason),
        }
    }

    /// Panic unless the check failed; returns the failure reason
    #[track_caller]
    pub fn expect_failure(&self) -> &str {
        match self {
            TestOutcome::Fail(reason) => reason,
            other => panic!("expected a failing check, got {:?}", other),
        }
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestOutcome::Pass => write!(f, "PASS"),
            TestOutcome::Fail(reason) => write!(f, "FAIL: {}", reason),
            TestOutcome::Skip(reason) => write!(f, "SKIP: {}", reason),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Pass,
    Fail,
    Skip,
}

/// Signal that stops a running check
#[derive(Debug, Clone, PartialEq)]
pub enum Interrupt {
    /// Scenario does not apply to this type
    Skip(String),
    /// Assertion failed
    Fail(String),
    /// Harness error; configuration errors are reported as failures
    Error(HarnessError),
}

impl From<HarnessError> for Interrupt {
    fn from(err: HarnessError) -> Self {
        Interrupt::Error(err)
    }
}

impl Interrupt {
    /// Fold into an outcome; `treat_skip_as_pass` turns skips into passes
    pub fn into_outcome(self, treat_skip_as_pass: bool) -> TestOutcome {
        match self {
            Interrupt::Skip(_) if treat_skip_as_pass => TestOutcome::Pass,
            Interrupt::Skip(reason) => TestOutcome::Skip(reason),
            Interrupt::Fail(reason) => TestOutcome::Fail(reason),
            Interrupt::Error(err) if err.is_configuration_error() => {
                TestOutcome::Fail(format!("configuration error: {}", err))
            }
            Interrupt::Error(err) => TestOutcome::Fail(err.to_string()),
        }
    }
}

/// Result of a running check
pub type Check<T = ()> = std::result::Result<T, Interrupt>;

pub fn skip<T>(reason: impl Into<String>) -> Check<T> {
    Err(Interrupt::Skip(reason.into()))
}

pub fn skip_if(condition: bool, reason: impl Into<String>) -> Check {
    if condition { skip(reason) } else { Ok(()) }
}

pub fn skip_unless(condition: bool, reason: impl Into<String>) -> Check {
    skip_if(!condition, reason)
}

pub fn fail<T>(reason: impl Into<String>) -> Check<T> {
    Err(Interrupt::Fail(reason.into()))
}

pub fn ensure_that(condition: bool, message: impl Into<String>) -> Check {
    if condition { Ok(()) } else { fail(message) }
}

// =============================================================================
// Suite report
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub check: String,
    pub outcome: TestOutcome,
}

/// Outcomes of every check run against one type
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub subject: String,
    pub checks: Vec<CheckReport>,
}

impl SuiteReport {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            checks: Vec::new(),
        }
    }

    pub fn record(&mut self, check: impl Into<String>, outcome: TestOutcome) {
        self.checks.push(CheckReport {
            check: check.into(),
            outcome,
        });
    }

    pub fn outcome(&self, check: &str) -> Option<&TestOutcome> {
        self.checks
            .iter()
            .find(|report| report.check == check)
            .map(|report| &report.outcome)
    }

    pub fn count(&self, status: OutcomeStatus) -> usize {
        self.checks
            .iter()
            .filter(|report| report.outcome.status() == status)
            .count()
    }

    pub fn all_passed(&self) -> bool {
        self.count(OutcomeStatus::Fail) == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckReport> {
        self.checks.iter().filter(|report| report.outcome.is_fail())
    }

    /// One-line narrative, e.g. `Account: 8 pass, 0 fail, 2 skip`
    pub fn summary(&self) -> String {
        let counts = OutcomeStatus::iter()
            .map(|status| format!("{} {}", self.count(status), status))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}: {}", self.subject, counts)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Panic listing every failed check
    #[track_caller]
    pub fn assert_all_passed(&self) {
        if !self.all_passed() {
            let failures = self
                .failures()
                .map(|report| format!("{}: {}", report.check, report.outcome))
                .collect::<Vec<_>>()
                .join("\n");
            panic!("{}\n{}", self.summary(), failures);
        }
    }
}
