//! Error exerciser: the four canonical constructor shapes of an error type.
//!
//! | constructor     | message                 | source    |
//! |-----------------|-------------------------|-----------|
//! | default         | none                    | none      |
//! | message         | `"The message"`         | none      |
//! | cause           | the cause's `Display`   | the cause |
//! | message + cause | `"The message"`         | the cause |
//!
//! Constructors that are not registered skip their check.

use crate::compare::assert_value_eq;
use crate::config::HarnessConfig;
use crate::error::Result;
use crate::outcome::{Check, SuiteReport, TestOutcome, ensure_that, fail, skip};
use crate::value::Value;
use std::error::Error as StdError;
use std::sync::Arc;
use strum::{Display, EnumIter, IntoEnumIterator};
use thiserror::Error;
use tracing::{debug, info_span};

pub const THE_MESSAGE: &str = "The message";

/// Cause handed to cause-taking constructors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("illegal state #{id}")]
pub struct SampleCause {
    pub id: u32,
}

impl SampleCause {
    pub fn new() -> Self {
        Self { id: rand::random() }
    }
}

impl Default for SampleCause {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorCheck {
    DefaultConstructorTest,
    MessageConstructorTest,
    CauseConstructorTest,
    MessageCauseConstructorTest,
}

type MessageFn<E> = Arc<dyn Fn(&E) -> Option<String>>;

pub struct ErrorExerciser<E> {
    name: String,
    default: Option<Arc<dyn Fn() -> E>>,
    with_message: Option<Arc<dyn Fn(String) -> E>>,
    with_cause: Option<Arc<dyn Fn(SampleCause) -> E>>,
    with_message_cause: Option<Arc<dyn Fn(String, SampleCause) -> E>>,
    message_of: MessageFn<E>,
    treat_ignore_as_success: bool,
}

impl<E> ErrorExerciser<E>
where
    E: StdError + 'static,
{
    /// Exerciser configured from the environment, reading messages through `Display`
    ///
    /// An empty rendering means no message.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        Ok(Self::from_config(name, &HarnessConfig::resolve()?))
    }

    pub fn from_config(name: impl Into<String>, config: &HarnessConfig) -> Self {
        Self {
            name: name.into(),
            default: None,
            with_message: None,
            with_cause: None,
            with_message_cause: None,
            message_of: Arc::new(|err: &E| {
                let rendered = err.to_string();
                (!rendered.is_empty()).then_some(rendered)
            }),
            treat_ignore_as_success: config.treat_ignore_as_success,
        }
    }

    pub fn default_constructor<F>(mut self, construct: F) -> Self
    where
        F: Fn() -> E + 'static,
    {
        self.default = Some(Arc::new(construct));
        self
    }

    pub fn message_constructor<F>(mut self, construct: F) -> Self
    where
        F: Fn(String) -> E + 'static,
    {
        self.with_message = Some(Arc::new(construct));
        self
    }

    pub fn cause_constructor<F>(mut self, construct: F) -> Self
    where
        F: Fn(SampleCause) -> E + 'static,
    {
        self.with_cause = Some(Arc::new(construct));
        self
    }

    pub fn message_cause_constructor<F>(mut self, construct: F) -> Self
    where
        F: Fn(String, SampleCause) -> E + 'static,
    {
        self.with_message_cause = Some(Arc::new(construct));
        self
    }

    /// Override how the message is read
    pub fn message_accessor<F>(mut self, message_of: F) -> Self
    where
        F: Fn(&E) -> Option<String> + 'static,
    {
        self.message_of = Arc::new(message_of);
        self
    }

    pub fn treat_ignore_as_success(mut self, treat: bool) -> Self {
        self.treat_ignore_as_success = treat;
        self
    }

    pub fn run(&self, check: ErrorCheck) -> TestOutcome {
        let span = info_span!("error_check", class = %self.name, check = %check);
        let _enter = span.enter();

        let result = match check {
            ErrorCheck::DefaultConstructorTest => self.default_run(),
            ErrorCheck::MessageConstructorTest => self.message_run(),
            ErrorCheck::CauseConstructorTest => self.cause_run(),
            ErrorCheck::MessageCauseConstructorTest => self.message_cause_run(),
        };

        match result {
            Ok(()) => {
                debug!("check passed");
                TestOutcome::Pass
            }
            Err(interrupt) => interrupt.into_outcome(self.treat_ignore_as_success),
        }
    }

    pub fn run_all(&self) -> SuiteReport {
        let mut report = SuiteReport::new(&self.name);
        for check in ErrorCheck::iter() {
            report.record(check.to_string(), self.run(check));
        }
        report
    }

    pub fn default_constructor_test(&self) -> TestOutcome {
        self.run(ErrorCheck::DefaultConstructorTest)
    }

    pub fn message_constructor_test(&self) -> TestOutcome {
        self.run(ErrorCheck::MessageConstructorTest)
    }

    pub fn cause_constructor_test(&self) -> TestOutcome {
        self.run(ErrorCheck::CauseConstructorTest)
    }

    pub fn message_cause_constructor_test(&self) -> TestOutcome {
        self.run(ErrorCheck::MessageCauseConstructorTest)
    }

    fn default_run(&self) -> Check {
        let Some(construct) = &self.default else {
            return skip(format!("{} has no default constructor", self.name));
        };
        let err = construct();
        self.assert_message(&err, None)?;
        self.assert_no_source(&err)
    }

    fn message_run(&self) -> Check {
        let Some(construct) = &self.with_message else {
            return skip(format!("{} has no message constructor", self.name));
        };
        let err = construct(THE_MESSAGE.to_string());
        self.assert_message(&err, Some(THE_MESSAGE.to_string()))?;
        self.assert_no_source(&err)
    }

    fn cause_run(&self) -> Check {
        let Some(construct) = &self.with_cause else {
            return skip(format!("{} has no cause constructor", self.name));
        };
        let cause = SampleCause::new();
        let err = construct(cause.clone());
        self.assert_message(&err, Some(cause.to_string()))?;
        self.assert_source(&err, &cause)
    }

    fn message_cause_run(&self) -> Check {
        let Some(construct) = &self.with_message_cause else {
            return skip(format!("{} has no message and cause constructor", self.name));
        };
        let cause = SampleCause::new();
        let err = construct(THE_MESSAGE.to_string(), cause.clone());
        self.assert_message(&err, Some(THE_MESSAGE.to_string()))?;
        self.assert_source(&err, &cause)
    }

    fn assert_message(&self, err: &E, expected: Option<String>) -> Check {
        let actual = (self.message_of)(err);
        assert_value_eq(
            &format!("Message of {}", self.name),
            &optional(expected),
            &optional(actual),
        )
    }

    fn assert_no_source(&self, err: &E) -> Check {
        match err.source() {
            None => Ok(()),
            Some(source) => fail(format!("{} has unexpected source: {}", self.name, source)),
        }
    }

    fn assert_source(&self, err: &E, cause: &SampleCause) -> Check {
        let Some(source) = err.source() else {
            return fail(format!("{} has no source", self.name));
        };
        ensure_that(
            source.downcast_ref::<SampleCause>() == Some(cause),
            format!(
                "Source of {} is not the cause: expected <{}> but was <{}>",
                self.name, cause, source
            ),
        )
    }
}

fn optional(message: Option<String>) -> Value {
    match message {
        Some(message) => Value::Str(message),
        None => Value::Unit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct PlainError;

    impl fmt::Display for PlainError {
        fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
            Ok(())
        }
    }

    impl StdError for PlainError {}

    #[test]
    fn empty_display_means_no_message() {
        let outcome = ErrorExerciser::new("PlainError")
            .unwrap()
            .default_constructor(|| PlainError)
            .default_constructor_test();
        assert_eq!(outcome, TestOutcome::Pass);
    }

    #[test]
    fn unregistered_constructors_skip() {
        let exerciser = ErrorExerciser::<PlainError>::new("PlainError")
            .unwrap()
            .treat_ignore_as_success(false);
        assert!(exerciser.message_constructor_test().is_skip());
        assert!(exerciser.cause_constructor_test().is_skip());
    }

    #[test]
    fn wrong_message_fails() {
        #[derive(Debug, Error)]
        #[error("always this")]
        struct Fixed;

        let outcome = ErrorExerciser::new("Fixed")
            .unwrap()
            .message_constructor(|_message| Fixed)
            .message_constructor_test();
        assert!(outcome.expect_failure().contains("Message of Fixed"));
    }

    #[test]
    fn sample_causes_differ() {
        let a = SampleCause { id: 1 };
        assert_eq!(a.to_string(), "illegal state #1");
        assert_ne!(a, SampleCause { id: 2 });
    }
}
