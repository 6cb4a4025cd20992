//! Reusable conformance checks for value types, delegating wrappers and
//! error types.
//!
//! - [`bean`]: property round-trips, copy constructors, equality, hashing and `Display`
//! - [`delegate`]: every target operation is forwarded to the wrapped instance
//! - [`exception`]: the four canonical error constructor shapes
//! - [`synth`]: deterministic, seedable test value synthesis from type descriptors
//!
//! Types describe themselves through [`ClassDescriptor`] and [`Describe`];
//! suites are generated with [`bean_test_suite!`], [`delegate_test_suite!`]
//! and [`error_test_suite!`].

pub mod bean;
pub mod class;
pub mod compare;
pub mod config;
pub mod delegate;
pub mod error;
pub mod exception;
pub mod introspect;
pub mod logging;
pub mod outcome;
pub mod suite;
pub mod synth;
pub mod types;
pub mod value;

pub use strum;

pub use bean::{BeanCheck, BeanExerciser, ConstructorParameters};
pub use class::{ClassDescriptor, MethodDescriptor, Visibility};
pub use compare::{assert_value_eq, values_equal};
pub use config::HarnessConfig;
pub use delegate::{
    CallRecorder, DelegateTarget, DelegateVerifier, TargetMethod, TestMethod,
    declared_test_methods_for,
};
pub use error::{HarnessError, Result};
pub use exception::{ErrorCheck, ErrorExerciser, SampleCause};
pub use introspect::{PropertyDescriptor, PropertyIntrospector};
pub use logging::{LoggingConfig, init_test_logging};
pub use outcome::{
    Check, Interrupt, SuiteReport, TestOutcome, ensure_that, fail, skip, skip_if, skip_unless,
};
pub use synth::{LengthBounds, SeededSource, SequentialSource, TestValueSource, ValueFactory};
pub use types::{ContainerKind, Describe, ScalarKind, TypeDescriptor};
pub use value::{CustomValue, FromValue, IntoValue, Value};
