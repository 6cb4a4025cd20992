//! Delegate verifier: check that a wrapper forwards calls unchanged.
//!
//! For every test method the verifier programs a strict [`CallRecorder`] with
//! exactly one expected call and a synthesized return value, builds the
//! wrapper around the recorder, invokes the same method on the wrapper and
//! asserts that the call arrived with the same arguments and that the return
//! value came back untouched.

use crate::class::Visibility;
use crate::compare::values_equal;
use crate::config::HarnessConfig;
use crate::error::{HarnessError, Result};
use crate::outcome::TestOutcome;
use crate::synth::ValueFactory;
use crate::types::{Describe, TypeDescriptor};
use crate::value::{FromValue, IntoValue, Value};
use parking_lot::Mutex;
use std::any::Any;
use std::collections::VecDeque;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, info, info_span, warn};

// =============================================================================
// Delegation target description
// =============================================================================

/// Method declared on the delegation target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetMethod {
    pub name: String,
    pub params: Vec<TypeDescriptor>,
    pub returns: TypeDescriptor,
    pub visibility: Visibility,
    pub is_static: bool,
    /// Generated by tooling, not by the author
    pub synthetic: bool,
}

impl TargetMethod {
    pub fn new(name: impl Into<String>, params: Vec<TypeDescriptor>, returns: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            params,
            returns,
            visibility: Visibility::Public,
            is_static: false,
            synthetic: false,
        }
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn into_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn into_synthetic(mut self) -> Self {
        self.synthetic = true;
        self
    }

    fn is_test_candidate(&self) -> bool {
        !self.is_static && self.visibility != Visibility::Private && !self.synthetic
    }
}

/// The type a wrapper forwards to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegateTarget {
    pub name: String,
    pub methods: Vec<TargetMethod>,
}

impl DelegateTarget {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: Vec::new(),
        }
    }

    pub fn method(mut self, method: TargetMethod) -> Self {
        self.methods.push(method);
        self
    }
}

/// Method to exercise on the wrapper
#[derive(Debug, Clone, PartialEq)]
pub struct TestMethod {
    pub name: String,
    /// `None` for methods without a result
    pub return_type: Option<TypeDescriptor>,
    pub parameter_types: Vec<TypeDescriptor>,
    /// Fixed arguments; synthesized per invocation when absent
    pub parameters: Option<Vec<Value>>,
}

impl TestMethod {
    pub fn new(name: impl Into<String>, return_type: TypeDescriptor, parameter_types: Vec<TypeDescriptor>) -> Self {
        Self {
            name: name.into(),
            return_type: Some(return_type),
            parameter_types,
            parameters: None,
        }
    }

    pub fn void(name: impl Into<String>, parameter_types: Vec<TypeDescriptor>) -> Self {
        Self {
            name: name.into(),
            return_type: None,
            parameter_types,
            parameters: None,
        }
    }

    pub fn with_parameters(mut self, parameters: Vec<Value>) -> Self {
        self.parameters = Some(parameters);
        self
    }

    fn has_return(&self) -> bool {
        self.return_type.as_ref().is_some_and(|ty| !ty.is_unit())
    }

    fn signature(&self) -> String {
        format!("{}({})", self.name, TypeDescriptor::signature(&self.parameter_types))
    }
}

/// Eligible methods of a target: instance, non-private, author-written
pub fn declared_test_methods_for(target: &DelegateTarget) -> Vec<TestMethod> {
    target
        .methods
        .iter()
        .filter(|method| method.is_test_candidate())
        .map(|method| TestMethod {
            name: method.name.clone(),
            return_type: Some(method.returns.clone()),
            parameter_types: method.params.clone(),
            parameters: None,
        })
        .collect()
}

// =============================================================================
// Call recorder
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ExpectedCall {
    pub method: String,
    pub args: Vec<Value>,
    pub returns: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: String,
    pub args: Vec<Value>,
}

#[derive(Debug, Default)]
struct RecorderState {
    expected: VecDeque<ExpectedCall>,
    calls: Vec<RecordedCall>,
    violations: Vec<String>,
}

/// Strict, ordered test double for a delegation target
///
/// Clones share state, so the verifier keeps one handle while the wrapper
/// owns another. An unexpected call is recorded and then panics.
#[derive(Debug, Clone, Default)]
pub struct CallRecorder {
    state: Arc<Mutex<RecorderState>>,
}

impl CallRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expect the next call; calls must arrive in expectation order
    pub fn expect(&self, method: impl Into<String>, args: Vec<Value>, returns: Value) {
        self.state.lock().expected.push_back(ExpectedCall {
            method: method.into(),
            args,
            returns,
        });
    }

    /// Record a call and hand back the programmed value
    #[track_caller]
    pub fn call_value(&self, method: &str, args: Vec<Value>) -> Value {
        let mut state = self.state.lock();
        state.calls.push(RecordedCall {
            method: method.to_string(),
            args: args.clone(),
        });

        let matches = state.expected.front().is_some_and(|expected| {
            expected.method == method
                && expected.args.len() == args.len()
                && expected.args.iter().zip(&args).all(|(e, a)| values_equal(e, a))
        });

        if matches {
            if let Some(expected) = state.expected.pop_front() {
                return expected.returns;
            }
        }

        let violation = match state.expected.front() {
            Some(expected) => format!(
                "unexpected call {}({}); expected {}({})",
                method,
                render_args(&args),
                expected.method,
                render_args(&expected.args)
            ),
            None => format!("unexpected call {}({})", method, render_args(&args)),
        };
        state.violations.push(violation.clone());
        drop(state);
        panic!("{}", violation);
    }

    /// Record a call and convert the programmed value
    #[track_caller]
    pub fn call<R: FromValue>(&self, method: &str, args: Vec<Value>) -> R {
        let value = self.call_value(method, args);
        match R::from_value(value) {
            Ok(value) => value,
            Err(err) => {
                let violation = format!("programmed return of {} does not fit: {}", method, err);
                self.state.lock().violations.push(violation.clone());
                panic!("{}", violation);
            }
        }
    }

    /// Every expectation met exactly once and nothing else called
    pub fn verify(&self) -> std::result::Result<(), String> {
        let state = self.state.lock();
        if let Some(violation) = state.violations.first() {
            return Err(violation.clone());
        }
        if let Some(missing) = state.expected.front() {
            return Err(format!(
                "expected call {}({}) was not made",
                missing.method,
                render_args(&missing.args)
            ));
        }
        Ok(())
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().calls.clone()
    }
}

fn render_args(args: &[Value]) -> String {
    args.iter()
        .map(|arg| arg.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// Verifier
// =============================================================================

type Invoker<W> = Arc<dyn Fn(&W, &[Value]) -> Result<Value>>;

struct Binding<W> {
    name: String,
    params: Vec<TypeDescriptor>,
    invoke: Invoker<W>,
}

/// Verifies a wrapper type `W` built around a [`CallRecorder`]
pub struct DelegateVerifier<W> {
    target: DelegateTarget,
    wrapper_name: String,
    construct: Arc<dyn Fn(CallRecorder) -> W>,
    bindings: Vec<Binding<W>>,
    test_methods: Option<Vec<TestMethod>>,
    factory: ValueFactory,
}

impl<W: 'static> DelegateVerifier<W> {
    pub fn new<C>(wrapper_name: impl Into<String>, target: DelegateTarget, construct: C) -> Result<Self>
    where
        C: Fn(CallRecorder) -> W + 'static,
    {
        Self::from_config(wrapper_name, target, construct, &HarnessConfig::resolve()?)
    }

    pub fn from_config<C>(
        wrapper_name: impl Into<String>,
        target: DelegateTarget,
        construct: C,
        config: &HarnessConfig,
    ) -> Result<Self>
    where
        C: Fn(CallRecorder) -> W + 'static,
    {
        Ok(Self {
            target,
            wrapper_name: wrapper_name.into(),
            construct: Arc::new(construct),
            bindings: Vec::new(),
            test_methods: None,
            factory: ValueFactory::from_config(config)?,
        })
    }

    /// Wrapper method over dynamic arguments
    pub fn bind<F>(mut self, name: impl Into<String>, params: Vec<TypeDescriptor>, invoke: F) -> Self
    where
        F: Fn(&W, &[Value]) -> Result<Value> + 'static,
    {
        self.bindings.push(Binding {
            name: name.into(),
            params,
            invoke: Arc::new(invoke),
        });
        self
    }

    pub fn bind0<R, F>(self, name: &str, invoke: F) -> Self
    where
        R: IntoValue,
        F: Fn(&W) -> R + 'static,
    {
        self.bind(name, Vec::new(), move |wrapper: &W, _args: &[Value]| {
            Ok(invoke(wrapper).into_value())
        })
    }

    pub fn bind1<A, R, F>(self, name: &str, invoke: F) -> Self
    where
        A: Describe + FromValue,
        R: IntoValue,
        F: Fn(&W, A) -> R + 'static,
    {
        self.bind(name, vec![A::descriptor()], move |wrapper: &W, args: &[Value]| {
            let a = A::from_value(arg_at(args, 0)?)?;
            Ok(invoke(wrapper, a).into_value())
        })
    }

    pub fn bind2<A, B, R, F>(self, name: &str, invoke: F) -> Self
    where
        A: Describe + FromValue,
        B: Describe + FromValue,
        R: IntoValue,
        F: Fn(&W, A, B) -> R + 'static,
    {
        self.bind(
            name,
            vec![A::descriptor(), B::descriptor()],
            move |wrapper: &W, args: &[Value]| {
                let a = A::from_value(arg_at(args, 0)?)?;
                let b = B::from_value(arg_at(args, 1)?)?;
                Ok(invoke(wrapper, a, b).into_value())
            },
        )
    }

    /// Exercise only these methods instead of every declared one
    pub fn test_methods(mut self, methods: Vec<TestMethod>) -> Self {
        self.test_methods = Some(methods);
        self
    }

    pub fn value_factory(mut self, factory: ValueFactory) -> Self {
        self.factory = factory;
        self
    }

    pub fn with_override<F>(mut self, ty: TypeDescriptor, generator: F) -> Self
    where
        F: Fn(&mut ValueFactory) -> Result<Value> + 'static,
    {
        self.factory.register(ty, generator);
        self
    }

    /// Verify every configured method; the first failure ends the check
    pub fn test_delegate_methods(&mut self) -> TestOutcome {
        let span = info_span!(
            "delegate_check",
            class = %self.wrapper_name,
            target = %self.target.name
        );
        let _enter = span.enter();

        let methods = self
            .test_methods
            .clone()
            .unwrap_or_else(|| declared_test_methods_for(&self.target));

        for method in &methods {
            info!(method = %method.signature(), "testing delegate method");
            if let Err(cause) = self.test_delegate_method(method) {
                let message = format!(
                    "Error testing delegate method {}({}): {}",
                    method.name,
                    TypeDescriptor::signature(&method.parameter_types),
                    cause
                );
                warn!(method = %method.name, "{}", message);
                return TestOutcome::Fail(message);
            }
        }

        debug!(methods = methods.len(), "all delegate methods forwarded");
        TestOutcome::Pass
    }

    fn test_delegate_method(&mut self, method: &TestMethod) -> std::result::Result<(), String> {
        let expected_return = match &method.return_type {
            Some(ty) if method.has_return() => self.factory.create_value(ty).map_err(|err| err.to_string())?,
            _ => Value::Unit,
        };

        let args = match &method.parameters {
            Some(fixed) => fixed.clone(),
            None => method
                .parameter_types
                .iter()
                .map(|ty| self.factory.create_value(ty))
                .collect::<Result<Vec<_>>>()
                .map_err(|err| err.to_string())?,
        };

        let binding = self
            .bindings
            .iter()
            .find(|binding| binding.name == method.name && binding.params == method.parameter_types)
            .ok_or_else(|| {
                HarnessError::NoSuchMethod {
                    class: self.wrapper_name.clone(),
                    method: method.signature(),
                }
                .to_string()
            })?;

        let recorder = CallRecorder::new();
        recorder.expect(method.name.clone(), args.clone(), expected_return.clone());

        let construct = Arc::clone(&self.construct);
        let invoke = Arc::clone(&binding.invoke);
        let handle = recorder.clone();
        let actual = panic::catch_unwind(AssertUnwindSafe(move || {
            let wrapper = construct(handle);
            invoke(&wrapper, &args)
        }))
        .map_err(|payload| format!("panicked: {}", panic_message(payload.as_ref())))?
        .map_err(|err| err.to_string())?;

        if method.has_return() && !values_equal(&expected_return, &actual) {
            return Err(format!(
                "return value not forwarded: expected <{}> but was <{}>",
                expected_return, actual
            ));
        }

        recorder.verify()
    }
}

fn arg_at(args: &[Value], idx: usize) -> Result<Value> {
    args.get(idx)
        .cloned()
        .ok_or_else(|| HarnessError::invocation("delegate binding", format!("missing argument {}", idx)))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

impl<W> fmt::Debug for DelegateVerifier<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegateVerifier")
            .field("wrapper", &self.wrapper_name)
            .field("target", &self.target.name)
            .field("bindings", &self.bindings.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_methods_exclude_static_private_and_synthetic() {
        let target = DelegateTarget::new("Store")
            .method(TargetMethod::new("get", vec![String::descriptor()], i64::descriptor()))
            .method(TargetMethod::new("helper", vec![], TypeDescriptor::Unit).with_visibility(Visibility::Private))
            .method(TargetMethod::new("create", vec![], TypeDescriptor::Named("Store")).into_static())
            .method(TargetMethod::new("coverage_init", vec![], TypeDescriptor::Unit).into_synthetic())
            .method(
                TargetMethod::new("flush", vec![], TypeDescriptor::Unit).with_visibility(Visibility::Restricted),
            );

        let names: Vec<_> = declared_test_methods_for(&target)
            .into_iter()
            .map(|method| method.name)
            .collect();
        assert_eq!(names, vec!["get", "flush"]);
    }

    #[test]
    fn recorder_returns_programmed_value() {
        let recorder = CallRecorder::new();
        recorder.expect("get", vec![Value::Str("k".into())], Value::I64(7));
        let value: i64 = recorder.call("get", vec![Value::Str("k".into())]);
        assert_eq!(value, 7);
        assert!(recorder.verify().is_ok());
        assert_eq!(recorder.calls().len(), 1);
    }

    #[test]
    fn recorder_reports_missing_calls() {
        let recorder = CallRecorder::new();
        recorder.expect("put", vec![Value::I32(1)], Value::Unit);
        let err = recorder.verify().unwrap_err();
        assert!(err.contains("put(1) was not made"));
    }

    #[test]
    fn recorder_panics_on_unexpected_call() {
        let recorder = CallRecorder::new();
        recorder.expect("get", vec![Value::I32(1)], Value::I32(2));
        let handle = recorder.clone();
        let result = panic::catch_unwind(AssertUnwindSafe(move || {
            handle.call_value("get", vec![Value::I32(5)])
        }));
        assert!(result.is_err());
        assert!(recorder.verify().unwrap_err().contains("unexpected call get(5)"));
    }
}
