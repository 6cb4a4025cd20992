//! Bean exerciser: construct, populate, re-read, copy and compare beans.
//!
//! Every check is repeated `test_runs` times. A run starts with an empty
//! constructor argument cache and a fresh property list, so each run draws new
//! values while repeated constructions inside one run reuse the same
//! arguments. The first failing assertion ends the check.
//!
//! Checks that need a hook the class does not register (equality, hash,
//! string representation, copy constructor) skip instead of failing.

use crate::class::{ClassDescriptor, CopyFn, EqualsFn};
use crate::compare::assert_value_eq;
use crate::config::HarnessConfig;
use crate::error::{HarnessError, Result};
use crate::introspect::{PropertyDescriptor, PropertyIntrospector};
use crate::outcome::{Check, Interrupt, SuiteReport, TestOutcome, ensure_that, fail, skip};
use crate::synth::ValueFactory;
use crate::types::TypeDescriptor;
use crate::value::Value;
use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;
use strum::{Display, EnumIter, IntoEnumIterator};
use tracing::{debug, error, info, info_span, warn};

/// Constructor overload to exercise: parameter types and the properties they set
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConstructorParameters {
    types: Vec<TypeDescriptor>,
    names: Vec<String>,
}

impl ConstructorParameters {
    pub fn new<I, S>(types: Vec<TypeDescriptor>, names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if types.len() != names.len() {
            return Err(HarnessError::MalformedConstructorParameters {
                types: types.len(),
                names: names.len(),
            });
        }
        Ok(Self { types, names })
    }

    /// The no-argument constructor
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn types(&self) -> &[TypeDescriptor] {
        &self.types
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    fn sets(&self, property: &str) -> bool {
        self.names.iter().any(|name| name == property)
    }
}

/// The checks a bean exerciser runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum BeanCheck {
    PropertyTestForAllConstructors,
    CopyConstructorEqualsTest,
    CopyConstructorValuesTest,
    CopyConstructorEmptyEqualsTest,
    CopyConstructorEmptyValuesTest,
    ToStringTestForAllConstructorsEmpty,
    ToStringTestForAllConstructorsFilled,
    EqualsIdentityTest,
    EqualsValuesTest,
    HashCodeTest,
}

pub struct BeanExerciser<T> {
    class: ClassDescriptor<T>,
    factory: ValueFactory,
    test_runs: usize,
    treat_ignore_as_success: bool,
    ignored: IndexSet<String>,
    constructor_parameters: Vec<ConstructorParameters>,
    constructor_values: HashMap<Vec<TypeDescriptor>, Vec<Value>>,
    properties: Option<Vec<PropertyDescriptor>>,
}

impl<T: 'static> BeanExerciser<T> {
    /// Exerciser configured from the `BEAN_HARNESS_*` environment variables
    pub fn new(class: ClassDescriptor<T>) -> Result<Self> {
        Self::from_config(class, &HarnessConfig::resolve()?)
    }

    pub fn from_config(class: ClassDescriptor<T>, config: &HarnessConfig) -> Result<Self> {
        let factory = ValueFactory::from_config(config)?;
        Ok(Self {
            class,
            factory,
            test_runs: config.test_runs,
            treat_ignore_as_success: config.treat_ignore_as_success,
            ignored: IndexSet::new(),
            constructor_parameters: vec![ConstructorParameters::empty()],
            constructor_values: HashMap::new(),
            properties: None,
        })
    }

    pub fn test_runs(mut self, test_runs: usize) -> Self {
        self.test_runs = test_runs;
        self
    }

    pub fn treat_ignore_as_success(mut self, treat: bool) -> Self {
        self.treat_ignore_as_success = treat;
        self
    }

    pub fn ignore_properties<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored.extend(names.into_iter().map(Into::into));
        self
    }

    /// Replace the constructor overloads to exercise
    pub fn constructor_parameters<I>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = ConstructorParameters>,
    {
        self.constructor_parameters = parameters.into_iter().collect();
        self
    }

    pub fn value_factory(mut self, factory: ValueFactory) -> Self {
        self.factory = factory;
        self
    }

    /// Register a value generator for a domain type
    pub fn with_override<F>(mut self, ty: TypeDescriptor, generator: F) -> Self
    where
        F: Fn(&mut ValueFactory) -> Result<Value> + 'static,
    {
        self.factory.register(ty, generator);
        self
    }

    pub fn class(&self) -> &ClassDescriptor<T> {
        &self.class
    }

    // =========================================================================
    // Checks
    // =========================================================================

    pub fn run(&mut self, check: BeanCheck) -> TestOutcome {
        match check {
            BeanCheck::PropertyTestForAllConstructors => self.property_test_for_all_constructors(),
            BeanCheck::CopyConstructorEqualsTest => self.copy_constructor_equals_test(),
            BeanCheck::CopyConstructorValuesTest => self.copy_constructor_values_test(),
            BeanCheck::CopyConstructorEmptyEqualsTest => self.copy_constructor_empty_equals_test(),
            BeanCheck::CopyConstructorEmptyValuesTest => self.copy_constructor_empty_values_test(),
            BeanCheck::ToStringTestForAllConstructorsEmpty => {
                self.to_string_test_for_all_constructors_empty()
            }
            BeanCheck::ToStringTestForAllConstructorsFilled => {
                self.to_string_test_for_all_constructors_filled()
            }
            BeanCheck::EqualsIdentityTest => self.equals_identity_test(),
            BeanCheck::EqualsValuesTest => self.equals_values_test(),
            BeanCheck::HashCodeTest => self.hash_code_test(),
        }
    }

    /// Run every check once and collect the outcomes
    pub fn run_all(&mut self) -> SuiteReport {
        let mut report = SuiteReport::new(self.class.name());
        for check in BeanCheck::iter() {
            let outcome = self.run(check);
            report.record(check.to_string(), outcome);
        }
        info!(class = self.class.name(), summary = %report.summary(), "bean checks finished");
        report
    }

    pub fn property_test_for_all_constructors(&mut self) -> TestOutcome {
        self.repeat(BeanCheck::PropertyTestForAllConstructors, Self::property_run)
    }

    pub fn copy_constructor_equals_test(&mut self) -> TestOutcome {
        self.repeat(BeanCheck::CopyConstructorEqualsTest, Self::copy_equals_run)
    }

    pub fn copy_constructor_values_test(&mut self) -> TestOutcome {
        self.repeat(BeanCheck::CopyConstructorValuesTest, Self::copy_values_run)
    }

    pub fn copy_constructor_empty_equals_test(&mut self) -> TestOutcome {
        self.repeat(BeanCheck::CopyConstructorEmptyEqualsTest, Self::copy_empty_equals_run)
    }

    pub fn copy_constructor_empty_values_test(&mut self) -> TestOutcome {
        self.repeat(BeanCheck::CopyConstructorEmptyValuesTest, Self::copy_empty_values_run)
    }

    pub fn to_string_test_for_all_constructors_empty(&mut self) -> TestOutcome {
        self.repeat(BeanCheck::ToStringTestForAllConstructorsEmpty, |this| {
            this.to_string_run(false)
        })
    }

    pub fn to_string_test_for_all_constructors_filled(&mut self) -> TestOutcome {
        self.repeat(BeanCheck::ToStringTestForAllConstructorsFilled, |this| {
            this.to_string_run(true)
        })
    }

    pub fn equals_identity_test(&mut self) -> TestOutcome {
        self.repeat(BeanCheck::EqualsIdentityTest, Self::equals_identity_run)
    }

    pub fn equals_values_test(&mut self) -> TestOutcome {
        self.repeat(BeanCheck::EqualsValuesTest, Self::equals_values_run)
    }

    pub fn hash_code_test(&mut self) -> TestOutcome {
        self.repeat(BeanCheck::HashCodeTest, Self::hash_code_run)
    }

    fn repeat<F>(&mut self, check: BeanCheck, mut body: F) -> TestOutcome
    where
        F: FnMut(&mut Self) -> Check,
    {
        let span = info_span!("bean_check", class = self.class.name(), check = %check);
        let _enter = span.enter();

        for run in 0..self.test_runs {
            self.begin_run();
            if let Err(interrupt) = body(self) {
                match &interrupt {
                    Interrupt::Skip(reason) => info!(reason = %reason, "skipping check"),
                    Interrupt::Fail(reason) => warn!(run, reason = %reason, "check failed"),
                    Interrupt::Error(err) => error!(run, error = %err, "check aborted"),
                }
                return interrupt.into_outcome(self.treat_ignore_as_success);
            }
        }

        debug!(runs = self.test_runs, "check passed");
        TestOutcome::Pass
    }

    fn begin_run(&mut self) {
        self.constructor_values.clear();
        self.properties = None;
    }

    // =========================================================================
    // Run bodies
    // =========================================================================

    fn property_run(&mut self) -> Check {
        for parameters in self.constructor_parameters.clone() {
            info!(
                parameter_types = %TypeDescriptor::signature(parameters.types()),
                "testing properties for constructor"
            );
            let mut bean = self.create_instance(&parameters)?;
            let values = self.fill_bean(&mut bean, &parameters)?;
            self.assert_constructor_values(&mut bean, &parameters)?;
            self.assert_property_values(&mut bean, &parameters, &values)?;
        }
        Ok(())
    }

    fn copy_equals_run(&mut self) -> Check {
        let equals = self.require_equals()?;
        let copy = self.require_copy()?;
        for parameters in self.constructor_parameters.clone() {
            let mut original = self.create_instance(&parameters)?;
            self.fill_bean(&mut original, &parameters)?;
            let copied = copy(&original);
            ensure_that(
                equals(&original, &copied),
                "Bean created with copy constructor is not equal to original bean",
            )?;
        }
        Ok(())
    }

    fn copy_values_run(&mut self) -> Check {
        let copy = self.require_copy()?;
        for parameters in self.constructor_parameters.clone() {
            info!(
                parameter_types = %TypeDescriptor::signature(parameters.types()),
                "testing properties for copy constructor"
            );
            let mut original = self.create_instance(&parameters)?;
            let values = self.fill_bean(&mut original, &parameters)?;
            let mut copied = copy(&original);
            self.assert_constructor_values(&mut copied, &parameters)?;
            self.assert_property_values(&mut copied, &parameters, &values)?;
        }
        Ok(())
    }

    fn copy_empty_equals_run(&mut self) -> Check {
        let equals = self.require_equals()?;
        let copy = self.require_copy()?;
        for parameters in self.constructor_parameters.clone() {
            let original = self.create_instance(&parameters)?;
            let copied = copy(&original);
            ensure_that(
                equals(&original, &copied),
                "Bean created with copy constructor is not equal to original bean",
            )?;
        }
        Ok(())
    }

    /// Unfilled copy must carry the source's initial values
    fn copy_empty_values_run(&mut self) -> Check {
        let copy = self.require_copy()?;
        for parameters in self.constructor_parameters.clone() {
            let mut original = self.create_instance(&parameters)?;
            let mut copied = copy(&original);
            let properties = self.properties()?;
            let introspector = introspector(&self.class, &self.ignored);
            for property in properties {
                if parameters.sets(&property.name) {
                    continue;
                }
                let expected = introspector.read(&mut original, &property)?;
                let actual = introspector.read(&mut copied, &property)?;
                assert_value_eq(&format!("Property value {}", property.name), &expected, &actual)?;
            }
        }
        Ok(())
    }

    fn to_string_run(&mut self, filled: bool) -> Check {
        let Some(display) = self.class.display_hook().cloned() else {
            return skip(format!(
                "{} does not implement a string representation",
                self.class.name()
            ));
        };

        for parameters in self.constructor_parameters.clone() {
            let mut bean = self.create_instance(&parameters)?;
            if filled {
                self.fill_bean(&mut bean, &parameters)?;
            }
            let rendered = display(&bean);
            ensure_that(
                !rendered.is_empty(),
                format!(
                    "String representation of {} is empty for constructor {}",
                    self.class.name(),
                    TypeDescriptor::signature(parameters.types())
                ),
            )?;
        }
        Ok(())
    }

    fn equals_identity_run(&mut self) -> Check {
        let equals = self.require_equals()?;
        for parameters in self.constructor_parameters.clone() {
            let mut bean = self.create_instance(&parameters)?;
            self.fill_bean(&mut bean, &parameters)?;
            ensure_that(equals(&bean, &bean), "Same beans are not equal")?;
        }
        Ok(())
    }

    fn equals_values_run(&mut self) -> Check {
        let equals = self.require_equals()?;
        for parameters in self.constructor_parameters.clone() {
            let (first, second) = self.twin_beans(&parameters)?;
            ensure_that(
                equals(&first, &second),
                "Beans with same property values are not equal",
            )?;
        }
        Ok(())
    }

    fn hash_code_run(&mut self) -> Check {
        let Some(hash) = self.class.hash_hook().cloned() else {
            return skip(format!("{} does not implement hashing", self.class.name()));
        };

        for parameters in self.constructor_parameters.clone() {
            let (first, second) = self.twin_beans(&parameters)?;
            let (first, second) = (hash(&first), hash(&second));
            ensure_that(
                first == second,
                format!(
                    "Beans with same property values do not have same hashCode: expected <{}> but was <{}>",
                    first, second
                ),
            )?;
        }
        Ok(())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn require_equals(&self) -> Check<EqualsFn<T>> {
        match self.class.equals_hook() {
            Some(equals) => Ok(equals.clone()),
            None => skip(format!(
                "{} does not implement equality",
                self.class.name()
            )),
        }
    }

    fn require_copy(&self) -> Check<CopyFn<T>> {
        match self.class.copy_hook() {
            Some(copy) => Ok(copy.clone()),
            None => skip(format!(
                "{} does not implement a copy constructor",
                self.class.name()
            )),
        }
    }

    /// Property list, memoized for the current run
    fn properties(&mut self) -> Result<Vec<PropertyDescriptor>> {
        if let Some(properties) = &self.properties {
            return Ok(properties.clone());
        }
        let properties = introspector(&self.class, &self.ignored).properties()?;
        self.properties = Some(properties.clone());
        Ok(properties)
    }

    /// Construct through the overload, reusing this run's cached arguments
    fn create_instance(&mut self, parameters: &ConstructorParameters) -> Check<T> {
        let types = parameters.types().to_vec();
        let args = match self.constructor_values.get(&types) {
            Some(args) => args.clone(),
            None => {
                let args = types
                    .iter()
                    .map(|ty| self.factory.create_value(ty))
                    .collect::<Result<Vec<_>>>()?;
                self.constructor_values.insert(types.clone(), args.clone());
                args
            }
        };
        let constructor = self.class.find_constructor(&types)?;
        Ok(constructor.construct(args)?)
    }

    /// Populate every property the constructor does not set
    fn fill_bean(&mut self, bean: &mut T, parameters: &ConstructorParameters) -> Check<IndexMap<String, Value>> {
        let properties = self.properties()?;
        let introspector = introspector(&self.class, &self.ignored);
        let mut values = IndexMap::new();

        for property in properties {
            if parameters.sets(&property.name) {
                continue;
            }
            let value = match self.factory.create_value(&property.ty) {
                Ok(value) => value,
                Err(err @ HarnessError::UnsupportedType { .. }) => {
                    return fail(format!(
                        "Could not create value for property '{}': {}",
                        property.name, err
                    ));
                }
                Err(err) => return Err(err.into()),
            };
            introspector.write(bean, &property, value.clone())?;
            values.insert(property.name, value);
        }
        Ok(values)
    }

    fn assert_constructor_values(&mut self, bean: &mut T, parameters: &ConstructorParameters) -> Check {
        let Some(expected) = self.constructor_values.get(parameters.types()).cloned() else {
            return Ok(());
        };
        let introspector = introspector(&self.class, &self.ignored);
        for (name, expected) in parameters.names().iter().zip(expected) {
            if introspector.is_ignored(name) {
                continue;
            }
            let property = introspector.describe(name)?;
            let actual = introspector.read(bean, &property)?;
            assert_value_eq(&format!("Constructor property value {}", name), &expected, &actual)?;
        }
        Ok(())
    }

    fn assert_property_values(
        &mut self,
        bean: &mut T,
        parameters: &ConstructorParameters,
        values: &IndexMap<String, Value>,
    ) -> Check {
        let properties = self.properties()?;
        let introspector = introspector(&self.class, &self.ignored);
        for property in properties {
            if parameters.sets(&property.name) {
                continue;
            }
            let Some(expected) = values.get(&property.name) else {
                continue;
            };
            let actual = introspector.read(bean, &property)?;
            assert_value_eq(&format!("Property value {}", property.name), expected, &actual)?;
        }
        Ok(())
    }

    /// Two independently constructed beans populated with identical values
    fn twin_beans(&mut self, parameters: &ConstructorParameters) -> Check<(T, T)> {
        let mut first = self.create_instance(parameters)?;
        let values = self.fill_bean(&mut first, parameters)?;
        let mut second = self.create_instance(parameters)?;

        let properties = self.properties()?;
        let introspector = introspector(&self.class, &self.ignored);
        for property in &properties {
            if let Some(value) = values.get(&property.name) {
                introspector.write(&mut second, property, value.clone())?;
            }
        }
        Ok((first, second))
    }
}

fn introspector<'a, T: 'static>(
    class: &'a ClassDescriptor<T>,
    ignored: &IndexSet<String>,
) -> PropertyIntrospector<'a, T> {
    PropertyIntrospector::new(class).ignoring(ignored.iter().cloned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::MethodDescriptor;
    use crate::synth::SequentialSource;
    use crate::types::Describe;

    #[derive(Debug, Clone, Default, PartialEq, Hash)]
    struct Point {
        x: i32,
        y: i32,
        label: String,
    }

    impl std::fmt::Display for Point {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "Point({}, {}, {})", self.x, self.y, self.label)
        }
    }

    fn point_class() -> ClassDescriptor<Point> {
        ClassDescriptor::new("Point")
            .constructor0(Point::default)
            .constructor2(|x: i32, y: i32| Point {
                x,
                y,
                ..Point::default()
            })
            .field("x", |p: &Point| &p.x, |p: &mut Point| &mut p.x)
            .field("y", |p: &Point| &p.y, |p: &mut Point| &mut p.y)
            .field("label", |p: &Point| &p.label, |p: &mut Point| &mut p.label)
            .equality()
            .hashing()
            .display()
            .copy_constructor()
    }

    fn exerciser() -> BeanExerciser<Point> {
        BeanExerciser::from_config(point_class(), &HarnessConfig::default())
            .unwrap()
            .value_factory(ValueFactory::with_source(SequentialSource::default()))
            .test_runs(3)
    }

    #[derive(Debug, Clone, Default)]
    struct Moody;

    fn moody_class(mood: TypeDescriptor) -> ClassDescriptor<Moody> {
        ClassDescriptor::new("Moody")
            .constructor0(|| Moody)
            .method(MethodDescriptor::new("get_mood", Vec::new(), mood.clone(), |_bean, _args| {
                Ok(Value::Unit)
            }))
            .method(MethodDescriptor::new("set_mood", vec![mood], TypeDescriptor::Unit, |_bean, _args| {
                Ok(Value::Unit)
            }))
    }

    #[test]
    fn configuration_errors_while_filling_are_not_disguised() {
        let empty = TypeDescriptor::Enum {
            name: "Mood",
            variants: &[],
        };
        let mut exerciser = BeanExerciser::from_config(moody_class(empty), &HarnessConfig::default())
            .unwrap()
            .test_runs(1);
        let outcome = exerciser.property_test_for_all_constructors();
        let reason = outcome.expect_failure();
        assert!(reason.starts_with("configuration error:"), "{}", reason);
        assert!(reason.contains("Mood"), "{}", reason);
    }

    #[test]
    fn unsupported_property_type_fails_the_check() {
        let mut exerciser =
            BeanExerciser::from_config(moody_class(TypeDescriptor::Named("Mood")), &HarnessConfig::default())
                .unwrap()
                .test_runs(1);
        let outcome = exerciser.property_test_for_all_constructors();
        assert!(
            outcome
                .expect_failure()
                .starts_with("Could not create value for property 'mood'"),
            "{}",
            outcome
        );
    }

    #[test]
    fn malformed_constructor_parameters_are_rejected() {
        let err = ConstructorParameters::new(vec![i32::descriptor()], Vec::<String>::new()).unwrap_err();
        assert_eq!(
            err,
            HarnessError::MalformedConstructorParameters { types: 1, names: 0 }
        );
    }

    #[test]
    fn well_formed_bean_passes_every_check() {
        let two_args =
            ConstructorParameters::new(vec![i32::descriptor(), i32::descriptor()], ["x", "y"]).unwrap();
        let mut exerciser = exerciser().constructor_parameters([ConstructorParameters::empty(), two_args]);
        let report = exerciser.run_all();
        report.assert_all_passed();
        assert_eq!(report.checks.len(), 10);
    }

    #[test]
    fn constructor_arguments_are_reused_within_a_run() {
        let two_args =
            ConstructorParameters::new(vec![i32::descriptor(), i32::descriptor()], ["x", "y"]).unwrap();
        let mut exerciser = exerciser();
        let first = exerciser.create_instance(&two_args).unwrap();
        let second = exerciser.create_instance(&two_args).unwrap();
        assert_eq!((first.x, first.y), (second.x, second.y));

        exerciser.begin_run();
        let third = exerciser.create_instance(&two_args).unwrap();
        assert_ne!((first.x, first.y), (third.x, third.y));
    }

    #[test]
    fn missing_hooks_skip_or_pass() {
        let class = ClassDescriptor::<Point>::new("Point")
            .constructor0(Point::default)
            .field("x", |p: &Point| &p.x, |p: &mut Point| &mut p.x);
        let mut exerciser = BeanExerciser::from_config(class, &HarnessConfig::default())
            .unwrap()
            .test_runs(1);

        assert_eq!(exerciser.hash_code_test(), TestOutcome::Pass);

        let mut strict = exerciser.treat_ignore_as_success(false);
        assert!(strict.equals_values_test().is_skip());
        assert!(strict.copy_constructor_values_test().is_skip());
        assert!(strict.to_string_test_for_all_constructors_empty().is_skip());
        assert!(strict.property_test_for_all_constructors().is_pass());
    }

    #[test]
    fn unknown_constructor_property_is_a_configuration_failure() {
        let params = ConstructorParameters::new(vec![i32::descriptor(), i32::descriptor()], ["x", "nope"]).unwrap();
        let mut exerciser = exerciser().constructor_parameters([params]);
        let outcome = exerciser.property_test_for_all_constructors();
        assert!(outcome.expect_failure().starts_with("configuration error"));
    }

    #[test]
    fn check_names_are_snake_case() {
        assert_eq!(
            BeanCheck::PropertyTestForAllConstructors.to_string(),
            "property_test_for_all_constructors"
        );
        assert_eq!(BeanCheck::iter().count(), 10);
    }
}
