//! Bean checks against well-formed fixtures

mod support;

use bean_harness::outcome::OutcomeStatus;
use bean_harness::{
    BeanCheck, BeanExerciser, ConstructorParameters, Describe, HarnessConfig, PropertyIntrospector,
    SequentialSource, TestOutcome, Value, ValueFactory,
};
use strum::IntoEnumIterator;
use support::{Customer, Tier, account_class, customer_class, customer_exerciser};

bean_harness::bean_test_suite!(customer_suite, support::customer_exerciser(support::customer_class()));

bean_harness::bean_test_suite!(
    account_suite,
    BeanExerciser::new(support::account_class())
        .expect("default config")
        .test_runs(3)
);

#[test]
fn customer_passes_every_check() {
    let mut exerciser = customer_exerciser(customer_class());
    let report = exerciser.run_all();
    report.assert_all_passed();
    assert_eq!(report.count(OutcomeStatus::Pass), BeanCheck::iter().count());
}

#[test]
fn inherited_properties_are_exercised_through_the_lens() {
    let class = account_class();
    let introspector = PropertyIntrospector::new(&class);
    let names: Vec<_> = introspector.property_names().into_iter().collect();
    assert_eq!(
        names,
        vec!["balance", "limits", "name", "age", "active", "tier", "tags"]
    );

    let balance_only =
        ConstructorParameters::new(vec![f64::descriptor()], ["balance"]).expect("well-formed parameters");
    let mut exerciser = BeanExerciser::new(class)
        .expect("default config")
        .test_runs(4)
        .constructor_parameters([ConstructorParameters::empty(), balance_only]);
    exerciser.run_all().assert_all_passed();
}

#[test]
fn introspection_is_idempotent() {
    let class = customer_class();
    let introspector = PropertyIntrospector::new(&class);
    assert_eq!(introspector.property_names(), introspector.property_names());
    assert_eq!(
        introspector.properties().expect("properties"),
        PropertyIntrospector::new(&class).properties().expect("properties")
    );
}

#[test]
fn account_without_hashing_skips_hash_check_when_strict() {
    let mut exerciser = BeanExerciser::new(account_class())
        .expect("default config")
        .test_runs(1)
        .treat_ignore_as_success(false);
    let outcome = exerciser.hash_code_test();
    assert!(outcome.is_skip(), "unexpected outcome: {}", outcome);
}

#[test]
fn ignored_properties_are_never_written() {
    let class = bean_harness::ClassDescriptor::new("Customer")
        .constructor0(Customer::default)
        .getter("get_name", |c: &Customer| format!("{}", c))
        .setter("set_name", |_c: &mut Customer, _name: String| {})
        .equality();

    let mut strict = BeanExerciser::new(class.clone()).expect("default config").test_runs(2);
    assert!(strict.property_test_for_all_constructors().is_fail());

    let mut relaxed = BeanExerciser::new(class)
        .expect("default config")
        .test_runs(2)
        .ignore_properties(["name"]);
    assert_eq!(relaxed.property_test_for_all_constructors(), TestOutcome::Pass);
}

#[test]
fn domain_types_use_registered_overrides() {
    let mut exerciser = customer_exerciser(customer_class()).with_override(
        Vec::<String>::descriptor(),
        |_factory| Ok(Value::Sequence(vec![Value::Str("vip".to_string())])),
    );
    assert_eq!(exerciser.property_test_for_all_constructors(), TestOutcome::Pass);
}

#[test]
fn enum_properties_draw_declared_variants() {
    let mut factory = ValueFactory::with_source(SequentialSource::default());
    for _ in 0..6 {
        let tier: Tier = factory.create().expect("tier");
        assert!(matches!(tier, Tier::Basic | Tier::Plus | Tier::Premium));
    }
}

#[test]
fn report_serializes_outcomes() {
    let mut exerciser = BeanExerciser::from_config(customer_class(), &HarnessConfig::default())
        .expect("default config")
        .test_runs(1);
    let report = exerciser.run_all();
    let json = report.to_json().expect("json");
    let parsed: serde_json::Value = serde_json::from_str(&json).expect("parse");
    assert_eq!(parsed["subject"], "Customer");
    assert_eq!(parsed["checks"].as_array().map(Vec::len), Some(10));
    assert_eq!(parsed["checks"][0]["check"], "property_test_for_all_constructors");
}
