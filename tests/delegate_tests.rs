mod support;

use bean_harness::{
    CallRecorder, Describe, IntoValue, TestMethod, TestOutcome, Value,
    declared_test_methods_for,
};
use support::{forwarding_store_verifier, lossy_store_verifier, store_target};

bean_harness::delegate_test_suite!(forwarding_store, support::forwarding_store_verifier());

#[test]
fn static_target_methods_are_not_exercised() {
    let names: Vec<_> = declared_test_methods_for(&store_target())
        .into_iter()
        .map(|method| method.name)
        .collect();
    assert_eq!(names, vec!["get", "put", "keys"]);
}

#[test]
fn forwarding_wrapper_passes() {
    assert_eq!(forwarding_store_verifier().test_delegate_methods(), TestOutcome::Pass);
}

#[test]
fn altered_arguments_are_reported() {
    let outcome = lossy_store_verifier().test_delegate_methods();
    let reason = outcome.expect_failure();
    assert!(
        reason.starts_with("Error testing delegate method get([string])"),
        "{}",
        reason
    );
    assert!(reason.contains("unexpected call get("), "{}", reason);
}

#[test]
fn swallowed_call_is_reported() {
    let outcome = lossy_store_verifier()
        .test_methods(vec![TestMethod::new("keys", Vec::<String>::descriptor(), Vec::new())])
        .test_delegate_methods();
    assert!(
        outcome.expect_failure().contains("return value not forwarded"),
        "{}",
        outcome
    );
}

#[test]
fn fixed_parameters_replace_synthesized_ones() {
    let outcome = lossy_store_verifier()
        .test_methods(vec![
            TestMethod::new("get", i64::descriptor(), vec![String::descriptor()])
                .with_parameters(vec!["KEY".to_string().into_value()]),
            TestMethod::void("put", vec![String::descriptor(), i64::descriptor()]),
        ])
        .test_delegate_methods();
    assert_eq!(outcome, TestOutcome::Pass);
}

#[test]
fn unbound_wrapper_method_fails() {
    let outcome = forwarding_store_verifier()
        .test_methods(vec![TestMethod::void("clear", Vec::new())])
        .test_delegate_methods();
    assert!(
        outcome
            .expect_failure()
            .starts_with("Error testing delegate method clear([])"),
        "{}",
        outcome
    );
}

#[test]
fn recorder_reports_missing_calls() {
    let recorder = CallRecorder::new();
    recorder.expect("put", vec![Value::Str("k".into()), Value::I64(1)], Value::Unit);
    assert_eq!(
        recorder.verify(),
        Err("expected call put(\"k\", 1) was not made".to_string())
    );

    recorder.call::<()>("put", vec![Value::Str("k".into()), Value::I64(1)]);
    assert_eq!(recorder.verify(), Ok(()));
    assert_eq!(recorder.calls().len(), 1);
}

#[test]
fn altered_return_value_is_reported() {
    use support::{RecordingStore, Store};

    let verifier = bean_harness::DelegateVerifier::new("OffByOne", store_target(), RecordingStore)
        .expect("default config")
        .bind1("get", |store: &RecordingStore, key: String| store.get(key).wrapping_add(1));
    let outcome = verifier
        .test_methods(vec![TestMethod::new("get", i64::descriptor(), vec![String::descriptor()])])
        .test_delegate_methods();
    let reason = outcome.expect_failure();
    assert!(reason.starts_with("Error testing delegate method get([string])"), "{}", reason);
    assert!(reason.contains("return value not forwarded"), "{}", reason);
}
