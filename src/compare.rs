//! Type-aware equality used by every exerciser assertion
//!
//! Floats compare within [`DELTA`]; arrays and sequences element-wise; sets as
//! multisets via mutual containment and size; maps by key regardless of order.

use crate::outcome::{Check, Interrupt};
use crate::value::Value;

/// Absolute tolerance for floating point comparison
pub const DELTA: f64 = 1e-13;

pub fn values_equal(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::F64(a), Value::F64(b)) => floats_equal(*a, *b),
        (Value::F32(a), Value::F32(b)) => floats_equal(f64::from(*a), f64::from(*b)),
        (Value::Array(a), Value::Array(b)) | (Value::Sequence(a), Value::Sequence(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (Value::Set(a), Value::Set(b)) => {
            a.len() == b.len() && contains_all(b, a) && contains_all(a, b)
        }
        (Value::Map(a), Value::Map(b)) => {
            a.len() == b.len()
                && a.iter().all(|(key, value)| {
                    b.iter()
                        .find(|(other_key, _)| values_equal(key, other_key))
                        .is_some_and(|(_, other_value)| values_equal(value, other_value))
                })
        }
        (Value::Holder(a), Value::Holder(b)) => values_equal(a, b),
        _ => expected == actual,
    }
}

/// Fail with `"{message}: expected <..> but was <..>"` unless equal
pub fn assert_value_eq(message: &str, expected: &Value, actual: &Value) -> Check {
    if values_equal(expected, actual) {
        Ok(())
    } else {
        Err(Interrupt::Fail(format!(
            "{}: expected <{}> but was <{}>",
            message, expected, actual
        )))
    }
}

/// Same NaN/infinity handling as an exact compare, otherwise within tolerance
fn floats_equal(a: f64, b: f64) -> bool {
    if a == b || (a.is_nan() && b.is_nan()) {
        return true;
    }
    (a - b).abs() <= DELTA
}

fn contains_all(haystack: &[Value], needles: &[Value]) -> bool {
    needles
        .iter()
        .all(|needle| haystack.iter().any(|item| values_equal(needle, item)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floats_compare_within_tolerance() {
        assert!(values_equal(&Value::F64(0.1 + 0.2), &Value::F64(0.3)));
        assert!(!values_equal(&Value::F64(0.3), &Value::F64(0.3001)));
        assert!(values_equal(&Value::F64(f64::NAN), &Value::F64(f64::NAN)));
    }

    #[test]
    fn arrays_compare_element_wise() {
        let a = Value::Array(vec![Value::F64(1.0), Value::F64(2.0)]);
        let b = Value::Array(vec![Value::F64(1.0), Value::F64(2.0 + 1e-15)]);
        let c = Value::Array(vec![Value::F64(2.0), Value::F64(1.0)]);
        assert!(values_equal(&a, &b));
        assert!(!values_equal(&a, &c));
    }

    #[test]
    fn sets_ignore_order() {
        let a = Value::Set(vec![Value::Str("x".into()), Value::Str("y".into())]);
        let b = Value::Set(vec![Value::Str("y".into()), Value::Str("x".into())]);
        assert!(values_equal(&a, &b));
    }

    #[test]
    fn mismatch_message_names_both_values() {
        let err = assert_value_eq("Property value n", &Value::I32(1), &Value::I32(2)).unwrap_err();
        assert_eq!(
            err,
            Interrupt::Fail("Property value n: expected <1> but was <2>".to_string())
        );
    }

    #[test]
    fn different_kinds_never_match() {
        assert!(!values_equal(&Value::I32(1), &Value::I64(1)));
    }
}
