//! Suite macros: one `#[test]` per check.
//!
//! ```rust,ignore
//! bean_harness::bean_test_suite!(person_bean, BeanExerciser::new(person_class()).unwrap());
//! bean_harness::error_test_suite!(store_error, store_error_exerciser());
//! bean_harness::delegate_test_suite!(logging_store, logging_store_verifier());
//! ```
//!
//! Each macro expands into a module named after its first argument. The
//! exerciser expression is evaluated afresh for every test, with logging
//! initialized from the environment first.

/// Expand into the ten bean checks
#[macro_export]
macro_rules! bean_test_suite {
    ($suite:ident, $exerciser:expr) => {
        #[cfg(test)]
        mod $suite {
            #[allow(unused_imports)]
            use super::*;

            fn check(check: $crate::bean::BeanCheck) {
                $crate::logging::init_test_logging();
                let mut exerciser = $exerciser;
                exerciser.run(check).assert_not_failed();
            }

            #[test]
            fn property_test_for_all_constructors() {
                check($crate::bean::BeanCheck::PropertyTestForAllConstructors);
            }

            #[test]
            fn copy_constructor_equals_test() {
                check($crate::bean::BeanCheck::CopyConstructorEqualsTest);
            }

            #[test]
            fn copy_constructor_values_test() {
                check($crate::bean::BeanCheck::CopyConstructorValuesTest);
            }

            #[test]
            fn copy_constructor_empty_equals_test() {
                check($crate::bean::BeanCheck::CopyConstructorEmptyEqualsTest);
            }

            #[test]
            fn copy_constructor_empty_values_test() {
                check($crate::bean::BeanCheck::CopyConstructorEmptyValuesTest);
            }

            #[test]
            fn to_string_test_for_all_constructors_empty() {
                check($crate::bean::BeanCheck::ToStringTestForAllConstructorsEmpty);
            }

            #[test]
            fn to_string_test_for_all_constructors_filled() {
                check($crate::bean::BeanCheck::ToStringTestForAllConstructorsFilled);
            }

            #[test]
            fn equals_identity_test() {
                check($crate::bean::BeanCheck::EqualsIdentityTest);
            }

            #[test]
            fn equals_values_test() {
                check($crate::bean::BeanCheck::EqualsValuesTest);
            }

            #[test]
            fn hash_code_test() {
                check($crate::bean::BeanCheck::HashCodeTest);
            }
        }
    };
}

/// Expand into the four error constructor checks
#[macro_export]
macro_rules! error_test_suite {
    ($suite:ident, $exerciser:expr) => {
        #[cfg(test)]
        mod $suite {
            #[allow(unused_imports)]
            use super::*;

            fn check(check: $crate::exception::ErrorCheck) {
                $crate::logging::init_test_logging();
                let exerciser = $exerciser;
                exerciser.run(check).assert_not_failed();
            }

            #[test]
            fn default_constructor_test() {
                check($crate::exception::ErrorCheck::DefaultConstructorTest);
            }

            #[test]
            fn message_constructor_test() {
                check($crate::exception::ErrorCheck::MessageConstructorTest);
            }

            #[test]
            fn cause_constructor_test() {
                check($crate::exception::ErrorCheck::CauseConstructorTest);
            }

            #[test]
            fn message_cause_constructor_test() {
                check($crate::exception::ErrorCheck::MessageCauseConstructorTest);
            }
        }
    };
}

/// Expand into the delegate forwarding check
#[macro_export]
macro_rules! delegate_test_suite {
    ($suite:ident, $verifier:expr) => {
        #[cfg(test)]
        mod $suite {
            #[allow(unused_imports)]
            use super::*;

            #[test]
            fn test_delegate_methods() {
                $crate::logging::init_test_logging();
                let mut verifier = $verifier;
                verifier.test_delegate_methods().assert_not_failed();
            }
        }
    };
}
