#![allow(dead_code)]

use bean_harness::{
    BeanExerciser, CallRecorder, ClassDescriptor, DelegateTarget, DelegateVerifier, Describe,
    ErrorExerciser, HarnessConfig, IntoValue, SampleCause, SequentialSource, TargetMethod,
    TypeDescriptor, ValueFactory,
};
use std::collections::BTreeMap;
use std::fmt;
use strum::{EnumString, IntoStaticStr, VariantNames};
use thiserror::Error;

// =============================================================================
// Beans
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, VariantNames, IntoStaticStr, EnumString)]
pub enum Tier {
    #[default]
    Basic,
    Plus,
    Premium,
}

bean_harness::enum_value!(Tier);

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Customer {
    name: String,
    age: i32,
    active: bool,
    tier: Tier,
    tags: Vec<String>,
}

impl Customer {
    pub fn named(name: String) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    pub fn with_name_and_age(name: String, age: i32) -> Self {
        Self {
            name,
            age,
            ..Self::default()
        }
    }
}

impl fmt::Display for Customer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Customer[name={}, age={}, active={}, tier={:?}]",
            self.name, self.age, self.active, self.tier
        )
    }
}

/// Ways a customer descriptor can be broken
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    LossySetter,
    IdentityEquals,
    RandomHash,
    EmptyDisplay,
    ShallowCopy,
}

pub fn customer_class() -> ClassDescriptor<Customer> {
    customer_class_with(None)
}

/// Accessor-style customer, optionally with one injected fault
pub fn customer_class_with(fault: Option<Fault>) -> ClassDescriptor<Customer> {
    let class = ClassDescriptor::new("Customer")
        .constructor0(Customer::default)
        .constructor1(Customer::named)
        .constructor2(Customer::with_name_and_age)
        .getter("get_name", |c: &Customer| c.name.clone())
        .setter("set_name", |c: &mut Customer, name: String| c.name = name)
        .getter("get_age", |c: &Customer| c.age);

    let class = if fault == Some(Fault::LossySetter) {
        class.setter("set_age", |c: &mut Customer, _age: i32| c.age = rand::random())
    } else {
        class.setter("set_age", |c: &mut Customer, age: i32| c.age = age)
    };

    let class = class
        .getter("is_active", |c: &Customer| c.active)
        .setter("set_active", |c: &mut Customer, active: bool| c.active = active)
        .getter("tier", |c: &Customer| c.tier)
        .setter("set_tier", |c: &mut Customer, tier: Tier| c.tier = tier)
        .getter("get_tags", |c: &Customer| c.tags.clone())
        .setter("set_tags", |c: &mut Customer, tags: Vec<String>| c.tags = tags);

    let class = match fault {
        Some(Fault::IdentityEquals) => class.equality_with(|a: &Customer, b: &Customer| std::ptr::eq(a, b)),
        _ => class.equality(),
    };
    let class = match fault {
        Some(Fault::RandomHash) => class.hashing_with(|_: &Customer| rand::random()),
        _ => class.hashing(),
    };
    let class = match fault {
        Some(Fault::EmptyDisplay) => class.display_with(|_: &Customer| String::new()),
        _ => class.display(),
    };
    match fault {
        Some(Fault::ShallowCopy) => class.copy_constructor_with(|c: &Customer| Customer::named(c.name.clone())),
        _ => class.copy_constructor(),
    }
}

pub fn name_only() -> bean_harness::ConstructorParameters {
    bean_harness::ConstructorParameters::new(vec![String::descriptor()], ["name"])
        .expect("well-formed parameters")
}

pub fn name_and_age() -> bean_harness::ConstructorParameters {
    bean_harness::ConstructorParameters::new(
        vec![String::descriptor(), i32::descriptor()],
        ["name", "age"],
    )
    .expect("well-formed parameters")
}

/// Exerciser over a sequential stream so failures are reproducible
pub fn customer_exerciser(class: ClassDescriptor<Customer>) -> BeanExerciser<Customer> {
    BeanExerciser::from_config(class, &HarnessConfig::default())
        .expect("default config")
        .value_factory(ValueFactory::with_source(SequentialSource::default()))
        .test_runs(5)
        .constructor_parameters([
            bean_harness::ConstructorParameters::empty(),
            name_only(),
            name_and_age(),
        ])
}

/// Field-style bean layered over a customer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Account {
    pub customer: Customer,
    pub balance: f64,
    pub limits: BTreeMap<String, i64>,
    pub audit_log: Vec<String>,
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Account[{}, balance={}]", self.customer, self.balance)
    }
}

pub fn account_class() -> ClassDescriptor<Account> {
    ClassDescriptor::new("Account")
        .constructor0(Account::default)
        .constructor1(|balance: f64| Account {
            balance,
            ..Account::default()
        })
        .static_field("KIND", String::descriptor())
        .field("balance", |a: &Account| &a.balance, |a: &mut Account| &mut a.balance)
        .field("limits", |a: &Account| &a.limits, |a: &mut Account| &mut a.limits)
        .transient_field("audit_log", |a: &Account| &a.audit_log, |a: &mut Account| &mut a.audit_log)
        .extends(
            &customer_class(),
            |a: &Account| &a.customer,
            |a: &mut Account| &mut a.customer,
        )
        .equality()
        .display()
        .copy_constructor()
}

// =============================================================================
// Delegates
// =============================================================================

pub trait Store {
    fn get(&self, key: String) -> i64;
    fn put(&self, key: String, value: i64);
    fn keys(&self) -> Vec<String>;
}

/// Store whose every call goes to a recorder
pub struct RecordingStore(pub CallRecorder);

impl Store for RecordingStore {
    fn get(&self, key: String) -> i64 {
        self.0.call("get", vec![key.into_value()])
    }

    fn put(&self, key: String, value: i64) {
        self.0.call::<()>("put", vec![key.into_value(), value.into_value()])
    }

    fn keys(&self) -> Vec<String> {
        self.0.call("keys", Vec::new())
    }
}

/// Forwards everything
pub struct ForwardingStore<S> {
    inner: S,
}

impl<S: Store> Store for ForwardingStore<S> {
    fn get(&self, key: String) -> i64 {
        self.inner.get(key)
    }

    fn put(&self, key: String, value: i64) {
        self.inner.put(key, value)
    }

    fn keys(&self) -> Vec<String> {
        self.inner.keys()
    }
}

/// Normalizes keys before forwarding and never forwards `keys`
pub struct LossyStore<S> {
    inner: S,
}

impl<S: Store> Store for LossyStore<S> {
    fn get(&self, key: String) -> i64 {
        self.inner.get(key.to_uppercase())
    }

    fn put(&self, key: String, value: i64) {
        self.inner.put(key, value)
    }

    fn keys(&self) -> Vec<String> {
        Vec::new()
    }
}

pub fn store_target() -> DelegateTarget {
    DelegateTarget::new("Store")
        .method(TargetMethod::new("get", vec![String::descriptor()], i64::descriptor()))
        .method(TargetMethod::new(
            "put",
            vec![String::descriptor(), i64::descriptor()],
            TypeDescriptor::Unit,
        ))
        .method(TargetMethod::new("keys", Vec::new(), Vec::<String>::descriptor()))
        .method(TargetMethod::new("open", Vec::new(), TypeDescriptor::Named("Store")).into_static())
}

fn bind_store<W: Store + 'static>(verifier: DelegateVerifier<W>) -> DelegateVerifier<W> {
    verifier
        .bind1("get", |store: &W, key: String| store.get(key))
        .bind2("put", |store: &W, key: String, value: i64| store.put(key, value))
        .bind0("keys", |store: &W| store.keys())
}

pub fn forwarding_store_verifier() -> DelegateVerifier<ForwardingStore<RecordingStore>> {
    let verifier = DelegateVerifier::new("ForwardingStore", store_target(), |recorder| ForwardingStore {
        inner: RecordingStore(recorder),
    })
    .expect("default config")
    .value_factory(ValueFactory::with_source(SequentialSource::default()));
    bind_store(verifier)
}

pub fn lossy_store_verifier() -> DelegateVerifier<LossyStore<RecordingStore>> {
    let verifier = DelegateVerifier::new("LossyStore", store_target(), |recorder| LossyStore {
        inner: RecordingStore(recorder),
    })
    .expect("default config")
    .value_factory(ValueFactory::with_source(SequentialSource::starting_at(0xabc)));
    bind_store(verifier)
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("")]
    Unknown,
    #[error("{0}")]
    Message(String),
    #[error("{source}")]
    Cause { source: SampleCause },
    #[error("{message}")]
    MessageCause { message: String, source: SampleCause },
}

pub fn store_error_exerciser() -> ErrorExerciser<StoreError> {
    ErrorExerciser::new("StoreError")
        .expect("environment config")
        .default_constructor(|| StoreError::Unknown)
        .message_constructor(StoreError::Message)
        .cause_constructor(|source| StoreError::Cause { source })
        .message_cause_constructor(|message, source| StoreError::MessageCause { message, source })
}

/// Error that drops its cause
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ForgetfulError {
    message: String,
}

pub fn forgetful_error_exerciser() -> ErrorExerciser<ForgetfulError> {
    ErrorExerciser::new("ForgetfulError")
        .expect("environment config")
        .message_constructor(|message| ForgetfulError { message })
        .message_cause_constructor(|message, _cause| ForgetfulError { message })
}
