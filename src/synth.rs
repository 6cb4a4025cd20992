//! Value synthesizer: fabricate test values from type descriptors.
//!
//! Every value is derived from a single stream of 64-bit "test values":
//!
//! - integers are truncated, booleans taken from parity
//! - floats are folded into the range their mantissa holds exactly, then cast
//! - strings are the lower-case hex rendering of the raw value
//! - timestamps lie strictly in the past, spaced by the raw value
//! - enumeration variants and container lengths use an unsigned fold
//! - containers recurse into their element types
//!
//! The stream is seedable so a failing run can be replayed exactly. Types the
//! synthesizer does not know are rejected with
//! [`HarnessError::UnsupportedType`] unless an override is registered.

use crate::config::HarnessConfig;
use crate::error::{HarnessError, Result};
use crate::types::{ContainerKind, Describe, ScalarKind, TypeDescriptor};
use crate::value::{IntoValue, Value};
use chrono::{Duration, Utc};
use rand::rngs::{OsRng, StdRng};
use rand::{RngCore, SeedableRng};
use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use tracing::{debug, info};

/// Timestamps step back this many milliseconds per unit of test value
const TIME_MULT: i64 = 100_000;

/// Bounds the timestamp offset to roughly a century
const TIME_UNITS_BOUND: u64 = 31_536_000;

/// Redraws allowed per missing element when a set or map key collides
const DISTINCT_ATTEMPTS_PER_ELEMENT: usize = 8;

/// Largest container length a factory may be configured to draw
pub const MAX_CONTAINER_LEN: usize = 1 << 16;

/// Integers of magnitude below this are exact as `f32`
const F32_EXACT_RANGE: i64 = 1 << 24;

/// Integers of magnitude below this are exact as `f64`
const F64_EXACT_RANGE: i64 = 1 << 53;

/// Source of raw 64-bit test values
pub trait TestValueSource {
    fn next_test_value(&mut self) -> i64;
}

impl<F> TestValueSource for F
where
    F: FnMut() -> i64,
{
    fn next_test_value(&mut self) -> i64 {
        self()
    }
}

/// Pseudo-random source seeded from a known value
pub struct SeededSource {
    seed: u64,
    rng: StdRng,
}

impl SeededSource {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Draw a fresh seed from the operating system
    pub fn from_entropy() -> Self {
        Self::new(OsRng.next_u64())
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl TestValueSource for SeededSource {
    fn next_test_value(&mut self) -> i64 {
        self.rng.next_u64() as i64
    }
}

/// Monotonically increasing source; every draw differs from the previous one
#[derive(Debug, Clone)]
pub struct SequentialSource {
    next: i64,
}

impl SequentialSource {
    pub fn starting_at(start: i64) -> Self {
        Self { next: start }
    }
}

impl Default for SequentialSource {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl TestValueSource for SequentialSource {
    fn next_test_value(&mut self) -> i64 {
        let value = self.next;
        self.next = self.next.wrapping_add(1);
        value
    }
}

/// Inclusive container length bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthBounds {
    pub min: usize,
    pub max: usize,
}

impl LengthBounds {
    pub fn new(min: usize, max: usize) -> Result<Self> {
        if min > max {
            return Err(HarnessError::InvalidConfig {
                message: format!("container length bounds [{}, {}] are inverted", min, max),
            });
        }
        if max > MAX_CONTAINER_LEN {
            return Err(HarnessError::InvalidConfig {
                message: format!(
                    "container length bound {} exceeds the limit of {}",
                    max, MAX_CONTAINER_LEN
                ),
            });
        }
        Ok(Self { min, max })
    }
}

impl Default for LengthBounds {
    fn default() -> Self {
        Self { min: 3, max: 10 }
    }
}

/// Generator registered for a specific descriptor
pub type Override = Arc<dyn Fn(&mut ValueFactory) -> Result<Value>>;

/// Fabricates values for type descriptors
pub struct ValueFactory {
    source: Box<dyn TestValueSource>,
    bounds: LengthBounds,
    overrides: HashMap<TypeDescriptor, Override>,
    seed: Option<u64>,
}

impl ValueFactory {
    pub fn with_source(source: impl TestValueSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            bounds: LengthBounds::default(),
            overrides: HashMap::new(),
            seed: None,
        }
    }

    /// Factory over a seeded pseudo-random stream
    pub fn seeded(seed: u64) -> Self {
        let mut factory = Self::with_source(SeededSource::new(seed));
        factory.seed = Some(seed);
        factory
    }

    /// Factory seeded from the configured environment variable
    ///
    /// The variable is read once. Without it a seed is drawn from the OS and
    /// logged, so the run can be reproduced by exporting it.
    pub fn from_config(config: &HarnessConfig) -> Result<Self> {
        let variable = config.seed_variable.as_str();
        let seed = match env::var(variable) {
            Ok(raw) if !raw.trim().is_empty() => parse_seed(variable, raw.trim())?,
            _ => SeededSource::from_entropy().seed(),
        };

        info!(
            variable,
            seed = seed as i64,
            "set {}={} to reproduce test values",
            variable,
            seed as i64
        );

        let bounds = LengthBounds::new(config.min_container_len, config.max_container_len)?;
        Ok(Self::seeded(seed).with_bounds(bounds))
    }

    pub fn with_bounds(mut self, bounds: LengthBounds) -> Self {
        self.bounds = bounds;
        self
    }

    /// Register a generator for a descriptor; it wins over the built-in rules
    pub fn with_override<F>(mut self, ty: TypeDescriptor, generator: F) -> Self
    where
        F: Fn(&mut ValueFactory) -> Result<Value> + 'static,
    {
        self.register(ty, generator);
        self
    }

    pub fn register<F>(&mut self, ty: TypeDescriptor, generator: F)
    where
        F: Fn(&mut ValueFactory) -> Result<Value> + 'static,
    {
        self.overrides.insert(ty, Arc::new(generator));
    }

    /// Register a typed generator for a domain type
    pub fn register_type<T, F>(&mut self, generator: F)
    where
        T: Describe + IntoValue,
        F: Fn(&mut ValueFactory) -> Result<T> + 'static,
    {
        self.register(T::descriptor(), move |factory| {
            generator(factory).map(IntoValue::into_value)
        });
    }

    /// Seed of the underlying stream when known
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn bounds(&self) -> LengthBounds {
        self.bounds
    }

    /// Next raw test value
    pub fn next_test_value(&mut self) -> i64 {
        self.source.next_test_value()
    }

    /// Create a test value for the given type
    pub fn create_value(&mut self, ty: &TypeDescriptor) -> Result<Value> {
        if let Some(generator) = self.overrides.get(ty).cloned() {
            return generator(self);
        }

        match ty {
            TypeDescriptor::Unit => Ok(Value::Unit),
            TypeDescriptor::Scalar(kind) => Ok(self.create_scalar(*kind)),
            TypeDescriptor::Dynamic => Ok(self.create_scalar(ScalarKind::String)),
            TypeDescriptor::Enum { name, variants } => {
                if variants.is_empty() {
                    return Err(HarnessError::EmptyEnumeration {
                        name: name.to_string(),
                    });
                }
                let idx = self.create_unsigned_index(variants.len());
                Ok(Value::Enum {
                    type_name: name,
                    variant: variants[idx],
                })
            }
            TypeDescriptor::Array(element) => {
                let len = self.create_length();
                let items = (0..len)
                    .map(|_| self.create_value(element))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Value::Array(items))
            }
            TypeDescriptor::Generic { container, args } => {
                if args.len() != container.arity() {
                    return Err(HarnessError::ArityMismatch {
                        container: container.to_string(),
                        expected: container.arity(),
                        actual: args.len(),
                    });
                }
                self.create_container(*container, args)
            }
            TypeDescriptor::Raw(_) | TypeDescriptor::Variable(_) | TypeDescriptor::Named(_) => {
                Err(HarnessError::UnsupportedType { ty: ty.to_string() })
            }
        }
    }

    /// Create and convert a value for a static type
    pub fn create<T>(&mut self) -> Result<T>
    where
        T: Describe + crate::value::FromValue,
    {
        let value = self.create_value(&T::descriptor())?;
        T::from_value(value)
    }

    fn create_scalar(&mut self, kind: ScalarKind) -> Value {
        let raw = self.next_test_value();
        match kind {
            ScalarKind::I8 => Value::I8(raw as i8),
            ScalarKind::I16 => Value::I16(raw as i16),
            ScalarKind::I32 => Value::I32(raw as i32),
            ScalarKind::I64 => Value::I64(raw),
            ScalarKind::U8 => Value::U8(raw as u8),
            ScalarKind::U16 => Value::U16(raw as u16),
            ScalarKind::U32 => Value::U32(raw as u32),
            ScalarKind::U64 => Value::U64(raw as u64),
            ScalarKind::F32 => Value::F32((raw % F32_EXACT_RANGE) as f32),
            ScalarKind::F64 => Value::F64((raw % F64_EXACT_RANGE) as f64),
            ScalarKind::Bool => Value::Bool(raw % 2 == 0),
            ScalarKind::Char => Value::Char(char_from_raw(raw)),
            ScalarKind::String => Value::Str(format!("{:x}", raw)),
            ScalarKind::Timestamp => {
                let units = raw.unsigned_abs() % TIME_UNITS_BOUND + 1;
                let offset = Duration::milliseconds(units as i64 * TIME_MULT);
                Value::Timestamp(Utc::now() - offset)
            }
        }
    }

    fn create_container(&mut self, container: ContainerKind, args: &[TypeDescriptor]) -> Result<Value> {
        match container {
            ContainerKind::Sequence => {
                let len = self.create_length();
                let items = (0..len)
                    .map(|_| self.create_value(&args[0]))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Value::Sequence(items))
            }
            ContainerKind::Set => {
                let len = self.create_length();
                let mut items: Vec<Value> = Vec::with_capacity(len);
                let mut attempts = len * DISTINCT_ATTEMPTS_PER_ELEMENT;
                while items.len() < len && attempts > 0 {
                    let item = self.create_value(&args[0])?;
                    if !items.contains(&item) {
                        items.push(item);
                    }
                    attempts -= 1;
                }
                if items.len() < len {
                    debug!(
                        element = %args[0],
                        requested = len,
                        produced = items.len(),
                        "element domain too small for requested set size"
                    );
                }
                Ok(Value::Set(items))
            }
            ContainerKind::Map => {
                let len = self.create_length();
                let mut entries: Vec<(Value, Value)> = Vec::with_capacity(len);
                let mut attempts = len * DISTINCT_ATTEMPTS_PER_ELEMENT;
                while entries.len() < len && attempts > 0 {
                    let key = self.create_value(&args[0])?;
                    let value = self.create_value(&args[1])?;
                    if !entries.iter().any(|(existing, _)| existing == &key) {
                        entries.push((key, value));
                    }
                    attempts -= 1;
                }
                if entries.len() < len {
                    debug!(
                        key = %args[0],
                        requested = len,
                        produced = entries.len(),
                        "key domain too small for requested map size"
                    );
                }
                Ok(Value::Map(entries))
            }
            ContainerKind::Holder => {
                let inner = self.create_value(&args[0])?;
                Ok(Value::Holder(Box::new(inner)))
            }
        }
    }

    /// Non-negative draw; negative raw values are folded, never returned
    fn create_unsigned_int(&mut self) -> u32 {
        (self.next_test_value() as i32).unsigned_abs()
    }

    fn create_unsigned_index(&mut self, bound: usize) -> usize {
        debug_assert!(bound > 0);
        self.create_unsigned_int() as usize % bound
    }

    /// Clamped to [`MAX_CONTAINER_LEN`] even for hand-built bounds
    fn create_length(&mut self) -> usize {
        let max = self.bounds.max.min(MAX_CONTAINER_LEN);
        let min = self.bounds.min.min(max);
        min + self.create_unsigned_index(max - min + 1)
    }
}

fn parse_seed(variable: &str, raw: &str) -> Result<u64> {
    raw.parse::<u64>()
        .or_else(|_| raw.parse::<i64>().map(|signed| signed as u64))
        .map_err(|_| HarnessError::InvalidSeed {
            variable: variable.to_string(),
            value: raw.to_string(),
        })
}

/// Truncate to 16 bits; surrogate code points fold into the valid range below
fn char_from_raw(raw: i64) -> char {
    let code = raw as u16 as u32;
    let code = if (0xD800..=0xDFFF).contains(&code) {
        code - 0x800
    } else {
        code
    };
    char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)
}
