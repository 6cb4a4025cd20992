//! Dynamic test values
//!
//! [`Value`] carries synthesized values through accessors, constructors and
//! comparisons without knowing the static type. [`IntoValue`] and
//! [`FromValue`] convert between the two worlds.

use crate::error::{HarnessError, Result};
use chrono::{DateTime, Utc};
use std::any::Any;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

/// Domain value stored inside [`Value::Custom`]
///
/// Implemented for every `Debug + PartialEq + Clone` type that is also
/// `Send + Sync`, so overrides can hand back their own structs.
pub trait CustomValue: fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn eq_value(&self, other: &dyn CustomValue) -> bool;
    fn clone_boxed(&self) -> Box<dyn CustomValue>;
}

impl<T> CustomValue for T
where
    T: Any + fmt::Debug + PartialEq + Clone + Send + Sync,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_value(&self, other: &dyn CustomValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }

    fn clone_boxed(&self) -> Box<dyn CustomValue> {
        Box::new(self.clone())
    }
}

/// Dynamically typed sample value
#[derive(Debug)]
pub enum Value {
    Unit,
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Bool(bool),
    Char(char),
    Str(String),
    Timestamp(DateTime<Utc>),
    Enum {
        type_name: &'static str,
        variant: &'static str,
    },
    Array(Vec<Value>),
    Sequence(Vec<Value>),
    /// Unordered; equality is multiset equality
    Set(Vec<Value>),
    /// Unordered key/value pairs with unique keys
    Map(Vec<(Value, Value)>),
    Holder(Box<Value>),
    Custom(Box<dyn CustomValue>),
}

impl Value {
    /// Wrap a domain value
    pub fn custom<T>(value: T) -> Self
    where
        T: Any + fmt::Debug + PartialEq + Clone + Send + Sync,
    {
        Value::Custom(Box::new(value))
    }

    /// Short name of the value's kind for error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Unit => "unit",
            Value::I8(_) => "i8",
            Value::I16(_) => "i16",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::U8(_) => "u8",
            Value::U16(_) => "u16",
            Value::U32(_) => "u32",
            Value::U64(_) => "u64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::Bool(_) => "bool",
            Value::Char(_) => "char",
            Value::Str(_) => "string",
            Value::Timestamp(_) => "timestamp",
            Value::Enum { .. } => "enum",
            Value::Array(_) => "array",
            Value::Sequence(_) => "sequence",
            Value::Set(_) => "set",
            Value::Map(_) => "map",
            Value::Holder(_) => "holder",
            Value::Custom(_) => "custom",
        }
    }

    /// Number of elements for container values
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Array(items) | Value::Sequence(items) | Value::Set(items) => Some(items.len()),
            Value::Map(entries) => Some(entries.len()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    /// Downcast a custom value
    pub fn downcast_custom<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Custom(inner) => inner.as_any().downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl Clone for Value {
    fn clone(&self) -> Self {
        match self {
            Value::Unit => Value::Unit,
            Value::I8(v) => Value::I8(*v),
            Value::I16(v) => Value::I16(*v),
            Value::I32(v) => Value::I32(*v),
            Value::I64(v) => Value::I64(*v),
            Value::U8(v) => Value::U8(*v),
            Value::U16(v) => Value::U16(*v),
            Value::U32(v) => Value::U32(*v),
            Value::U64(v) => Value::U64(*v),
            Value::F32(v) => Value::F32(*v),
            Value::F64(v) => Value::F64(*v),
            Value::Bool(v) => Value::Bool(*v),
            Value::Char(v) => Value::Char(*v),
            Value::Str(v) => Value::Str(v.clone()),
            Value::Timestamp(v) => Value::Timestamp(*v),
            Value::Enum { type_name, variant } => Value::Enum {
                type_name: *type_name,
                variant: *variant,
            },
            Value::Array(items) => Value::Array(items.clone()),
            Value::Sequence(items) => Value::Sequence(items.clone()),
            Value::Set(items) => Value::Set(items.clone()),
            Value::Map(entries) => Value::Map(entries.clone()),
            Value::Holder(inner) => Value::Holder(inner.clone()),
            Value::Custom(inner) => Value::Custom(inner.clone_boxed()),
        }
    }
}

/// Exact structural equality; sets and maps ignore order
///
/// The assertion layer in [`crate::compare`] adds float tolerance on top.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Unit, Value::Unit) => true,
            (Value::I8(a), Value::I8(b)) => a == b,
            (Value::I16(a), Value::I16(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::U8(a), Value::U8(b)) => a == b,
            (Value::U16(a), Value::U16(b)) => a == b,
            (Value::U32(a), Value::U32(b)) => a == b,
            (Value::U64(a), Value::U64(b)) => a == b,
            (Value::F32(a), Value::F32(b)) => a == b,
            (Value::F64(a), Value::F64(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (
                Value::Enum {
                    type_name: ta,
                    variant: va,
                },
                Value::Enum {
                    type_name: tb,
                    variant: vb,
                },
            ) => ta == tb && va == vb,
            (Value::Array(a), Value::Array(b)) | (Value::Sequence(a), Value::Sequence(b)) => {
                a == b
            }
            (Value::Set(a), Value::Set(b)) => {
                a.len() == b.len()
                    && a.iter().all(|item| b.contains(item))
                    && b.iter().all(|item| a.contains(item))
            }
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(key, value)| {
                        b.iter()
                            .find(|(other_key, _)| other_key == key)
                            .is_some_and(|(_, other_value)| other_value == value)
                    })
            }
            (Value::Holder(a), Value::Holder(b)) => a == b,
            (Value::Custom(a), Value::Custom(b)) => a.eq_value(&**b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list(f: &mut fmt::Formatter<'_>, open: &str, items: &[Value], close: &str) -> fmt::Result {
            write!(f, "{}", open)?;
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", item)?;
            }
            write!(f, "{}", close)
        }

        match self {
            Value::Unit => write!(f, "()"),
            Value::I8(v) => write!(f, "{}", v),
            Value::I16(v) => write!(f, "{}", v),
            Value::I32(v) => write!(f, "{}", v),
            Value::I64(v) => write!(f, "{}", v),
            Value::U8(v) => write!(f, "{}", v),
            Value::U16(v) => write!(f, "{}", v),
            Value::U32(v) => write!(f, "{}", v),
            Value::U64(v) => write!(f, "{}", v),
            Value::F32(v) => write!(f, "{}", v),
            Value::F64(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Char(v) => write!(f, "{:?}", v),
            Value::Str(v) => write!(f, "{:?}", v),
            Value::Timestamp(v) => write!(f, "{}", v.to_rfc3339()),
            Value::Enum { type_name, variant } => write!(f, "{}::{}", type_name, variant),
            Value::Array(items) | Value::Sequence(items) => list(f, "[", items, "]"),
            Value::Set(items) => list(f, "{", items, "}"),
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (idx, (key, value)) in entries.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
            Value::Holder(inner) => write!(f, "Holder({})", inner),
            Value::Custom(inner) => write!(f, "{:?}", inner),
        }
    }
}

// =============================================================================
// Static <-> dynamic conversion
// =============================================================================

/// Convert a static value into a [`Value`]
pub trait IntoValue {
    fn into_value(self) -> Value;
}

/// Convert a [`Value`] back into a static value
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self>;
}

macro_rules! scalar_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl IntoValue for $ty {
                fn into_value(self) -> Value {
                    Value::$variant(self)
                }
            }

            impl FromValue for $ty {
                fn from_value(value: Value) -> Result<Self> {
                    match value {
                        Value::$variant(inner) => Ok(inner),
                        other => Err(HarnessError::conversion(stringify!($ty), other.kind_name())),
                    }
                }
            }
        )*
    };
}

scalar_value! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    bool => Bool,
    char => Char,
    String => Str,
    DateTime<Utc> => Timestamp,
}

impl IntoValue for () {
    fn into_value(self) -> Value {
        Value::Unit
    }
}

impl FromValue for () {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Unit => Ok(()),
            other => Err(HarnessError::conversion("()", other.kind_name())),
        }
    }
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

fn elements<T: FromValue>(items: Vec<Value>) -> Result<Vec<T>> {
    items.into_iter().map(T::from_value).collect()
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn into_value(self) -> Value {
        Value::Sequence(self.into_iter().map(IntoValue::into_value).collect())
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Sequence(items) | Value::Array(items) => elements(items),
            other => Err(HarnessError::conversion("Vec", other.kind_name())),
        }
    }
}

impl<T: IntoValue> IntoValue for Box<[T]> {
    fn into_value(self) -> Value {
        Value::Array(
            self.into_vec()
                .into_iter()
                .map(IntoValue::into_value)
                .collect(),
        )
    }
}

impl<T: FromValue> FromValue for Box<[T]> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Array(items) | Value::Sequence(items) => {
                Ok(elements(items)?.into_boxed_slice())
            }
            other => Err(HarnessError::conversion("boxed slice", other.kind_name())),
        }
    }
}

impl<T: IntoValue> IntoValue for HashSet<T> {
    fn into_value(self) -> Value {
        Value::Set(self.into_iter().map(IntoValue::into_value).collect())
    }
}

impl<T: FromValue + Eq + Hash> FromValue for HashSet<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Set(items) => Ok(elements(items)?.into_iter().collect()),
            other => Err(HarnessError::conversion("HashSet", other.kind_name())),
        }
    }
}

impl<T: IntoValue> IntoValue for BTreeSet<T> {
    fn into_value(self) -> Value {
        Value::Set(self.into_iter().map(IntoValue::into_value).collect())
    }
}

impl<T: FromValue + Ord> FromValue for BTreeSet<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Set(items) => Ok(elements(items)?.into_iter().collect()),
            other => Err(HarnessError::conversion("BTreeSet", other.kind_name())),
        }
    }
}

fn entries<K: FromValue, V: FromValue>(pairs: Vec<(Value, Value)>) -> Result<Vec<(K, V)>> {
    pairs
        .into_iter()
        .map(|(key, value)| Ok((K::from_value(key)?, V::from_value(value)?)))
        .collect()
}

impl<K: IntoValue, V: IntoValue> IntoValue for HashMap<K, V> {
    fn into_value(self) -> Value {
        Value::Map(
            self.into_iter()
                .map(|(key, value)| (key.into_value(), value.into_value()))
                .collect(),
        )
    }
}

impl<K: FromValue + Eq + Hash, V: FromValue> FromValue for HashMap<K, V> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Map(pairs) => Ok(entries(pairs)?.into_iter().collect()),
            other => Err(HarnessError::conversion("HashMap", other.kind_name())),
        }
    }
}

impl<K: IntoValue, V: IntoValue> IntoValue for BTreeMap<K, V> {
    fn into_value(self) -> Value {
        Value::Map(
            self.into_iter()
                .map(|(key, value)| (key.into_value(), value.into_value()))
                .collect(),
        )
    }
}

impl<K: FromValue + Ord, V: FromValue> FromValue for BTreeMap<K, V> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Map(pairs) => Ok(entries(pairs)?.into_iter().collect()),
            other => Err(HarnessError::conversion("BTreeMap", other.kind_name())),
        }
    }
}

impl<T: IntoValue + Clone> IntoValue for Arc<T> {
    fn into_value(self) -> Value {
        let inner = Arc::try_unwrap(self).unwrap_or_else(|shared| (*shared).clone());
        Value::Holder(Box::new(inner.into_value()))
    }
}

impl<T: FromValue> FromValue for Arc<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Holder(inner) => Ok(Arc::new(T::from_value(*inner)?)),
            other => Err(HarnessError::conversion("Arc", other.kind_name())),
        }
    }
}

/// Bridge a `strum`-derived enumeration into the harness
///
/// The enumeration must derive `strum::VariantNames`, `strum::IntoStaticStr`
/// and `strum::EnumString`.
///
/// ```rust,ignore
/// #[derive(Debug, Clone, Copy, PartialEq, VariantNames, IntoStaticStr, EnumString)]
/// enum Color { Red, Green }
///
/// bean_harness::enum_value!(Color);
/// ```
#[macro_export]
macro_rules! enum_value {
    ($ty:ty) => {
        impl $crate::Describe for $ty {
            fn descriptor() -> $crate::TypeDescriptor {
                $crate::TypeDescriptor::Enum {
                    name: stringify!($ty),
                    variants: <$ty as $crate::strum::VariantNames>::VARIANTS,
                }
            }
        }

        impl $crate::IntoValue for $ty {
            fn into_value(self) -> $crate::Value {
                $crate::Value::Enum {
                    type_name: stringify!($ty),
                    variant: <&'static str as ::std::convert::From<$ty>>::from(self),
                }
            }
        }

        impl $crate::FromValue for $ty {
            fn from_value(value: $crate::Value) -> $crate::Result<Self> {
                match value {
                    $crate::Value::Enum { variant, .. } => {
                        <$ty as ::std::str::FromStr>::from_str(variant).map_err(|_| {
                            $crate::HarnessError::Conversion {
                                expected: stringify!($ty).to_string(),
                                found: variant.to_string(),
                            }
                        })
                    }
                    other => Err($crate::HarnessError::Conversion {
                        expected: stringify!($ty).to_string(),
                        found: other.kind_name().to_string(),
                    }),
                }
            }
        }
    };
}
