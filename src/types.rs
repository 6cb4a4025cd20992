//! Runtime type descriptors
//!
//! A [`TypeDescriptor`] is the harness' stand-in for a reflected type: the
//! value synthesizer, the property introspector and the constructor lookup all
//! work on descriptors instead of static types. [`Describe`] produces the
//! descriptor for a static Rust type.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use strum::{Display, EnumIter};

/// Scalar kinds drawn directly from the test value source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum ScalarKind {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Bool,
    Char,
    String,
    Timestamp,
}

/// Parameterized container kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum ContainerKind {
    /// Key to value mapping, two type arguments
    Map,
    /// Ordered sequence, one type argument
    Sequence,
    /// Unordered set, one type argument
    Set,
    /// Single-value holder, one type argument
    Holder,
}

impl ContainerKind {
    /// Number of type arguments the container requires
    pub fn arity(&self) -> usize {
        match self {
            ContainerKind::Map => 2,
            ContainerKind::Sequence | ContainerKind::Set | ContainerKind::Holder => 1,
        }
    }
}

/// Opaque handle to a runtime type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    /// No value; the return type of a void method
    Unit,
    Scalar(ScalarKind),
    /// Any value; synthesized as a string
    Dynamic,
    /// Enumeration with its declared variants in declaration order
    Enum {
        name: &'static str,
        variants: &'static [&'static str],
    },
    /// Array of the element type
    Array(Box<TypeDescriptor>),
    /// Parameterized container
    Generic {
        container: ContainerKind,
        args: Vec<TypeDescriptor>,
    },
    /// Container without type arguments
    Raw(ContainerKind),
    /// Type variable that was never resolved to a concrete type
    Variable(&'static str),
    /// Domain type; only synthesizable through a registered override
    Named(&'static str),
}

impl TypeDescriptor {
    pub fn scalar(kind: ScalarKind) -> Self {
        TypeDescriptor::Scalar(kind)
    }

    pub fn array(element: TypeDescriptor) -> Self {
        TypeDescriptor::Array(Box::new(element))
    }

    pub fn map(key: TypeDescriptor, value: TypeDescriptor) -> Self {
        TypeDescriptor::Generic {
            container: ContainerKind::Map,
            args: vec![key, value],
        }
    }

    pub fn sequence(element: TypeDescriptor) -> Self {
        TypeDescriptor::Generic {
            container: ContainerKind::Sequence,
            args: vec![element],
        }
    }

    pub fn set(element: TypeDescriptor) -> Self {
        TypeDescriptor::Generic {
            container: ContainerKind::Set,
            args: vec![element],
        }
    }

    pub fn holder(inner: TypeDescriptor) -> Self {
        TypeDescriptor::Generic {
            container: ContainerKind::Holder,
            args: vec![inner],
        }
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, TypeDescriptor::Unit)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, TypeDescriptor::Scalar(ScalarKind::Bool))
    }

    /// Render a parameter list the way failure messages show signatures
    pub fn signature(types: &[TypeDescriptor]) -> String {
        let rendered = types
            .iter()
            .map(|ty| ty.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        format!("[{}]", rendered)
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Unit => write!(f, "()"),
            TypeDescriptor::Scalar(kind) => write!(f, "{}", kind),
            TypeDescriptor::Dynamic => write!(f, "dynamic"),
            TypeDescriptor::Enum { name, .. } => write!(f, "{}", name),
            TypeDescriptor::Array(element) => write!(f, "[{}]", element),
            TypeDescriptor::Generic { container, args } => {
                let args = args
                    .iter()
                    .map(|arg| arg.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "{}<{}>", container, args)
            }
            TypeDescriptor::Raw(container) => write!(f, "{}", container),
            TypeDescriptor::Variable(name) => write!(f, "{}", name),
            TypeDescriptor::Named(name) => write!(f, "{}", name),
        }
    }
}

/// Static types that know their runtime descriptor
pub trait Describe {
    fn descriptor() -> TypeDescriptor;
}

macro_rules! describe_scalar {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Describe for $ty {
                fn descriptor() -> TypeDescriptor {
                    TypeDescriptor::Scalar(ScalarKind::$kind)
                }
            }
        )*
    };
}

describe_scalar! {
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
    String => String,
    DateTime<Utc> => Timestamp,
}

impl Describe for () {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::Unit
    }
}

impl<T: Describe> Describe for Vec<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::sequence(T::descriptor())
    }
}

impl<T: Describe> Describe for Box<[T]> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::array(T::descriptor())
    }
}

impl<T: Describe + Eq + Hash> Describe for HashSet<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::set(T::descriptor())
    }
}

impl<T: Describe + Ord> Describe for BTreeSet<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::set(T::descriptor())
    }
}

impl<K: Describe + Eq + Hash, V: Describe> Describe for HashMap<K, V> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::map(K::descriptor(), V::descriptor())
    }
}

impl<K: Describe + Ord, V: Describe> Describe for BTreeMap<K, V> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::map(K::descriptor(), V::descriptor())
    }
}

impl<T: Describe> Describe for Arc<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::holder(T::descriptor())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_types_map_to_descriptors() {
        assert_eq!(i32::descriptor(), TypeDescriptor::Scalar(ScalarKind::I32));
        assert_eq!(
            HashMap::<String, i64>::descriptor(),
            TypeDescriptor::map(
                TypeDescriptor::Scalar(ScalarKind::String),
                TypeDescriptor::Scalar(ScalarKind::I64)
            )
        );
        assert_eq!(
            Box::<[u8]>::descriptor(),
            TypeDescriptor::array(TypeDescriptor::Scalar(ScalarKind::U8))
        );
        assert_eq!(
            Arc::<bool>::descriptor(),
            TypeDescriptor::holder(TypeDescriptor::Scalar(ScalarKind::Bool))
        );
    }

    #[test]
    fn container_arity() {
        assert_eq!(ContainerKind::Map.arity(), 2);
        assert_eq!(ContainerKind::Holder.arity(), 1);
    }

    #[test]
    fn descriptors_render_readably() {
        let ty = TypeDescriptor::map(
            String::descriptor(),
            TypeDescriptor::sequence(i32::descriptor()),
        );
        assert_eq!(ty.to_string(), "Map<string, Sequence<i32>>");
        assert_eq!(
            TypeDescriptor::signature(&[String::descriptor(), bool::descriptor()]),
            "[string, bool]"
        );
    }
}
