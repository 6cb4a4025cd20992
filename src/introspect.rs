//! Property discovery over a [`ClassDescriptor`].
//!
//! A property is either a non-static, non-transient field, or a name derived
//! from a one-parameter `set…` method that has a matching getter. Both
//! sources are merged and deduplicated by name; insertion order is kept so
//! repeated discovery yields the same ordered set.
//!
//! Accessor naming:
//! - setters: `set_name` or `setName`
//! - getters: `get_name`, `getName`, bare `name`; for booleans also
//!   `is_name` and `isName`

use crate::class::{ClassDescriptor, FieldDescriptor, MethodDescriptor};
use crate::error::{HarnessError, Result};
use crate::types::TypeDescriptor;
use crate::value::Value;
use indexmap::IndexSet;
use std::fmt;
use tracing::{debug, warn};

const SETTER_PREFIX: &str = "set";

/// How a property is read or written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessPath {
    Field,
    Method(String),
}

/// Overall access strategy of a property
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessStrategy {
    FieldDirect,
    Accessors,
    /// One side through a method, the other through the field
    Mixed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDescriptor {
    pub name: String,
    pub ty: TypeDescriptor,
    pub read: AccessPath,
    pub write: AccessPath,
}

impl PropertyDescriptor {
    pub fn strategy(&self) -> AccessStrategy {
        match (&self.read, &self.write) {
            (AccessPath::Field, AccessPath::Field) => AccessStrategy::FieldDirect,
            (AccessPath::Method(_), AccessPath::Method(_)) => AccessStrategy::Accessors,
            _ => AccessStrategy::Mixed,
        }
    }
}

impl fmt::Display for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.ty)
    }
}

/// Discovers and accesses the properties of one class
pub struct PropertyIntrospector<'a, T> {
    class: &'a ClassDescriptor<T>,
    ignored: IndexSet<String>,
}

impl<'a, T: 'static> PropertyIntrospector<'a, T> {
    pub fn new(class: &'a ClassDescriptor<T>) -> Self {
        Self {
            class,
            ignored: IndexSet::new(),
        }
    }

    /// Omit these property names entirely
    pub fn ignoring<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignored.contains(name)
    }

    pub fn class(&self) -> &'a ClassDescriptor<T> {
        self.class
    }

    /// Names of all logical properties, fields first
    pub fn property_names(&self) -> IndexSet<String> {
        let mut names = IndexSet::new();

        for field in self.class.all_fields() {
            if field.is_property_candidate() && !self.is_ignored(&field.name) {
                names.insert(field.name.clone());
            }
        }

        for setter in self.class.all_methods() {
            if setter.params.len() != 1 {
                continue;
            }
            let Some(name) = property_name_from_setter(&setter.name) else {
                continue;
            };
            if self.is_ignored(&name) {
                continue;
            }
            if self.getter(&name).is_some() {
                names.insert(name);
            }
        }

        names
    }

    /// Full descriptors for every property
    pub fn properties(&self) -> Result<Vec<PropertyDescriptor>> {
        self.property_names()
            .iter()
            .map(|name| self.describe(name))
            .collect()
    }

    /// Resolve type and access paths of one property
    pub fn describe(&self, name: &str) -> Result<PropertyDescriptor> {
        let ty = self.property_type(name)?;
        let read = match self.getter(name) {
            Some(getter) => AccessPath::Method(getter.name.clone()),
            None => AccessPath::Field,
        };
        let write = match self.setter(name, &ty) {
            Some(setter) => AccessPath::Method(setter.name.clone()),
            None => AccessPath::Field,
        };
        Ok(PropertyDescriptor {
            name: name.to_string(),
            ty,
            read,
            write,
        })
    }

    /// Declared type: field first, then the getter's return type
    pub fn property_type(&self, name: &str) -> Result<TypeDescriptor> {
        if let Some(field) = self.field(name) {
            return Ok(field.ty.clone());
        }
        self.getter(name)
            .map(|getter| getter.returns.clone())
            .ok_or_else(|| HarnessError::PropertyNotFound {
                class: self.class.name().to_string(),
                property: name.to_string(),
            })
    }

    /// Backing field, if any
    pub fn field(&self, name: &str) -> Option<&'a FieldDescriptor<T>> {
        let found = self.class.find_field(name);
        if found.is_none() {
            debug!(class = self.class.name(), property = name, "no field found for property");
        }
        found
    }

    /// First getter for the property, walking the layers outward per candidate name
    pub fn getter(&self, name: &str) -> Option<&'a MethodDescriptor<T>> {
        let upper = capitalize(name);
        let plain = [format!("get_{}", name), format!("get{}", upper), name.to_string()];
        let boolean = [format!("is_{}", name), format!("is{}", upper)];

        let readable = |method: &&MethodDescriptor<T>| method.params.is_empty() && !method.returns.is_unit();

        for candidate in &plain {
            if let Some(getter) = self
                .class
                .all_methods()
                .filter(readable)
                .find(|method| &method.name == candidate)
            {
                return Some(getter);
            }
        }
        for candidate in &boolean {
            if let Some(getter) = self
                .class
                .all_methods()
                .filter(readable)
                .find(|method| &method.name == candidate && method.returns.is_bool())
            {
                return Some(getter);
            }
        }
        None
    }

    /// Setter taking exactly the property type
    pub fn setter(&self, name: &str, ty: &TypeDescriptor) -> Option<&'a MethodDescriptor<T>> {
        let candidates = [format!("set_{}", name), format!("set{}", capitalize(name))];
        let params = std::slice::from_ref(ty);
        let found = candidates
            .iter()
            .find_map(|candidate| self.class.find_method(candidate, params));
        if found.is_none() {
            debug!(class = self.class.name(), property = name, "no setter found for property");
        }
        found
    }

    /// Read through the getter, else the field
    pub fn read(&self, bean: &mut T, property: &PropertyDescriptor) -> Result<Value> {
        match &property.read {
            AccessPath::Method(name) => self.invoke(bean, name, &[], Vec::new()),
            AccessPath::Field => self.require_field(&property.name)?.read(bean),
        }
    }

    /// Write through the setter, else the field
    pub fn write(&self, bean: &mut T, property: &PropertyDescriptor, value: Value) -> Result<()> {
        match &property.write {
            AccessPath::Method(name) => {
                self.invoke(bean, name, std::slice::from_ref(&property.ty), vec![value])?;
                Ok(())
            }
            AccessPath::Field => self.require_field(&property.name)?.write(bean, value),
        }
    }

    fn invoke(&self, bean: &mut T, name: &str, params: &[TypeDescriptor], args: Vec<Value>) -> Result<Value> {
        let method = self
            .class
            .find_method(name, params)
            .ok_or_else(|| HarnessError::NoSuchMethod {
                class: self.class.name().to_string(),
                method: format!("{}{}", name, TypeDescriptor::signature(params)),
            })?;
        method.invoke(bean, args)
    }

    fn require_field(&self, name: &str) -> Result<&'a FieldDescriptor<T>> {
        self.class.find_field(name).ok_or_else(|| {
            warn!(class = self.class.name(), property = name, "property has neither accessor nor field");
            HarnessError::PropertyNotFound {
                class: self.class.name().to_string(),
                property: name.to_string(),
            }
        })
    }
}

/// `set_name` and `setName` both yield `name`
fn property_name_from_setter(method: &str) -> Option<String> {
    let rest = method.strip_prefix(SETTER_PREFIX)?;
    let rest = rest.strip_prefix('_').unwrap_or(rest);
    let mut chars = rest.chars();
    let first = chars.next()?;
    Some(first.to_lowercase().chain(chars).collect())
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
