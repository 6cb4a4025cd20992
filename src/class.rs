//! Class descriptors: the registration API that stands in for reflection.
//!
//! A [`ClassDescriptor`] lists what a bean type exposes to the harness:
//!
//! - fields with typed read/write lenses (plus static and transient markers)
//! - accessor and other methods, callable with dynamic [`Value`] arguments
//! - constructors keyed by their parameter type signature
//! - optional equality, hash, string representation and copy hooks
//!
//! Descriptors are layered. Layer 0 belongs to the type itself; every
//! [`ClassDescriptor::extends`] call appends the layers of an embedded base
//! type, so lookups walk the ancestor chain outward from the most-derived
//! declaration.
//!
//! ```rust,ignore
//! let class = ClassDescriptor::<Person>::new("Person")
//!     .constructor0(Person::default)
//!     .field("name", |p| &p.name, |p| &mut p.name)
//!     .getter("get_name", |p: &Person| p.name.clone())
//!     .setter("set_name", |p: &mut Person, name: String| p.name = name)
//!     .equality()
//!     .hashing()
//!     .display();
//! ```

use crate::error::{HarnessError, Result};
use crate::types::{Describe, TypeDescriptor};
use crate::value::{FromValue, IntoValue, Value};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

pub type FieldGetter<T> = Arc<dyn Fn(&T) -> Value>;
pub type FieldSetter<T> = Arc<dyn Fn(&mut T, Value) -> Result<()>>;
pub type MethodInvoker<T> = Arc<dyn Fn(&mut T, Vec<Value>) -> Result<Value>>;
pub type ConstructorFn<T> = Arc<dyn Fn(Vec<Value>) -> Result<T>>;
pub type EqualsFn<T> = Arc<dyn Fn(&T, &T) -> bool>;
pub type HashFn<T> = Arc<dyn Fn(&T) -> u64>;
pub type DisplayFn<T> = Arc<dyn Fn(&T) -> String>;
pub type CopyFn<T> = Arc<dyn Fn(&T) -> T>;

/// Method visibility as far as the harness cares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    #[default]
    Public,
    /// Crate- or module-restricted
    Restricted,
    Private,
}

// =============================================================================
// Fields
// =============================================================================

pub struct FieldDescriptor<T> {
    pub name: String,
    pub ty: TypeDescriptor,
    pub is_static: bool,
    pub is_transient: bool,
    get: Option<FieldGetter<T>>,
    set: Option<FieldSetter<T>>,
}

impl<T> FieldDescriptor<T> {
    /// Field the harness may treat as a bean property
    pub fn is_property_candidate(&self) -> bool {
        !self.is_static && !self.is_transient
    }

    pub fn read(&self, bean: &T) -> Result<Value> {
        let get = self
            .get
            .as_ref()
            .ok_or_else(|| HarnessError::invocation(&self.name, "field has no instance accessor"))?;
        Ok(get(bean))
    }

    pub fn write(&self, bean: &mut T, value: Value) -> Result<()> {
        let set = self
            .set
            .as_ref()
            .ok_or_else(|| HarnessError::invocation(&self.name, "field has no instance accessor"))?;
        set(bean, value)
    }
}

impl<T> Clone for FieldDescriptor<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            ty: self.ty.clone(),
            is_static: self.is_static,
            is_transient: self.is_transient,
            get: self.get.clone(),
            set: self.set.clone(),
        }
    }
}

impl<T> fmt::Debug for FieldDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("is_static", &self.is_static)
            .field("is_transient", &self.is_transient)
            .finish()
    }
}

// =============================================================================
// Methods
// =============================================================================

pub struct MethodDescriptor<T> {
    pub name: String,
    pub params: Vec<TypeDescriptor>,
    /// [`TypeDescriptor::Unit`] for methods without a result
    pub returns: TypeDescriptor,
    pub visibility: Visibility,
    pub is_static: bool,
    invoke: Option<MethodInvoker<T>>,
}

impl<T> MethodDescriptor<T> {
    /// Callable instance method
    pub fn new<F>(
        name: impl Into<String>,
        params: Vec<TypeDescriptor>,
        returns: TypeDescriptor,
        invoke: F,
    ) -> Self
    where
        F: Fn(&mut T, Vec<Value>) -> Result<Value> + 'static,
    {
        Self {
            name: name.into(),
            params,
            returns,
            visibility: Visibility::Public,
            is_static: false,
            invoke: Some(Arc::new(invoke)),
        }
    }

    /// Declaration without a body; visible to introspection, not callable
    pub fn declared(name: impl Into<String>, params: Vec<TypeDescriptor>, returns: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            params,
            returns,
            visibility: Visibility::Public,
            is_static: false,
            invoke: None,
        }
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn into_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn invoke(&self, bean: &mut T, args: Vec<Value>) -> Result<Value> {
        if args.len() != self.params.len() {
            return Err(HarnessError::invocation(
                &self.name,
                format!("expected {} argument(s), got {}", self.params.len(), args.len()),
            ));
        }
        match &self.invoke {
            Some(invoke) => invoke(bean, args),
            None => Err(HarnessError::invocation(&self.name, "method has no registered body")),
        }
    }
}

impl<T> Clone for MethodDescriptor<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            params: self.params.clone(),
            returns: self.returns.clone(),
            visibility: self.visibility,
            is_static: self.is_static,
            invoke: self.invoke.clone(),
        }
    }
}

impl<T> fmt::Debug for MethodDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("returns", &self.returns)
            .field("visibility", &self.visibility)
            .field("is_static", &self.is_static)
            .finish()
    }
}

// =============================================================================
// Constructors
// =============================================================================

pub struct ConstructorDescriptor<T> {
    pub params: Vec<TypeDescriptor>,
    construct: ConstructorFn<T>,
}

impl<T> ConstructorDescriptor<T> {
    pub fn construct(&self, args: Vec<Value>) -> Result<T> {
        if args.len() != self.params.len() {
            return Err(HarnessError::invocation(
                format!("constructor {}", TypeDescriptor::signature(&self.params)),
                format!("expected {} argument(s), got {}", self.params.len(), args.len()),
            ));
        }
        (self.construct)(args)
    }
}

impl<T> Clone for ConstructorDescriptor<T> {
    fn clone(&self) -> Self {
        Self {
            params: self.params.clone(),
            construct: self.construct.clone(),
        }
    }
}

/// One level of the ancestor chain
pub struct Layer<T> {
    pub name: String,
    pub fields: Vec<FieldDescriptor<T>>,
    pub methods: Vec<MethodDescriptor<T>>,
}

impl<T> Clone for Layer<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            fields: self.fields.clone(),
            methods: self.methods.clone(),
        }
    }
}

// =============================================================================
// Class descriptor
// =============================================================================

pub struct ClassDescriptor<T> {
    name: String,
    layers: Vec<Layer<T>>,
    constructors: Vec<ConstructorDescriptor<T>>,
    equals: Option<EqualsFn<T>>,
    hash: Option<HashFn<T>>,
    display: Option<DisplayFn<T>>,
    copy: Option<CopyFn<T>>,
}

impl<T> Clone for ClassDescriptor<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            layers: self.layers.clone(),
            constructors: self.constructors.clone(),
            equals: self.equals.clone(),
            hash: self.hash.clone(),
            display: self.display.clone(),
            copy: self.copy.clone(),
        }
    }
}

impl<T> fmt::Debug for ClassDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDescriptor")
            .field("name", &self.name)
            .field("layers", &self.layers.iter().map(|l| &l.name).collect::<Vec<_>>())
            .field("constructors", &self.constructors.len())
            .field("equals", &self.equals.is_some())
            .field("hash", &self.hash.is_some())
            .field("display", &self.display.is_some())
            .field("copy", &self.copy.is_some())
            .finish()
    }
}

impl<T: 'static> ClassDescriptor<T> {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            layers: vec![Layer {
                name: name.clone(),
                fields: Vec::new(),
                methods: Vec::new(),
            }],
            name,
            constructors: Vec::new(),
            equals: None,
            hash: None,
            display: None,
            copy: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Layers, most-derived first
    pub fn layers(&self) -> &[Layer<T>] {
        &self.layers
    }

    fn own_layer(&mut self) -> &mut Layer<T> {
        &mut self.layers[0]
    }

    // -------------------------------------------------------------------------
    // Fields
    // -------------------------------------------------------------------------

    /// Instance field reachable through a pair of lenses
    pub fn field<F, G, M>(self, name: &str, get: G, get_mut: M) -> Self
    where
        F: Describe + IntoValue + FromValue + Clone + 'static,
        G: Fn(&T) -> &F + 'static,
        M: Fn(&mut T) -> &mut F + 'static,
    {
        self.push_field::<F, G, M>(name, false, get, get_mut)
    }

    /// Instance field excluded from bean properties
    pub fn transient_field<F, G, M>(self, name: &str, get: G, get_mut: M) -> Self
    where
        F: Describe + IntoValue + FromValue + Clone + 'static,
        G: Fn(&T) -> &F + 'static,
        M: Fn(&mut T) -> &mut F + 'static,
    {
        self.push_field::<F, G, M>(name, true, get, get_mut)
    }

    /// Associated constant or static; never a bean property
    pub fn static_field(mut self, name: &str, ty: TypeDescriptor) -> Self {
        self.own_layer().fields.push(FieldDescriptor {
            name: name.to_string(),
            ty,
            is_static: true,
            is_transient: false,
            get: None,
            set: None,
        });
        self
    }

    fn push_field<F, G, M>(mut self, name: &str, transient: bool, get: G, get_mut: M) -> Self
    where
        F: Describe + IntoValue + FromValue + Clone + 'static,
        G: Fn(&T) -> &F + 'static,
        M: Fn(&mut T) -> &mut F + 'static,
    {
        let getter: FieldGetter<T> = Arc::new(move |bean: &T| get(bean).clone().into_value());
        let setter: FieldSetter<T> = Arc::new(move |bean: &mut T, value: Value| {
            *get_mut(bean) = F::from_value(value)?;
            Ok(())
        });
        self.own_layer().fields.push(FieldDescriptor {
            name: name.to_string(),
            ty: F::descriptor(),
            is_static: false,
            is_transient: transient,
            get: Some(getter),
            set: Some(setter),
        });
        self
    }

    // -------------------------------------------------------------------------
    // Methods
    // -------------------------------------------------------------------------

    /// Zero-argument accessor returning `F`
    pub fn getter<F, G>(self, name: &str, get: G) -> Self
    where
        F: Describe + IntoValue + 'static,
        G: Fn(&T) -> F + 'static,
    {
        self.method(MethodDescriptor::new(
            name,
            Vec::new(),
            F::descriptor(),
            move |bean: &mut T, _args: Vec<Value>| Ok(get(&*bean).into_value()),
        ))
    }

    /// One-argument mutator taking `F`
    pub fn setter<F, S>(self, name: &str, set: S) -> Self
    where
        F: Describe + FromValue + 'static,
        S: Fn(&mut T, F) + 'static,
    {
        let method_name = name.to_string();
        self.method(MethodDescriptor::new(
            name,
            vec![F::descriptor()],
            TypeDescriptor::Unit,
            move |bean: &mut T, args: Vec<Value>| {
                let arg = single_arg(&method_name, args)?;
                set(bean, F::from_value(arg)?);
                Ok(Value::Unit)
            },
        ))
    }

    pub fn method(mut self, method: MethodDescriptor<T>) -> Self {
        self.own_layer().methods.push(method);
        self
    }

    // -------------------------------------------------------------------------
    // Constructors
    // -------------------------------------------------------------------------

    /// Constructor over dynamic arguments
    pub fn constructor<C>(mut self, params: Vec<TypeDescriptor>, construct: C) -> Self
    where
        C: Fn(Vec<Value>) -> Result<T> + 'static,
    {
        self.constructors.push(ConstructorDescriptor {
            params,
            construct: Arc::new(construct),
        });
        self
    }

    pub fn constructor0<C>(self, construct: C) -> Self
    where
        C: Fn() -> T + 'static,
    {
        self.constructor(Vec::new(), move |_args| Ok(construct()))
    }

    pub fn constructor1<A, C>(self, construct: C) -> Self
    where
        A: Describe + FromValue + 'static,
        C: Fn(A) -> T + 'static,
    {
        self.constructor(vec![A::descriptor()], move |args| {
            let mut args = args.into_iter();
            let a = A::from_value(next_arg(&mut args)?)?;
            Ok(construct(a))
        })
    }

    pub fn constructor2<A, B, C>(self, construct: C) -> Self
    where
        A: Describe + FromValue + 'static,
        B: Describe + FromValue + 'static,
        C: Fn(A, B) -> T + 'static,
    {
        self.constructor(vec![A::descriptor(), B::descriptor()], move |args| {
            let mut args = args.into_iter();
            let a = A::from_value(next_arg(&mut args)?)?;
            let b = B::from_value(next_arg(&mut args)?)?;
            Ok(construct(a, b))
        })
    }

    pub fn constructor3<A, B, D, C>(self, construct: C) -> Self
    where
        A: Describe + FromValue + 'static,
        B: Describe + FromValue + 'static,
        D: Describe + FromValue + 'static,
        C: Fn(A, B, D) -> T + 'static,
    {
        self.constructor(
            vec![A::descriptor(), B::descriptor(), D::descriptor()],
            move |args| {
                let mut args = args.into_iter();
                let a = A::from_value(next_arg(&mut args)?)?;
                let b = B::from_value(next_arg(&mut args)?)?;
                let d = D::from_value(next_arg(&mut args)?)?;
                Ok(construct(a, b, d))
            },
        )
    }

    /// Constructor whose parameter types match exactly
    pub fn find_constructor(&self, params: &[TypeDescriptor]) -> Result<&ConstructorDescriptor<T>> {
        self.constructors
            .iter()
            .find(|ctor| ctor.params.as_slice() == params)
            .ok_or_else(|| HarnessError::NoSuchConstructor {
                class: self.name.clone(),
                signature: TypeDescriptor::signature(params),
            })
    }

    // -------------------------------------------------------------------------
    // Hooks
    // -------------------------------------------------------------------------

    pub fn equality(self) -> Self
    where
        T: PartialEq,
    {
        self.equality_with(|a: &T, b: &T| a == b)
    }

    pub fn equality_with<F>(mut self, equals: F) -> Self
    where
        F: Fn(&T, &T) -> bool + 'static,
    {
        self.equals = Some(Arc::new(equals));
        self
    }

    pub fn hashing(self) -> Self
    where
        T: Hash,
    {
        self.hashing_with(|bean: &T| {
            let mut hasher = DefaultHasher::new();
            bean.hash(&mut hasher);
            hasher.finish()
        })
    }

    pub fn hashing_with<F>(mut self, hash: F) -> Self
    where
        F: Fn(&T) -> u64 + 'static,
    {
        self.hash = Some(Arc::new(hash));
        self
    }

    pub fn display(self) -> Self
    where
        T: fmt::Display,
    {
        self.display_with(|bean: &T| bean.to_string())
    }

    pub fn display_with<F>(mut self, display: F) -> Self
    where
        F: Fn(&T) -> String + 'static,
    {
        self.display = Some(Arc::new(display));
        self
    }

    pub fn copy_constructor(self) -> Self
    where
        T: Clone,
    {
        self.copy_constructor_with(T::clone)
    }

    pub fn copy_constructor_with<F>(mut self, copy: F) -> Self
    where
        F: Fn(&T) -> T + 'static,
    {
        self.copy = Some(Arc::new(copy));
        self
    }

    pub fn equals_hook(&self) -> Option<&EqualsFn<T>> {
        self.equals.as_ref()
    }

    pub fn hash_hook(&self) -> Option<&HashFn<T>> {
        self.hash.as_ref()
    }

    pub fn display_hook(&self) -> Option<&DisplayFn<T>> {
        self.display.as_ref()
    }

    pub fn copy_hook(&self) -> Option<&CopyFn<T>> {
        self.copy.as_ref()
    }

    // -------------------------------------------------------------------------
    // Inheritance
    // -------------------------------------------------------------------------

    /// Append the layers of an embedded base type
    ///
    /// Fields and methods of `base` become reachable through the lenses.
    /// Constructors and hooks stay with the type that declares them.
    pub fn extends<B, G, M>(mut self, base: &ClassDescriptor<B>, lens: G, lens_mut: M) -> Self
    where
        B: 'static,
        G: Fn(&T) -> &B + 'static,
        M: Fn(&mut T) -> &mut B + 'static,
    {
        let lens: Arc<dyn Fn(&T) -> &B> = Arc::new(lens);
        let lens_mut: Arc<dyn Fn(&mut T) -> &mut B> = Arc::new(lens_mut);

        for layer in &base.layers {
            let fields = layer
                .fields
                .iter()
                .map(|field| lift_field(field, &lens, &lens_mut))
                .collect();
            let methods = layer
                .methods
                .iter()
                .map(|method| lift_method(method, &lens_mut))
                .collect();
            self.layers.push(Layer {
                name: layer.name.clone(),
                fields,
                methods,
            });
        }
        self
    }

    // -------------------------------------------------------------------------
    // Lookup
    // -------------------------------------------------------------------------

    /// Every field of every layer, most-derived first
    pub fn all_fields(&self) -> impl Iterator<Item = &FieldDescriptor<T>> {
        self.layers.iter().flat_map(|layer| layer.fields.iter())
    }

    /// Every method of every layer, most-derived first
    pub fn all_methods(&self) -> impl Iterator<Item = &MethodDescriptor<T>> {
        self.layers.iter().flat_map(|layer| layer.methods.iter())
    }

    /// First field with the name, walking outward
    pub fn find_field(&self, name: &str) -> Option<&FieldDescriptor<T>> {
        self.all_fields().find(|field| field.name == name)
    }

    /// First method with the name and parameter types, walking outward
    pub fn find_method(&self, name: &str, params: &[TypeDescriptor]) -> Option<&MethodDescriptor<T>> {
        self.all_methods()
            .find(|method| method.name == name && method.params.as_slice() == params)
    }
}

fn lift_field<T: 'static, B: 'static>(
    field: &FieldDescriptor<B>,
    lens: &Arc<dyn Fn(&T) -> &B>,
    lens_mut: &Arc<dyn Fn(&mut T) -> &mut B>,
) -> FieldDescriptor<T> {
    let get = field.get.clone().map(|get| {
        let lens = Arc::clone(lens);
        Arc::new(move |bean: &T| get(lens(bean))) as FieldGetter<T>
    });
    let set = field.set.clone().map(|set| {
        let lens_mut = Arc::clone(lens_mut);
        Arc::new(move |bean: &mut T, value: Value| set(lens_mut(bean), value)) as FieldSetter<T>
    });
    FieldDescriptor {
        name: field.name.clone(),
        ty: field.ty.clone(),
        is_static: field.is_static,
        is_transient: field.is_transient,
        get,
        set,
    }
}

fn lift_method<T: 'static, B: 'static>(
    method: &MethodDescriptor<B>,
    lens_mut: &Arc<dyn Fn(&mut T) -> &mut B>,
) -> MethodDescriptor<T> {
    let invoke = method.invoke.clone().map(|invoke| {
        let lens_mut = Arc::clone(lens_mut);
        Arc::new(move |bean: &mut T, args: Vec<Value>| invoke(lens_mut(bean), args)) as MethodInvoker<T>
    });
    MethodDescriptor {
        name: method.name.clone(),
        params: method.params.clone(),
        returns: method.returns.clone(),
        visibility: method.visibility,
        is_static: method.is_static,
        invoke,
    }
}

fn next_arg(args: &mut std::vec::IntoIter<Value>) -> Result<Value> {
    args.next()
        .ok_or_else(|| HarnessError::invocation("constructor", "missing argument"))
}

fn single_arg(target: &str, args: Vec<Value>) -> Result<Value> {
    let mut args = args.into_iter();
    match (args.next(), args.next()) {
        (Some(arg), None) => Ok(arg),
        _ => Err(HarnessError::invocation(target, "expected exactly one argument")),
    }
}
