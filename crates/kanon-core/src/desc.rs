//! Contract type descriptions.
//!
//! A [`TypeDesc`] is the structural information the schema compiler walks
//! once per operation. Types opt in through [`Contract`], usually via
//! `#[derive(Contract)]`; the standard containers and scalars are covered
//! here.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, TimeZone};
use indexmap::IndexMap;

use crate::{Cookie, CustomValue, Value};

/// Annotation carrying the wire key and the `omitempty` flag.
pub const ANNOTATION_WIRE: &str = "wire";
/// Annotation carrying the comma-separated validator list.
pub const ANNOTATION_RULES: &str = "rules";
/// Annotation carrying the default literal.
pub const ANNOTATION_DEFAULT: &str = "default";
/// Annotation carrying a timestamp layout in chrono syntax.
pub const ANNOTATION_LAYOUT: &str = "layout";
/// Annotation naming a registered custom format.
pub const ANNOTATION_SPEC: &str = "spec";
/// Annotation excluding a member from every walk.
pub const ANNOTATION_IGNORE: &str = "ignore";

/// Structural description of a contract type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDesc {
    /// Type name, used in error messages and documentation.
    pub name: Cow<'static, str>,
    /// Shape of the type.
    pub shape: Shape,
}

impl TypeDesc {
    /// Creates a description.
    #[must_use]
    pub fn new(name: impl Into<Cow<'static, str>>, shape: Shape) -> Self {
        Self {
            name: name.into(),
            shape,
        }
    }

    /// Creates a record description.
    #[must_use]
    pub fn record(name: impl Into<Cow<'static, str>>, fields: Vec<FieldDesc>) -> Self {
        Self::new(name, Shape::Struct(fields))
    }

    /// Describes `T`.
    #[must_use]
    pub fn of<T: Contract + ?Sized>() -> Self {
        T::describe()
    }

    /// Returns the record members, if this describes a record.
    #[must_use]
    pub fn fields(&self) -> Option<&[FieldDesc]> {
        match &self.shape {
            Shape::Struct(fields) => Some(fields),
            _ => None,
        }
    }
}

/// Shape of a contract type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// Boolean.
    Bool,
    /// Signed integer of the given width.
    Int {
        /// Width in bits.
        bits: u8,
    },
    /// Unsigned integer of the given width.
    Uint {
        /// Width in bits.
        bits: u8,
    },
    /// Floating point number of the given width.
    Float {
        /// Width in bits.
        bits: u8,
    },
    /// String.
    String,
    /// Date-time.
    Timestamp,
    /// Structured cookie.
    Cookie,
    /// Any JSON value.
    Any,
    /// A type only a custom format can decode and encode.
    Opaque,
    /// Optional indirection.
    Optional(Box<TypeDesc>),
    /// Sequence.
    List(Box<TypeDesc>),
    /// Map.
    Map {
        /// Key type.
        key: Box<TypeDesc>,
        /// Value type.
        value: Box<TypeDesc>,
    },
    /// Record.
    Struct(Vec<FieldDesc>),
}

/// One member of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDesc {
    /// Name used to address the member in the destination.
    pub binding: Cow<'static, str>,
    /// Member type.
    pub ty: TypeDesc,
    /// Annotations in declaration order.
    pub annotations: IndexMap<String, String>,
}

impl FieldDesc {
    /// Creates a member without annotations.
    #[must_use]
    pub fn new(binding: impl Into<Cow<'static, str>>, ty: TypeDesc) -> Self {
        Self {
            binding: binding.into(),
            ty,
            annotations: IndexMap::new(),
        }
    }

    /// Creates a member of type `T`.
    #[must_use]
    pub fn of<T: Contract + ?Sized>(binding: impl Into<Cow<'static, str>>) -> Self {
        Self::new(binding, T::describe())
    }

    /// Sets an arbitrary annotation.
    #[must_use]
    pub fn annotate(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(name.into(), value.into());
        self
    }

    /// Sets the wire key.
    #[must_use]
    pub fn wire(self, key: impl Into<String>) -> Self {
        self.annotate(ANNOTATION_WIRE, key)
    }

    /// Marks the member to be skipped on encode when empty.
    #[must_use]
    pub fn omit_empty(self) -> Self {
        let wire = match self.annotation(ANNOTATION_WIRE) {
            Some(existing) if existing.split(',').any(|p| p == "omitempty") => {
                existing.to_string()
            }
            Some(existing) => format!("{existing},omitempty"),
            None => ",omitempty".to_string(),
        };
        self.annotate(ANNOTATION_WIRE, wire)
    }

    /// Sets the validator list, e.g. `required,oneof=a b c`.
    #[must_use]
    pub fn rules(self, rules: impl Into<String>) -> Self {
        self.annotate(ANNOTATION_RULES, rules)
    }

    /// Sets the default literal.
    #[must_use]
    pub fn default_literal(self, literal: impl Into<String>) -> Self {
        self.annotate(ANNOTATION_DEFAULT, literal)
    }

    /// Sets the timestamp layout.
    #[must_use]
    pub fn layout(self, layout: impl Into<String>) -> Self {
        self.annotate(ANNOTATION_LAYOUT, layout)
    }

    /// Attaches a registered custom format.
    #[must_use]
    pub fn spec(self, id: impl Into<String>) -> Self {
        self.annotate(ANNOTATION_SPEC, id)
    }

    /// Excludes the member from every walk.
    #[must_use]
    pub fn ignore(self) -> Self {
        self.annotate(ANNOTATION_IGNORE, "true")
    }

    /// Returns an annotation value.
    #[must_use]
    pub fn annotation(&self, name: &str) -> Option<&str> {
        self.annotations.get(name).map(String::as_str)
    }
}

/// A type that can describe its own shape to the schema compiler.
pub trait Contract {
    /// Returns the structural description of this type.
    fn describe() -> TypeDesc;
}

macro_rules! contract_scalar {
    ($($ty:ty => $shape:expr),+ $(,)?) => {
        $(
            impl Contract for $ty {
                fn describe() -> TypeDesc {
                    TypeDesc::new(stringify!($ty), $shape)
                }
            }
        )+
    };
}

contract_scalar! {
    bool => Shape::Bool,
    i8 => Shape::Int { bits: 8 },
    i16 => Shape::Int { bits: 16 },
    i32 => Shape::Int { bits: 32 },
    i64 => Shape::Int { bits: 64 },
    isize => Shape::Int { bits: 64 },
    u8 => Shape::Uint { bits: 8 },
    u16 => Shape::Uint { bits: 16 },
    u32 => Shape::Uint { bits: 32 },
    u64 => Shape::Uint { bits: 64 },
    usize => Shape::Uint { bits: 64 },
    f32 => Shape::Float { bits: 32 },
    f64 => Shape::Float { bits: 64 },
    String => Shape::String,
    str => Shape::String,
    Cookie => Shape::Cookie,
    Value => Shape::Any,
    CustomValue => Shape::Opaque,
}

impl Contract for () {
    fn describe() -> TypeDesc {
        TypeDesc::record("()", Vec::new())
    }
}

impl<Tz: TimeZone> Contract for DateTime<Tz> {
    fn describe() -> TypeDesc {
        TypeDesc::new("DateTime", Shape::Timestamp)
    }
}

impl<T: Contract + ?Sized> Contract for &T {
    fn describe() -> TypeDesc {
        T::describe()
    }
}

impl<T: Contract + ?Sized> Contract for Box<T> {
    fn describe() -> TypeDesc {
        T::describe()
    }
}

impl<T: Contract> Contract for Option<T> {
    fn describe() -> TypeDesc {
        let inner = T::describe();
        TypeDesc::new(
            format!("Option<{}>", inner.name),
            Shape::Optional(Box::new(inner)),
        )
    }
}

impl<T: Contract> Contract for Vec<T> {
    fn describe() -> TypeDesc {
        let inner = T::describe();
        TypeDesc::new(format!("Vec<{}>", inner.name), Shape::List(Box::new(inner)))
    }
}

fn map_desc<K: Contract, V: Contract>() -> TypeDesc {
    let key = K::describe();
    let value = V::describe();
    TypeDesc::new(
        format!("Map<{}, {}>", key.name, value.name),
        Shape::Map {
            key: Box::new(key),
            value: Box::new(value),
        },
    )
}

impl<K: Contract, V: Contract, S> Contract for HashMap<K, V, S> {
    fn describe() -> TypeDesc {
        map_desc::<K, V>()
    }
}

impl<K: Contract, V: Contract> Contract for BTreeMap<K, V> {
    fn describe() -> TypeDesc {
        map_desc::<K, V>()
    }
}

impl<K: Contract, V: Contract, S> Contract for IndexMap<K, V, S> {
    fn describe() -> TypeDesc {
        map_desc::<K, V>()
    }
}
