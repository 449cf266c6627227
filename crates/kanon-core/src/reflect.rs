//! Borrowed read model over handler values.
//!
//! The response encoder and the validators never inspect Rust types
//! directly; they ask a value for a [`View`] and dispatch on it. Records,
//! sequences and maps expose their members through [`StructView`],
//! [`ListView`] and [`MapView`] so nothing is copied or materialized.

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::BuildHasher;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, TimeZone};
use indexmap::IndexMap;

use crate::{Cookie, CustomValue, Value};

/// A borrowed, shape-tagged view of a value.
#[derive(Clone, Copy)]
pub enum View<'a> {
    /// Absent pointer or explicit null.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    Uint(u64),
    /// Floating point number.
    Float(f64),
    /// String.
    Str(&'a str),
    /// Timestamp.
    Timestamp(DateTime<FixedOffset>),
    /// Structured cookie.
    Cookie(&'a Cookie),
    /// Opaque value for custom format encoders.
    Custom(&'a (dyn Any + Send + Sync)),
    /// Sequence.
    List(&'a dyn ListView),
    /// Map.
    Map(&'a dyn MapView),
    /// Record.
    Struct(&'a dyn StructView),
}

impl<'a> View<'a> {
    /// Returns the lowercase name of this view's shape.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Uint(_) => "uint",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Timestamp(_) => "timestamp",
            Self::Cookie(_) => "cookie",
            Self::Custom(_) => "custom",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Struct(_) => "struct",
        }
    }

    /// Returns `true` when the value counts as "not present": null, empty
    /// string, zero number, `false`, or an empty collection.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Bool(b) => !b,
            Self::Int(i) => *i == 0,
            Self::Uint(u) => *u == 0,
            Self::Float(f) => *f == 0.0,
            Self::Str(s) => s.is_empty(),
            Self::List(list) => list.len() == 0,
            Self::Map(map) => map.len() == 0,
            Self::Timestamp(_) | Self::Cookie(_) | Self::Custom(_) | Self::Struct(_) => false,
        }
    }

    /// Returns the string if this is a string view.
    #[must_use]
    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the numeric value as `f64`.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Uint(u) => Some(*u as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the length of strings (in characters) and collections.
    #[must_use]
    pub fn length(&self) -> Option<usize> {
        match self {
            Self::Str(s) => Some(s.chars().count()),
            Self::List(list) => Some(list.len()),
            Self::Map(map) => Some(map.len()),
            _ => None,
        }
    }

    /// Renders a scalar view for error messages.
    #[must_use]
    pub fn display(&self) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Uint(u) => u.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Str(s) => (*s).to_string(),
            Self::Timestamp(ts) => ts.to_rfc3339(),
            Self::Cookie(c) => c.to_string(),
            other => format!("<{}>", other.type_name()),
        }
    }
}

impl fmt::Debug for View<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Self::Int(i) => f.debug_tuple("Int").field(i).finish(),
            Self::Uint(u) => f.debug_tuple("Uint").field(u).finish(),
            Self::Float(x) => f.debug_tuple("Float").field(x).finish(),
            Self::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Self::Timestamp(ts) => f.debug_tuple("Timestamp").field(ts).finish(),
            Self::Cookie(c) => f.debug_tuple("Cookie").field(c).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
            Self::List(list) => write!(f, "List(len={})", list.len()),
            Self::Map(map) => write!(f, "Map(len={})", map.len()),
            Self::Struct(_) => f.write_str("Struct(..)"),
        }
    }
}

/// A value the encoder and validators can read.
pub trait Reflect {
    /// Returns a borrowed view of this value.
    fn reflect(&self) -> View<'_>;
}

/// Sequence access.
pub trait ListView {
    /// Number of elements.
    fn len(&self) -> usize;

    /// Element at `index`.
    fn get(&self, index: usize) -> Option<&dyn Reflect>;
}

/// Map access. Keys are exposed as views so non-string keys can be
/// detected and reported by the encoder.
pub trait MapView {
    /// Number of entries.
    fn len(&self) -> usize;

    /// All entries, in a deterministic order.
    fn entries(&self) -> Vec<(View<'_>, &dyn Reflect)>;
}

/// Record access by binding name.
pub trait StructView {
    /// Member named `binding`, if the record has one.
    fn field(&self, binding: &str) -> Option<&dyn Reflect>;

    /// All members in declaration order.
    fn fields(&self) -> Vec<(&str, &dyn Reflect)>;
}

macro_rules! reflect_scalar {
    ($variant:ident, $target:ty => $($ty:ty),+) => {
        $(
            impl Reflect for $ty {
                fn reflect(&self) -> View<'_> {
                    View::$variant(<$target>::from(*self))
                }
            }
        )+
    };
}

reflect_scalar!(Int, i64 => i8, i16, i32, i64);
reflect_scalar!(Uint, u64 => u8, u16, u32, u64);
reflect_scalar!(Float, f64 => f32, f64);

impl Reflect for bool {
    fn reflect(&self) -> View<'_> {
        View::Bool(*self)
    }
}

impl Reflect for isize {
    fn reflect(&self) -> View<'_> {
        View::Int(*self as i64)
    }
}

impl Reflect for usize {
    fn reflect(&self) -> View<'_> {
        View::Uint(*self as u64)
    }
}

impl Reflect for str {
    fn reflect(&self) -> View<'_> {
        View::Str(self)
    }
}

impl Reflect for String {
    fn reflect(&self) -> View<'_> {
        View::Str(self)
    }
}

impl Reflect for Cookie {
    fn reflect(&self) -> View<'_> {
        View::Cookie(self)
    }
}

impl<Tz: TimeZone> Reflect for DateTime<Tz> {
    fn reflect(&self) -> View<'_> {
        View::Timestamp(self.fixed_offset())
    }
}

impl Reflect for CustomValue {
    fn reflect(&self) -> View<'_> {
        View::Custom(self.as_any())
    }
}

impl<T: Reflect + ?Sized> Reflect for &T {
    fn reflect(&self) -> View<'_> {
        (**self).reflect()
    }
}

impl<T: Reflect + ?Sized> Reflect for Box<T> {
    fn reflect(&self) -> View<'_> {
        (**self).reflect()
    }
}

impl<T: Reflect + ?Sized> Reflect for Arc<T> {
    fn reflect(&self) -> View<'_> {
        (**self).reflect()
    }
}

impl<T: Reflect> Reflect for Option<T> {
    fn reflect(&self) -> View<'_> {
        match self {
            Some(inner) => inner.reflect(),
            None => View::Null,
        }
    }
}

impl<T: Reflect> ListView for Vec<T> {
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn get(&self, index: usize) -> Option<&dyn Reflect> {
        self.as_slice().get(index).map(|item| item as &dyn Reflect)
    }
}

impl<T: Reflect> Reflect for Vec<T> {
    fn reflect(&self) -> View<'_> {
        View::List(self)
    }
}

impl<K: Reflect + Ord, V: Reflect, S: BuildHasher> MapView for HashMap<K, V, S> {
    fn len(&self) -> usize {
        HashMap::len(self)
    }

    fn entries(&self) -> Vec<(View<'_>, &dyn Reflect)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
            .into_iter()
            .map(|(k, v)| (k.reflect(), v as &dyn Reflect))
            .collect()
    }
}

impl<K: Reflect + Ord, V: Reflect, S: BuildHasher> Reflect for HashMap<K, V, S> {
    fn reflect(&self) -> View<'_> {
        View::Map(self)
    }
}

impl<K: Reflect, V: Reflect> MapView for BTreeMap<K, V> {
    fn len(&self) -> usize {
        BTreeMap::len(self)
    }

    fn entries(&self) -> Vec<(View<'_>, &dyn Reflect)> {
        self.iter()
            .map(|(k, v)| (k.reflect(), v as &dyn Reflect))
            .collect()
    }
}

impl<K: Reflect, V: Reflect> Reflect for BTreeMap<K, V> {
    fn reflect(&self) -> View<'_> {
        View::Map(self)
    }
}

impl<K: Reflect, V: Reflect, S> MapView for IndexMap<K, V, S> {
    fn len(&self) -> usize {
        IndexMap::len(self)
    }

    fn entries(&self) -> Vec<(View<'_>, &dyn Reflect)> {
        self.iter()
            .map(|(k, v)| (k.reflect(), v as &dyn Reflect))
            .collect()
    }
}

impl<K: Reflect, V: Reflect, S> Reflect for IndexMap<K, V, S> {
    fn reflect(&self) -> View<'_> {
        View::Map(self)
    }
}

/// Records bound by the binder are keyed by binding name.
impl StructView for IndexMap<String, Value> {
    fn field(&self, binding: &str) -> Option<&dyn Reflect> {
        self.get(binding).map(|v| v as &dyn Reflect)
    }

    fn fields(&self) -> Vec<(&str, &dyn Reflect)> {
        self.iter()
            .map(|(k, v)| (k.as_str(), v as &dyn Reflect))
            .collect()
    }
}

impl Reflect for Value {
    fn reflect(&self) -> View<'_> {
        match self {
            Self::Null => View::Null,
            Self::Bool(b) => View::Bool(*b),
            Self::Int(i) => View::Int(*i),
            Self::Uint(u) => View::Uint(*u),
            Self::Float(f) => View::Float(*f),
            Self::String(s) => View::Str(s),
            Self::Timestamp(ts) => View::Timestamp(*ts),
            Self::Cookie(c) => View::Cookie(c),
            Self::Custom(c) => View::Custom(c.as_any()),
            Self::List(items) => View::List(items),
            Self::Map(members) => View::Map(members),
            Self::Struct(members) => View::Struct(members),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_values() {
        assert!(0_i32.reflect().is_zero());
        assert!(String::new().reflect().is_zero());
        assert!(false.reflect().is_zero());
        assert!(Option::<u8>::None.reflect().is_zero());
        assert!(Vec::<u8>::new().reflect().is_zero());
        assert!(!"x".reflect().is_zero());
        assert!(!1.5_f64.reflect().is_zero());
    }

    #[test]
    fn test_length_counts_characters() {
        assert_eq!("héllo".reflect().length(), Some(5));
        assert_eq!(vec![1, 2, 3].reflect().length(), Some(3));
        assert_eq!(7_u8.reflect().length(), None);
    }

    #[test]
    fn test_hash_map_entries_are_sorted() {
        let mut map = HashMap::new();
        map.insert("b".to_string(), 2_u8);
        map.insert("a".to_string(), 1_u8);
        let View::Map(view) = map.reflect() else {
            panic!("expected map view");
        };
        let keys: Vec<_> = view
            .entries()
            .into_iter()
            .map(|(k, _)| k.display())
            .collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_value_struct_view() {
        let mut members = IndexMap::new();
        members.insert("name".to_string(), Value::from("ada"));
        let value = Value::Struct(members);
        let View::Struct(view) = value.reflect() else {
            panic!("expected struct view");
        };
        assert_eq!(
            view.field("name").map(|f| f.reflect().display()),
            Some("ada".to_string())
        );
        assert!(view.field("missing").is_none());
    }
}
