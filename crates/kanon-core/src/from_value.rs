//! Conversion from bound [`Value`]s into typed destinations.
//!
//! The binder fills a dynamic destination; `FromValue` moves it into the
//! caller's own types. Absent members go through [`FromValue::from_absent`],
//! which is how pointer-like destinations (`Option<T>`) stay unallocated
//! when no data was sent.

use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};

use chrono::{DateTime, FixedOffset, Utc};
use indexmap::IndexMap;
use thiserror::Error;

use crate::{Cookie, CustomValue, Value};

/// Error converting a bound value into a typed destination.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// The bound value has a different shape.
    #[error("expected {expected}, found {found}")]
    Mismatch {
        /// Expected shape.
        expected: &'static str,
        /// Actual shape.
        found: &'static str,
    },

    /// The bound number does not fit the destination.
    #[error("{value} is out of range for {target}")]
    OutOfRange {
        /// Rendered value.
        value: String,
        /// Destination type.
        target: &'static str,
    },

    /// No value was bound and the destination has no empty state.
    #[error("missing value")]
    Missing,

    /// A record member failed to convert.
    #[error("member '{field}': {source}")]
    Field {
        /// Binding name of the member.
        field: String,
        /// Underlying error.
        #[source]
        source: Box<ValueError>,
    },
}

impl ValueError {
    /// Creates a shape mismatch error.
    #[must_use]
    pub fn mismatch(expected: &'static str, found: &Value) -> Self {
        Self::Mismatch {
            expected,
            found: found.type_name(),
        }
    }
}

/// Builds a typed destination from a bound value.
pub trait FromValue: Sized {
    /// Converts a bound value.
    fn from_value(value: Value) -> Result<Self, ValueError>;

    /// Produces the destination when nothing was bound.
    fn from_absent() -> Result<Self, ValueError> {
        Err(ValueError::Missing)
    }
}

/// Takes the members out of a bound record.
///
/// Maps are accepted too, so records nested under interface-typed members
/// convert the same way.
pub fn into_members(value: Value) -> Result<IndexMap<String, Value>, ValueError> {
    match value {
        Value::Struct(members) | Value::Map(members) => Ok(members),
        Value::Null => Ok(IndexMap::new()),
        other => Err(ValueError::mismatch("struct", &other)),
    }
}

/// Removes and converts one member of a bound record.
pub fn take_member<T: FromValue>(
    members: &mut IndexMap<String, Value>,
    binding: &str,
) -> Result<T, ValueError> {
    let result = match members.shift_remove(binding) {
        Some(value) => T::from_value(value),
        None => T::from_absent(),
    };
    result.map_err(|source| ValueError::Field {
        field: binding.to_string(),
        source: Box::new(source),
    })
}

macro_rules! from_value_int {
    ($($ty:ty),+) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: Value) -> Result<Self, ValueError> {
                    let out_of_range = |rendered: String| ValueError::OutOfRange {
                        value: rendered,
                        target: stringify!($ty),
                    };
                    match value {
                        Value::Int(i) => <$ty>::try_from(i).map_err(|_| out_of_range(i.to_string())),
                        Value::Uint(u) => <$ty>::try_from(u).map_err(|_| out_of_range(u.to_string())),
                        Value::Null => Self::from_absent(),
                        other => Err(ValueError::mismatch(stringify!($ty), &other)),
                    }
                }

                fn from_absent() -> Result<Self, ValueError> {
                    Ok(0)
                }
            }
        )+
    };
}

from_value_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Self::from_absent(),
            other => other
                .as_f64()
                .ok_or_else(|| ValueError::mismatch("f64", &other)),
        }
    }

    fn from_absent() -> Result<Self, ValueError> {
        Ok(0.0)
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        let wide = f64::from_value(value)?;
        if wide.is_finite() && wide.abs() > f64::from(f32::MAX) {
            return Err(ValueError::OutOfRange {
                value: wide.to_string(),
                target: "f32",
            });
        }
        Ok(wide as f32)
    }

    fn from_absent() -> Result<Self, ValueError> {
        Ok(0.0)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Bool(b) => Ok(b),
            Value::Null => Self::from_absent(),
            other => Err(ValueError::mismatch("bool", &other)),
        }
    }

    fn from_absent() -> Result<Self, ValueError> {
        Ok(false)
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::String(s) => Ok(s),
            Value::Cookie(c) => Ok(c.value().to_string()),
            Value::Null => Self::from_absent(),
            other => Err(ValueError::mismatch("string", &other)),
        }
    }

    fn from_absent() -> Result<Self, ValueError> {
        Ok(String::new())
    }
}

impl FromValue for Cookie {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Cookie(c) => Ok(c),
            other => Err(ValueError::mismatch("cookie", &other)),
        }
    }
}

impl FromValue for DateTime<FixedOffset> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Timestamp(ts) => Ok(ts),
            other => Err(ValueError::mismatch("timestamp", &other)),
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        DateTime::<FixedOffset>::from_value(value).map(|ts| ts.with_timezone(&Utc))
    }
}

impl FromValue for CustomValue {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Custom(c) => Ok(c),
            other => Err(ValueError::mismatch("custom", &other)),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        Ok(value)
    }

    fn from_absent() -> Result<Self, ValueError> {
        Ok(Value::Null)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }

    fn from_absent() -> Result<Self, ValueError> {
        Ok(None)
    }
}

impl<T: FromValue> FromValue for Box<T> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        T::from_value(value).map(Box::new)
    }

    fn from_absent() -> Result<Self, ValueError> {
        T::from_absent().map(Box::new)
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            Value::Null => Self::from_absent(),
            other => Err(ValueError::mismatch("list", &other)),
        }
    }

    fn from_absent() -> Result<Self, ValueError> {
        Ok(Vec::new())
    }
}

fn map_entries(value: Value) -> Result<IndexMap<String, Value>, ValueError> {
    match value {
        Value::Map(members) | Value::Struct(members) => Ok(members),
        Value::Null => Ok(IndexMap::new()),
        other => Err(ValueError::mismatch("map", &other)),
    }
}

impl<T: FromValue, S: BuildHasher + Default> FromValue for HashMap<String, T, S> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        map_entries(value)?
            .into_iter()
            .map(|(k, v)| T::from_value(v).map(|v| (k, v)))
            .collect()
    }

    fn from_absent() -> Result<Self, ValueError> {
        Ok(Self::default())
    }
}

impl<T: FromValue> FromValue for BTreeMap<String, T> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        map_entries(value)?
            .into_iter()
            .map(|(k, v)| T::from_value(v).map(|v| (k, v)))
            .collect()
    }

    fn from_absent() -> Result<Self, ValueError> {
        Ok(Self::new())
    }
}

impl<K, T, S> FromValue for IndexMap<K, T, S>
where
    K: From<String> + Hash + Eq,
    T: FromValue,
    S: BuildHasher + Default,
{
    fn from_value(value: Value) -> Result<Self, ValueError> {
        map_entries(value)?
            .into_iter()
            .map(|(k, v)| T::from_value(v).map(|v| (K::from(k), v)))
            .collect()
    }

    fn from_absent() -> Result<Self, ValueError> {
        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_range_checks() {
        assert_eq!(u8::from_value(Value::Uint(200)), Ok(200));
        assert!(matches!(
            u8::from_value(Value::Uint(300)),
            Err(ValueError::OutOfRange { .. })
        ));
        assert!(matches!(
            u32::from_value(Value::Int(-1)),
            Err(ValueError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_option_distinguishes_absent() {
        assert_eq!(Option::<i64>::from_absent(), Ok(None));
        assert_eq!(Option::<i64>::from_value(Value::Null), Ok(None));
        assert_eq!(Option::<i64>::from_value(Value::Int(0)), Ok(Some(0)));
    }

    #[test]
    fn test_take_member_wraps_errors() {
        let mut members = IndexMap::new();
        members.insert("age".to_string(), Value::from("old"));
        let err = take_member::<i32>(&mut members, "age").unwrap_err();
        assert!(err.to_string().contains("member 'age'"));
        assert_eq!(take_member::<i32>(&mut members, "missing"), Ok(0));
    }

    #[test]
    fn test_timestamps_require_a_value() {
        assert_eq!(DateTime::<Utc>::from_absent(), Err(ValueError::Missing));
    }

    #[test]
    fn test_map_conversion() {
        let mut members = IndexMap::new();
        members.insert("a".to_string(), Value::Int(1));
        let map = HashMap::<String, i64>::from_value(Value::Map(members)).unwrap();
        assert_eq!(map["a"], 1);
    }
}
