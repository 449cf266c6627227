//! String coercion for transport values, default literals and timestamps.

use std::num::IntErrorKind;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use thiserror::Error;

use crate::error::rule_names;
use crate::{Kind, Value};

/// A string that could not be coerced to its declared kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CoerceError {
    /// `typeCast` or `rangeError`.
    pub rule: &'static str,
    /// Human-readable cause.
    pub message: String,
}

impl CoerceError {
    fn cast(raw: &str, target: &str) -> Self {
        Self {
            rule: rule_names::TYPE_CAST,
            message: format!("cannot parse '{raw}' as {target}"),
        }
    }

    fn range(raw: &str, target: &str) -> Self {
        Self {
            rule: rule_names::RANGE_ERROR,
            message: format!("value '{raw}' out of range for {target}"),
        }
    }
}

fn width_name(kind: Kind, bits: u8) -> String {
    match kind {
        Kind::Int => format!("int{bits}"),
        Kind::Uint => format!("uint{bits}"),
        Kind::Float => format!("float{bits}"),
        other => other.to_string(),
    }
}

/// Parses a boolean the way HTTP clients commonly send them:
/// `1 t T TRUE true True` and `0 f F FALSE false False`.
pub fn parse_bool(raw: &str) -> Result<bool, CoerceError> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(CoerceError::cast(raw, "bool")),
    }
}

/// Checks a signed integer against a declared width.
pub fn check_int(value: i64, bits: u8) -> Result<i64, CoerceError> {
    if bits == 0 || bits >= 64 {
        return Ok(value);
    }
    let max = (1_i64 << (bits - 1)) - 1;
    let min = -(1_i64 << (bits - 1));
    if value < min || value > max {
        return Err(CoerceError::range(&value.to_string(), &width_name(Kind::Int, bits)));
    }
    Ok(value)
}

/// Checks an unsigned integer against a declared width.
pub fn check_uint(value: u64, bits: u8) -> Result<u64, CoerceError> {
    if bits == 0 || bits >= 64 {
        return Ok(value);
    }
    if value > (1_u64 << bits) - 1 {
        return Err(CoerceError::range(&value.to_string(), &width_name(Kind::Uint, bits)));
    }
    Ok(value)
}

/// Checks a float against a declared width.
pub fn check_float(value: f64, bits: u8) -> Result<f64, CoerceError> {
    if bits == 32 && value.is_finite() && value.abs() > f64::from(f32::MAX) {
        return Err(CoerceError::range(&value.to_string(), "float32"));
    }
    Ok(value)
}

/// Coerces a raw string into a primitive value of `kind`.
///
/// Integers and floats are range-checked against `bits`; an overflow is
/// reported as `rangeError`, any other failure as `typeCast`.
pub fn parse_primitive(kind: Kind, bits: u8, raw: &str) -> Result<Value, CoerceError> {
    match kind {
        Kind::String => Ok(Value::String(raw.to_string())),
        Kind::Bool => parse_bool(raw).map(Value::Bool),
        Kind::Int => match raw.parse::<i64>() {
            Ok(i) => check_int(i, bits).map(Value::Int),
            Err(e) if overflowed(e.kind()) => Err(CoerceError::range(raw, &width_name(kind, bits))),
            Err(_) => Err(CoerceError::cast(raw, &width_name(kind, bits))),
        },
        Kind::Uint => match raw.parse::<u64>() {
            Ok(u) => check_uint(u, bits).map(Value::Uint),
            Err(e) if overflowed(e.kind()) => Err(CoerceError::range(raw, &width_name(kind, bits))),
            Err(_) => Err(CoerceError::cast(raw, &width_name(kind, bits))),
        },
        Kind::Float => raw
            .parse::<f64>()
            .map_err(|_| CoerceError::cast(raw, &width_name(kind, bits)))
            .and_then(|f| check_float(f, bits))
            .map(Value::Float),
        other => Err(CoerceError::cast(raw, other.as_str())),
    }
}

fn overflowed(kind: &IntErrorKind) -> bool {
    matches!(kind, IntErrorKind::PosOverflow | IntErrorKind::NegOverflow)
}

/// Parses a timestamp with a chrono layout, or RFC 3339 when none is given.
///
/// Layouts without an offset are read as UTC, and date-only layouts as
/// midnight UTC.
pub fn parse_timestamp(raw: &str, layout: Option<&str>) -> Result<DateTime<FixedOffset>, CoerceError> {
    let cast = || CoerceError {
        rule: rule_names::TYPE_CAST,
        message: format!("cannot parse '{raw}' as timestamp"),
    };
    let Some(layout) = layout else {
        return DateTime::parse_from_rfc3339(raw).map_err(|_| cast());
    };
    if let Ok(ts) = DateTime::parse_from_str(raw, layout) {
        return Ok(ts);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, layout) {
        return Ok(naive.and_utc().fixed_offset());
    }
    NaiveDate::parse_from_str(raw, layout)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
        .ok_or_else(cast)
}

/// Renders a timestamp with a chrono layout, or RFC 3339 (UTC as `Z`).
#[must_use]
pub fn format_timestamp(ts: &DateTime<FixedOffset>, layout: Option<&str>) -> String {
    match layout {
        Some(layout) => ts.format(layout).to_string(),
        None if ts.offset().local_minus_utc() == 0 => ts
            .with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::AutoSi, true),
        None => ts.to_rfc3339_opts(SecondsFormat::AutoSi, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_forms() {
        assert_eq!(parse_bool("T"), Ok(true));
        assert_eq!(parse_bool("0"), Ok(false));
        assert!(parse_bool("yes").is_err());
    }

    #[test]
    fn test_int_width_is_range_error() {
        let err = parse_primitive(Kind::Uint, 8, "300").unwrap_err();
        assert_eq!(err.rule, rule_names::RANGE_ERROR);
        assert_eq!(parse_primitive(Kind::Uint, 8, "255"), Ok(Value::Uint(255)));
        assert_eq!(parse_primitive(Kind::Int, 8, "-128"), Ok(Value::Int(-128)));
        assert!(parse_primitive(Kind::Int, 8, "-129").is_err());
    }

    #[test]
    fn test_int_overflow_is_range_error() {
        let err = parse_primitive(Kind::Int, 64, "99999999999999999999").unwrap_err();
        assert_eq!(err.rule, rule_names::RANGE_ERROR);
    }

    #[test]
    fn test_bad_syntax_is_type_cast() {
        let err = parse_primitive(Kind::Int, 64, "abc").unwrap_err();
        assert_eq!(err.rule, rule_names::TYPE_CAST);
        assert_eq!(err.message, "cannot parse 'abc' as int64");
        assert_eq!(
            parse_primitive(Kind::Uint, 64, "-1").unwrap_err().rule,
            rule_names::TYPE_CAST
        );
    }

    #[test]
    fn test_float32_range() {
        assert!(parse_primitive(Kind::Float, 32, "1e39").is_err());
        assert_eq!(parse_primitive(Kind::Float, 64, "1e39"), Ok(Value::Float(1e39)));
    }

    #[test]
    fn test_timestamp_layouts() {
        let ts = parse_timestamp("2024-03-01T10:00:00Z", None).unwrap();
        assert_eq!(format_timestamp(&ts, None), "2024-03-01T10:00:00Z");

        let date = parse_timestamp("2024-03-01", Some("%Y-%m-%d")).unwrap();
        assert_eq!(format_timestamp(&date, Some("%Y-%m-%d")), "2024-03-01");
        assert_eq!(format_timestamp(&date, None), "2024-03-01T00:00:00Z");

        let naive = parse_timestamp("2024-03-01 08:30", Some("%Y-%m-%d %H:%M")).unwrap();
        assert_eq!(format_timestamp(&naive, None), "2024-03-01T08:30:00Z");

        assert!(parse_timestamp("yesterday", None).is_err());
    }

    #[test]
    fn test_offset_is_preserved() {
        let ts = parse_timestamp("2024-03-01T10:00:00+02:00", None).unwrap();
        assert_eq!(format_timestamp(&ts, None), "2024-03-01T10:00:00+02:00");
    }
}
