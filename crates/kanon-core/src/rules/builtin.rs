//! Presence, membership and bound rules.

use super::{rule_fn, RuleBuildError, RuleContext, RuleFn, RuleRegistry, RuleViolation};
use crate::{Kind, View};

pub(super) fn register(registry: &mut RuleRegistry) {
    registry
        .register("required", required)
        .register("omitempty", omitempty)
        .register("oneof", oneof)
        .register("min", |ctx: &RuleContext<'_>| bound(ctx, Bound::Min))
        .register("max", |ctx: &RuleContext<'_>| bound(ctx, Bound::Max))
        .register("len", |ctx: &RuleContext<'_>| bound(ctx, Bound::Len))
        .register("lt", |ctx: &RuleContext<'_>| bound(ctx, Bound::Lt))
        .register("gt", |ctx: &RuleContext<'_>| bound(ctx, Bound::Gt))
        .register("lte", |ctx: &RuleContext<'_>| bound(ctx, Bound::Lte))
        .register("gte", |ctx: &RuleContext<'_>| bound(ctx, Bound::Gte));
}

/// Rejects zero values: empty string, zero number, `false`, null and empty
/// collections.
fn required(_: &RuleContext<'_>) -> Result<RuleFn, RuleBuildError> {
    Ok(rule_fn(|view| {
        if view.is_zero() {
            Err(RuleViolation::failed("value is required"))
        } else {
            Ok(())
        }
    }))
}

/// Marker only; the schema compiler makes the rules after it skip zero
/// values.
fn omitempty(_: &RuleContext<'_>) -> Result<RuleFn, RuleBuildError> {
    Ok(super::noop())
}

enum Options {
    Strings(Vec<String>),
    Ints(Vec<i64>),
    Uints(Vec<u64>),
    Floats(Vec<f64>),
    Bools(Vec<bool>),
}

fn parse_all<T: std::str::FromStr>(options: &[String], kind: Kind) -> Result<Vec<T>, RuleBuildError> {
    options
        .iter()
        .map(|o| {
            o.parse::<T>().map_err(|_| {
                RuleBuildError::new(format!("oneof option '{o}' is not a valid {kind}"))
            })
        })
        .collect()
}

/// Membership in a fixed option set, converted once to the field's kind.
/// Zero values pass; emptiness belongs to `required`.
fn oneof(ctx: &RuleContext<'_>) -> Result<RuleFn, RuleBuildError> {
    if ctx.options.is_empty() {
        return Err(RuleBuildError::new("rule 'oneof' needs at least one option"));
    }
    let options = match ctx.kind {
        Kind::Int => Options::Ints(parse_all(ctx.options, ctx.kind)?),
        Kind::Uint => Options::Uints(parse_all(ctx.options, ctx.kind)?),
        Kind::Float => Options::Floats(parse_all(ctx.options, ctx.kind)?),
        Kind::Bool => Options::Bools(parse_all(ctx.options, ctx.kind)?),
        _ => Options::Strings(ctx.options.to_vec()),
    };
    Ok(rule_fn(move |view| {
        if view.is_zero() {
            return Ok(());
        }
        let found = match (&options, view) {
            (Options::Ints(set), View::Int(i)) => set.contains(&i),
            (Options::Ints(set), View::Uint(u)) => i64::try_from(u).is_ok_and(|i| set.contains(&i)),
            (Options::Uints(set), View::Uint(u)) => set.contains(&u),
            (Options::Uints(set), View::Int(i)) => u64::try_from(i).is_ok_and(|u| set.contains(&u)),
            (Options::Floats(set), v) => match v.as_f64() {
                Some(f) => set.iter().any(|o| o.to_bits() == f.to_bits()),
                None => return Err(RuleViolation::wrong_type("number", &v)),
            },
            (Options::Bools(set), View::Bool(b)) => set.contains(&b),
            (Options::Strings(set), View::Str(s)) => set.iter().any(|o| o == s),
            (Options::Strings(set), View::Cookie(c)) => set.iter().any(|o| o == c.value()),
            (Options::Ints(_) | Options::Uints(_), v) => {
                return Err(RuleViolation::wrong_type("integer", &v))
            }
            (Options::Bools(_), v) => return Err(RuleViolation::wrong_type("bool", &v)),
            (Options::Strings(_), v) => return Err(RuleViolation::wrong_type("string", &v)),
        };
        if found {
            Ok(())
        } else {
            Err(RuleViolation::failed(format!(
                "given value '{}' not supported",
                view.display()
            )))
        }
    }))
}

#[derive(Clone, Copy)]
enum Bound {
    Min,
    Max,
    Len,
    Lt,
    Gt,
    Lte,
    Gte,
}

impl Bound {
    fn name(self) -> &'static str {
        match self {
            Self::Min => "min",
            Self::Max => "max",
            Self::Len => "len",
            Self::Lt => "lt",
            Self::Gt => "gt",
            Self::Lte => "lte",
            Self::Gte => "gte",
        }
    }

    fn holds(self, measured: f64, limit: f64) -> bool {
        match self {
            Self::Min | Self::Gte => measured >= limit,
            Self::Max | Self::Lte => measured <= limit,
            Self::Len => (measured - limit).abs() < f64::EPSILON,
            Self::Lt => measured < limit,
            Self::Gt => measured > limit,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Self::Min => "is less than minimum",
            Self::Max => "exceeds maximum",
            Self::Len => "must equal",
            Self::Lt => "must be less than",
            Self::Gt => "must be greater than",
            Self::Lte => "must be at most",
            Self::Gte => "must be at least",
        }
    }
}

/// Numeric comparison. Strings (by character) and collections compare their
/// length, numbers compare their value.
fn bound(ctx: &RuleContext<'_>, op: Bound) -> Result<RuleFn, RuleBuildError> {
    let limit = ctx.numeric_option(op.name())?;
    Ok(rule_fn(move |view| {
        let (label, measured) = match (view.length(), view.as_f64()) {
            (Some(len), _) => ("length", len as f64),
            (None, Some(n)) => ("value", n),
            (None, None) => {
                return Err(RuleViolation::wrong_type(
                    "number, string or collection",
                    &view,
                ))
            }
        };
        if op.holds(measured, limit) {
            Ok(())
        } else {
            Err(RuleViolation::failed(format!(
                "{label} {measured} {} {limit}",
                op.describe()
            )))
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::super::RuleRegistry;
    use super::*;
    use crate::Reflect;

    fn build(name: &str, kind: Kind, options: &[&str]) -> RuleFn {
        let options: Vec<String> = options.iter().map(ToString::to_string).collect();
        RuleRegistry::new()
            .build(
                name,
                &RuleContext {
                    kind,
                    type_name: kind.as_str(),
                    options: &options,
                },
            )
            .unwrap()
    }

    #[test]
    fn test_required_rejects_zero_values() {
        let rule = build("required", Kind::String, &[]);
        assert_eq!(
            rule("".reflect()),
            Err(RuleViolation::failed("value is required"))
        );
        assert!(rule("x".reflect()).is_ok());
        assert!(rule(0_u8.reflect()).is_err());
        assert!(rule(Vec::<u8>::new().reflect()).is_err());
    }

    #[test]
    fn test_oneof_message() {
        let rule = build("oneof", Kind::Int, &["1", "2", "5"]);
        assert!(rule(5_i64.reflect()).is_ok());
        assert_eq!(
            rule(29_i64.reflect()).unwrap_err().to_string(),
            "given value '29' not supported"
        );
    }

    #[test]
    fn test_oneof_skips_zero() {
        let rule = build("oneof", Kind::String, &["a", "b", "c"]);
        assert!(rule("".reflect()).is_ok());
        assert!(rule("b".reflect()).is_ok());
        assert!(rule("d".reflect()).is_err());
    }

    #[test]
    fn test_oneof_rejects_bad_options() {
        let options = vec!["one".to_string()];
        let result = RuleRegistry::new().build(
            "oneof",
            &RuleContext {
                kind: Kind::Int,
                type_name: "i32",
                options: &options,
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_bounds_on_strings_and_numbers() {
        let min = build("min", Kind::String, &["3"]);
        assert!(min("abc".reflect()).is_ok());
        assert_eq!(
            min("ab".reflect()).unwrap_err().to_string(),
            "length 2 is less than minimum 3"
        );

        let max = build("max", Kind::Int, &["10"]);
        assert!(max(10_i32.reflect()).is_ok());
        assert_eq!(
            max(11_i32.reflect()).unwrap_err().to_string(),
            "value 11 exceeds maximum 10"
        );

        let len = build("len", Kind::Slice, &["2"]);
        assert!(len(vec![1, 2].reflect()).is_ok());
        assert!(len(vec![1].reflect()).is_err());

        let gt = build("gt", Kind::Float, &["0"]);
        assert!(gt(0.5_f64.reflect()).is_ok());
        assert!(gt(0.0_f64.reflect()).is_err());
    }

    #[test]
    fn test_bounds_reject_wrong_type() {
        let min = build("min", Kind::Bool, &["1"]);
        assert!(matches!(
            min(true.reflect()),
            Err(RuleViolation::WrongType { .. })
        ));
    }
}
