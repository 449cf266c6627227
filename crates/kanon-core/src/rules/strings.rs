//! String-shape rules.
//!
//! Each rule accepts string views only and reports any other host type as
//! [`RuleViolation::WrongType`], separately from pattern failures.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use once_cell::sync::Lazy;
use regex::Regex;

use super::{rule_fn, RuleBuildError, RuleContext, RuleFn, RuleRegistry, RuleViolation};
use crate::View;

static ALPHA: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z]+$").expect("alpha regex"));
static ALPHANUM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9]+$").expect("alphanum regex"));
static NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-+]?[0-9]+(?:\.[0-9]+)?$").expect("numeric regex"));
static HEXADECIMAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(0[xX])?[0-9a-fA-F]+$").expect("hexadecimal regex"));
static HEXCOLOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$")
        .expect("hexcolor regex")
});
static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("email regex")
});
static URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.-]*://[^\s/?#]+(?:[/?#][^\s]*)?$").expect("url regex")
});
static MAC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[0-9a-fA-F]{2}[:-]){5}[0-9a-fA-F]{2}$").expect("mac regex")
});
static BASE64: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[A-Za-z0-9+/]{4})*(?:[A-Za-z0-9+/]{2}==|[A-Za-z0-9+/]{3}=)?$")
        .expect("base64 regex")
});
static SEMVER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(0|[1-9]\d*)\.(0|[1-9]\d*)\.(0|[1-9]\d*)(?:-((?:0|[1-9]\d*|\d*[a-zA-Z-][0-9a-zA-Z-]*)(?:\.(?:0|[1-9]\d*|\d*[a-zA-Z-][0-9a-zA-Z-]*))*))?(?:\+([0-9a-zA-Z-]+(?:\.[0-9a-zA-Z-]+)*))?$",
    )
    .expect("semver regex")
});

pub(super) fn register(registry: &mut RuleRegistry) {
    registry
        .register("alpha", |_: &RuleContext<'_>| pattern(&ALPHA, "alphabetic string"))
        .register("alphanum", |_: &RuleContext<'_>| {
            pattern(&ALPHANUM, "alphanumeric string")
        })
        .register("numeric", |_: &RuleContext<'_>| pattern(&NUMERIC, "numeric string"))
        .register("hexadecimal", |_: &RuleContext<'_>| {
            pattern(&HEXADECIMAL, "hexadecimal string")
        })
        .register("hexcolor", |_: &RuleContext<'_>| pattern(&HEXCOLOR, "hex color"))
        .register("email", |_: &RuleContext<'_>| pattern(&EMAIL, "email address"))
        .register("url", |_: &RuleContext<'_>| pattern(&URL, "URL"))
        .register("mac", |_: &RuleContext<'_>| pattern(&MAC, "MAC address"))
        .register("base64", |_: &RuleContext<'_>| pattern(&BASE64, "base64 string"))
        .register("semver", |_: &RuleContext<'_>| {
            pattern(&SEMVER, "semantic version")
        })
        .register("uuid", |_: &RuleContext<'_>| {
            check(|s| uuid::Uuid::try_parse(s).is_ok(), "UUID")
        })
        .register("ip", |_: &RuleContext<'_>| {
            check(|s| s.parse::<IpAddr>().is_ok(), "IP address")
        })
        .register("ipv4", |_: &RuleContext<'_>| {
            check(|s| s.parse::<Ipv4Addr>().is_ok(), "IPv4 address")
        })
        .register("ipv6", |_: &RuleContext<'_>| {
            check(|s| s.parse::<Ipv6Addr>().is_ok(), "IPv6 address")
        })
        .register("cidr", |_: &RuleContext<'_>| check(is_cidr, "CIDR block"))
        .register("lowercase", |_: &RuleContext<'_>| {
            check(|s| s.to_lowercase() == s, "lowercase string")
        })
        .register("uppercase", |_: &RuleContext<'_>| {
            check(|s| s.to_uppercase() == s, "uppercase string")
        })
        .register("ascii", |_: &RuleContext<'_>| check(|s| s.is_ascii(), "ASCII string"))
        .register("contains", |ctx: &RuleContext<'_>| {
            substring(ctx, "contain", |s, needle| s.contains(needle))
        })
        .register("excludes", |ctx: &RuleContext<'_>| {
            substring(ctx, "not contain", |s, needle| !s.contains(needle))
        })
        .register("startswith", |ctx: &RuleContext<'_>| {
            substring(ctx, "start with", |s, needle| s.starts_with(needle))
        })
        .register("endswith", |ctx: &RuleContext<'_>| {
            substring(ctx, "end with", |s, needle| s.ends_with(needle))
        });
}

fn is_cidr(s: &str) -> bool {
    let Some((addr, prefix)) = s.split_once('/') else {
        return false;
    };
    let Ok(prefix) = prefix.parse::<u8>() else {
        return false;
    };
    match addr.parse::<IpAddr>() {
        Ok(IpAddr::V4(_)) => prefix <= 32,
        Ok(IpAddr::V6(_)) => prefix <= 128,
        Err(_) => false,
    }
}

fn string_of<'a>(view: &View<'a>) -> Result<&'a str, RuleViolation> {
    view.as_str()
        .ok_or_else(|| RuleViolation::wrong_type("string", view))
}

fn pattern(regex: &'static Regex, what: &'static str) -> Result<RuleFn, RuleBuildError> {
    check(move |s| regex.is_match(s), what)
}

fn check<F>(accepts: F, what: &'static str) -> Result<RuleFn, RuleBuildError>
where
    F: Fn(&str) -> bool + Send + Sync + 'static,
{
    Ok(rule_fn(move |view| {
        let s = string_of(&view)?;
        if accepts(s) {
            Ok(())
        } else {
            Err(RuleViolation::failed(format!(
                "value '{s}' is not a valid {what}"
            )))
        }
    }))
}

fn substring<F>(ctx: &RuleContext<'_>, verb: &'static str, test: F) -> Result<RuleFn, RuleBuildError>
where
    F: Fn(&str, &str) -> bool + Send + Sync + 'static,
{
    if ctx.options.is_empty() {
        return Err(RuleBuildError::new(format!(
            "rule expecting to {verb} a substring needs an option"
        )));
    }
    let needle = ctx.options.join(" ");
    Ok(rule_fn(move |view| {
        let s = string_of(&view)?;
        if test(s, &needle) {
            Ok(())
        } else {
            Err(RuleViolation::failed(format!(
                "value '{s}' does not {verb} '{needle}'"
            )))
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Kind, Reflect};

    fn build(name: &str, options: &[&str]) -> RuleFn {
        let options: Vec<String> = options.iter().map(ToString::to_string).collect();
        RuleRegistry::new()
            .build(
                name,
                &RuleContext {
                    kind: Kind::String,
                    type_name: "String",
                    options: &options,
                },
            )
            .unwrap()
    }

    #[test]
    fn test_email() {
        let rule = build("email", &[]);
        assert!(rule("ada@example.com".reflect()).is_ok());
        assert_eq!(
            rule("not-an-email".reflect()).unwrap_err().to_string(),
            "value 'not-an-email' is not a valid email address"
        );
    }

    #[test]
    fn test_wrong_host_type_is_distinct() {
        let rule = build("email", &[]);
        assert!(matches!(
            rule(42_i32.reflect()),
            Err(RuleViolation::WrongType {
                expected: "string",
                found: "int"
            })
        ));
    }

    #[test]
    fn test_network_shapes() {
        assert!(build("ipv4", &[])("10.0.0.1".reflect()).is_ok());
        assert!(build("ipv4", &[])("::1".reflect()).is_err());
        assert!(build("ipv6", &[])("::1".reflect()).is_ok());
        assert!(build("cidr", &[])("10.0.0.0/8".reflect()).is_ok());
        assert!(build("cidr", &[])("10.0.0.0/33".reflect()).is_err());
        assert!(build("mac", &[])("00:1a:2b:3c:4d:5e".reflect()).is_ok());
    }

    #[test]
    fn test_identifier_shapes() {
        assert!(build("uuid", &[])("67e55044-10b1-426f-9247-bb680e5fe0c8".reflect()).is_ok());
        assert!(build("uuid", &[])("67e55044".reflect()).is_err());
        assert!(build("semver", &[])("1.2.3-beta.1+build".reflect()).is_ok());
        assert!(build("semver", &[])("1.2".reflect()).is_err());
        assert!(build("hexcolor", &[])("#a1b2c3".reflect()).is_ok());
        assert!(build("base64", &[])("aGVsbG8=".reflect()).is_ok());
        assert!(build("url", &[])("https://example.com/a?b=c".reflect()).is_ok());
        assert!(build("url", &[])("example.com".reflect()).is_err());
    }

    #[test]
    fn test_substring_rules() {
        let rule = build("startswith", &["ab"]);
        assert!(rule("abc".reflect()).is_ok());
        assert_eq!(
            rule("xyz".reflect()).unwrap_err().to_string(),
            "value 'xyz' does not start with 'ab'"
        );
        assert!(build("excludes", &["bad"])("good".reflect()).is_ok());
    }

    #[test]
    fn test_character_classes() {
        assert!(build("alpha", &[])("abc".reflect()).is_ok());
        assert!(build("alpha", &[])("ab1".reflect()).is_err());
        assert!(build("numeric", &[])("-12.5".reflect()).is_ok());
        assert!(build("lowercase", &[])("abc".reflect()).is_ok());
        assert!(build("uppercase", &[])("aBC".reflect()).is_err());
    }
}
