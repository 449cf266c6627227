//! Structured request cookies.
//!
//! A cookie-formatted field binds the whole `name=value` token from the
//! `Cookie` header rather than only its value.

use std::fmt;

/// A single cookie token from a request `Cookie` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    name: String,
    value: String,
}

impl Cookie {
    /// Create a new cookie.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Parse a single `name=value` token. Surrounding quotes on the value
    /// are removed.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        let (name, value) = token.trim().split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some(Self::new(name, value.trim().trim_matches('"')))
    }

    /// Parse every token of a `Cookie` header value, in header order.
    /// Malformed tokens are skipped.
    pub fn parse_header(header_value: &str) -> impl Iterator<Item = Cookie> + '_ {
        header_value.split(';').filter_map(Self::parse)
    }

    /// Get the cookie name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the cookie value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token() {
        let cookie = Cookie::parse(" session = \"abc123\" ").unwrap();
        assert_eq!(cookie.name(), "session");
        assert_eq!(cookie.value(), "abc123");
        assert_eq!(cookie.to_string(), "session=abc123");
    }

    #[test]
    fn test_parse_header() {
        let cookies: Vec<_> = Cookie::parse_header("session=abc; theme=dark; broken").collect();
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies[1], Cookie::new("theme", "dark"));
    }

    #[test]
    fn test_parse_rejects_empty_name() {
        assert!(Cookie::parse("=value").is_none());
    }
}
