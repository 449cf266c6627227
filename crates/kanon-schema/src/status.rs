//! Status code to response variant resolution.

use std::collections::BTreeMap;

/// Catch-all variant.
pub const DEFAULT_VARIANT: &str = "Default";
/// 1xx fallback.
pub const INFORMATIONAL_VARIANT: &str = "Informational";
/// 2xx fallback.
pub const SUCCESS_VARIANT: &str = "Success";
/// 3xx fallback, and 4xx when present.
pub const REDIRECT_VARIANT: &str = "Redirect";
/// 4xx and 5xx fallback.
pub const ERROR_VARIANT: &str = "Err";

/// Explicit status to variant-name mapping.
#[derive(Debug, Clone)]
pub struct StatusRegistry {
    names: BTreeMap<u16, String>,
}

impl Default for StatusRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        for (status, name) in [
            (200, "Ok"),
            (201, "Created"),
            (202, "Accepted"),
            (204, "NoContent"),
            (400, "BadRequest"),
            (401, "Unauthorized"),
            (403, "Forbidden"),
            (404, "NotFound"),
            (409, "Conflict"),
            (422, "UnprocessableEntity"),
            (500, "InternalServerError"),
        ] {
            registry.register(status, name);
        }
        registry
    }
}

impl StatusRegistry {
    /// Creates a registry with no explicit mappings.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            names: BTreeMap::new(),
        }
    }

    /// Maps `status` to `variant`.
    pub fn register(&mut self, status: u16, variant: impl Into<String>) -> &mut Self {
        self.names.insert(status, variant.into());
        self
    }

    /// Returns the explicit variant name for `status`.
    #[must_use]
    pub fn name(&self, status: u16) -> Option<&str> {
        self.names.get(&status).map(String::as_str)
    }

    /// Picks the variant that answers `status`.
    ///
    /// Order: a variant named by the decimal status, the explicit mapping,
    /// the range fallback (`Informational`, `Success`, `Redirect`, then
    /// `Redirect` or `Err` for 4xx and `Err` for 5xx), and finally
    /// `Default`. `has_variant` reports which variants the operation
    /// declared.
    pub fn resolve<F>(&self, status: u16, has_variant: F) -> Option<String>
    where
        F: Fn(&str) -> bool,
    {
        let decimal = status.to_string();
        if has_variant(&decimal) {
            return Some(decimal);
        }
        if let Some(name) = self.name(status).filter(|n| has_variant(n)) {
            return Some(name.to_string());
        }
        let fallbacks: &[&str] = match status {
            100..=199 => &[INFORMATIONAL_VARIANT],
            200..=299 => &[SUCCESS_VARIANT],
            300..=399 => &[REDIRECT_VARIANT],
            400..=499 => &[REDIRECT_VARIANT, ERROR_VARIANT],
            500..=599 => &[ERROR_VARIANT],
            _ => &[],
        };
        fallbacks
            .iter()
            .chain(std::iter::once(&DEFAULT_VARIANT))
            .find(|name| has_variant(name))
            .map(|name| (*name).to_string())
    }
}
