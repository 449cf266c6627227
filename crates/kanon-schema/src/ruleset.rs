//! Per-operation rule sets.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use kanon_core::{ContractError, Location};

use crate::rule::FieldRule;
use crate::status::StatusRegistry;

/// One rule tree per location, iterated in binding order
/// (header, cookie, query, path, body).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationRules {
    rules: BTreeMap<Location, FieldRule>,
}

impl LocationRules {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, location: Location, rule: FieldRule) {
        self.rules.insert(location, rule);
    }

    /// Returns the rule tree for `location`.
    #[must_use]
    pub fn get(&self, location: Location) -> Option<&FieldRule> {
        self.rules.get(&location)
    }

    /// Iterates over the declared locations in binding order.
    pub fn iter(&self) -> impl Iterator<Item = (Location, &FieldRule)> {
        self.rules.iter().map(|(loc, rule)| (*loc, rule))
    }

    /// Returns `true` if no location was declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// The compiled request and response rules of one operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaRuleSet {
    pub(crate) operation_id: String,
    pub(crate) request: LocationRules,
    pub(crate) responses: IndexMap<String, LocationRules>,
}

impl SchemaRuleSet {
    /// Operation this set was compiled for.
    #[must_use]
    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    /// Request rules.
    #[must_use]
    pub fn request(&self) -> &LocationRules {
        &self.request
    }

    /// Rules of the named response variant.
    #[must_use]
    pub fn response(&self, variant: &str) -> Option<&LocationRules> {
        self.responses.get(variant)
    }

    /// Declared response variant names in declaration order.
    pub fn variants(&self) -> impl Iterator<Item = &str> {
        self.responses.keys().map(String::as_str)
    }

    /// Resolves the response rules that answer `status`.
    pub fn response_for_status(
        &self,
        status: u16,
        registry: &StatusRegistry,
    ) -> Result<(&str, &LocationRules), ContractError> {
        let variant = registry
            .resolve(status, |name| self.responses.contains_key(name))
            .ok_or(ContractError::NoResponseRules { status })?;
        self.responses
            .get_key_value(variant.as_str())
            .map(|(name, rules)| (name.as_str(), rules))
            .ok_or(ContractError::NoResponseRules { status })
    }
}
