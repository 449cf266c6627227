//! Validation rule registry.
//!
//! A rule builder receives the declared kind, the declared type name and the
//! literal options of one annotation entry, and returns a [`RuleFn`] that is
//! run against every coerced value of that field.
//!
//! # Unknown rule names
//!
//! [`RuleRegistry::build`] resolves a name nobody registered to a no-op
//! validator instead of failing. Unrecognized annotations therefore never
//! break compilation, but a misspelled rule (`requried`) validates nothing.
//! The schema compiler logs a warning for every such name; watch for it.

mod builtin;
mod strings;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::{Kind, View};

/// A compiled validator.
pub type RuleFn = Arc<dyn Fn(View<'_>) -> Result<(), RuleViolation> + Send + Sync>;

/// Why a value failed a rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleViolation {
    /// The rule cannot inspect values of this type.
    #[error("rule expects {expected}, got {found}")]
    WrongType {
        /// Accepted types.
        expected: &'static str,
        /// Actual type.
        found: &'static str,
    },

    /// The value failed the rule.
    #[error("{0}")]
    Failed(String),
}

impl RuleViolation {
    /// Creates a failure with a message.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Creates a wrong-type failure for `view`.
    #[must_use]
    pub fn wrong_type(expected: &'static str, view: &View<'_>) -> Self {
        Self::WrongType {
            expected,
            found: view.type_name(),
        }
    }
}

/// Error returned by a builder that rejects its options.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct RuleBuildError(pub String);

impl RuleBuildError {
    /// Creates a build error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Everything a builder knows about the field it validates.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    /// Declared kind of the field.
    pub kind: Kind,
    /// Declared type name.
    pub type_name: &'a str,
    /// Space-separated options, e.g. `["red", "green"]` for `oneof=red green`.
    pub options: &'a [String],
}

impl RuleContext<'_> {
    /// Returns the single numeric option, or an error naming `rule`.
    pub fn numeric_option(&self, rule: &str) -> Result<f64, RuleBuildError> {
        match self.options {
            [single] => single.parse::<f64>().map_err(|_| {
                RuleBuildError::new(format!("rule '{rule}' expects a number, got '{single}'"))
            }),
            _ => Err(RuleBuildError::new(format!(
                "rule '{rule}' expects exactly one option"
            ))),
        }
    }
}

/// Builds validators from declared options.
pub trait RuleBuilder: Send + Sync {
    /// Builds a validator for one field.
    fn build(&self, ctx: &RuleContext<'_>) -> Result<RuleFn, RuleBuildError>;
}

impl<F> RuleBuilder for F
where
    F: Fn(&RuleContext<'_>) -> Result<RuleFn, RuleBuildError> + Send + Sync,
{
    fn build(&self, ctx: &RuleContext<'_>) -> Result<RuleFn, RuleBuildError> {
        self(ctx)
    }
}

/// Wraps a closure as a [`RuleFn`].
pub fn rule_fn<F>(f: F) -> RuleFn
where
    F: Fn(View<'_>) -> Result<(), RuleViolation> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A validator that accepts everything.
#[must_use]
pub fn noop() -> RuleFn {
    rule_fn(|_| Ok(()))
}

/// Name to builder map consulted by the schema compiler.
///
/// Populate it before compiling any operation; compiled rule trees hold the
/// built closures, not the registry.
#[derive(Clone)]
pub struct RuleRegistry {
    builders: HashMap<String, Arc<dyn RuleBuilder>>,
}

impl RuleRegistry {
    /// Creates a registry with the built-in rules.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self::empty();
        builtin::register(&mut registry);
        strings::register(&mut registry);
        registry
    }

    /// Creates a registry with no rules at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            builders: HashMap::new(),
        }
    }

    /// Registers a builder, replacing any previous one with the same name.
    pub fn register(&mut self, name: impl Into<String>, builder: impl RuleBuilder + 'static) -> &mut Self {
        self.builders.insert(name.into(), Arc::new(builder));
        self
    }

    /// Returns `true` if `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.builders.contains_key(name)
    }

    /// Returns the registered rule names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.builders.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Builds the validator named `name`.
    ///
    /// Unregistered names yield [`noop`].
    pub fn build(&self, name: &str, ctx: &RuleContext<'_>) -> Result<RuleFn, RuleBuildError> {
        match self.builders.get(name) {
            Some(builder) => builder.build(ctx),
            None => Ok(noop()),
        }
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("rules", &self.names())
            .finish()
    }
}
