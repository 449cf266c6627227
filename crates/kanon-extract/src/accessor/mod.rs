//! Read-only cursors over already-parsed, untyped payloads.
//!
//! The binder never builds a generic tree of the whole payload. It asks an
//! [`Accessor`] what sits at a path and gets back a [`Probe`]: absent,
//! explicit null, a scalar, or a container marker. Two implementations
//! ship with the crate:
//!
//! - [`LazyJson`] navigates a JSON document, splitting a container into its
//!   children only when a walk first descends into it
//! - [`FlatSource`] serves string key/value data (headers, query strings,
//!   path parameters, cookies and urlencoded forms) with dotted keys
//!
//! Accessors are per-request state. [`LazyJson`] caches children in
//! unsynchronized cells and is therefore `!Sync`, so a single instance can
//! never be observed by two concurrent walks.

mod flat;
mod json;

use std::borrow::Cow;
use std::fmt;

use kanon_core::Value;
use thiserror::Error;

pub use flat::FlatSource;
pub use json::LazyJson;

/// The payload could not be interpreted at some path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct AccessError(pub String);

impl From<serde_json::Error> for AccessError {
    fn from(err: serde_json::Error) -> Self {
        Self(format!("invalid JSON: {err}"))
    }
}

/// One step of a path: a wire key or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Object member.
    Key(String),
    /// Array element.
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

/// Renders a path in dotted form, e.g. `items.0.name`.
#[must_use]
pub fn render_path(path: &[PathSegment]) -> String {
    let mut out = String::new();
    for (i, segment) in path.iter().enumerate() {
        if i > 0 {
            out.push('.');
        }
        out.push_str(&segment.to_string());
    }
    out
}

/// A scalar found at a path.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar<'a> {
    /// Untyped transport text, coerced by parsing.
    Text(Cow<'a, str>),
    /// JSON string.
    String(Cow<'a, str>),
    /// JSON number, as its literal text.
    Number(&'a str),
    /// JSON boolean.
    Bool(bool),
}

impl Scalar<'_> {
    /// Name of the wire type, for error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Text(_) | Self::String(_) => "string",
            Self::Number(_) => "number",
            Self::Bool(_) => "bool",
        }
    }
}

/// What an accessor found at a path.
#[derive(Debug, Clone, PartialEq)]
pub enum Probe<'a> {
    /// Nothing was sent at this path.
    Absent,
    /// Explicit null.
    Null,
    /// A single value.
    Scalar(Scalar<'a>),
    /// An object; members are reached by extending the path with keys.
    Object,
    /// An array; elements are reached by extending the path with indices.
    Array,
}

impl Probe<'_> {
    /// Name of the wire type, for error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Absent => "nothing",
            Self::Null => "null",
            Self::Scalar(scalar) => scalar.type_name(),
            Self::Object => "object",
            Self::Array => "array",
        }
    }
}

/// Path-addressed, read-only access to an untyped payload.
pub trait Accessor {
    /// Looks up what sits at `path`.
    fn probe(&self, path: &[PathSegment]) -> Result<Probe<'_>, AccessError>;

    /// Keys of the object at `path`, in payload order. Empty for anything
    /// that is not an object.
    fn keys(&self, path: &[PathSegment]) -> Result<Vec<String>, AccessError>;

    /// Materializes the whole value at `path`, for fields that accept any
    /// shape.
    fn materialize(&self, path: &[PathSegment]) -> Result<Option<Value>, AccessError>;

    /// Every element of the array at `path` in one step, for accessors
    /// that can list them without a lookup per index. `None` means the
    /// caller probes `path + [i]` until absent.
    fn elements(&self, _path: &[PathSegment]) -> Result<Option<Vec<Probe<'_>>>, AccessError> {
        Ok(None)
    }

    /// Returns `true` if anything, including null, sits at `path`.
    fn exists(&self, path: &[PathSegment]) -> Result<bool, AccessError> {
        Ok(!matches!(self.probe(path)?, Probe::Absent))
    }

    /// Returns `true` when every value is untyped text. Textual sources
    /// treat empty strings as absent and bind slices from repeated keys.
    fn is_textual(&self) -> bool {
        false
    }
}

/// An accessor with nothing in it, used for empty bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptySource;

impl Accessor for EmptySource {
    fn probe(&self, _: &[PathSegment]) -> Result<Probe<'_>, AccessError> {
        Ok(Probe::Absent)
    }

    fn keys(&self, _: &[PathSegment]) -> Result<Vec<String>, AccessError> {
        Ok(Vec::new())
    }

    fn materialize(&self, _: &[PathSegment]) -> Result<Option<Value>, AccessError> {
        Ok(None)
    }
}
