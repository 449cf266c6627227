//! Custom format hooks.
//!
//! A field annotated with `spec:<id>` is decoded from, and encoded to, a
//! single string by the [`FormatSpec`] registered under that id. Unlike
//! validators, an unregistered id is a compile error: skipping a decode
//! hook would bind garbage.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::{Reflect, Value};

/// A format hook failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct FormatError(pub String);

impl FormatError {
    /// Creates a format error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// A named decode/encode pair for a semantic type.
pub trait FormatSpec: Send + Sync {
    /// Registry id, referenced by `spec:<id>`.
    fn id(&self) -> &str;

    /// Decodes a wire string.
    fn decode(&self, raw: &str) -> Result<Value, FormatError>;

    /// Encodes a handler value to a wire string.
    fn encode(&self, value: &dyn Reflect) -> Result<String, FormatError>;
}

type DecodeFn = dyn Fn(&str) -> Result<Value, FormatError> + Send + Sync;
type EncodeFn = dyn Fn(&dyn Reflect) -> Result<String, FormatError> + Send + Sync;

/// A [`FormatSpec`] built from two closures.
pub struct FnFormat {
    id: String,
    decode: Box<DecodeFn>,
    encode: Box<EncodeFn>,
}

impl FnFormat {
    /// Creates a format from a decoder and an encoder.
    pub fn new<D, E>(id: impl Into<String>, decode: D, encode: E) -> Self
    where
        D: Fn(&str) -> Result<Value, FormatError> + Send + Sync + 'static,
        E: Fn(&dyn Reflect) -> Result<String, FormatError> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            decode: Box::new(decode),
            encode: Box::new(encode),
        }
    }
}

impl FormatSpec for FnFormat {
    fn id(&self) -> &str {
        &self.id
    }

    fn decode(&self, raw: &str) -> Result<Value, FormatError> {
        (self.decode)(raw)
    }

    fn encode(&self, value: &dyn Reflect) -> Result<String, FormatError> {
        (self.encode)(value)
    }
}

impl fmt::Debug for FnFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnFormat").field("id", &self.id).finish()
    }
}

/// Id to format map consulted by the schema compiler.
#[derive(Clone, Default)]
pub struct FormatRegistry {
    specs: HashMap<String, Arc<dyn FormatSpec>>,
}

impl FormatRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a format under its own id.
    pub fn register(&mut self, spec: impl FormatSpec + 'static) -> &mut Self {
        self.specs.insert(spec.id().to_string(), Arc::new(spec));
        self
    }

    /// Looks up a format.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<dyn FormatSpec>> {
        self.specs.get(id).cloned()
    }

    /// Returns `true` if `id` is registered.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.specs.contains_key(id)
    }
}

impl fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<_> = self.specs.keys().collect();
        ids.sort_unstable();
        f.debug_struct("FormatRegistry").field("ids", &ids).finish()
    }
}
