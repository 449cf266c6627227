//! Body codecs and content-type negotiation.
//!
//! A [`BodyCodec`] owns one wire format for the body location. Decoding
//! hands the binder an [`Accessor`](crate::accessor::Accessor) over the raw
//! bytes; encoding drives the [`Encoder`] and renders its output.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use kanon_core::{Reflect, ValidationErrors, Value};
use kanon_schema::FieldRule;
use mime::Mime;

use crate::binder::Binder;
use crate::encode::Encoder;
use crate::form::FormCodec;
use crate::json::JsonCodec;

/// A body wire format.
pub trait BodyCodec: Send + Sync {
    /// Short name used in logs and configuration.
    fn name(&self) -> &str;

    /// Returns `true` if this codec handles `content_type`.
    fn matches(&self, content_type: &Mime) -> bool;

    /// Content type written on encoded responses.
    fn content_type(&self) -> &str;

    /// Decodes `body` and binds it against `rule`.
    fn decode_and_bind(
        &self,
        body: &[u8],
        rule: &FieldRule,
        binder: &Binder,
        should_bind: bool,
    ) -> Result<Option<Value>, ValidationErrors>;

    /// Validates and encodes `value` against `rule`.
    fn encode(
        &self,
        value: &dyn Reflect,
        rule: &FieldRule,
        encoder: &Encoder,
    ) -> Result<Bytes, ValidationErrors>;
}

/// Codecs in preference order.
#[derive(Clone)]
pub struct CodecRegistry {
    codecs: Vec<Arc<dyn BodyCodec>>,
}

impl CodecRegistry {
    /// Creates a registry with JSON and urlencoded form support. JSON comes
    /// first and is used when a client states no preference.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(JsonCodec).register(FormCodec);
        registry
    }

    /// Creates a registry with no codecs.
    #[must_use]
    pub fn empty() -> Self {
        Self { codecs: Vec::new() }
    }

    /// Appends a codec. Earlier codecs win when several match.
    pub fn register(&mut self, codec: impl BodyCodec + 'static) -> &mut Self {
        self.codecs.push(Arc::new(codec));
        self
    }

    /// Selects the codec for a `Content-Type` value. Parameters such as
    /// `charset` are ignored.
    #[must_use]
    pub fn select(&self, content_type: &str) -> Option<&Arc<dyn BodyCodec>> {
        let mime: Mime = content_type.trim().parse().ok()?;
        self.codecs.iter().find(|codec| codec.matches(&mime))
    }

    /// Selects the codec for an `Accept` value, falling back to the first
    /// codec when the header is absent, a wildcard, or names nothing we
    /// support.
    #[must_use]
    pub fn negotiate(&self, accept: Option<&str>) -> Option<&Arc<dyn BodyCodec>> {
        accept
            .into_iter()
            .flat_map(|header| header.split(','))
            .filter_map(|candidate| candidate.trim().parse::<Mime>().ok())
            .find_map(|mime| self.codecs.iter().find(|codec| codec.matches(&mime)))
            .or_else(|| self.first())
    }

    /// Returns the preferred codec.
    #[must_use]
    pub fn first(&self) -> Option<&Arc<dyn BodyCodec>> {
        self.codecs.first()
    }

    /// Returns the registered codec names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.codecs.iter().map(|codec| codec.name())
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_ignores_parameters() {
        let codecs = CodecRegistry::new();
        assert_eq!(codecs.select("application/json; charset=utf-8").unwrap().name(), "json");
        assert_eq!(codecs.select("application/problem+json").unwrap().name(), "json");
        assert_eq!(
            codecs.select("application/x-www-form-urlencoded").unwrap().name(),
            "form"
        );
        assert!(codecs.select("text/xml").is_none());
        assert!(codecs.select("not a mime").is_none());
    }

    #[test]
    fn test_negotiate_falls_back_to_first() {
        let codecs = CodecRegistry::new();
        assert_eq!(codecs.negotiate(None).unwrap().name(), "json");
        assert_eq!(codecs.negotiate(Some("*/*")).unwrap().name(), "json");
        assert_eq!(
            codecs
                .negotiate(Some("text/html, application/x-www-form-urlencoded"))
                .unwrap()
                .name(),
            "form"
        );
    }

    #[test]
    fn test_empty_registry() {
        let codecs = CodecRegistry::empty();
        assert!(codecs.select("application/json").is_none());
        assert!(codecs.negotiate(None).is_none());
        assert_eq!(format!("{codecs:?}"), "[]");
    }
}
