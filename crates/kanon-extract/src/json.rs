//! The JSON body codec.

use bytes::Bytes;
use kanon_core::{rule_names, Direction, Location, Reflect, ValidationError, ValidationErrors, Value};
use kanon_schema::FieldRule;
use mime::Mime;

use crate::accessor::LazyJson;
use crate::binder::Binder;
use crate::codec::BodyCodec;
use crate::encode::Encoder;

/// `application/json` and any `+json` suffix type.
///
/// Decoding scans the body lazily: only the members a rule asks for are
/// ever parsed, and strings without escapes are borrowed from the body.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl BodyCodec for JsonCodec {
    fn name(&self) -> &str {
        "json"
    }

    fn matches(&self, content_type: &Mime) -> bool {
        content_type.type_() == mime::APPLICATION
            && (content_type.subtype() == mime::JSON || content_type.suffix() == Some(mime::JSON))
    }

    fn content_type(&self) -> &str {
        mime::APPLICATION_JSON.essence_str()
    }

    fn decode_and_bind(
        &self,
        body: &[u8],
        rule: &FieldRule,
        binder: &Binder,
        should_bind: bool,
    ) -> Result<Option<Value>, ValidationErrors> {
        let document = LazyJson::from_slice(body).map_err(|e| {
            ValidationError::new(
                Direction::Request,
                Location::Body,
                "",
                rule_names::TYPE_CAST,
                e.to_string(),
            )
        })?;
        binder.walk(rule, &document, Location::Body, should_bind)
    }

    fn encode(
        &self,
        value: &dyn Reflect,
        rule: &FieldRule,
        encoder: &Encoder,
    ) -> Result<Bytes, ValidationErrors> {
        encoder.encode_json(rule, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kanon_core::fixtures::User;
    use kanon_core::Contract;
    use kanon_schema::SchemaCompiler;

    #[test]
    fn test_matches_suffix_types() {
        let codec = JsonCodec;
        assert!(codec.matches(&"application/json".parse().unwrap()));
        assert!(codec.matches(&"application/vnd.api+json".parse().unwrap()));
        assert!(!codec.matches(&"text/json".parse().unwrap()));
        assert!(!codec.matches(&"application/xml".parse().unwrap()));
    }

    #[test]
    fn test_malformed_body_is_a_type_cast() {
        let rule = SchemaCompiler::default().compile_type(&User::describe()).unwrap();
        let errors = JsonCodec
            .decode_and_bind(b"{\"name\": ", &rule, &Binder::default(), true)
            .unwrap_err();
        let error = errors.iter().next().unwrap();
        assert_eq!(error.rule, rule_names::TYPE_CAST);
        assert_eq!(error.location, Location::Body);
        assert!(error.cause.starts_with("invalid JSON"));
    }

    #[test]
    fn test_decode_then_encode() {
        let rule = SchemaCompiler::default().compile_type(&User::describe()).unwrap();
        let bound = JsonCodec
            .decode_and_bind(br#"{"name": "Ann", "tags": ["x"]}"#, &rule, &Binder::default(), true)
            .unwrap()
            .unwrap();
        let body = JsonCodec.encode(&bound, &rule, &Encoder::default()).unwrap();
        assert_eq!(&body[..], br#"{"name":"Ann","age":25,"tags":["x"]}"#);
    }
}
