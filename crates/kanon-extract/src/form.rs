//! The `application/x-www-form-urlencoded` body codec.
//!
//! Form bodies are flat: nested members use dotted keys (`owner.name=ann`)
//! and slices repeat their key (`tags=a&tags=b`) or index it
//! (`items.0.sku=x`).

use bytes::Bytes;
use kanon_core::{rule_names, Direction, Location, Reflect, ValidationError, ValidationErrors, Value};
use kanon_schema::FieldRule;
use mime::Mime;

use crate::accessor::FlatSource;
use crate::binder::Binder;
use crate::codec::BodyCodec;
use crate::encode::Encoder;

/// URL-encoded form bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormCodec;

fn body_error(direction: Direction, cause: String) -> ValidationErrors {
    ValidationError::new(direction, Location::Body, "", rule_names::TYPE_CAST, cause).into()
}

impl BodyCodec for FormCodec {
    fn name(&self) -> &str {
        "form"
    }

    fn matches(&self, content_type: &Mime) -> bool {
        content_type.essence_str() == mime::APPLICATION_WWW_FORM_URLENCODED.essence_str()
    }

    fn content_type(&self) -> &str {
        mime::APPLICATION_WWW_FORM_URLENCODED.essence_str()
    }

    fn decode_and_bind(
        &self,
        body: &[u8],
        rule: &FieldRule,
        binder: &Binder,
        should_bind: bool,
    ) -> Result<Option<Value>, ValidationErrors> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)
            .map_err(|e| body_error(Direction::Request, format!("invalid form body: {e}")))?;
        let source = FlatSource::from_pairs(pairs);
        binder.walk(rule, &source, Location::Body, should_bind)
    }

    fn encode(
        &self,
        value: &dyn Reflect,
        rule: &FieldRule,
        encoder: &Encoder,
    ) -> Result<Bytes, ValidationErrors> {
        let pairs = encoder.encode_pairs(rule, value)?;
        serde_urlencoded::to_string(&pairs)
            .map(Bytes::from)
            .map_err(|e| body_error(Direction::Response, format!("cannot encode form body: {e}")))
    }
}
