//! The compiled rule tree.
//!
//! A [`FieldRule`] is produced once by the
//! [`SchemaCompiler`](crate::SchemaCompiler) and never mutated afterwards.
//! Binders and encoders only borrow it, so one tree serves any number of
//! concurrent walks.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use kanon_core::{Format, FormatSpec, Kind, RuleFn, RuleViolation, Value, View};
use serde_json::json;

/// One compiled validator.
#[derive(Clone)]
pub struct Validator {
    name: String,
    options: Vec<String>,
    skip_zero: bool,
    check: RuleFn,
}

impl Validator {
    pub(crate) fn new(name: String, options: Vec<String>, skip_zero: bool, check: RuleFn) -> Self {
        Self {
            name,
            options,
            skip_zero,
            check,
        }
    }

    /// Rule name, used as the `rule` of reported errors.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Option tokens the rule was built with.
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Runs the rule. Rules declared after `omitempty` accept zero values.
    pub fn run(&self, view: View<'_>) -> Result<(), RuleViolation> {
        if self.skip_zero && view.is_zero() {
            return Ok(());
        }
        (self.check)(view)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("name", &self.name)
            .field("options", &self.options)
            .field("skip_zero", &self.skip_zero)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Validator {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.options == other.options && self.skip_zero == other.skip_zero
    }
}

/// The compiled description of one field.
#[derive(Clone)]
pub struct FieldRule {
    pub(crate) kind: Kind,
    pub(crate) format: Format,
    pub(crate) wire_key: String,
    pub(crate) binding: String,
    pub(crate) type_name: String,
    pub(crate) default_literal: Option<String>,
    pub(crate) default_value: Option<Value>,
    pub(crate) required: bool,
    pub(crate) nullable: bool,
    pub(crate) omit_empty: bool,
    pub(crate) ignored: bool,
    pub(crate) bits: u8,
    pub(crate) max_bound: Option<f64>,
    pub(crate) validators: Vec<Validator>,
    pub(crate) item: Option<Box<FieldRule>>,
    pub(crate) value_rule: Option<Box<FieldRule>>,
    pub(crate) properties: IndexMap<String, FieldRule>,
    pub(crate) annotations: IndexMap<String, Vec<String>>,
    pub(crate) custom: Option<Arc<dyn FormatSpec>>,
}

impl FieldRule {
    pub(crate) fn new(binding: impl Into<String>, wire_key: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            kind: Kind::Invalid,
            format: Format::None,
            wire_key: wire_key.into(),
            binding: binding.into(),
            type_name: type_name.into(),
            default_literal: None,
            default_value: None,
            required: false,
            nullable: false,
            omit_empty: false,
            ignored: false,
            bits: 0,
            max_bound: None,
            validators: Vec::new(),
            item: None,
            value_rule: None,
            properties: IndexMap::new(),
            annotations: IndexMap::new(),
            custom: None,
        }
    }

    /// Structural kind.
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Semantic format.
    pub fn format(&self) -> &Format {
        &self.format
    }

    /// External field name.
    pub fn wire_key(&self) -> &str {
        &self.wire_key
    }

    /// Name used to address the destination member.
    pub fn binding(&self) -> &str {
        &self.binding
    }

    /// Declared type name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Raw default literal.
    pub fn default_literal(&self) -> Option<&str> {
        self.default_literal.as_deref()
    }

    /// Default literal coerced to the field's kind at compile time.
    pub fn default_value(&self) -> Option<&Value> {
        self.default_value.as_ref()
    }

    /// Whether any declared rule is named `required`.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Whether the destination is optional: absent data leaves it empty and
    /// explicit null binds as null.
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Whether the encoder skips this field when its value is empty.
    pub fn omits_empty(&self) -> bool {
        self.omit_empty
    }

    /// Whether every walk skips this field.
    pub fn is_ignored(&self) -> bool {
        self.ignored
    }

    /// Declared numeric width in bits, 0 for non-numeric kinds.
    pub fn bits(&self) -> u8 {
        self.bits
    }

    /// Ceiling from a `max=N` rule.
    pub fn max_bound(&self) -> Option<f64> {
        self.max_bound
    }

    /// Validators in declaration order.
    pub fn validators(&self) -> &[Validator] {
        &self.validators
    }

    /// Element rule of a slice.
    pub fn item(&self) -> Option<&FieldRule> {
        self.item.as_deref()
    }

    /// Value rule of a map.
    pub fn value_rule(&self) -> Option<&FieldRule> {
        self.value_rule.as_deref()
    }

    /// Members of a record, keyed by wire key in declaration order.
    pub fn properties(&self) -> &IndexMap<String, FieldRule> {
        &self.properties
    }

    /// Member with the given wire key.
    pub fn property(&self, wire_key: &str) -> Option<&FieldRule> {
        self.properties.get(wire_key)
    }

    /// Every declared annotation, values split on `,`.
    pub fn annotations(&self) -> &IndexMap<String, Vec<String>> {
        &self.annotations
    }

    /// Custom format attached through `spec:<id>`.
    pub fn custom_format(&self) -> Option<&Arc<dyn FormatSpec>> {
        self.custom.as_ref()
    }

    /// Whether the field is a single value on the wire.
    pub fn is_leaf(&self) -> bool {
        self.custom.is_some() || self.kind.is_primitive()
    }

    /// Projects the tree to a JSON-Schema-shaped document.
    pub fn to_json_schema(&self) -> serde_json::Value {
        let mut schema = match self.kind {
            _ if self.custom.is_some() => json!({"type": "string"}),
            Kind::String => json!({"type": "string"}),
            Kind::Bool => json!({"type": "boolean"}),
            Kind::Int => json!({"type": "integer"}),
            Kind::Uint => json!({"type": "integer", "minimum": 0}),
            Kind::Float => json!({"type": "number"}),
            Kind::Slice => {
                let items = self.item().map_or_else(|| json!({}), Self::to_json_schema);
                json!({"type": "array", "items": items})
            }
            Kind::Map => {
                let values = self
                    .value_rule()
                    .map_or_else(|| json!({}), Self::to_json_schema);
                json!({"type": "object", "additionalProperties": values})
            }
            Kind::Struct => {
                let properties: serde_json::Map<String, serde_json::Value> = self
                    .properties
                    .iter()
                    .filter(|(_, rule)| !rule.ignored)
                    .map(|(key, rule)| (key.clone(), rule.to_json_schema()))
                    .collect();
                let required: Vec<&str> = self
                    .properties
                    .iter()
                    .filter(|(_, rule)| rule.required && !rule.ignored)
                    .map(|(key, _)| key.as_str())
                    .collect();
                let mut object = json!({"type": "object", "properties": properties});
                if !required.is_empty() {
                    object["required"] = json!(required);
                }
                object
            }
            Kind::Pointer | Kind::Interface | Kind::Invalid => json!({}),
        };
        if let Some(format) = self.format.name() {
            schema["format"] = json!(format);
        }
        if let Some(default) = &self.default_value {
            schema["default"] = default.to_json();
        }
        if let Some(max) = self.max_bound {
            let key = match self.kind {
                Kind::String => "maxLength",
                Kind::Slice => "maxItems",
                Kind::Map => "maxProperties",
                _ => "maximum",
            };
            schema[key] = json!(max);
        }
        if self.nullable {
            schema["nullable"] = json!(true);
        }
        schema
    }
}

impl fmt::Debug for FieldRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldRule")
            .field("kind", &self.kind)
            .field("format", &self.format)
            .field("wire_key", &self.wire_key)
            .field("binding", &self.binding)
            .field("required", &self.required)
            .field("nullable", &self.nullable)
            .field("validators", &self.validators)
            .field("item", &self.item)
            .field("value_rule", &self.value_rule)
            .field("properties", &self.properties)
            .finish_non_exhaustive()
    }
}

/// Structural equality. Validator closures compare by name and options,
/// custom formats by id.
impl PartialEq for FieldRule {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.format == other.format
            && self.wire_key == other.wire_key
            && self.binding == other.binding
            && self.type_name == other.type_name
            && self.default_literal == other.default_literal
            && self.default_value == other.default_value
            && self.required == other.required
            && self.nullable == other.nullable
            && self.omit_empty == other.omit_empty
            && self.ignored == other.ignored
            && self.bits == other.bits
            && self.max_bound == other.max_bound
            && self.validators == other.validators
            && self.item == other.item
            && self.value_rule == other.value_rule
            && self.properties == other.properties
            && self.annotations == other.annotations
            && self.custom.as_ref().map(|c| c.id()) == other.custom.as_ref().map(|c| c.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kanon_core::rules::{noop, rule_fn};
    use kanon_core::Reflect;

    fn leaf(kind: Kind, key: &str) -> FieldRule {
        let mut rule = FieldRule::new(key, key, kind.as_str());
        rule.kind = kind;
        rule
    }

    #[test]
    fn test_validator_skip_zero() {
        let rejects_all = rule_fn(|_| Err(RuleViolation::failed("no")));
        let strict = Validator::new("x".into(), vec![], false, rejects_all.clone());
        let lenient = Validator::new("x".into(), vec![], true, rejects_all);
        assert!(strict.run("".reflect()).is_err());
        assert!(lenient.run("".reflect()).is_ok());
        assert!(lenient.run("a".reflect()).is_err());
    }

    #[test]
    fn test_structural_equality_ignores_closure_identity() {
        let mut a = leaf(Kind::String, "name");
        let mut b = leaf(Kind::String, "name");
        a.validators.push(Validator::new("email".into(), vec![], false, noop()));
        b.validators.push(Validator::new("email".into(), vec![], false, noop()));
        assert_eq!(a, b);
        b.required = true;
        assert_ne!(a, b);
    }

    #[test]
    fn test_json_schema_projection() {
        let mut name = leaf(Kind::String, "name");
        name.required = true;
        name.max_bound = Some(64.0);
        let mut age = leaf(Kind::Uint, "age");
        age.default_value = Some(Value::Uint(25));
        let mut tags = leaf(Kind::Slice, "tags");
        tags.item = Some(Box::new(leaf(Kind::String, "")));

        let mut root = leaf(Kind::Struct, "");
        for rule in [name, age, tags] {
            root.properties.insert(rule.wire_key.clone(), rule);
        }

        let schema = root.to_json_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["name"]));
        assert_eq!(schema["properties"]["name"]["maxLength"], 64.0);
        assert_eq!(schema["properties"]["age"]["default"], 25);
        assert_eq!(schema["properties"]["tags"]["items"]["type"], "string");
    }
}
