//! The schema compiler.
//!
//! Walks a contract's [`TypeDesc`] once, depth-first, and produces the
//! immutable [`FieldRule`] trees binders and encoders dispatch on. This is
//! the only place type descriptions are inspected; nothing here runs on the
//! request path.

use std::sync::Arc;

use indexmap::IndexMap;
use kanon_core::coerce::{parse_primitive, parse_timestamp};
use kanon_core::desc::{
    ANNOTATION_DEFAULT, ANNOTATION_IGNORE, ANNOTATION_LAYOUT, ANNOTATION_RULES, ANNOTATION_SPEC,
    ANNOTATION_WIRE,
};
use kanon_core::{
    Contract, Cookie, FieldDesc, Format, FormatRegistry, Kind, Location, RuleContext,
    RuleRegistry, SchemaError, Shape, TypeDesc, Value,
};
use tracing::{debug, warn};

use crate::annotations::{parse_rules, raw_annotations, WireTag};
use crate::rule::{FieldRule, Validator};
use crate::ruleset::{LocationRules, SchemaRuleSet};

/// Declared inputs and outputs of one operation.
#[derive(Debug, Clone)]
pub struct OperationContract {
    operation_id: String,
    request: Option<TypeDesc>,
    responses: IndexMap<String, TypeDesc>,
}

impl OperationContract {
    /// Starts a contract for `operation_id`.
    #[must_use]
    pub fn new(operation_id: impl Into<String>) -> Self {
        Self {
            operation_id: operation_id.into(),
            request: None,
            responses: IndexMap::new(),
        }
    }

    /// Sets the request contract type.
    #[must_use]
    pub fn request<T: Contract>(self) -> Self {
        self.request_desc(T::describe())
    }

    /// Sets the request contract description.
    #[must_use]
    pub fn request_desc(mut self, desc: TypeDesc) -> Self {
        self.request = Some(desc);
        self
    }

    /// Adds a response variant, e.g. `"Ok"`, `"Err"` or `"201"`.
    #[must_use]
    pub fn response<T: Contract>(self, variant: impl Into<String>) -> Self {
        self.response_desc(variant, T::describe())
    }

    /// Adds a response variant from a description.
    #[must_use]
    pub fn response_desc(mut self, variant: impl Into<String>, desc: TypeDesc) -> Self {
        self.responses.insert(variant.into(), desc);
        self
    }

    /// Operation id.
    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }
}

/// Compiles contract descriptions into rule trees.
#[derive(Debug, Clone)]
pub struct SchemaCompiler {
    rules: Arc<RuleRegistry>,
    formats: Arc<FormatRegistry>,
}

impl Default for SchemaCompiler {
    fn default() -> Self {
        Self::new(
            Arc::new(RuleRegistry::new()),
            Arc::new(FormatRegistry::new()),
        )
    }
}

impl SchemaCompiler {
    /// Creates a compiler over populated registries.
    #[must_use]
    pub fn new(rules: Arc<RuleRegistry>, formats: Arc<FormatRegistry>) -> Self {
        Self { rules, formats }
    }

    /// Compiles a standalone type into a root rule.
    pub fn compile_type(&self, desc: &TypeDesc) -> Result<FieldRule, SchemaError> {
        let mut rule = FieldRule::new("", "", desc.name.as_ref());
        self.shape_into(&mut rule, desc, &IndexMap::new(), "")?;
        Ok(rule)
    }

    /// Compiles a record whose members are named after locations.
    pub fn compile_locations(&self, desc: &TypeDesc) -> Result<LocationRules, SchemaError> {
        let fields = desc.fields().ok_or_else(|| SchemaError::InvalidContract {
            type_name: desc.name.to_string(),
        })?;
        let mut locations = LocationRules::new();
        for field in fields {
            let location =
                Location::from_member(&field.binding).ok_or_else(|| SchemaError::InvalidContract {
                    type_name: desc.name.to_string(),
                })?;
            let mut rule = FieldRule::new(field.binding.as_ref(), "", field.ty.name.as_ref());
            rule.annotations = raw_annotations(&field.annotations);
            self.shape_into(&mut rule, &field.ty, &field.annotations, "")?;
            if location != Location::Body && rule.kind != Kind::Struct {
                return Err(SchemaError::NotARecord {
                    location: location.to_string(),
                    type_name: field.ty.name.to_string(),
                });
            }
            locations.insert(location, rule);
        }
        Ok(locations)
    }

    /// Compiles an operation's request and every response variant.
    pub fn compile_operation(&self, contract: &OperationContract) -> Result<SchemaRuleSet, SchemaError> {
        let request = match &contract.request {
            Some(desc) => self.compile_locations(desc)?,
            None => LocationRules::new(),
        };
        let mut responses = IndexMap::new();
        for (variant, desc) in &contract.responses {
            responses.insert(variant.clone(), self.compile_locations(desc)?);
        }
        debug!(
            operation_id = %contract.operation_id,
            request_locations = request.iter().count(),
            variants = responses.len(),
            "compiled operation contract"
        );
        Ok(SchemaRuleSet {
            operation_id: contract.operation_id.clone(),
            request,
            responses,
        })
    }

    fn field(&self, field: &FieldDesc, path: &str) -> Result<FieldRule, SchemaError> {
        let wire = field
            .annotation(ANNOTATION_WIRE)
            .map(WireTag::parse)
            .unwrap_or_default();
        let ignored = wire.ignored
            || field
                .annotation(ANNOTATION_IGNORE)
                .is_some_and(|v| v != "false");
        let wire_key = wire.name.unwrap_or_else(|| field.binding.to_string());
        let field_path = join(path, &wire_key);

        let mut rule = FieldRule::new(field.binding.as_ref(), wire_key, field.ty.name.as_ref());
        rule.omit_empty = wire.omit_empty;
        rule.ignored = ignored;
        rule.annotations = raw_annotations(&field.annotations);
        if !ignored {
            self.shape_into(&mut rule, &field.ty, &field.annotations, &field_path)?;
        }
        Ok(rule)
    }

    fn element(&self, ty: &TypeDesc, path: &str) -> Result<FieldRule, SchemaError> {
        let mut rule = FieldRule::new("", "", ty.name.as_ref());
        self.shape_into(&mut rule, ty, &IndexMap::new(), path)?;
        Ok(rule)
    }

    fn shape_into(
        &self,
        rule: &mut FieldRule,
        ty: &TypeDesc,
        annotations: &IndexMap<String, String>,
        path: &str,
    ) -> Result<(), SchemaError> {
        let mut ty = ty;
        while let Shape::Optional(inner) = &ty.shape {
            rule.nullable = true;
            ty = inner;
        }
        rule.type_name = ty.name.to_string();

        if let Some(id) = annotations.get(ANNOTATION_SPEC) {
            let spec = self
                .formats
                .get(id)
                .ok_or_else(|| SchemaError::UnknownFormat {
                    id: id.clone(),
                    field_path: path.to_string(),
                })?;
            let (kind, bits) = scalar(&ty.shape).unwrap_or((Kind::String, 0));
            rule.kind = kind;
            rule.bits = bits;
            rule.format = Format::Custom(id.clone());
            rule.custom = Some(spec);
        } else {
            self.structure_into(rule, ty, annotations, path)?;
        }

        self.attach_validators(rule, annotations, path)?;
        self.attach_default(rule, annotations, path)
    }

    fn structure_into(
        &self,
        rule: &mut FieldRule,
        ty: &TypeDesc,
        annotations: &IndexMap<String, String>,
        path: &str,
    ) -> Result<(), SchemaError> {
        if let Some((kind, bits)) = scalar(&ty.shape) {
            rule.kind = kind;
            rule.bits = bits;
            return Ok(());
        }
        match &ty.shape {
            Shape::Timestamp => {
                rule.kind = Kind::String;
                rule.format = Format::Timestamp {
                    layout: annotations.get(ANNOTATION_LAYOUT).cloned(),
                };
            }
            Shape::Cookie => {
                rule.kind = Kind::String;
                rule.format = Format::Cookie;
            }
            Shape::Any => rule.kind = Kind::Interface,
            Shape::List(inner) => {
                rule.kind = Kind::Slice;
                rule.item = Some(Box::new(self.element(inner, &join(path, "[]"))?));
            }
            Shape::Map { value, .. } => {
                rule.kind = Kind::Map;
                rule.value_rule = Some(Box::new(self.element(value, &join(path, "{}"))?));
            }
            Shape::Struct(fields) => {
                rule.kind = Kind::Struct;
                for field in fields {
                    let child = self.field(field, path)?;
                    rule.properties.insert(child.wire_key.clone(), child);
                }
            }
            _ => rule.kind = Kind::Invalid,
        }
        Ok(())
    }

    fn attach_validators(
        &self,
        rule: &mut FieldRule,
        annotations: &IndexMap<String, String>,
        path: &str,
    ) -> Result<(), SchemaError> {
        let Some(declared) = annotations.get(ANNOTATION_RULES) else {
            return Ok(());
        };
        let mut skip_zero = false;
        for spec in parse_rules(declared) {
            match spec.name.as_str() {
                "required" => rule.required = true,
                "omitempty" => skip_zero = true,
                "max" => {
                    rule.max_bound = spec.options.first().and_then(|o| o.parse().ok());
                }
                _ => {}
            }
            if !self.rules.contains(&spec.name) {
                warn!(
                    rule = %spec.name,
                    field_path = %path,
                    "unregistered validation rule resolves to a no-op"
                );
            }
            let ctx = RuleContext {
                kind: rule.kind,
                type_name: &rule.type_name,
                options: &spec.options,
            };
            let check = self
                .rules
                .build(&spec.name, &ctx)
                .map_err(|e| SchemaError::InvalidRule {
                    rule: spec.name.clone(),
                    field_path: path.to_string(),
                    reason: e.to_string(),
                })?;
            rule.validators
                .push(Validator::new(spec.name, spec.options, skip_zero, check));
        }
        Ok(())
    }

    fn attach_default(
        &self,
        rule: &mut FieldRule,
        annotations: &IndexMap<String, String>,
        path: &str,
    ) -> Result<(), SchemaError> {
        let Some(literal) = annotations.get(ANNOTATION_DEFAULT) else {
            return Ok(());
        };
        let value = default_value(rule, literal).map_err(|reason| SchemaError::InvalidDefault {
            literal: literal.clone(),
            field_path: path.to_string(),
            reason,
        })?;
        rule.default_literal = Some(literal.clone());
        rule.default_value = Some(value);
        Ok(())
    }
}

fn scalar(shape: &Shape) -> Option<(Kind, u8)> {
    match shape {
        Shape::Bool => Some((Kind::Bool, 0)),
        Shape::Int { bits } => Some((Kind::Int, *bits)),
        Shape::Uint { bits } => Some((Kind::Uint, *bits)),
        Shape::Float { bits } => Some((Kind::Float, *bits)),
        Shape::String => Some((Kind::String, 0)),
        _ => None,
    }
}

fn join(path: &str, segment: &str) -> String {
    if path.is_empty() {
        segment.to_string()
    } else {
        format!("{path}.{segment}")
    }
}

/// Coerces a default literal the same way an incoming value would be.
fn default_value(rule: &FieldRule, literal: &str) -> Result<Value, String> {
    if let Some(spec) = &rule.custom {
        return spec.decode(literal).map_err(|e| e.to_string());
    }
    match &rule.format {
        Format::Timestamp { layout } => {
            return parse_timestamp(literal, layout.as_deref())
                .map(Value::Timestamp)
                .map_err(|e| e.to_string());
        }
        Format::Cookie => {
            return Cookie::parse(literal)
                .map(Value::Cookie)
                .ok_or_else(|| format!("'{literal}' is not a name=value cookie"));
        }
        _ => {}
    }
    if rule.kind.is_primitive() {
        return parse_primitive(rule.kind, rule.bits, literal).map_err(|e| e.to_string());
    }
    let json: serde_json::Value = serde_json::from_str(literal).map_err(|e| e.to_string())?;
    conform(Value::from(json), rule)
}

/// Reshapes a JSON-parsed default to what binding would have produced.
fn conform(value: Value, rule: &FieldRule) -> Result<Value, String> {
    match (rule.kind, value) {
        (Kind::Int, Value::Uint(u)) => i64::try_from(u)
            .map(Value::Int)
            .map_err(|_| format!("{u} overflows int")),
        (Kind::Uint, Value::Int(i)) => u64::try_from(i)
            .map(Value::Uint)
            .map_err(|_| format!("{i} is negative")),
        (Kind::Float, Value::Int(i)) => Ok(Value::Float(i as f64)),
        (Kind::Float, Value::Uint(u)) => Ok(Value::Float(u as f64)),
        (Kind::Slice, Value::List(items)) => match rule.item() {
            Some(item) => items
                .into_iter()
                .map(|v| conform(v, item))
                .collect::<Result<_, _>>()
                .map(Value::List),
            None => Ok(Value::List(items)),
        },
        (Kind::Map, Value::Map(entries)) => match rule.value_rule() {
            Some(value_rule) => entries
                .into_iter()
                .map(|(k, v)| conform(v, value_rule).map(|v| (k, v)))
                .collect::<Result<_, _>>()
                .map(Value::Map),
            None => Ok(Value::Map(entries)),
        },
        (Kind::Struct, Value::Map(entries)) => {
            let mut members = IndexMap::new();
            for (key, v) in entries {
                if let Some(child) = rule.property(&key) {
                    members.insert(child.binding.clone(), conform(v, child)?);
                }
            }
            Ok(Value::Struct(members))
        }
        (_, v) => Ok(v),
    }
}
