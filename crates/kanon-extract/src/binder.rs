//! The request binder.
//!
//! One walk per location drives a compiled [`FieldRule`] and an
//! [`Accessor`] together: each field is fetched, defaulted, coerced,
//! validated and, when binding is requested, written into a [`Value`]
//! keyed by binding name.
//!
//! # Aggregate or fail fast
//!
//! Leaf failures are collected so the caller sees every one of them:
//! `required`, `typeCast` (including a JSON value of the wrong type),
//! `rangeError` and validator failures. Structural failures abort the
//! current location and are reported together with whatever was collected
//! before them: a container of the wrong shape (`typeMismatch`), an
//! accessor error, nesting deeper than `max_depth`, and an array longer
//! than its `max` bound. Array elements are walked one by one, so sibling
//! elements keep collecting leaf errors.
//!
//! Locations are bound in order (header, cookie, query, path, body) and
//! binding stops at the first location with errors.
//!
//! # Missing data
//!
//! Only optional (`Option<T>`) destinations stay unallocated when nothing
//! was sent. An absent or null record that is not optional is walked all
//! the same, so its own required members report and its defaults fill in.
//! Timestamps, cookies and custom formats have no empty value, so leaving
//! one of them out is a `required` failure even without the rule.

use indexmap::IndexMap;
use kanon_core::coerce::{parse_primitive, parse_timestamp, CoerceError};
use kanon_core::{
    rule_names, ContractError, Cookie, Direction, Format, Kind, Location, Reflect, ValidationError,
    ValidationErrors, Value,
};
use kanon_schema::{FieldRule, LocationRules};
use tracing::debug;

use crate::accessor::{render_path, AccessError, Accessor, EmptySource, PathSegment, Probe, Scalar};
use crate::codec::CodecRegistry;
use crate::guard::catch_panics;
use crate::request::RequestData;

/// Default body size limit (1 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;
/// Default rule nesting limit.
pub const DEFAULT_MAX_DEPTH: usize = 64;
/// Default limit on probed array elements.
pub const DEFAULT_MAX_ARRAY_ITEMS: usize = 10_000;

/// Limits and switches applied to every walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindOptions {
    /// Bodies larger than this fail with `PayloadTooLarge`.
    pub max_body_bytes: usize,
    /// Deeper rule walks fail with `typeMismatch`.
    pub max_depth: usize,
    /// Probing stops with a `max` error beyond this many elements.
    pub max_array_items: usize,
    /// Run `required` checks and validators. Coercion always runs.
    pub validate: bool,
}

impl Default for BindOptions {
    fn default() -> Self {
        Self {
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            max_depth: DEFAULT_MAX_DEPTH,
            max_array_items: DEFAULT_MAX_ARRAY_ITEMS,
            validate: true,
        }
    }
}

/// Binds and validates incoming data against compiled rules.
///
/// A binder holds no per-request state and can be shared freely.
#[derive(Debug, Clone, Default)]
pub struct Binder {
    options: BindOptions,
}

impl Binder {
    /// Creates a binder with the given limits.
    #[must_use]
    pub fn new(options: BindOptions) -> Self {
        Self { options }
    }

    /// Returns the limits in effect.
    #[must_use]
    pub fn options(&self) -> &BindOptions {
        &self.options
    }

    /// Walks `rule` against `accessor` for one location.
    ///
    /// Returns the bound value, `None` when nothing was bound (absent
    /// optional data, or `should_bind` unset), or every failure found.
    pub fn walk(
        &self,
        rule: &FieldRule,
        accessor: &dyn Accessor,
        location: Location,
        should_bind: bool,
    ) -> Result<Option<Value>, ValidationErrors> {
        catch_panics(Direction::Request, location, || {
            let mut walk = Walk {
                accessor,
                location,
                options: &self.options,
                should_bind,
                path: Vec::new(),
                errors: ValidationErrors::new(),
            };
            let step = walk.root(rule);
            walk.finish(step)
        })
    }

    /// Binds every declared location of a request.
    ///
    /// The result is a record keyed by the contract's member names
    /// (`header`, `query`, `body`, ...), ready for
    /// [`FromValue`](kanon_core::FromValue).
    pub fn bind_request(
        &self,
        rules: &LocationRules,
        request: &RequestData,
        codecs: &CodecRegistry,
        should_bind: bool,
    ) -> Result<Value, ContractError> {
        let mut bound = IndexMap::new();
        for (location, rule) in rules.iter() {
            let step = match location {
                Location::Body => self.bind_body(rule, request, codecs, should_bind),
                transport => self
                    .bind_transport(rule, request, transport, should_bind)
                    .map_err(ContractError::Request),
            };
            match step {
                Ok(Some(value)) => {
                    bound.insert(rule.binding().to_string(), value);
                }
                Ok(None) => {}
                Err(err) => {
                    debug!(%location, error = %err, "request binding failed");
                    return Err(err);
                }
            }
        }
        Ok(Value::Struct(bound))
    }

    fn bind_transport(
        &self,
        rule: &FieldRule,
        request: &RequestData,
        location: Location,
        should_bind: bool,
    ) -> Result<Option<Value>, ValidationErrors> {
        let source = request.transport_source(location).map_err(|e| {
            ValidationError::new(
                Direction::Request,
                location,
                "",
                rule_names::TYPE_CAST,
                e.to_string(),
            )
        })?;
        self.walk(rule, &source, location, should_bind)
    }

    fn bind_body(
        &self,
        rule: &FieldRule,
        request: &RequestData,
        codecs: &CodecRegistry,
        should_bind: bool,
    ) -> Result<Option<Value>, ContractError> {
        let body = request.body();
        if body.len() > self.options.max_body_bytes {
            return Err(ContractError::PayloadTooLarge {
                size: body.len(),
                limit: self.options.max_body_bytes,
            });
        }
        if body.iter().all(u8::is_ascii_whitespace) {
            return self
                .walk(rule, &EmptySource, Location::Body, should_bind)
                .map_err(ContractError::Request);
        }
        let content_type = request
            .content_type()
            .unwrap_or(mime::APPLICATION_JSON.essence_str());
        let codec = codecs
            .select(content_type)
            .ok_or_else(|| ContractError::UnsupportedMediaType {
                content_type: content_type.to_string(),
            })?;
        catch_panics(Direction::Request, Location::Body, || {
            codec.decode_and_bind(body, rule, self, should_bind)
        })
        .map_err(ContractError::Request)
    }
}

type Step = Result<Option<Value>, ValidationError>;

struct Walk<'w> {
    accessor: &'w dyn Accessor,
    location: Location,
    options: &'w BindOptions,
    should_bind: bool,
    path: Vec<PathSegment>,
    errors: ValidationErrors,
}

impl<'w> Walk<'w> {
    fn error(&self, rule: &str, cause: impl Into<String>) -> ValidationError {
        ValidationError::new(
            Direction::Request,
            self.location,
            render_path(&self.path),
            rule,
            cause,
        )
    }

    fn record(&mut self, rule: &str, cause: impl Into<String>) {
        let error = self.error(rule, cause);
        self.errors.push(error);
    }

    fn access<T>(&self, result: Result<T, AccessError>) -> Result<T, ValidationError> {
        result.map_err(|e| self.error(rule_names::TYPE_CAST, e.to_string()))
    }

    fn finish(mut self, step: Step) -> Result<Option<Value>, ValidationErrors> {
        match step {
            Err(abort) => {
                self.errors.push(abort);
                Err(self.errors)
            }
            Ok(_) if !self.errors.is_empty() => Err(self.errors),
            Ok(value) if self.should_bind => Ok(value),
            Ok(_) => Ok(None),
        }
    }

    /// A bare top-level string is coerced like transport text, so a body of
    /// `"4"` binds to a numeric root.
    fn root(&mut self, rule: &FieldRule) -> Step {
        let accessor = self.accessor;
        let probe = self.access(accessor.probe(&[]))?;
        let probe = match probe {
            Probe::Scalar(Scalar::String(text)) if rule.is_leaf() => {
                Probe::Scalar(Scalar::Text(text))
            }
            other => other,
        };
        self.resolve(rule, probe, 0)
    }

    fn field(&mut self, rule: &FieldRule, depth: usize) -> Step {
        if rule.is_ignored() || rule.kind() == Kind::Invalid {
            return Ok(None);
        }
        let accessor = self.accessor;
        let probe = self.access(accessor.probe(&self.path))?;
        self.resolve(rule, probe, depth)
    }

    fn resolve(&mut self, rule: &FieldRule, probe: Probe<'_>, depth: usize) -> Step {
        if rule.is_ignored() || rule.kind() == Kind::Invalid {
            return Ok(None);
        }
        if depth > self.options.max_depth {
            return Err(self.error(
                rule_names::TYPE_MISMATCH,
                "maximum nesting depth exceeded",
            ));
        }
        match probe {
            Probe::Absent => self.absent(rule, depth),
            Probe::Scalar(Scalar::Text(text)) if text.is_empty() => self.absent(rule, depth),
            Probe::Null => self.null(rule, depth),
            probe if rule.is_leaf() => Ok(self.leaf(rule, probe)),
            probe => self.container(rule, probe, depth),
        }
    }

    fn absent(&mut self, rule: &FieldRule, depth: usize) -> Step {
        if let Some(default) = rule.default_value() {
            let value = default.clone();
            self.validate(rule, &value);
            return Ok(Some(value));
        }
        if rule.is_required() && self.options.validate {
            self.required(rule);
            return Ok(None);
        }
        self.empty(rule, depth)
    }

    fn null(&mut self, rule: &FieldRule, depth: usize) -> Step {
        if rule.is_required() && self.options.validate {
            self.required(rule);
            return Ok(None);
        }
        if rule.is_nullable() || rule.kind() == Kind::Interface {
            return Ok(Some(Value::Null));
        }
        self.empty(rule, depth)
    }

    /// No data for a destination that is not optional. A record is still
    /// walked so its own required members and defaults apply; a leaf with no
    /// empty state cannot be built and counts as missing.
    fn empty(&mut self, rule: &FieldRule, depth: usize) -> Step {
        if rule.is_nullable() {
            return Ok(None);
        }
        if rule.kind() == Kind::Struct {
            return self.members(rule, depth);
        }
        if !has_empty_state(rule) {
            self.required(rule);
        }
        Ok(None)
    }

    /// Required slices report at their first index.
    fn required(&mut self, rule: &FieldRule) {
        if rule.kind() == Kind::Slice {
            self.path.push(PathSegment::Index(0));
            self.record(rule_names::REQUIRED, "value is required");
            self.path.pop();
        } else if self.path.is_empty() && self.location == Location::Body {
            self.record(rule_names::REQUIRED, "request body is required");
        } else {
            self.record(rule_names::REQUIRED, "value is required");
        }
    }

    fn leaf(&mut self, rule: &FieldRule, probe: Probe<'_>) -> Option<Value> {
        match self.coerce(rule, probe) {
            Ok(value) => {
                self.validate(rule, &value);
                Some(value)
            }
            Err(err) => {
                self.record(err.rule, err.message);
                None
            }
        }
    }

    fn coerce(&self, rule: &FieldRule, probe: Probe<'_>) -> Result<Value, CoerceError> {
        let scalar = match probe {
            Probe::Scalar(scalar) => scalar,
            other => return Err(mismatch(rule, other.type_name())),
        };

        if let Some(spec) = rule.custom_format() {
            let text = match &scalar {
                Scalar::Text(t) | Scalar::String(t) => t.as_ref(),
                Scalar::Number(n) => n,
                Scalar::Bool(true) => "true",
                Scalar::Bool(false) => "false",
            };
            return spec.decode(text).map_err(|e| cast(e.to_string()));
        }

        match (rule.format(), scalar) {
            (Format::Timestamp { layout }, Scalar::Text(t) | Scalar::String(t)) => {
                parse_timestamp(&t, layout.as_deref()).map(Value::Timestamp)
            }
            (Format::Cookie, Scalar::Text(t)) if self.location == Location::Cookie => {
                Ok(Value::Cookie(Cookie::new(rule.wire_key(), t.as_ref())))
            }
            (Format::Cookie, Scalar::Text(t) | Scalar::String(t)) => Cookie::parse(&t)
                .map(Value::Cookie)
                .ok_or_else(|| cast(format!("cannot parse '{t}' as cookie"))),
            (_, Scalar::Text(t)) => parse_primitive(rule.kind(), rule.bits(), &t),
            (_, Scalar::String(s)) if rule.kind() == Kind::String => Ok(Value::String(s.into_owned())),
            (_, Scalar::Number(n)) if rule.kind().is_numeric() => {
                parse_primitive(rule.kind(), rule.bits(), n)
            }
            (_, Scalar::Bool(b)) if rule.kind() == Kind::Bool => Ok(Value::Bool(b)),
            (_, other) => Err(mismatch(rule, other.type_name())),
        }
    }

    /// Runs validators in declaration order, recording the first failure.
    fn validate(&mut self, rule: &FieldRule, value: &Value) {
        if !self.options.validate {
            return;
        }
        let view = value.reflect();
        for validator in rule.validators() {
            if let Err(violation) = validator.run(view) {
                self.record(validator.name(), violation.to_string());
                break;
            }
        }
    }

    fn container(&mut self, rule: &FieldRule, probe: Probe<'_>, depth: usize) -> Step {
        let textual = self.accessor.is_textual();
        match (rule.kind(), probe) {
            (Kind::Struct, Probe::Object) => self.members(rule, depth),
            (Kind::Slice, Probe::Array) => self.elements(rule, depth),
            (Kind::Slice, Probe::Scalar(_) | Probe::Object) if textual => {
                self.elements(rule, depth)
            }
            (Kind::Map, Probe::Object) => self.entries(rule, depth),
            (Kind::Interface, _) => {
                let accessor = self.accessor;
                self.access(accessor.materialize(&self.path))
            }
            (Kind::Struct | Kind::Map, other) => Err(self.error(
                rule_names::TYPE_MISMATCH,
                format!("expected object, got {}", other.type_name()),
            )),
            (Kind::Slice, other) => Err(self.error(
                rule_names::TYPE_MISMATCH,
                format!("expected array, got {}", other.type_name()),
            )),
            _ => Ok(None),
        }
    }

    fn members(&mut self, rule: &FieldRule, depth: usize) -> Step {
        let mut members = IndexMap::new();
        for child in rule.properties().values() {
            self.path.push(PathSegment::Key(child.wire_key().to_string()));
            let step = self.field(child, depth + 1);
            self.path.pop();
            if let Some(value) = step? {
                if self.should_bind {
                    members.insert(child.binding().to_string(), value);
                }
            }
        }
        let value = Value::Struct(members);
        self.validate(rule, &value);
        Ok(Some(value))
    }

    fn elements(&mut self, rule: &FieldRule, depth: usize) -> Step {
        let Some(item) = rule.item() else {
            return Ok(None);
        };
        let accessor = self.accessor;
        let batch = if item.is_leaf() {
            self.access(accessor.elements(&self.path))?
        } else {
            None
        };
        let items = match batch {
            Some(probes) => self.leaf_elements(rule, item, probes, depth)?,
            None => self.probed_elements(rule, item, depth)?,
        };

        if items.is_empty() && rule.is_required() && self.options.validate {
            self.required(rule);
            return Ok(None);
        }
        let value = Value::List(items);
        self.validate(rule, &value);
        Ok(Some(value))
    }

    /// Primitive elements listed by the accessor in one step.
    fn leaf_elements(
        &mut self,
        rule: &FieldRule,
        item: &FieldRule,
        probes: Vec<Probe<'_>>,
        depth: usize,
    ) -> Result<Vec<Value>, ValidationError> {
        if let Some(last) = probes.len().checked_sub(1) {
            self.check_length(rule, last)?;
        }
        let mut items = Vec::with_capacity(probes.len());
        for (index, probe) in probes.into_iter().enumerate() {
            self.path.push(PathSegment::Index(index));
            let step = self.resolve(item, probe, depth + 1);
            self.path.pop();
            items.push(step?.unwrap_or(Value::Null));
        }
        Ok(items)
    }

    /// Elements probed index by index until the first absent one.
    fn probed_elements(
        &mut self,
        rule: &FieldRule,
        item: &FieldRule,
        depth: usize,
    ) -> Result<Vec<Value>, ValidationError> {
        let accessor = self.accessor;
        let mut items = Vec::new();
        for index in 0.. {
            self.path.push(PathSegment::Index(index));
            let probe = match accessor.probe(&self.path) {
                Ok(Probe::Absent) => {
                    self.path.pop();
                    break;
                }
                Ok(probe) => probe,
                Err(err) => {
                    let abort = self.error(rule_names::TYPE_CAST, err.to_string());
                    self.path.pop();
                    return Err(abort);
                }
            };
            self.path.pop();
            self.check_length(rule, index)?;
            self.path.push(PathSegment::Index(index));
            let step = self.resolve(item, probe, depth + 1);
            self.path.pop();
            items.push(step?.unwrap_or(Value::Null));
        }
        Ok(items)
    }

    /// Fails once an element at `index` exists beyond either array limit.
    fn check_length(&self, rule: &FieldRule, index: usize) -> Result<(), ValidationError> {
        if index >= self.options.max_array_items {
            return Err(self.error(
                rule_names::MAX,
                format!("array exceeds the limit of {} items", self.options.max_array_items),
            ));
        }
        match rule.max_bound() {
            Some(max) if (index + 1) as f64 > max => Err(self.error(
                rule_names::MAX,
                format!("array length exceeds maximum {max}"),
            )),
            _ => Ok(()),
        }
    }

    fn entries(&mut self, rule: &FieldRule, depth: usize) -> Step {
        let Some(value_rule) = rule.value_rule() else {
            return Ok(None);
        };
        let accessor = self.accessor;
        let keys = self.access(accessor.keys(&self.path))?;
        let mut entries = IndexMap::new();
        for key in keys {
            self.path.push(PathSegment::Key(key.clone()));
            let step = self.field(value_rule, depth + 1);
            self.path.pop();
            if let Some(value) = step? {
                entries.insert(key, value);
            }
        }
        let value = Value::Map(entries);
        self.validate(rule, &value);
        Ok(Some(value))
    }
}

/// Whether an unset destination of this rule can still be built: numbers,
/// strings and bools have a zero value, collections start empty.
fn has_empty_state(rule: &FieldRule) -> bool {
    rule.custom_format().is_none() && matches!(rule.format(), Format::None)
}

fn cast(message: String) -> CoerceError {
    CoerceError {
        rule: rule_names::TYPE_CAST,
        message,
    }
}

fn mismatch(rule: &FieldRule, found: &str) -> CoerceError {
    let expected = match rule.kind() {
        Kind::Int | Kind::Uint | Kind::Float => "number",
        Kind::Bool => "bool",
        _ => "string",
    };
    cast(format!("value doesn't contain {expected}; it contains {found}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::{FlatSource, LazyJson};
    use kanon_core::desc::Contract;
    use kanon_core::fixtures::{self, User};
    use kanon_core::{FieldDesc, TypeDesc};
    use kanon_schema::SchemaCompiler;

    fn compile(desc: &TypeDesc) -> FieldRule {
        SchemaCompiler::default().compile_type(desc).unwrap()
    }

    fn bind_json(rule: &FieldRule, body: &str) -> Result<Option<Value>, ValidationErrors> {
        let doc = LazyJson::parse(body).unwrap();
        Binder::default().walk(rule, &doc, Location::Body, true)
    }

    #[test]
    fn test_binds_record() {
        let rule = compile(&User::describe());
        let value = bind_json(&rule, r#"{"name": "Ann", "age": 31, "tags": ["a"]}"#)
            .unwrap()
            .unwrap();
        assert_eq!(value.get("name"), Some(&Value::from("Ann")));
        assert_eq!(value.get("age"), Some(&Value::Uint(31)));
        assert_eq!(value.get("email"), None);
        assert_eq!(value.get("tags"), Some(&Value::List(vec![Value::from("a")])));
    }

    #[test]
    fn test_default_fires_only_on_absence() {
        let rule = compile(&User::describe());
        let absent = bind_json(&rule, r#"{"name": "Ann"}"#).unwrap().unwrap();
        assert_eq!(absent.get("age"), Some(&Value::Uint(25)));
        let zero = bind_json(&rule, r#"{"name": "Ann", "age": 0}"#).unwrap().unwrap();
        assert_eq!(zero.get("age"), Some(&Value::Uint(0)));
    }

    #[test]
    fn test_explicit_null_binds_null_for_optional() {
        let rule = compile(&User::describe());
        let value = bind_json(&rule, r#"{"name": "Ann", "email": null}"#)
            .unwrap()
            .unwrap();
        assert_eq!(value.get("email"), Some(&Value::Null));
    }

    #[test]
    fn test_leaf_errors_are_collected() {
        let rule = compile(&User::describe());
        let errors = bind_json(&rule, r#"{"name": "A", "age": "old", "email": "nope"}"#).unwrap_err();
        let rules: Vec<_> = errors.iter().map(|e| e.rule.as_str()).collect();
        assert_eq!(rules, vec!["min", "typeCast", "email"]);
        let cast = errors.iter().find(|e| e.rule == "typeCast").unwrap();
        assert_eq!(cast.field_path, "age");
        assert_eq!(cast.cause, "value doesn't contain number; it contains string");
    }

    #[test]
    fn test_range_error() {
        let rule = compile(&User::describe());
        let errors = bind_json(&rule, r#"{"name": "Ann", "age": 300}"#).unwrap_err();
        assert!(errors.has_rule(rule_names::RANGE_ERROR));
    }

    #[test]
    fn test_container_mismatch_aborts() {
        let rule = compile(&User::describe());
        let errors = bind_json(&rule, r#"{"name": "", "tags": {"a": 1}}"#).unwrap_err();
        let rules: Vec<_> = errors.iter().map(|e| e.rule.as_str()).collect();
        assert_eq!(rules, vec!["required", "typeMismatch"]);
    }

    #[test]
    fn test_required_empty_slice_reports_first_index() {
        let desc = TypeDesc::record(
            "Batch",
            vec![FieldDesc::of::<Vec<String>>("ids").rules("required")],
        );
        let rule = compile(&desc);
        let errors = bind_json(&rule, r#"{"ids": []}"#).unwrap_err();
        let error = errors.iter().next().unwrap();
        assert_eq!((error.rule.as_str(), error.field_path.as_str()), ("required", "ids.0"));
    }

    #[test]
    fn test_array_max_bound() {
        let desc = TypeDesc::record(
            "Batch",
            vec![FieldDesc::of::<Vec<u8>>("ids").rules("max=2")],
        );
        let rule = compile(&desc);
        assert!(bind_json(&rule, r#"{"ids": [1, 2]}"#).is_ok());
        let errors = bind_json(&rule, r#"{"ids": [1, 2, 3]}"#).unwrap_err();
        assert!(errors.has_rule(rule_names::MAX));
    }

    #[test]
    fn test_array_item_limit() {
        let desc = TypeDesc::record("Batch", vec![FieldDesc::of::<Vec<u8>>("ids")]);
        let rule = compile(&desc);
        let doc = LazyJson::parse(r#"{"ids": [1, 2, 3]}"#).unwrap();
        let binder = Binder::new(BindOptions {
            max_array_items: 2,
            ..BindOptions::default()
        });
        let errors = binder.walk(&rule, &doc, Location::Body, true).unwrap_err();
        assert!(errors.to_string().contains("limit of 2 items"));
    }

    #[test]
    fn test_depth_limit() {
        let rule = compile(&User::describe());
        let doc = LazyJson::parse(r#"{"name": "Ann", "tags": ["x"]}"#).unwrap();
        let binder = Binder::new(BindOptions {
            max_depth: 1,
            ..BindOptions::default()
        });
        let errors = binder.walk(&rule, &doc, Location::Body, true).unwrap_err();
        assert!(errors.to_string().contains("maximum nesting depth exceeded"));
    }

    #[test]
    fn test_map_entries() {
        let desc = TypeDesc::record(
            "Scores",
            vec![FieldDesc::of::<std::collections::HashMap<String, i32>>("by_user")],
        );
        let rule = compile(&desc);
        let value = bind_json(&rule, r#"{"by_user": {"ann": 3, "bob": -1}}"#)
            .unwrap()
            .unwrap();
        let scores = value.get("by_user").unwrap();
        assert_eq!(scores.get("bob"), Some(&Value::Int(-1)));

        let errors = bind_json(&rule, r#"{"by_user": {"ann": "x"}}"#).unwrap_err();
        assert_eq!(errors.iter().next().unwrap().field_path, "by_user.ann");
    }

    #[test]
    fn test_root_primitive_fast_path() {
        let rule = compile(&TypeDesc::of::<i64>());
        assert_eq!(bind_json(&rule, "4").unwrap(), Some(Value::Int(4)));
        assert_eq!(bind_json(&rule, r#""4""#).unwrap(), Some(Value::Int(4)));
    }

    #[test]
    fn test_should_bind_false_validates_only() {
        let rule = compile(&User::describe());
        let doc = LazyJson::parse(r#"{"name": "Ann"}"#).unwrap();
        let result = Binder::default().walk(&rule, &doc, Location::Body, false);
        assert_eq!(result.unwrap(), None);
    }

    #[test]
    fn test_textual_source_coerces_and_treats_empty_as_absent() {
        let rule = compile(&User::describe());
        let source = FlatSource::from_pairs([
            ("name", "Ann"),
            ("age", ""),
            ("tags", "a"),
            ("tags", "b"),
        ]);
        let value = Binder::default()
            .walk(&rule, &source, Location::Query, true)
            .unwrap()
            .unwrap();
        assert_eq!(value.get("age"), Some(&Value::Uint(25)));
        assert_eq!(
            value.get("tags"),
            Some(&Value::List(vec![Value::from("a"), Value::from("b")]))
        );
    }

    #[test]
    fn test_listed_and_probed_elements_agree() {
        let desc = TypeDesc::record("Batch", vec![FieldDesc::of::<Vec<u8>>("ids").rules("max=3")]);
        let rule = compile(&desc);
        let walk = |source: &FlatSource| Binder::default().walk(&rule, source, Location::Query, true);

        let repeated = FlatSource::from_pairs([("ids", "1"), ("ids", "2")]);
        let indexed = FlatSource::from_pairs([("ids.0", "1"), ("ids.1", "2")]);
        let expected = Value::List(vec![Value::Uint(1), Value::Uint(2)]);
        assert_eq!(walk(&repeated).unwrap().unwrap().get("ids"), Some(&expected));
        assert_eq!(walk(&indexed).unwrap().unwrap().get("ids"), Some(&expected));

        let too_many = FlatSource::from_pairs([("ids", "1"), ("ids", "2"), ("ids", "3"), ("ids", "4")]);
        let error = walk(&too_many).unwrap_err().iter().next().unwrap().clone();
        assert_eq!((error.rule.as_str(), error.field_path.as_str()), ("max", "ids"));
    }

    #[test]
    fn test_bind_request_stops_at_first_failing_location() {
        let rules = SchemaCompiler::default()
            .compile_locations(&fixtures::create_user_request())
            .unwrap();
        let request = RequestData::builder()
            .uri("/orgs/1/users?limit=500")
            .path_param("org_id", "1")
            .header("content-type", "application/json")
            .body(r#"{"name": "x"}"#)
            .build();
        let err = Binder::default()
            .bind_request(&rules, &request, &CodecRegistry::new(), true)
            .unwrap_err();
        let ContractError::Request(errors) = err else {
            panic!("expected request error");
        };
        assert!(errors.iter().all(|e| e.location == Location::Header));
        assert!(errors.has_rule(rule_names::REQUIRED));
    }

    #[test]
    fn test_payload_limits_and_media_type() {
        let rules = SchemaCompiler::default()
            .compile_locations(&TypeDesc::record("Req", vec![FieldDesc::of::<User>("body")]))
            .unwrap();
        let binder = Binder::new(BindOptions {
            max_body_bytes: 8,
            ..BindOptions::default()
        });
        let large = RequestData::builder().body(r#"{"name": "Annabel"}"#).build();
        assert!(matches!(
            binder.bind_request(&rules, &large, &CodecRegistry::new(), true),
            Err(ContractError::PayloadTooLarge { limit: 8, .. })
        ));

        let xml = RequestData::builder()
            .header("content-type", "application/xml")
            .body("<a/>")
            .build();
        assert!(matches!(
            Binder::default().bind_request(&rules, &xml, &CodecRegistry::new(), true),
            Err(ContractError::UnsupportedMediaType { .. })
        ));
    }
}
