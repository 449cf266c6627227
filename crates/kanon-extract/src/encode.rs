//! The response encoder.
//!
//! Walks a response rule tree against a handler value and writes wire
//! output directly, validating every value immediately before it is
//! written. Output goes to a pooled buffer and is only handed out when the
//! whole walk succeeded, so a value that breaks its contract never leaves a
//! partial body behind.

use bytes::Bytes;
use kanon_core::coerce::{check_int, check_uint, format_timestamp};
use kanon_core::{
    rule_names, Direction, Format, Kind, ListView, Location, MapView, Reflect, StructView,
    ValidationError, ValidationErrors, Value, View,
};
use kanon_schema::{FieldRule, LocationRules};

use crate::accessor::{render_path, PathSegment};
use crate::binder::DEFAULT_MAX_DEPTH;
use crate::codec::BodyCodec;
use crate::guard::catch_panics;
use crate::number::{format_float, write_int, write_string, write_uint};
use crate::pool::BufferPool;

/// Stand-in for members a record does not expose.
static ABSENT: Value = Value::Null;

/// Switches applied to every encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Run `required` checks and validators. Shape checks always run.
    pub validate: bool,
    /// Deeper rule walks fail with `typeMismatch`.
    pub max_depth: usize,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            validate: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// A fully encoded response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodedResponse {
    /// Header pairs rendered from the variant's `header` record.
    pub headers: Vec<(String, String)>,
    /// Content type of `body`, when a body rule exists.
    pub content_type: Option<String>,
    /// Encoded body.
    pub body: Bytes,
}

/// Validates and serializes handler values against compiled rules.
#[derive(Debug, Default)]
pub struct Encoder {
    options: EncodeOptions,
    pool: BufferPool,
}

impl Encoder {
    /// Creates an encoder keeping up to `pool_capacity` idle buffers.
    #[must_use]
    pub fn new(options: EncodeOptions, pool_capacity: usize) -> Self {
        Self {
            options,
            pool: BufferPool::new(pool_capacity),
        }
    }

    /// Returns the options in effect.
    #[must_use]
    pub fn options(&self) -> &EncodeOptions {
        &self.options
    }

    /// Encodes `value` as JSON.
    pub fn encode_json(&self, rule: &FieldRule, value: &dyn Reflect) -> Result<Bytes, ValidationErrors> {
        catch_panics(Direction::Response, Location::Body, || {
            let mut buffer = self.pool.checkout();
            let mut emit = Emit::new(&self.options, Location::Body);
            let flow = emit.json(rule, value, &mut buffer, 0);
            emit.finish(flow)?;
            Ok(Bytes::copy_from_slice(buffer.as_bytes()))
        })
    }

    /// Renders a header record into `(name, value)` pairs. Slice members
    /// yield one pair per element.
    pub fn encode_headers(
        &self,
        rule: &FieldRule,
        value: &dyn Reflect,
    ) -> Result<Vec<(String, String)>, ValidationErrors> {
        catch_panics(Direction::Response, Location::Header, || {
            let mut emit = Emit::new(&self.options, Location::Header);
            let mut pairs = Vec::new();
            let flow = emit.headers(rule, value, &mut pairs);
            emit.finish(flow)?;
            Ok(pairs)
        })
    }

    /// Flattens `value` into dotted key/value pairs. Primitive slices
    /// become repeated keys; other elements are indexed (`items.0.name`).
    pub fn encode_pairs(
        &self,
        rule: &FieldRule,
        value: &dyn Reflect,
    ) -> Result<Vec<(String, String)>, ValidationErrors> {
        catch_panics(Direction::Response, Location::Body, || {
            let mut emit = Emit::new(&self.options, Location::Body);
            let mut pairs = Vec::new();
            let flow = emit.flatten(rule, value, String::new(), &mut pairs, 0);
            emit.finish(flow)?;
            Ok(pairs)
        })
    }

    /// Encodes a response value against one variant's rules.
    ///
    /// `value` must be a record whose members are named after locations
    /// (`header`, `body`). Failures from every location are reported
    /// together.
    pub fn encode_response(
        &self,
        rules: &LocationRules,
        value: &dyn Reflect,
        codec: &dyn BodyCodec,
    ) -> Result<EncodedResponse, ValidationErrors> {
        let view = value.reflect();
        let View::Struct(record) = view else {
            return Err(ValidationError::new(
                Direction::Response,
                Location::Body,
                "",
                rule_names::TYPE_MISMATCH,
                format!("response value must be a record, got {}", view.type_name()),
            )
            .into());
        };

        let mut response = EncodedResponse::default();
        let mut errors = ValidationErrors::new();
        for (location, rule) in rules.iter() {
            let member = record.field(rule.binding()).unwrap_or(&ABSENT);
            match location {
                Location::Header => match self.encode_headers(rule, member) {
                    Ok(headers) => response.headers = headers,
                    Err(e) => errors.extend(e),
                },
                Location::Body => match codec.encode(member, rule, self) {
                    Ok(body) => {
                        response.body = body;
                        response.content_type = Some(codec.content_type().to_string());
                    }
                    Err(e) => errors.extend(e),
                },
                _ => {}
            }
        }
        errors.into_result()?;
        Ok(response)
    }
}

type Flow = Result<(), ValidationError>;

struct Emit<'e> {
    options: &'e EncodeOptions,
    location: Location,
    path: Vec<PathSegment>,
    errors: ValidationErrors,
}

impl<'e> Emit<'e> {
    fn new(options: &'e EncodeOptions, location: Location) -> Self {
        Self {
            options,
            location,
            path: Vec::new(),
            errors: ValidationErrors::new(),
        }
    }

    fn error(&self, rule: &str, cause: impl Into<String>) -> ValidationError {
        ValidationError::new(
            Direction::Response,
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

    fn finish(mut self, flow: Flow) -> Result<(), ValidationErrors> {
        if let Err(abort) = flow {
            self.errors.push(abort);
        }
        self.errors.into_result()
    }

    fn validate(&mut self, rule: &FieldRule, view: View<'_>) {
        if !self.options.validate {
            return;
        }
        for validator in rule.validators() {
            if let Err(violation) = validator.run(view) {
                self.record(validator.name(), violation.to_string());
                break;
            }
        }
    }

    fn depth(&self, depth: usize) -> Flow {
        if depth > self.options.max_depth {
            return Err(self.error(
                rule_names::TYPE_MISMATCH,
                "maximum nesting depth exceeded",
            ));
        }
        Ok(())
    }

    fn missing(&mut self, rule: &FieldRule) {
        if rule.is_required() && self.options.validate {
            self.record(rule_names::REQUIRED, "value is required");
        }
    }

    fn json(&mut self, rule: &FieldRule, value: &dyn Reflect, out: &mut String, depth: usize) -> Flow {
        self.depth(depth)?;
        let view = value.reflect();
        if matches!(view, View::Null) {
            self.missing(rule);
            out.push_str("null");
            return Ok(());
        }
        if rule.custom_format().is_some() || rule.kind().is_primitive() {
            match self.text(rule, value) {
                Some(text) if rule.kind() == Kind::String || rule.custom_format().is_some() => {
                    write_string(out, &text);
                }
                Some(text) => out.push_str(&text),
                None => out.push_str("null"),
            }
            return Ok(());
        }
        match (rule.kind(), view) {
            (Kind::Struct, View::Struct(record)) => self.members(rule, record, out, depth),
            (Kind::Slice, View::List(list)) => self.elements(rule, list, out, depth),
            (Kind::Map, View::Map(map)) => self.entries(rule, map, out, depth),
            (Kind::Interface, view) => self.any(view, out, depth),
            (Kind::Struct | Kind::Map, other) => Err(self.error(
                rule_names::TYPE_MISMATCH,
                format!("expected object, got {}", other.type_name()),
            )),
            (Kind::Slice, other) => Err(self.error(
                rule_names::TYPE_MISMATCH,
                format!("expected array, got {}", other.type_name()),
            )),
            _ => {
                out.push_str("null");
                Ok(())
            }
        }
    }

    fn members(&mut self, rule: &FieldRule, record: &dyn StructView, out: &mut String, depth: usize) -> Flow {
        out.push('{');
        let mut first = true;
        for child in rule.properties().values() {
            if child.is_ignored() || child.kind() == Kind::Invalid {
                continue;
            }
            let member = record.field(child.binding()).unwrap_or(&ABSENT);
            self.path.push(PathSegment::Key(child.wire_key().to_string()));
            if child.omits_empty() && member.reflect().is_zero() {
                self.missing(child);
                self.path.pop();
                continue;
            }
            if !first {
                out.push(',');
            }
            first = false;
            write_string(out, child.wire_key());
            out.push(':');
            let flow = self.json(child, member, out, depth + 1);
            self.path.pop();
            flow?;
        }
        out.push('}');
        self.validate(rule, View::Struct(record));
        Ok(())
    }

    fn elements(&mut self, rule: &FieldRule, list: &dyn ListView, out: &mut String, depth: usize) -> Flow {
        if let Some(max) = rule.max_bound() {
            if list.len() as f64 > max {
                return Err(self.error(
                    rule_names::MAX,
                    format!("array length {} exceeds maximum {max}", list.len()),
                ));
            }
        }
        let Some(item) = rule.item() else {
            out.push_str("[]");
            return Ok(());
        };
        out.push('[');
        for index in 0..list.len() {
            if index > 0 {
                out.push(',');
            }
            let element = list.get(index).unwrap_or(&ABSENT);
            self.path.push(PathSegment::Index(index));
            let flow = self.json(item, element, out, depth + 1);
            self.path.pop();
            flow?;
        }
        out.push(']');
        self.validate(rule, View::List(list));
        Ok(())
    }

    fn entries(&mut self, rule: &FieldRule, map: &dyn MapView, out: &mut String, depth: usize) -> Flow {
        let Some(value_rule) = rule.value_rule() else {
            out.push_str("{}");
            return Ok(());
        };
        out.push('{');
        for (i, (key, value)) in map.entries().into_iter().enumerate() {
            let View::Str(key) = key else {
                return Err(self.error(
                    rule_names::TYPE_MISMATCH,
                    format!("map keys must be strings, got {}", key.type_name()),
                ));
            };
            if i > 0 {
                out.push(',');
            }
            write_string(out, key);
            out.push(':');
            self.path.push(PathSegment::Key(key.to_string()));
            let flow = self.json(value_rule, value, out, depth + 1);
            self.path.pop();
            flow?;
        }
        out.push('}');
        self.validate(rule, View::Map(map));
        Ok(())
    }

    /// Writes a value with no rules attached.
    fn any(&mut self, view: View<'_>, out: &mut String, depth: usize) -> Flow {
        self.depth(depth)?;
        match view {
            View::Null | View::Custom(_) => out.push_str("null"),
            View::Bool(b) => out.push_str(if b { "true" } else { "false" }),
            View::Int(i) => write_int(out, i),
            View::Uint(u) => write_uint(out, u),
            View::Float(f) => match format_float(f, 64) {
                Some(text) => out.push_str(&text),
                None => {
                    self.record(rule_names::RANGE_ERROR, format!("unsupported float value {f}"));
                    out.push_str("null");
                }
            },
            View::Str(s) => write_string(out, s),
            View::Timestamp(ts) => write_string(out, &format_timestamp(&ts, None)),
            View::Cookie(c) => write_string(out, &c.to_string()),
            View::List(list) => {
                out.push('[');
                for index in 0..list.len() {
                    if index > 0 {
                        out.push(',');
                    }
                    let element = list.get(index).unwrap_or(&ABSENT);
                    self.any(element.reflect(), out, depth + 1)?;
                }
                out.push(']');
            }
            View::Map(map) => {
                out.push('{');
                for (i, (key, value)) in map.entries().into_iter().enumerate() {
                    let View::Str(key) = key else {
                        return Err(self.error(
                            rule_names::TYPE_MISMATCH,
                            format!("map keys must be strings, got {}", key.type_name()),
                        ));
                    };
                    if i > 0 {
                        out.push(',');
                    }
                    write_string(out, key);
                    out.push(':');
                    self.any(value.reflect(), out, depth + 1)?;
                }
                out.push('}');
            }
            View::Struct(record) => {
                out.push('{');
                for (i, (key, value)) in record.fields().into_iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    write_string(out, key);
                    out.push(':');
                    self.any(value.reflect(), out, depth + 1)?;
                }
                out.push('}');
            }
        }
        Ok(())
    }

    /// Validates a leaf and renders it as unquoted text.
    fn text(&mut self, rule: &FieldRule, value: &dyn Reflect) -> Option<String> {
        let view = value.reflect();
        self.validate(rule, view);

        if let Some(spec) = rule.custom_format() {
            return match spec.encode(value) {
                Ok(text) => Some(text),
                Err(err) => {
                    self.record(rule_names::TYPE_CAST, err.to_string());
                    None
                }
            };
        }

        let checked = match (rule.kind(), view) {
            (Kind::String, View::Str(s)) => Ok(s.to_string()),
            (Kind::String, View::Timestamp(ts)) => {
                let layout = match rule.format() {
                    Format::Timestamp { layout } => layout.as_deref(),
                    _ => None,
                };
                Ok(format_timestamp(&ts, layout))
            }
            (Kind::String, View::Cookie(c)) => Ok(c.to_string()),
            (Kind::Bool, View::Bool(b)) => Ok(b.to_string()),
            (Kind::Int, View::Int(i)) => check_int(i, rule.bits()).map(|i| i.to_string()),
            (Kind::Int, View::Uint(u)) => i64::try_from(u)
                .map_err(|_| range(u, rule))
                .and_then(|i| check_int(i, rule.bits()))
                .map(|i| i.to_string()),
            (Kind::Uint, View::Uint(u)) => check_uint(u, rule.bits()).map(|u| u.to_string()),
            (Kind::Uint, View::Int(i)) => u64::try_from(i)
                .map_err(|_| range(i, rule))
                .and_then(|u| check_uint(u, rule.bits()))
                .map(|u| u.to_string()),
            (Kind::Float, View::Float(f)) => {
                format_float(f, rule.bits()).ok_or_else(|| range(f, rule))
            }
            (Kind::Float, View::Int(i)) => format_float(i as f64, rule.bits()).ok_or_else(|| range(i, rule)),
            (Kind::Float, View::Uint(u)) => format_float(u as f64, rule.bits()).ok_or_else(|| range(u, rule)),
            (kind, other) => {
                let expected = match kind {
                    Kind::Int | Kind::Uint | Kind::Float => "number",
                    Kind::Bool => "bool",
                    _ => "string",
                };
                Err(kanon_core::coerce::CoerceError {
                    rule: rule_names::TYPE_CAST,
                    message: format!(
                        "value doesn't contain {expected}; it contains {}",
                        other.type_name()
                    ),
                })
            }
        };
        match checked {
            Ok(text) => Some(text),
            Err(err) => {
                self.record(err.rule, err.message);
                None
            }
        }
    }

    fn headers(&mut self, rule: &FieldRule, value: &dyn Reflect, pairs: &mut Vec<(String, String)>) -> Flow {
        let view = value.reflect();
        let record = match view {
            View::Null => return Ok(()),
            View::Struct(record) => record,
            other => {
                return Err(self.error(
                    rule_names::TYPE_MISMATCH,
                    format!("expected object, got {}", other.type_name()),
                ))
            }
        };
        for child in rule.properties().values() {
            if child.is_ignored() || child.kind() == Kind::Invalid {
                continue;
            }
            let member = record.field(child.binding()).unwrap_or(&ABSENT);
            self.path.push(PathSegment::Key(child.wire_key().to_string()));
            match (child.kind(), member.reflect()) {
                (_, View::Null) => self.missing(child),
                (Kind::Slice, View::List(list)) => {
                    if let Some(item) = child.item() {
                        for index in 0..list.len() {
                            let element = list.get(index).unwrap_or(&ABSENT);
                            if let Some(text) = self.text(item, element) {
                                pairs.push((child.wire_key().to_string(), text));
                            }
                        }
                    }
                }
                _ => {
                    if let Some(text) = self.text(child, member) {
                        if !(text.is_empty() && child.omits_empty()) {
                            pairs.push((child.wire_key().to_string(), text));
                        }
                    }
                }
            }
            self.path.pop();
        }
        Ok(())
    }

    fn flatten(
        &mut self,
        rule: &FieldRule,
        value: &dyn Reflect,
        key: String,
        pairs: &mut Vec<(String, String)>,
        depth: usize,
    ) -> Flow {
        self.depth(depth)?;
        let view = value.reflect();
        if matches!(view, View::Null) {
            self.missing(rule);
            return Ok(());
        }
        if rule.is_leaf() {
            if let Some(text) = self.text(rule, value) {
                pairs.push((key, text));
            }
            return Ok(());
        }
        match (rule.kind(), view) {
            (Kind::Struct, View::Struct(record)) => {
                for child in rule.properties().values() {
                    if child.is_ignored() || child.kind() == Kind::Invalid {
                        continue;
                    }
                    let member = record.field(child.binding()).unwrap_or(&ABSENT);
                    if child.omits_empty() && member.reflect().is_zero() {
                        continue;
                    }
                    self.path.push(PathSegment::Key(child.wire_key().to_string()));
                    let flow = self.flatten(child, member, join(&key, child.wire_key()), pairs, depth + 1);
                    self.path.pop();
                    flow?;
                }
                self.validate(rule, view);
            }
            (Kind::Slice, View::List(list)) => {
                if let Some(item) = rule.item() {
                    for index in 0..list.len() {
                        let element = list.get(index).unwrap_or(&ABSENT);
                        let element_key = if item.is_leaf() {
                            key.clone()
                        } else {
                            join(&key, &index.to_string())
                        };
                        self.path.push(PathSegment::Index(index));
                        let flow = self.flatten(item, element, element_key, pairs, depth + 1);
                        self.path.pop();
                        flow?;
                    }
                }
                self.validate(rule, view);
            }
            (Kind::Map, View::Map(map)) => {
                if let Some(value_rule) = rule.value_rule() {
                    for (entry_key, entry) in map.entries() {
                        let View::Str(entry_key) = entry_key else {
                            return Err(self.error(
                                rule_names::TYPE_MISMATCH,
                                format!("map keys must be strings, got {}", entry_key.type_name()),
                            ));
                        };
                        self.path.push(PathSegment::Key(entry_key.to_string()));
                        let flow = self.flatten(value_rule, entry, join(&key, entry_key), pairs, depth + 1);
                        self.path.pop();
                        flow?;
                    }
                }
                self.validate(rule, view);
            }
            (Kind::Struct | Kind::Map | Kind::Slice, other) => {
                return Err(self.error(
                    rule_names::TYPE_MISMATCH,
                    format!("cannot flatten {} as {}", other.type_name(), rule.kind()),
                ));
            }
            _ => {}
        }
        Ok(())
    }
}

fn join(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{prefix}.{segment}")
    }
}

fn range(value: impl std::fmt::Display, rule: &FieldRule) -> kanon_core::coerce::CoerceError {
    kanon_core::coerce::CoerceError {
        rule: rule_names::RANGE_ERROR,
        message: format!("value '{value}' out of range for {}{}", rule.kind(), rule.bits()),
    }
}
