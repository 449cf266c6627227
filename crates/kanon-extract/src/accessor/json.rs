use std::borrow::Cow;

use indexmap::IndexMap;
use kanon_core::Value;
use once_cell::unsync::OnceCell;
use serde_json::value::RawValue;

use super::{AccessError, Accessor, PathSegment, Probe, Scalar};

/// A lazily split JSON document.
///
/// The whole document is syntax-checked once by [`LazyJson::parse`]. After
/// that each node holds only its raw text; an object or array is split into
/// child nodes the first time a lookup passes through it, and the split is
/// cached for the rest of the walk.
///
/// # Example
///
/// ```
/// use kanon_extract::{Accessor, LazyJson, PathSegment, Probe, Scalar};
///
/// let doc = LazyJson::parse(r#"{"user": {"age": 30, "nick": null}}"#).unwrap();
/// let age = [PathSegment::Key("user".into()), PathSegment::Key("age".into())];
/// assert_eq!(doc.probe(&age).unwrap(), Probe::Scalar(Scalar::Number("30")));
///
/// let nick = [PathSegment::Key("user".into()), PathSegment::Key("nick".into())];
/// assert_eq!(doc.probe(&nick).unwrap(), Probe::Null);
///
/// let email = [PathSegment::Key("user".into()), PathSegment::Key("email".into())];
/// assert_eq!(doc.probe(&email).unwrap(), Probe::Absent);
/// ```
#[derive(Debug)]
pub struct LazyJson<'a> {
    root: Node<'a>,
}

#[derive(Debug)]
struct Node<'a> {
    raw: &'a RawValue,
    children: OnceCell<Children<'a>>,
}

#[derive(Debug)]
enum Children<'a> {
    Object(IndexMap<String, Node<'a>>),
    Array(Vec<Node<'a>>),
    Leaf,
}

impl<'a> LazyJson<'a> {
    /// Checks the syntax of `text` and wraps it.
    pub fn parse(text: &'a str) -> Result<Self, AccessError> {
        let raw: &'a RawValue = serde_json::from_str(text)?;
        Ok(Self {
            root: Node::new(raw),
        })
    }

    /// Like [`parse`](Self::parse), for a UTF-8 byte body.
    pub fn from_slice(body: &'a [u8]) -> Result<Self, AccessError> {
        let text = std::str::from_utf8(body)
            .map_err(|e| AccessError(format!("body is not valid UTF-8: {e}")))?;
        Self::parse(text)
    }

    fn find(&self, path: &[PathSegment]) -> Result<Option<&Node<'a>>, AccessError> {
        let mut node = &self.root;
        for segment in path {
            match node.child(segment)? {
                Some(child) => node = child,
                None => return Ok(None),
            }
        }
        Ok(Some(node))
    }
}

impl<'a> Node<'a> {
    fn new(raw: &'a RawValue) -> Self {
        Self {
            raw,
            children: OnceCell::new(),
        }
    }

    fn text(&self) -> &'a str {
        let raw: &'a RawValue = self.raw;
        raw.get().trim()
    }

    fn children(&self) -> Result<&Children<'a>, AccessError> {
        self.children.get_or_try_init(|| {
            let text = self.text();
            match text.as_bytes().first() {
                Some(b'{') => {
                    let members: IndexMap<String, &'a RawValue> = serde_json::from_str(text)?;
                    Ok(Children::Object(
                        members
                            .into_iter()
                            .map(|(key, raw)| (key, Node::new(raw)))
                            .collect(),
                    ))
                }
                Some(b'[') => {
                    let items: Vec<&'a RawValue> = serde_json::from_str(text)?;
                    Ok(Children::Array(items.into_iter().map(Node::new).collect()))
                }
                _ => Ok(Children::Leaf),
            }
        })
    }

    fn child(&self, segment: &PathSegment) -> Result<Option<&Node<'a>>, AccessError> {
        Ok(match (self.children()?, segment) {
            (Children::Object(members), PathSegment::Key(key)) => members.get(key),
            (Children::Array(items), PathSegment::Index(index)) => items.get(*index),
            _ => None,
        })
    }

    fn probe(&self) -> Result<Probe<'a>, AccessError> {
        let text = self.text();
        Ok(match text.as_bytes().first() {
            None => Probe::Absent,
            Some(b'n') => Probe::Null,
            Some(b't') => Probe::Scalar(Scalar::Bool(true)),
            Some(b'f') => Probe::Scalar(Scalar::Bool(false)),
            Some(b'"') => Probe::Scalar(Scalar::String(decode_string(text)?)),
            Some(b'{') => Probe::Object,
            Some(b'[') => Probe::Array,
            Some(_) => Probe::Scalar(Scalar::Number(text)),
        })
    }
}

/// Borrows the string when it has no escapes.
fn decode_string(text: &str) -> Result<Cow<'_, str>, AccessError> {
    match serde_json::from_str::<&str>(text) {
        Ok(borrowed) => Ok(Cow::Borrowed(borrowed)),
        Err(_) => Ok(Cow::Owned(serde_json::from_str::<String>(text)?)),
    }
}

impl Accessor for LazyJson<'_> {
    fn probe(&self, path: &[PathSegment]) -> Result<Probe<'_>, AccessError> {
        match self.find(path)? {
            Some(node) => node.probe(),
            None => Ok(Probe::Absent),
        }
    }

    fn keys(&self, path: &[PathSegment]) -> Result<Vec<String>, AccessError> {
        let Some(node) = self.find(path)? else {
            return Ok(Vec::new());
        };
        Ok(match node.children()? {
            Children::Object(members) => members.keys().cloned().collect(),
            _ => Vec::new(),
        })
    }

    fn elements(&self, path: &[PathSegment]) -> Result<Option<Vec<Probe<'_>>>, AccessError> {
        let Some(node) = self.find(path)? else {
            return Ok(None);
        };
        match node.children()? {
            Children::Array(items) => items.iter().map(Node::probe).collect::<Result<_, _>>().map(Some),
            _ => Ok(None),
        }
    }

    fn materialize(&self, path: &[PathSegment]) -> Result<Option<Value>, AccessError> {
        let Some(node) = self.find(path)? else {
            return Ok(None);
        };
        let json: serde_json::Value = serde_json::from_str(node.text())?;
        Ok(Some(Value::from(json)))
    }
}
