//! # Kanon Extract
//!
//! Request binding and response encoding for the Kanon contract engine.
//!
//! This crate walks compiled rule trees against live data. The
//! [`Binder`] reads a [`RequestData`] one location at a time, coercing
//! and validating as it goes, and the [`Encoder`] validates a handler's
//! value while writing it to the wire.
//!
//! ## Sources
//!
//! The binder never sees raw headers or JSON directly. Each location is
//! served through an [`Accessor`]:
//!
//! | Accessor | Location | Values |
//! |----------|----------|--------|
//! | [`FlatSource`] | header, cookie, query, path, form bodies | text, coerced per field |
//! | [`LazyJson`] | JSON bodies | typed JSON, parsed on demand |
//! | [`EmptySource`] | empty bodies | nothing |
//!
//! ## Body codecs
//!
//! | Codec | Content type |
//! |-------|--------------|
//! | [`JsonCodec`] | `application/json`, `*/*+json` |
//! | [`FormCodec`] | `application/x-www-form-urlencoded` |
//!
//! Further formats plug in through [`BodyCodec`] and [`CodecRegistry`].
//!
//! ## Example
//!
//! ```rust
//! use kanon_core::{fixtures::User, Contract, Location, Value};
//! use kanon_extract::{Binder, Encoder, LazyJson};
//! use kanon_schema::SchemaCompiler;
//!
//! let rule = SchemaCompiler::default().compile_type(&User::describe()).unwrap();
//!
//! let body = LazyJson::parse(r#"{"name": "Ann", "age": 31}"#).unwrap();
//! let user = Binder::default()
//!     .walk(&rule, &body, Location::Body, true)
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(user.get("age"), Some(&Value::Uint(31)));
//!
//! let json = Encoder::default().encode_json(&rule, &user).unwrap();
//! assert_eq!(&json[..], br#"{"name":"Ann","age":31}"#);
//! ```
//!
//! ## Errors
//!
//! Walks report [`ValidationErrors`](kanon_core::ValidationErrors): every
//! leaf failure is collected, while structural failures end the walk of
//! their location. A panicking format hook is reported as a `panic` error
//! instead of unwinding into the caller.

#![doc(html_root_url = "https://docs.rs/kanon-extract/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod accessor;
mod binder;
mod codec;
mod encode;
mod form;
mod guard;
mod json;
mod number;
mod pool;
mod request;

pub use accessor::{
    render_path, AccessError, Accessor, EmptySource, FlatSource, LazyJson, PathSegment, Probe,
    Scalar,
};
pub use binder::{
    BindOptions, Binder, DEFAULT_MAX_ARRAY_ITEMS, DEFAULT_MAX_BODY_BYTES, DEFAULT_MAX_DEPTH,
};
pub use codec::{BodyCodec, CodecRegistry};
pub use encode::{EncodeOptions, EncodedResponse, Encoder};
pub use form::FormCodec;
pub use json::JsonCodec;
pub use number::format_float;
pub use pool::{BufferPool, PooledBuffer};
pub use request::{RequestData, RequestDataBuilder};
