//! # Kanon Core
//!
//! Core types and traits for the Kanon contract engine.
//!
//! This crate provides the foundational types used throughout Kanon:
//!
//! - [`Kind`], [`Format`], [`Location`], [`Direction`] - tags the compiled rule trees dispatch on
//! - [`Value`] - the dynamic destination the binder writes into
//! - [`Reflect`] / [`View`] - borrowed read model the encoder and validators consume
//! - [`FromValue`] - conversion from bound values into typed destinations
//! - [`Contract`] / [`TypeDesc`] - structural descriptions walked by the schema compiler
//! - [`RuleRegistry`] - named validation rule builders
//! - [`FormatRegistry`] - custom `spec:<id>` decode/encode hooks
//! - [`ValidationError`] / [`ContractError`] - the error taxonomy

#![doc(html_root_url = "https://docs.rs/kanon-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod coerce;
mod cookie;
pub mod desc;
mod error;
pub mod fixtures;
pub mod format;
pub mod from_value;
mod kind;
pub mod reflect;
pub mod rules;
mod value;

pub use cookie::Cookie;
pub use desc::{Contract, FieldDesc, Shape, TypeDesc};
pub use error::{
    rule_names, ContractError, ContractResult, ErrorDetail, ErrorEnvelope, SchemaError,
    ValidationError, ValidationErrors,
};
pub use format::{FnFormat, FormatError, FormatRegistry, FormatSpec};
pub use from_value::{FromValue, ValueError};
pub use kind::{Direction, Format, Kind, Location};
pub use reflect::{ListView, MapView, Reflect, StructView, View};
pub use rules::{
    RuleBuildError, RuleBuilder, RuleContext, RuleFn, RuleRegistry, RuleViolation,
};
pub use value::{CustomValue, Value};
