//! Kanon Schema - Contract Compilation
//!
//! This crate turns contract type descriptions into immutable rule trees,
//! once per registered operation.
//!
//! # Overview
//!
//! - [`SchemaCompiler`] walks a [`TypeDesc`](kanon_core::TypeDesc)
//!   depth-first and attaches validators from a
//!   [`RuleRegistry`](kanon_core::RuleRegistry) and format hooks from a
//!   [`FormatRegistry`](kanon_core::FormatRegistry)
//! - [`FieldRule`] is the unit of the tree, shared read-only by every walk
//! - [`SchemaRuleSet`] holds the request rules by location and one
//!   [`LocationRules`] per response variant
//! - [`StatusRegistry`] maps status codes to response variants
//!
//! # Architecture
//!
//! ```text
//!      OperationContract (request + response variants)
//!                 │
//!      ┌──────────▼─────────────────┐
//!      │   SchemaCompiler           │◄── RuleRegistry, FormatRegistry
//!      └──────────┬─────────────────┘
//!                 │ compile once
//!      ┌──────────▼─────────────────┐
//!      │   SchemaRuleSet            │
//!      │   request:  LocationRules  │
//!      │   "Ok":     LocationRules  │
//!      │   "Err":    LocationRules  │
//!      └────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use kanon_core::fixtures;
//! use kanon_core::Location;
//! use kanon_schema::{OperationContract, SchemaCompiler};
//!
//! let contract = OperationContract::new("createUser")
//!     .request_desc(fixtures::create_user_request())
//!     .response_desc("Created", fixtures::create_user_response());
//! let rules = SchemaCompiler::default().compile_operation(&contract).unwrap();
//!
//! let body = rules.request().get(Location::Body).unwrap();
//! assert!(body.property("name").unwrap().is_required());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod annotations;
mod compiler;
mod rule;
mod ruleset;
pub mod status;

pub use compiler::{OperationContract, SchemaCompiler};
pub use rule::{FieldRule, Validator};
pub use ruleset::{LocationRules, SchemaRuleSet};
pub use status::StatusRegistry;
