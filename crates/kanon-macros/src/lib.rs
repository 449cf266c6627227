//! Procedural macros for Kanon contracts.
//!
//! `#[derive(Contract)]` turns a plain record into a contract type: the
//! schema compiler can describe it, the binder can build it and the encoder
//! can read it, with no hand-written glue.
//!
//! # Example
//!
//! ```rust,ignore
//! use kanon::prelude::*;
//!
//! #[derive(Contract)]
//! struct CreateUser {
//!     #[kanon(rules = "required,min=2,max=64")]
//!     name: String,
//!     #[kanon(default = "25")]
//!     age: u8,
//!     #[kanon(wire = "email", omit_empty, rules = "email")]
//!     email: Option<String>,
//! }
//! ```
//!
//! # Member attributes
//!
//! | Attribute | Effect |
//! |-----------|--------|
//! | `wire = "key"` | Wire key; `"key,omitempty"` also works |
//! | `omit_empty` | Skip the member on encode when it is empty |
//! | `rules = "..."` | Validators, e.g. `required,oneof=a b c` |
//! | `default = "..."` | Literal substituted when the value is absent |
//! | `layout = "..."` | Timestamp layout (chrono syntax) |
//! | `spec = "id"` | Registered custom format |
//! | `skip` | Leave the member out; it is rebuilt with `Default` |
//!
//! Any other `name = "value"` pair is kept as a raw annotation for
//! extension hooks.

mod contract;
mod parse;

use proc_macro::TokenStream;

/// Derives `Contract`, `StructView`, `Reflect` and `FromValue` for a record.
///
/// Field types must themselves implement those traits; every primitive,
/// `String`, `Option`, `Vec`, the map types and other derived records do.
///
/// # Generated Code
///
/// ```rust,ignore
/// impl ::kanon_core::Contract for CreateUser {
///     fn describe() -> ::kanon_core::TypeDesc {
///         ::kanon_core::TypeDesc::record("CreateUser", vec![
///             ::kanon_core::FieldDesc::of::<String>("name").rules("required,min=2,max=64"),
///             ::kanon_core::FieldDesc::of::<u8>("age").default_literal("25"),
///             // ...
///         ])
///     }
/// }
/// ```
#[proc_macro_derive(Contract, attributes(kanon))]
pub fn derive_contract(input: TokenStream) -> TokenStream {
    contract::expand_contract(input.into())
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
