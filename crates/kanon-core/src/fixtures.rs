//! Test fixtures for Kanon development and testing.
//!
//! Pre-built contract descriptions and a hand-written record type that can
//! be used in tests across the workspace. [`User`] implements by hand what
//! `#[derive(Contract)]` generates.
//!
//! # Example
//!
//! ```
//! use kanon_core::fixtures;
//!
//! let request = fixtures::create_user_request();
//! assert_eq!(request.fields().map(<[_]>::len), Some(4));
//! ```

use crate::desc::{Contract, FieldDesc, TypeDesc};
use crate::format::{FnFormat, FormatError};
use crate::from_value::{into_members, take_member, FromValue, ValueError};
use crate::reflect::{Reflect, StructView, View};
use crate::{CustomValue, Value};

/// A user record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct User {
    /// Display name, 2 to 64 characters.
    pub name: String,
    /// Age, defaults to 25.
    pub age: u8,
    /// Optional contact address.
    pub email: Option<String>,
    /// Free-form labels.
    pub tags: Vec<String>,
}

impl Contract for User {
    fn describe() -> TypeDesc {
        TypeDesc::record(
            "User",
            vec![
                FieldDesc::of::<String>("name").rules("required,min=2,max=64"),
                FieldDesc::of::<u8>("age").default_literal("25"),
                FieldDesc::of::<Option<String>>("email")
                    .wire("email,omitempty")
                    .rules("email"),
                FieldDesc::of::<Vec<String>>("tags").omit_empty(),
            ],
        )
    }
}

impl StructView for User {
    fn field(&self, binding: &str) -> Option<&dyn Reflect> {
        match binding {
            "name" => Some(&self.name),
            "age" => Some(&self.age),
            "email" => Some(&self.email),
            "tags" => Some(&self.tags),
            _ => None,
        }
    }

    fn fields(&self) -> Vec<(&str, &dyn Reflect)> {
        vec![
            ("name", &self.name as &dyn Reflect),
            ("age", &self.age as &dyn Reflect),
            ("email", &self.email as &dyn Reflect),
            ("tags", &self.tags as &dyn Reflect),
        ]
    }
}

impl Reflect for User {
    fn reflect(&self) -> View<'_> {
        View::Struct(self)
    }
}

impl FromValue for User {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        let mut members = into_members(value)?;
        Ok(Self {
            name: take_member(&mut members, "name")?,
            age: take_member(&mut members, "age")?,
            email: take_member(&mut members, "email")?,
            tags: take_member(&mut members, "tags")?,
        })
    }
}

/// An amount of money in minor units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Money {
    /// Amount in cents.
    pub cents: i64,
    /// ISO currency code.
    pub currency: String,
}

impl Contract for Money {
    fn describe() -> TypeDesc {
        TypeDesc::new("Money", crate::Shape::Opaque)
    }
}

impl Reflect for Money {
    fn reflect(&self) -> View<'_> {
        View::Custom(self)
    }
}

impl FromValue for Money {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Custom(custom) => custom
                .downcast_ref::<Money>()
                .cloned()
                .ok_or_else(|| ValueError::mismatch("Money", &Value::Custom(custom.clone()))),
            other => Err(ValueError::mismatch("Money", &other)),
        }
    }
}

/// The `money` format: `"12.34 USD"` on the wire, [`Money`] in memory.
#[must_use]
pub fn money_format() -> FnFormat {
    FnFormat::new(
        "money",
        |raw| {
            let (amount, currency) = raw
                .split_once(' ')
                .ok_or_else(|| FormatError::new(format!("'{raw}' is not '<amount> <currency>'")))?;
            let (units, cents) = amount.split_once('.').unwrap_or((amount, "0"));
            let units: i64 = units
                .parse()
                .map_err(|_| FormatError::new(format!("invalid amount '{amount}'")))?;
            let cents: i64 = format!("{cents:0<2}")
                .get(..2)
                .and_then(|c| c.parse().ok())
                .ok_or_else(|| FormatError::new(format!("invalid amount '{amount}'")))?;
            let sign = if amount.starts_with('-') { -1 } else { 1 };
            Ok(Value::Custom(CustomValue::new(Money {
                cents: units * 100 + sign * cents,
                currency: currency.to_string(),
            })))
        },
        |value| match value.reflect() {
            View::Custom(any) => any
                .downcast_ref::<Money>()
                .map(|m| {
                    let sign = if m.cents < 0 { "-" } else { "" };
                    let abs = m.cents.unsigned_abs();
                    format!("{sign}{}.{:02} {}", abs / 100, abs % 100, m.currency)
                })
                .ok_or_else(|| FormatError::new("value is not Money")),
            other => Err(FormatError::new(format!(
                "cannot encode {} as money",
                other.type_name()
            ))),
        },
    )
}

/// Request contract for `createUser`: header, query, path and body.
#[must_use]
pub fn create_user_request() -> TypeDesc {
    TypeDesc::record(
        "CreateUserRequest",
        vec![
            FieldDesc::new(
                "header",
                TypeDesc::record(
                    "CreateUserHeader",
                    vec![FieldDesc::of::<String>("request_id")
                        .wire("x-request-id")
                        .rules("required,uuid")],
                ),
            ),
            FieldDesc::new(
                "query",
                TypeDesc::record(
                    "CreateUserQuery",
                    vec![
                        FieldDesc::of::<bool>("dry_run").wire("dry_run"),
                        FieldDesc::of::<u32>("limit").default_literal("10").rules("max=100"),
                    ],
                ),
            ),
            FieldDesc::new(
                "path",
                TypeDesc::record(
                    "CreateUserPath",
                    vec![FieldDesc::of::<u64>("org_id").rules("required")],
                ),
            ),
            FieldDesc::of::<User>("body"),
        ],
    )
}

/// Response contract for `createUser`'s `Created` variant.
#[must_use]
pub fn create_user_response() -> TypeDesc {
    TypeDesc::record(
        "CreateUserCreated",
        vec![
            FieldDesc::new(
                "header",
                TypeDesc::record(
                    "CreateUserCreatedHeader",
                    vec![FieldDesc::of::<String>("location").wire("Location").rules("required")],
                ),
            ),
            FieldDesc::of::<User>("body"),
        ],
    )
}
