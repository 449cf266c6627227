//! Shape tags shared by the compiler and the per-request walks.
//!
//! Every compiled rule carries a [`Kind`] and a [`Format`]; the binder and
//! the encoder dispatch on these tags only and never look at contract type
//! descriptions again.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Structural kind of a compiled field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    /// UTF-8 string.
    String,
    /// Boolean.
    Bool,
    /// Signed integer.
    Int,
    /// Unsigned integer.
    Uint,
    /// Floating point number.
    Float,
    /// Record with named members.
    Struct,
    /// Ordered sequence.
    Slice,
    /// String-keyed map.
    Map,
    /// Optional indirection. The compiler flattens pointers into their
    /// pointee, so compiled rules never carry this kind.
    Pointer,
    /// Any JSON value, bound as-is.
    Interface,
    /// Unsupported type, skipped by every walk.
    Invalid,
}

impl Kind {
    /// Returns `true` for kinds that are a single scalar on the wire.
    #[must_use]
    pub const fn is_primitive(self) -> bool {
        matches!(
            self,
            Self::String | Self::Bool | Self::Int | Self::Uint | Self::Float
        )
    }

    /// Returns `true` for numeric kinds.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::Uint | Self::Float)
    }

    /// Returns the lowercase name of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Uint => "uint",
            Self::Float => "float",
            Self::Struct => "struct",
            Self::Slice => "slice",
            Self::Map => "map",
            Self::Pointer => "pointer",
            Self::Interface => "interface",
            Self::Invalid => "invalid",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic refinement of a [`Kind`].
///
/// Formats drive special-case coercion and encoding: timestamps are parsed
/// with a layout, cookies bind the whole header token, and custom formats
/// delegate to a registered [`FormatSpec`](crate::FormatSpec).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Format {
    /// No refinement.
    #[default]
    None,
    /// Date-time, parsed and rendered with `layout` (chrono syntax) or
    /// RFC 3339 when no layout is declared.
    Timestamp {
        /// Optional `strftime`-style layout.
        layout: Option<String>,
    },
    /// Structured cookie.
    Cookie,
    /// Custom format registered under this id.
    Custom(String),
}

impl Format {
    /// Returns `true` unless this is [`Format::None`].
    #[must_use]
    pub fn is_special(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Returns the name used in documentation projections.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::None => None,
            Self::Timestamp { .. } => Some("date-time"),
            Self::Cookie => Some("cookie"),
            Self::Custom(id) => Some(id),
        }
    }
}

/// Where a piece of request or response data travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    /// HTTP headers.
    Header,
    /// Cookies from the `Cookie` header.
    Cookie,
    /// URL query string.
    Query,
    /// Path parameters.
    Path,
    /// Message body.
    Body,
}

impl Location {
    /// All locations in binding order.
    pub const ALL: [Self; 5] = [
        Self::Header,
        Self::Cookie,
        Self::Query,
        Self::Path,
        Self::Body,
    ];

    /// Returns the lowercase name, which is also the member name a request
    /// contract uses for this location.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Cookie => "cookie",
            Self::Query => "query",
            Self::Path => "path",
            Self::Body => "body",
        }
    }

    /// Resolves a contract member name (case-insensitive) to a location.
    #[must_use]
    pub fn from_member(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|loc| loc.as_str().eq_ignore_ascii_case(name))
    }

    /// Returns `true` for locations whose values are strings on the wire.
    #[must_use]
    pub const fn is_transport(self) -> bool {
        !matches!(self, Self::Body)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Binding an incoming request.
    Request,
    /// Encoding an outgoing response.
    Response,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request => f.write_str("request"),
            Self::Response => f.write_str("response"),
        }
    }
}
