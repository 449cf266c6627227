//! Error types for Kanon.
//!
//! Walk failures are reported as [`ValidationError`]s carrying the
//! direction, location, dotted field path and rule name. A failed walk
//! yields [`ValidationErrors`], which the transport layer receives wrapped
//! in a [`ContractError`].
//!
//! | `ContractError` | Status | Code |
//! |---|---|---|
//! | `Request` | 400 | `REQUEST_VALIDATION_FAILED` |
//! | `Response` | 500 | `RESPONSE_VALIDATION_FAILED` |
//! | `UnsupportedMediaType` | 415 | `UNSUPPORTED_MEDIA_TYPE` |
//! | `PayloadTooLarge` | 413 | `PAYLOAD_TOO_LARGE` |
//! | `NoResponseRules` | 500 | `NO_RESPONSE_RULES` |
//! | `Schema` | 500 | `SCHEMA_ERROR` |
//! | `Internal` | 500 | `INTERNAL_ERROR` |

use std::fmt;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Direction, Location};

/// Rule names used for failures that are not produced by a registered
/// validator.
pub mod rule_names {
    /// Value absent or zero where mandatory.
    pub const REQUIRED: &str = "required";
    /// Value could not be coerced to the declared kind.
    pub const TYPE_CAST: &str = "typeCast";
    /// Structural shape mismatch.
    pub const TYPE_MISMATCH: &str = "typeMismatch";
    /// Collection bound exceeded.
    pub const MAX: &str = "max";
    /// Number does not fit the declared width.
    pub const RANGE_ERROR: &str = "rangeError";
    /// A hook panicked during the walk.
    pub const PANIC: &str = "panic";
}

/// Result type alias using [`ContractError`].
pub type ContractResult<T> = Result<T, ContractError>;

/// A single failure found while binding or encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Walk direction.
    pub direction: Direction,
    /// Location the field belongs to.
    pub location: Location,
    /// Dotted path including numeric indices, e.g. `items.0.name`.
    pub field_path: String,
    /// Name of the failing rule.
    pub rule: String,
    /// Human-readable cause.
    pub cause: String,
}

impl ValidationError {
    /// Creates a validation error.
    #[must_use]
    pub fn new(
        direction: Direction,
        location: Location,
        field_path: impl Into<String>,
        rule: impl Into<String>,
        cause: impl Into<String>,
    ) -> Self {
        Self {
            direction,
            location,
            field_path: field_path.into(),
            rule: rule.into(),
            cause: cause.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.direction, self.location, self.cause)?;
        if !self.field_path.is_empty() {
            write!(f, " at {}", self.field_path)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// An ordered list of validation failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one failure.
    pub fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    /// Appends every failure from `other`.
    pub fn extend(&mut self, other: ValidationErrors) {
        self.0.extend(other.0);
    }

    /// Returns `true` if there are no failures.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of failures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over the failures in the order they were found.
    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }

    /// Returns `true` if any failure was raised by `rule`.
    #[must_use]
    pub fn has_rule(&self, rule: &str) -> bool {
        self.0.iter().any(|e| e.rule == rule)
    }

    /// Returns `Ok(())` when empty, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Consumes the list.
    #[must_use]
    pub fn into_vec(self) -> Vec<ValidationError> {
        self.0
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        Self(vec![error])
    }
}

impl From<Vec<ValidationError>> for ValidationErrors {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self(errors)
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Errors raised while compiling a contract into rule trees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A `spec:<id>` annotation names a format that was never registered.
    #[error("unknown format spec '{id}' at {field_path}")]
    UnknownFormat {
        /// The unregistered id.
        id: String,
        /// Field carrying the annotation.
        field_path: String,
    },

    /// A default literal does not coerce to its field's kind.
    #[error("invalid default '{literal}' at {field_path}: {reason}")]
    InvalidDefault {
        /// The literal.
        literal: String,
        /// Field carrying the default.
        field_path: String,
        /// Coercion failure.
        reason: String,
    },

    /// A request or response member must be a record.
    #[error("{location} contract '{type_name}' is not a record")]
    NotARecord {
        /// Location member name.
        location: String,
        /// Declared type name.
        type_name: String,
    },

    /// The top-level contract is not a record of locations.
    #[error("contract '{type_name}' must be a record of header/cookie/query/path/body members")]
    InvalidContract {
        /// Declared type name.
        type_name: String,
    },

    /// A registered rule rejected its options.
    #[error("invalid options for rule '{rule}' at {field_path}: {reason}")]
    InvalidRule {
        /// Rule name.
        rule: String,
        /// Field carrying the rule.
        field_path: String,
        /// Builder failure.
        reason: String,
    },
}

/// Transport-facing error returned by binding and encoding.
#[derive(Debug, Error)]
pub enum ContractError {
    /// The request did not satisfy its contract.
    #[error("{0}")]
    Request(ValidationErrors),

    /// The handler's response did not satisfy its own contract.
    #[error("{0}")]
    Response(ValidationErrors),

    /// No registered body codec accepts the content type.
    #[error("unsupported media type '{content_type}'")]
    UnsupportedMediaType {
        /// The offending content type.
        content_type: String,
    },

    /// The body is larger than the configured limit.
    #[error("payload of {size} bytes exceeds limit of {limit} bytes")]
    PayloadTooLarge {
        /// Body size.
        size: usize,
        /// Configured limit.
        limit: usize,
    },

    /// No response variant matches the status code.
    #[error("no matching response rules for status code {status}")]
    NoResponseRules {
        /// Status code.
        status: u16,
    },

    /// Compilation failed.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Unexpected failure inside the walk.
    #[error("internal error: {message}")]
    Internal {
        /// Description.
        message: String,
    },
}

impl ContractError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns the direction this error belongs to.
    #[must_use]
    pub const fn direction(&self) -> Option<Direction> {
        match self {
            Self::Request(_) | Self::UnsupportedMediaType { .. } | Self::PayloadTooLarge { .. } => {
                Some(Direction::Request)
            }
            Self::Response(_) | Self::NoResponseRules { .. } => Some(Direction::Response),
            Self::Schema(_) | Self::Internal { .. } => None,
        }
    }

    /// Returns the validation failures, if any.
    #[must_use]
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Request(errors) | Self::Response(errors) => Some(errors),
            _ => None,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Request(_) => StatusCode::BAD_REQUEST,
            Self::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Response(_)
            | Self::NoResponseRules { .. }
            | Self::Schema(_)
            | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Request(_) => "REQUEST_VALIDATION_FAILED",
            Self::Response(_) => "RESPONSE_VALIDATION_FAILED",
            Self::UnsupportedMediaType { .. } => "UNSUPPORTED_MEDIA_TYPE",
            Self::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            Self::NoResponseRules { .. } => "NO_RESPONSE_RULES",
            Self::Schema(_) => "SCHEMA_ERROR",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Converts this error to a serializable error envelope.
    ///
    /// Response-side failures are server defects, so their details are not
    /// exposed to clients.
    #[must_use]
    pub fn to_envelope(&self, request_id: Option<&str>) -> ErrorEnvelope {
        let (message, details) = match self {
            Self::Request(errors) => (self.to_string(), serde_json::to_value(errors).ok()),
            Self::Response(_) | Self::Schema(_) | Self::Internal { .. } => {
                ("internal server error".to_string(), None)
            }
            _ => (self.to_string(), None),
        };
        ErrorEnvelope {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message,
                details,
            },
            request_id: request_id.map(ToString::to_string),
        }
    }
}

/// Serializable error envelope for HTTP responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// The error details.
    pub error: ErrorDetail,
    /// The request ID for correlation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Error detail within an envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Per-field failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query_error(path: &str, rule: &str, cause: &str) -> ValidationError {
        ValidationError::new(Direction::Request, Location::Query, path, rule, cause)
    }

    #[test]
    fn test_display_includes_path() {
        let error = query_error("user_id", "oneof", "given value '29' not supported");
        assert_eq!(
            error.to_string(),
            "request query: given value '29' not supported at user_id"
        );
    }

    #[test]
    fn test_display_omits_empty_path() {
        let error = ValidationError::new(
            Direction::Request,
            Location::Body,
            "",
            rule_names::REQUIRED,
            "request body is required",
        );
        assert_eq!(error.to_string(), "request body: request body is required");
    }

    #[test]
    fn test_errors_join() {
        let mut errors = ValidationErrors::new();
        errors.push(query_error("a", "required", "value is required"));
        errors.push(query_error("b", "required", "value is required"));
        assert_eq!(
            errors.to_string(),
            "request query: value is required at a; request query: value is required at b"
        );
        assert!(errors.has_rule("required"));
        assert!(!errors.has_rule("max"));
    }

    #[test]
    fn test_status_mapping() {
        let request = ContractError::Request(query_error("a", "required", "x").into());
        assert_eq!(request.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(request.error_code(), "REQUEST_VALIDATION_FAILED");
        assert_eq!(request.direction(), Some(Direction::Request));

        let missing = ContractError::NoResponseRules { status: 418 };
        assert_eq!(missing.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            missing.to_string(),
            "no matching response rules for status code 418"
        );

        let media = ContractError::UnsupportedMediaType {
            content_type: "text/csv".into(),
        };
        assert_eq!(media.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[test]
    fn test_envelope_hides_response_details() {
        let response = ContractError::Response(
            ValidationError::new(Direction::Response, Location::Body, "id", "required", "x")
                .into(),
        );
        let envelope = response.to_envelope(Some("req-1"));
        assert_eq!(envelope.error.code, "RESPONSE_VALIDATION_FAILED");
        assert!(envelope.error.details.is_none());

        let request = ContractError::Request(query_error("a", "required", "x").into());
        assert!(request.to_envelope(None).error.details.is_some());
    }
}
