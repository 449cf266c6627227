//! # Kanon
//!
//! **A compile-once contract engine for HTTP operations.**
//!
//! Declare what an operation accepts and returns as plain Rust types, compile
//! that description once, then on every request:
//!
//! - coerce and validate headers, cookies, query, path and body against it,
//!   binding them into a typed value
//! - validate the handler's output against the matching response variant
//!   while serializing it straight into wire bytes
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use kanon::prelude::*;
//!
//! #[derive(Debug, Contract)]
//! struct CreateUserRequest {
//!     body: NewUser,
//! }
//!
//! #[derive(Debug, Contract)]
//! struct NewUser {
//!     #[kanon(rules = "required,min=2")]
//!     name: String,
//!     #[kanon(default = "25")]
//!     age: u8,
//! }
//!
//! let engine = Engine::builder().build();
//! let create_user = engine.register(
//!     OperationContract::new("createUser")
//!         .request::<CreateUserRequest>()
//!         .response::<CreateUserCreated>("Created"),
//! )?;
//!
//! let input: CreateUserRequest = create_user.bind_into(&request)?;
//! let encoded = create_user.encode_response(201, &output, accept)?;
//! ```
//!
//! The derive expands to paths under `kanon_core`, so crates deriving
//! `Contract` depend on `kanon-core` as well.
//!
//! ## Architecture
//!
//! ```text
//! OperationContract ─► SchemaCompiler ─► SchemaRuleSet (immutable, shared)
//!                                             │
//! RequestData ─► Binder ─► Value ─► handler ─► Encoder ─► EncodedResponse
//! ```

#![doc(html_root_url = "https://docs.rs/kanon/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod engine;
mod operation;

pub use engine::{Engine, EngineBuilder};
pub use operation::Operation;

// Re-export the member crates
pub use kanon_config as config;
pub use kanon_core as core;
pub use kanon_extract as extract;
pub use kanon_schema as schema;
pub use kanon_telemetry as telemetry;

pub use kanon_core::{Contract, ContractError, FromValue, Reflect, ValidationError, ValidationErrors, Value};
pub use kanon_extract::{EncodedResponse, RequestData};
pub use kanon_schema::{OperationContract, SchemaRuleSet};

// Re-export the derive macro
pub use kanon_macros::Contract;

/// Installs logging from `config` and describes the failure counters.
///
/// Call once at startup, after the metrics recorder (if any) is installed.
///
/// # Errors
///
/// Returns an error if the log filter is invalid or a global subscriber is
/// already set.
pub fn init_telemetry(config: &kanon_config::KanonConfig) -> Result<(), kanon_telemetry::TelemetryError> {
    kanon_telemetry::init_logging(&config.logging.to_log_config())?;
    kanon_telemetry::metrics::describe_metrics();
    Ok(())
}

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use kanon::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{Engine, EngineBuilder, Operation};

    pub use kanon_config::{ConfigLoader, KanonConfig};
    pub use kanon_core::{
        Contract, ContractError, FieldDesc, FromValue, Location, Reflect, TypeDesc,
        ValidationError, ValidationErrors, Value,
    };
    pub use kanon_extract::{BodyCodec, CodecRegistry, EncodedResponse, RequestData};
    pub use kanon_macros::Contract;
    pub use kanon_schema::{OperationContract, SchemaRuleSet, StatusRegistry};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_telemetry_disabled_logging() {
        let mut config = kanon_config::KanonConfig::default();
        config.logging.enabled = false;
        assert!(init_telemetry(&config).is_ok());
    }

    #[test]
    fn test_init_telemetry_rejects_bad_filter() {
        let mut config = kanon_config::KanonConfig::default();
        config.logging.level = "kanon=[".to_string();
        assert!(init_telemetry(&config).is_err());
    }
}
