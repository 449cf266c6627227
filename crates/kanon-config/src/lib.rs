//! Typed configuration for Kanon.
//!
//! - TOML and JSON configuration files
//! - `.env` files and `PREFIX__SECTION__KEY` environment overrides
//! - Strict validation (unknown fields are rejected)
//!
//! # Example
//!
//! ```no_run
//! use kanon_config::ConfigLoader;
//!
//! # fn main() -> Result<(), kanon_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_defaults()
//!     .with_file("kanon.toml")?
//!     .with_env_prefix("KANON")
//!     .load()?;
//!
//! println!("bodies are capped at {} bytes", config.codec.max_body_bytes);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [codec]
//! max_body_bytes = 1048576
//! max_depth = 64
//! max_array_items = 10000
//! pool_capacity = 32
//!
//! [validation]
//! validate_requests = true
//! validate_responses = true
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```
//!
//! # Environment Variable Overrides
//!
//! - `KANON__CODEC__MAX_DEPTH=32`
//! - `KANON__VALIDATION__VALIDATE_RESPONSES=false`
//! - `KANON__LOGGING__FORMAT=pretty`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::{KanonConfig, KanonConfigBuilder};
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{CodecConfig, LogFormat, LoggingConfig, ValidationConfig};
