//! Configuration section types.

use kanon_telemetry::LogConfig;
use serde::{Deserialize, Serialize};

/// Body codec limits and encoder resources.
///
/// # Example
///
/// ```
/// use kanon_config::CodecConfig;
///
/// let config = CodecConfig::default();
/// assert_eq!(config.max_body_bytes, 1024 * 1024);
/// assert_eq!(config.max_depth, 64);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CodecConfig {
    /// Largest accepted request body in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Deepest rule walk before a branch is rejected.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Most array elements probed in one slice.
    #[serde(default = "default_max_array_items")]
    pub max_array_items: usize,

    /// Encode buffers kept for reuse.
    #[serde(default = "default_pool_capacity")]
    pub pool_capacity: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: default_max_body_bytes(),
            max_depth: default_max_depth(),
            max_array_items: default_max_array_items(),
            pool_capacity: default_pool_capacity(),
        }
    }
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

fn default_max_depth() -> usize {
    64
}

fn default_max_array_items() -> usize {
    10_000
}

fn default_pool_capacity() -> usize {
    32
}

/// Which directions are validated.
///
/// Coercion of request data always runs; turning off `validate_requests`
/// skips `required` checks and validators only. With `validate_responses`
/// off the encoder still writes bytes but never rejects a handler value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ValidationConfig {
    /// Validate incoming requests.
    #[serde(default = "default_true")]
    pub validate_requests: bool,

    /// Validate outgoing responses.
    #[serde(default = "default_true")]
    pub validate_responses: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            validate_requests: true,
            validate_responses: true,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directives (trace, debug, info, warn, error, or per-target).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include ANSI color codes in output.
    #[serde(default)]
    pub ansi_enabled: bool,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            ansi_enabled: false,
            include_location: false,
        }
    }
}

impl LoggingConfig {
    /// Converts this section into the telemetry crate's logging settings.
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            json_format: self.format == LogFormat::Json,
            file_line_info: self.include_location,
            ansi: self.ansi_enabled,
            ..LogConfig::default()
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}
