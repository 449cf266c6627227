//! The top-level [`KanonConfig`] and its builder.

use serde::{Deserialize, Serialize};

use crate::{CodecConfig, ConfigError, LogFormat, LoggingConfig, ValidationConfig};

/// Complete Kanon engine configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use kanon_config::KanonConfig;
///
/// let config = KanonConfig::default();
/// assert!(config.validation.validate_requests);
/// assert_eq!(config.codec.max_depth, 64);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct KanonConfig {
    /// Body codec limits.
    #[serde(default)]
    pub codec: CodecConfig,

    /// Request and response validation switches.
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl KanonConfig {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```
    /// use kanon_config::{CodecConfig, KanonConfig};
    ///
    /// let config = KanonConfig::builder()
    ///     .codec(CodecConfig {
    ///         max_depth: 16,
    ///         ..Default::default()
    ///     })
    ///     .build();
    ///
    /// assert_eq!(config.codec.max_depth, 16);
    /// ```
    #[must_use]
    pub fn builder() -> KanonConfigBuilder {
        KanonConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a codec limit is zero or the
    /// log level is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.codec.max_body_bytes == 0 {
            return Err(ConfigError::invalid_value(
                "codec.max_body_bytes",
                "must be greater than 0",
            ));
        }

        if self.codec.max_depth == 0 {
            return Err(ConfigError::invalid_value("codec.max_depth", "must be at least 1"));
        }

        if self.codec.max_array_items == 0 {
            return Err(ConfigError::invalid_value(
                "codec.max_array_items",
                "must be greater than 0",
            ));
        }

        if self.logging.enabled && self.logging.level.trim().is_empty() {
            return Err(ConfigError::invalid_value("logging.level", "must not be empty"));
        }

        Ok(())
    }

    /// Create a development configuration preset.
    ///
    /// Pretty, colored debug logs. Response validation stays on so contract
    /// bugs surface while developing.
    ///
    /// # Example
    ///
    /// ```
    /// use kanon_config::KanonConfig;
    ///
    /// let config = KanonConfig::development();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();

        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.ansi_enabled = true;
        config.logging.include_location = true;

        config
    }

    /// Create a production configuration preset.
    ///
    /// JSON logs at info level with both directions validated.
    ///
    /// # Example
    ///
    /// ```
    /// use kanon_config::{KanonConfig, LogFormat};
    ///
    /// let config = KanonConfig::production();
    /// assert_eq!(config.logging.format, LogFormat::Json);
    /// ```
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();

        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config.logging.ansi_enabled = false;

        config.validation.validate_requests = true;
        config.validation.validate_responses = true;

        config
    }
}

/// Builder for [`KanonConfig`].
#[derive(Debug, Default)]
pub struct KanonConfigBuilder {
    config: KanonConfig,
}

impl KanonConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the codec section.
    #[must_use]
    pub fn codec(mut self, codec: CodecConfig) -> Self {
        self.config.codec = codec;
        self
    }

    /// Set the validation section.
    #[must_use]
    pub fn validation(mut self, validation: ValidationConfig) -> Self {
        self.config.validation = validation;
        self
    }

    /// Set the logging section.
    #[must_use]
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.config.logging = logging;
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> KanonConfig {
        self.config
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if validation fails.
    pub fn build_validated(self) -> Result<KanonConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(KanonConfig::default().validate().is_ok());
        assert!(KanonConfig::development().validate().is_ok());
        assert!(KanonConfig::production().validate().is_ok());
    }

    #[test]
    fn test_zero_depth_rejected() {
        let config = KanonConfig::builder()
            .codec(CodecConfig {
                max_depth: 0,
                ..Default::default()
            })
            .build();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("codec.max_depth"));
    }

    #[test]
    fn test_empty_level_rejected_only_when_enabled() {
        let mut logging = LoggingConfig {
            level: " ".to_string(),
            ..Default::default()
        };
        let result = KanonConfig::builder().logging(logging.clone()).build_validated();
        assert!(result.is_err());

        logging.enabled = false;
        assert!(KanonConfig::builder().logging(logging).build_validated().is_ok());
    }

    #[test]
    fn test_development_preset() {
        let config = KanonConfig::development();
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.logging.include_location);
        assert!(config.validation.validate_responses);
    }

    #[test]
    fn test_serde_roundtrip_through_toml() {
        let config = KanonConfig::development();
        let text = toml::to_string(&config).unwrap();
        let back: KanonConfig = toml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
}
