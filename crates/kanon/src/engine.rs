//! The [`Engine`]: registries, compiler and runtime components in one place.

use std::fmt;
use std::sync::Arc;

use kanon_config::KanonConfig;
use kanon_core::{ContractError, FormatRegistry, FormatSpec, RuleBuilder, RuleRegistry};
use kanon_extract::{BindOptions, Binder, BodyCodec, CodecRegistry, EncodeOptions, Encoder};
use kanon_schema::{OperationContract, SchemaCompiler, StatusRegistry};
use tracing::debug;

use crate::operation::Operation;

/// Runtime state shared by every operation an engine registers.
pub(crate) struct Shared {
    pub(crate) binder: Binder,
    pub(crate) encoder: Encoder,
    pub(crate) codecs: CodecRegistry,
    pub(crate) statuses: StatusRegistry,
    pub(crate) config: KanonConfig,
}

/// Compiles operation contracts and hands out [`Operation`]s that bind
/// requests and encode responses.
///
/// Rule and format registries are frozen when the engine is built, so every
/// operation compiled by one engine sees the same rules.
///
/// # Example
///
/// ```
/// use kanon::{Engine, OperationContract};
/// use kanon_core::fixtures;
///
/// let engine = Engine::builder().build();
/// let operation = engine
///     .register(
///         OperationContract::new("createUser")
///             .request_desc(fixtures::create_user_request())
///             .response_desc("Created", fixtures::create_user_response()),
///     )
///     .unwrap();
/// assert_eq!(operation.id(), "createUser");
/// ```
#[derive(Clone)]
pub struct Engine {
    compiler: SchemaCompiler,
    rules: Arc<RuleRegistry>,
    shared: Arc<Shared>,
}

impl Engine {
    /// Creates a builder with the built-in rules, JSON and form codecs, the
    /// default status mapping and default configuration.
    #[must_use]
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Creates an engine from a loaded configuration with built-in
    /// registries.
    #[must_use]
    pub fn from_config(config: KanonConfig) -> Self {
        Self::builder().config(config).build()
    }

    /// Compiles `contract` into an [`Operation`].
    ///
    /// # Errors
    ///
    /// Returns `ContractError::Schema` when the contract cannot be compiled.
    pub fn register(&self, contract: OperationContract) -> Result<Operation, ContractError> {
        let rules = self.compiler.compile_operation(&contract)?;
        debug!(
            operation_id = contract.operation_id(),
            variants = rules.variants().count(),
            "operation registered"
        );
        Ok(Operation::new(rules, Arc::clone(&self.shared)))
    }

    /// Configuration in effect.
    #[must_use]
    pub fn config(&self) -> &KanonConfig {
        &self.shared.config
    }

    /// Registered body codecs.
    #[must_use]
    pub fn codecs(&self) -> &CodecRegistry {
        &self.shared.codecs
    }

    /// Status code to variant mapping.
    #[must_use]
    pub fn statuses(&self) -> &StatusRegistry {
        &self.shared.statuses
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("rules", &self.rules)
            .field("codecs", &self.shared.codecs)
            .field("config", &self.shared.config)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Engine`].
pub struct EngineBuilder {
    config: KanonConfig,
    rules: RuleRegistry,
    formats: FormatRegistry,
    codecs: CodecRegistry,
    statuses: StatusRegistry,
}

impl EngineBuilder {
    /// Creates a builder with built-in registries.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: KanonConfig::default(),
            rules: RuleRegistry::new(),
            formats: FormatRegistry::new(),
            codecs: CodecRegistry::new(),
            statuses: StatusRegistry::default(),
        }
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: KanonConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers a validation rule, replacing any built-in of the same name.
    #[must_use]
    pub fn rule(mut self, name: impl Into<String>, builder: impl RuleBuilder + 'static) -> Self {
        self.rules.register(name, builder);
        self
    }

    /// Registers a custom `spec:<id>` format.
    #[must_use]
    pub fn format(mut self, spec: impl FormatSpec + 'static) -> Self {
        self.formats.register(spec);
        self
    }

    /// Appends a body codec after the built-in ones.
    #[must_use]
    pub fn codec(mut self, codec: impl BodyCodec + 'static) -> Self {
        self.codecs.register(codec);
        self
    }

    /// Replaces the codec registry.
    #[must_use]
    pub fn codecs(mut self, codecs: CodecRegistry) -> Self {
        self.codecs = codecs;
        self
    }

    /// Maps a status code to a response variant name.
    #[must_use]
    pub fn status(mut self, status: u16, variant: impl Into<String>) -> Self {
        self.statuses.register(status, variant);
        self
    }

    /// Builds the engine.
    #[must_use]
    pub fn build(self) -> Engine {
        let codec = &self.config.codec;
        let binder = Binder::new(BindOptions {
            max_body_bytes: codec.max_body_bytes,
            max_depth: codec.max_depth,
            max_array_items: codec.max_array_items,
            validate: self.config.validation.validate_requests,
        });
        let encoder = Encoder::new(
            EncodeOptions {
                validate: self.config.validation.validate_responses,
                max_depth: codec.max_depth,
            },
            codec.pool_capacity,
        );
        let rules = Arc::new(self.rules);
        let compiler = SchemaCompiler::new(Arc::clone(&rules), Arc::new(self.formats));
        Engine {
            compiler,
            rules,
            shared: Arc::new(Shared {
                binder,
                encoder,
                codecs: self.codecs,
                statuses: self.statuses,
                config: self.config,
            }),
        }
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
