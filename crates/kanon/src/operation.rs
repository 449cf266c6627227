//! A registered operation and its per-request entry points.

use std::fmt;
use std::sync::Arc;

use kanon_core::{ContractError, FromValue, Location, Reflect, Value};
use kanon_extract::{EncodedResponse, RequestData};
use kanon_schema::SchemaRuleSet;
use kanon_telemetry::metrics;
use tracing::{debug, error};

use crate::engine::Shared;

/// One compiled operation.
///
/// Owns its [`SchemaRuleSet`] for its whole lifetime. Cloning is cheap and
/// clones share the rules and the engine's runtime, so an operation can be
/// handed to any number of concurrent request handlers.
#[derive(Clone)]
pub struct Operation {
    rules: Arc<SchemaRuleSet>,
    shared: Arc<Shared>,
}

impl Operation {
    pub(crate) fn new(rules: SchemaRuleSet, shared: Arc<Shared>) -> Self {
        Self {
            rules: Arc::new(rules),
            shared,
        }
    }

    /// Operation id.
    #[must_use]
    pub fn id(&self) -> &str {
        self.rules.operation_id()
    }

    /// Compiled rules.
    #[must_use]
    pub fn rules(&self) -> &SchemaRuleSet {
        &self.rules
    }

    /// Validates `request` and binds every declared location.
    ///
    /// The result is a record keyed by location member name (`header`,
    /// `query`, `body`, ...).
    pub fn bind(&self, request: &RequestData) -> Result<Value, ContractError> {
        self.walk_request(request, true)
    }

    /// Validates `request` and converts the bound record into `T`.
    ///
    /// `T` should be the type the operation was registered with. A bound
    /// record that does not convert means `T` disagrees with the compiled
    /// contract, which is reported as an internal error.
    pub fn bind_into<T: FromValue>(&self, request: &RequestData) -> Result<T, ContractError> {
        let value = self.bind(request)?;
        T::from_value(value).map_err(|e| {
            ContractError::internal(format!(
                "bound request does not convert for operation '{}': {e}",
                self.id()
            ))
        })
    }

    /// Validates `request` without producing a value.
    pub fn validate(&self, request: &RequestData) -> Result<(), ContractError> {
        self.walk_request(request, false).map(|_| ())
    }

    /// Validates and encodes a handler's `value` for `status`.
    ///
    /// The response variant is resolved from `status`; the body codec is
    /// negotiated from `accept`, falling back to the first registered codec.
    pub fn encode_response(
        &self,
        status: u16,
        value: &dyn Reflect,
        accept: Option<&str>,
    ) -> Result<EncodedResponse, ContractError> {
        let result = self.encode(status, value, accept);
        if let Err(err) = &result {
            metrics::record_response_failure(self.id());
            error!(
                operation_id = self.id(),
                status,
                error = %err,
                "response does not satisfy its contract"
            );
        }
        result
    }

    fn walk_request(&self, request: &RequestData, should_bind: bool) -> Result<Value, ContractError> {
        let shared = &self.shared;
        let result = shared.binder.bind_request(
            self.rules.request(),
            request,
            &shared.codecs,
            should_bind,
        );
        if let Err(err) = &result {
            let location = failure_location(err);
            metrics::record_request_failure(self.id(), location.as_str());
            debug!(
                operation_id = self.id(),
                location = %location,
                error = %err,
                "request rejected"
            );
        }
        result
    }

    fn encode(
        &self,
        status: u16,
        value: &dyn Reflect,
        accept: Option<&str>,
    ) -> Result<EncodedResponse, ContractError> {
        let shared = &self.shared;
        let (variant, rules) = self.rules.response_for_status(status, &shared.statuses)?;
        let codec = shared
            .codecs
            .negotiate(accept)
            .ok_or_else(|| ContractError::internal("no body codec registered"))?;
        debug!(operation_id = self.id(), status, variant, codec = codec.name(), "encoding response");
        shared
            .encoder
            .encode_response(rules, value, codec.as_ref())
            .map_err(ContractError::Response)
    }
}

fn failure_location(err: &ContractError) -> Location {
    err.validation_errors()
        .and_then(|errors| errors.iter().next())
        .map_or(Location::Body, |first| first.location)
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("id", &self.id())
            .field("variants", &self.rules.variants().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
