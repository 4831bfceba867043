//! API behavior options: the policy request-handling middleware consults.
//!
//! Built and mutated during startup, then frozen behind an [`Arc`] and read
//! concurrently by every request. Nothing here blocks or performs I/O.

use std::sync::Arc;

use http::StatusCode;
use problem_details::ProblemDetails;

use crate::catalog::ProblemDetailsCatalog;
use crate::context::{ActionContext, ActionResult};
use crate::error::ConfigError;
use crate::factory::InvalidModelStateResponseFactory;
use crate::switches::{CompatibilitySwitch, CompatibilitySwitches, CompatibilityVersion, SwitchId};

/// Name of the switch backing
/// [`ApiBehaviorOptions::allow_use_problem_details_for_client_error_responses`].
pub const ALLOW_USE_PROBLEM_DETAILS_FOR_CLIENT_ERROR_RESPONSES: &str =
    "AllowUseProblemDetailsForClientErrorResponses";

fn problem_details_by_default(version: CompatibilityVersion) -> bool {
    version >= CompatibilityVersion::Version2_2
}

#[derive(Clone, Debug)]
enum ResponseFactorySlot {
    /// Built-in factory; follows the problem details switch.
    Default(InvalidModelStateResponseFactory),
    /// Supplied by the host; never replaced implicitly.
    Custom(InvalidModelStateResponseFactory),
}

impl ResponseFactorySlot {
    fn get(&self) -> &InvalidModelStateResponseFactory {
        match self {
            Self::Default(f) | Self::Custom(f) => f,
        }
    }
}

/// Options governing how invalid requests and client error statuses are turned
/// into responses.
#[derive(Clone, Debug)]
pub struct ApiBehaviorOptions {
    switches: CompatibilitySwitches,
    allow_problem_details: SwitchId,
    response_factory: ResponseFactorySlot,
    problem_details_factory: ProblemDetailsCatalog,
    suppress_model_state_invalid_filter: bool,
    suppress_infer_binding_sources_for_parameters: bool,
    suppress_consumes_constraint_for_form_file_parameters: bool,
}

impl Default for ApiBehaviorOptions {
    fn default() -> Self {
        Self::new(CompatibilityVersion::default())
    }
}

impl ApiBehaviorOptions {
    /// Create options whose switch defaults are derived from `version`.
    #[must_use]
    pub fn new(version: CompatibilityVersion) -> Self {
        let mut switches = CompatibilitySwitches::new(version);
        let allow_problem_details = switches.register(
            ALLOW_USE_PROBLEM_DETAILS_FOR_CLIENT_ERROR_RESPONSES,
            problem_details_by_default,
        );
        let response_factory = ResponseFactorySlot::Default(
            InvalidModelStateResponseFactory::default_for(
                switches.value(allow_problem_details) == Some(true),
            ),
        );
        Self {
            switches,
            allow_problem_details,
            response_factory,
            problem_details_factory: ProblemDetailsCatalog::default(),
            suppress_model_state_invalid_filter: false,
            suppress_infer_binding_sources_for_parameters: false,
            suppress_consumes_constraint_for_form_file_parameters: false,
        }
    }

    #[must_use]
    pub fn compatibility_version(&self) -> CompatibilityVersion {
        self.switches.version()
    }

    #[must_use]
    pub fn invalid_model_state_response_factory(&self) -> &InvalidModelStateResponseFactory {
        self.response_factory.get()
    }

    /// Replace the invalid model state response factory.
    ///
    /// # Errors
    /// Returns [`ConfigError::NullResponseFactory`] when `factory` is `None`;
    /// the current factory is kept in that case.
    pub fn set_invalid_model_state_response_factory(
        &mut self,
        factory: Option<InvalidModelStateResponseFactory>,
    ) -> Result<(), ConfigError> {
        let Some(factory) = factory else {
            tracing::warn!("rejected null invalid model state response factory");
            return Err(ConfigError::NullResponseFactory);
        };
        tracing::debug!("invalid model state response factory replaced");
        self.response_factory = ResponseFactorySlot::Custom(factory);
        Ok(())
    }

    #[must_use]
    pub fn with_invalid_model_state_response_factory<F>(mut self, f: F) -> Self
    where
        F: Fn(&ActionContext) -> ActionResult + Send + Sync + 'static,
    {
        tracing::debug!("invalid model state response factory replaced");
        self.response_factory =
            ResponseFactorySlot::Custom(InvalidModelStateResponseFactory::new(f));
        self
    }

    /// When `true`, requests with invalid model state are not short-circuited
    /// and the handler deals with them itself.
    #[must_use]
    pub fn suppress_model_state_invalid_filter(&self) -> bool {
        self.suppress_model_state_invalid_filter
    }

    pub fn set_suppress_model_state_invalid_filter(&mut self, value: bool) {
        self.suppress_model_state_invalid_filter = value;
    }

    /// When `true`, binding sources are not inferred for parameters.
    ///
    /// Otherwise route values bind from the path, form files from the form,
    /// complex types from the body and everything else from the query.
    #[must_use]
    pub fn suppress_infer_binding_sources_for_parameters(&self) -> bool {
        self.suppress_infer_binding_sources_for_parameters
    }

    pub fn set_suppress_infer_binding_sources_for_parameters(&mut self, value: bool) {
        self.suppress_infer_binding_sources_for_parameters = value;
    }

    /// When `true`, form-bound parameters do not add a `multipart/form-data`
    /// consumes constraint to their endpoint.
    #[must_use]
    pub fn suppress_consumes_constraint_for_form_file_parameters(&self) -> bool {
        self.suppress_consumes_constraint_for_form_file_parameters
    }

    pub fn set_suppress_consumes_constraint_for_form_file_parameters(&mut self, value: bool) {
        self.suppress_consumes_constraint_for_form_file_parameters = value;
    }

    #[must_use]
    pub fn allow_use_problem_details_for_client_error_responses(&self) -> bool {
        // the handle is registered on this registry in `new`
        self.switches.value(self.allow_problem_details) == Some(true)
    }

    pub fn set_allow_use_problem_details_for_client_error_responses(&mut self, value: bool) {
        let before = self.allow_use_problem_details_for_client_error_responses();
        self.switches.set_value(self.allow_problem_details, value);
        self.refresh_default_factory(before);
    }

    /// Override a switch by name. Returns `false` for an unknown name.
    pub fn set_switch(&mut self, name: &str, value: bool) -> bool {
        let before = self.allow_use_problem_details_for_client_error_responses();
        let known = self.switches.set(name, value);
        if known {
            self.refresh_default_factory(before);
        }
        known
    }

    #[must_use]
    pub fn switches(&self) -> &CompatibilitySwitches {
        &self.switches
    }

    #[must_use]
    pub fn problem_details_factory(&self) -> &ProblemDetailsCatalog {
        &self.problem_details_factory
    }

    pub fn problem_details_factory_mut(&mut self) -> &mut ProblemDetailsCatalog {
        &mut self.problem_details_factory
    }

    /// Response to short-circuit with, or `None` to let the request through.
    #[must_use]
    pub fn invalid_model_state_result(&self, ctx: &ActionContext) -> Option<ActionResult> {
        if self.suppress_model_state_invalid_filter || ctx.model_state.is_valid() {
            return None;
        }
        tracing::debug!(
            path = %ctx.path,
            errors = ctx.model_state.error_count(),
            "short-circuiting request with invalid model state"
        );
        Some(self.invalid_model_state_response_factory().invoke(ctx))
    }

    /// Problem body for a bare client error status, finalized for `ctx`.
    ///
    /// `None` when problem details are disabled or no factory covers `status`;
    /// the caller decides what to render instead.
    #[must_use]
    pub fn client_error_problem(
        &self,
        status: StatusCode,
        ctx: &ActionContext,
    ) -> Option<ProblemDetails> {
        if !self.allow_use_problem_details_for_client_error_responses() {
            return None;
        }
        self.problem_details_factory
            .create(status, ctx)
            .map(|p| p.finalize(&ctx.path, ctx.trace_id.as_deref()))
    }

    /// Mark the end of configuration and share the options read-only.
    #[must_use]
    pub fn freeze(self) -> Arc<Self> {
        tracing::debug!(
            version = %self.compatibility_version(),
            problem_details = self.allow_use_problem_details_for_client_error_responses(),
            suppress_model_state_invalid_filter = self.suppress_model_state_invalid_filter,
            catalog_entries = self.problem_details_factory.len(),
            "api behavior options frozen"
        );
        Arc::new(self)
    }

    /// Rebuild the built-in factory if the problem details switch flipped.
    fn refresh_default_factory(&mut self, before: bool) {
        let now = self.allow_use_problem_details_for_client_error_responses();
        if now != before && matches!(self.response_factory, ResponseFactorySlot::Default(_)) {
            self.response_factory =
                ResponseFactorySlot::Default(InvalidModelStateResponseFactory::default_for(now));
        }
    }
}

impl<'a> IntoIterator for &'a ApiBehaviorOptions {
    type Item = &'a CompatibilitySwitch;
    type IntoIter = std::slice::Iter<'a, CompatibilitySwitch>;

    fn into_iter(self) -> Self::IntoIter {
        self.switches.iter()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use problem_details::APPLICATION_PROBLEM_JSON;

    fn invalid_ctx() -> ActionContext {
        ActionContext::new("/users/7")
            .with_trace_id("req-1")
            .with_error("email", "Email is required")
    }

    #[test]
    fn defaults() {
        let options = ApiBehaviorOptions::default();
        assert_eq!(options.compatibility_version(), CompatibilityVersion::Version2_0);
        assert!(!options.suppress_model_state_invalid_filter());
        assert!(!options.suppress_infer_binding_sources_for_parameters());
        assert!(!options.suppress_consumes_constraint_for_form_file_parameters());
        assert!(!options.allow_use_problem_details_for_client_error_responses());
        assert_eq!(options.problem_details_factory().len(), 3);
    }

    #[test]
    fn problem_details_default_on_from_2_2() {
        assert!(
            !ApiBehaviorOptions::new(CompatibilityVersion::Version2_1)
                .allow_use_problem_details_for_client_error_responses()
        );
        assert!(
            ApiBehaviorOptions::new(CompatibilityVersion::Version2_2)
                .allow_use_problem_details_for_client_error_responses()
        );
    }

    #[test]
    fn null_factory_is_rejected_and_previous_kept() {
        let mut options = ApiBehaviorOptions::default();
        let before = options.invalid_model_state_response_factory().clone();

        let err = options
            .set_invalid_model_state_response_factory(None)
            .unwrap_err();
        assert!(matches!(err, ConfigError::NullResponseFactory));
        assert!(options.invalid_model_state_response_factory().ptr_eq(&before));
    }

    #[test]
    fn factory_round_trip_preserves_identity() {
        let mut options = ApiBehaviorOptions::default();
        let factory = InvalidModelStateResponseFactory::new(|_| {
            ActionResult::json(StatusCode::UNPROCESSABLE_ENTITY, serde_json::Value::Null)
        });

        options
            .set_invalid_model_state_response_factory(Some(factory.clone()))
            .unwrap();
        assert!(options.invalid_model_state_response_factory().ptr_eq(&factory));

        // switch changes never replace a host factory
        options.set_allow_use_problem_details_for_client_error_responses(true);
        assert!(options.invalid_model_state_response_factory().ptr_eq(&factory));
    }

    #[test]
    fn flag_and_switch_stay_coherent() {
        let mut options = ApiBehaviorOptions::default();
        let switch_value = |o: &ApiBehaviorOptions| {
            o.switches()
                .get(ALLOW_USE_PROBLEM_DETAILS_FOR_CLIENT_ERROR_RESPONSES)
                .unwrap()
        };

        options.set_allow_use_problem_details_for_client_error_responses(true);
        assert!(switch_value(&options));

        assert!(options.set_switch(ALLOW_USE_PROBLEM_DETAILS_FOR_CLIENT_ERROR_RESPONSES, false));
        assert!(!options.allow_use_problem_details_for_client_error_responses());
        assert!(!switch_value(&options));
    }

    #[test]
    fn default_factory_identity_survives_unchanged_switch_writes() {
        let mut options = ApiBehaviorOptions::default();
        let before = options.invalid_model_state_response_factory().clone();

        options.set_allow_use_problem_details_for_client_error_responses(false);
        assert!(options.invalid_model_state_response_factory().ptr_eq(&before));
        assert!(options.set_switch(ALLOW_USE_PROBLEM_DETAILS_FOR_CLIENT_ERROR_RESPONSES, false));
        assert!(options.invalid_model_state_response_factory().ptr_eq(&before));
        assert!(!options.set_switch("NoSuchSwitch", true));
        assert!(options.invalid_model_state_response_factory().ptr_eq(&before));

        options.set_allow_use_problem_details_for_client_error_responses(true);
        let flipped = options.invalid_model_state_response_factory().clone();
        assert!(!flipped.ptr_eq(&before));

        options.set_allow_use_problem_details_for_client_error_responses(true);
        assert!(options.invalid_model_state_response_factory().ptr_eq(&flipped));
    }

    #[test]
    fn enumerates_single_switch() {
        let options = ApiBehaviorOptions::default();
        let names: Vec<_> = (&options).into_iter().map(CompatibilitySwitch::name).collect();
        assert_eq!(names, vec![ALLOW_USE_PROBLEM_DETAILS_FOR_CLIENT_ERROR_RESPONSES]);
    }

    #[test]
    fn default_factory_follows_switch() {
        let mut options = ApiBehaviorOptions::default();
        let legacy = options.invalid_model_state_result(&invalid_ctx()).unwrap();
        assert_eq!(legacy.content_type, "application/json");
        assert_eq!(legacy.body["email"][0], "Email is required");

        options.set_allow_use_problem_details_for_client_error_responses(true);
        let problem = options.invalid_model_state_result(&invalid_ctx()).unwrap();
        assert_eq!(problem.content_type, APPLICATION_PROBLEM_JSON);
        assert_eq!(problem.body["errors"]["email"][0], "Email is required");
        assert_eq!(problem.body["traceId"], "req-1");
    }

    #[test]
    fn invalid_state_filter_can_be_suppressed() {
        let mut options = ApiBehaviorOptions::default();
        assert!(options.invalid_model_state_result(&ActionContext::new("/ok")).is_none());
        assert!(options.invalid_model_state_result(&invalid_ctx()).is_some());

        options.set_suppress_model_state_invalid_filter(true);
        assert!(options.invalid_model_state_result(&invalid_ctx()).is_none());
    }

    #[test]
    fn client_error_problem_respects_switch_and_catalog() {
        let ctx = ActionContext::new("/missing").with_trace_id("t-1");
        let mut options = ApiBehaviorOptions::default();
        assert!(options.client_error_problem(StatusCode::NOT_FOUND, &ctx).is_none());

        options.set_allow_use_problem_details_for_client_error_responses(true);
        let p = options
            .client_error_problem(StatusCode::NOT_FOUND, &ctx)
            .unwrap();
        assert_eq!(p.status, StatusCode::NOT_FOUND);
        assert_eq!(p.instance.as_deref(), Some("/missing"));
        assert_eq!(p.trace_id(), Some("t-1"));

        options
            .problem_details_factory_mut()
            .remove(StatusCode::NOT_FOUND);
        assert!(options.client_error_problem(StatusCode::NOT_FOUND, &ctx).is_none());
        assert!(options.client_error_problem(StatusCode::CONFLICT, &ctx).is_none());
    }

    #[test]
    fn builder_installs_custom_factory() {
        let options = ApiBehaviorOptions::default().with_invalid_model_state_response_factory(|ctx| {
            ActionResult::json(
                StatusCode::UNPROCESSABLE_ENTITY,
                serde_json::json!({ "count": ctx.model_state.error_count() }),
            )
        });
        let result = options.invalid_model_state_result(&invalid_ctx()).unwrap();
        assert_eq!(result.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(result.body["count"], 1);
    }
}
