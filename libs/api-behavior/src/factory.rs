//! Invalid model state response factory

use std::fmt;
use std::sync::Arc;

use problem_details::ValidationProblemDetails;

use crate::context::{ActionContext, ActionResult};

type ResponseFn = dyn Fn(&ActionContext) -> ActionResult + Send + Sync;

/// Converts a request with invalid model state into the response sent back.
///
/// Cloning shares the underlying function; identity is observable via
/// [`InvalidModelStateResponseFactory::ptr_eq`].
#[derive(Clone)]
pub struct InvalidModelStateResponseFactory(Arc<ResponseFn>);

impl InvalidModelStateResponseFactory {
    #[must_use]
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&ActionContext) -> ActionResult + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn invoke(&self, ctx: &ActionContext) -> ActionResult {
        (self.0)(ctx)
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// 400 carrying the raw model state map.
    #[must_use]
    pub fn serializable_error() -> Self {
        Self::new(|ctx| ActionResult::bad_request(&ctx.model_state))
    }

    /// 400 carrying a validation problem details body.
    #[must_use]
    pub fn validation_problem() -> Self {
        Self::new(|ctx| {
            let problem = ValidationProblemDetails::new(ctx.model_state.errors().clone())
                .finalize(&ctx.path, ctx.trace_id.as_deref());
            ActionResult::validation_problem(&problem)
        })
    }

    /// Default used by a freshly constructed policy.
    #[must_use]
    pub fn default_for(use_problem_details: bool) -> Self {
        if use_problem_details {
            Self::validation_problem()
        } else {
            Self::serializable_error()
        }
    }
}

impl fmt::Debug for InvalidModelStateResponseFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("InvalidModelStateResponseFactory")
            .finish_non_exhaustive()
    }
}
