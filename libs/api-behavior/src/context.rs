//! Request-side types handed to policy factories.
//!
//! These are the boundary with the host pipeline: the validation layer fills
//! [`ModelState`], the routing layer supplies the path, and whatever comes back
//! as an [`ActionResult`] is rendered by the host transport.

use std::collections::BTreeMap;

use http::StatusCode;
use problem_details::{APPLICATION_PROBLEM_JSON, ProblemDetails, ValidationProblemDetails};
use serde::Serialize;
use serde_json::Value;

/// Validation errors collected for the current request, keyed by field path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ModelState {
    errors: BTreeMap<String, Vec<String>>,
}

impl ModelState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn errors(&self) -> &BTreeMap<String, Vec<String>> {
        &self.errors
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors.values().map(Vec::len).sum()
    }
}

/// Per-request context passed to every factory.
#[derive(Debug, Clone, Default)]
pub struct ActionContext {
    pub path: String,
    pub trace_id: Option<String>,
    pub model_state: ModelState,
}

impl ActionContext {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    #[must_use]
    pub fn with_model_state(mut self, model_state: ModelState) -> Self {
        self.model_state = model_state;
        self
    }

    #[must_use]
    pub fn with_error(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.model_state.add_error(field, message);
        self
    }
}

/// Response representation returned to the host pipeline.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct ActionResult {
    pub status: StatusCode,
    pub body: Value,
    pub content_type: &'static str,
}

impl ActionResult {
    pub fn json(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body,
            content_type: "application/json",
        }
    }

    pub fn problem(problem: &ProblemDetails) -> Self {
        Self {
            status: problem.status,
            body: to_body(problem),
            content_type: APPLICATION_PROBLEM_JSON,
        }
    }

    pub fn validation_problem(problem: &ValidationProblemDetails) -> Self {
        Self {
            status: problem.problem.status,
            body: to_body(problem),
            content_type: APPLICATION_PROBLEM_JSON,
        }
    }

    /// Legacy 400 body: the serialized model state map.
    pub fn bad_request(model_state: &ModelState) -> Self {
        Self::json(StatusCode::BAD_REQUEST, to_body(model_state))
    }
}

fn to_body<T: Serialize>(value: &T) -> Value {
    // String-keyed maps and plain structs always serialize to a JSON value.
    serde_json::to_value(value).unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to serialize response body");
        Value::Null
    })
}
