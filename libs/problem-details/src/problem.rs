//! RFC 7807 Problem Details for HTTP APIs (pure data model, no HTTP framework dependencies)

use std::collections::BTreeMap;

use http::StatusCode;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Content type for Problem Details as per RFC 7807.
pub const APPLICATION_PROBLEM_JSON: &str = "application/problem+json";

/// Type URI used when a problem carries no more specific classification.
pub const ABOUT_BLANK: &str = "about:blank";

/// Extension member carrying the request trace identifier.
pub const TRACE_ID_EXTENSION: &str = "traceId";

/// Title used for validation problems produced from invalid model state.
pub const VALIDATION_PROBLEM_TITLE: &str = "One or more validation errors occurred.";

/// Standard members an extension may not shadow.
pub const RESERVED_MEMBERS: &[&str] = &["type", "title", "status", "detail", "instance"];

/// Member holding field errors in [`ValidationProblemDetails`].
const ERRORS_MEMBER: &str = "errors";

fn deserialize_status_code<'de, D>(deserializer: D) -> Result<StatusCode, D::Error>
where
    D: Deserializer<'de>,
{
    let code = u16::deserialize(deserializer)?;
    StatusCode::from_u16(code).map_err(serde::de::Error::custom)
}

/// RFC 7807 Problem Details for HTTP APIs.
///
/// Values are produced fresh for every request and are never shared between
/// requests, so callers may mutate them freely before rendering.
///
/// Extensions are written inline next to the standard members; an extension
/// whose name collides with a standard member is never written.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[must_use]
pub struct ProblemDetails {
    /// A URI reference that identifies the problem type.
    #[serde(rename = "type")]
    pub type_url: String,
    /// A short, human-readable summary of the problem type.
    #[serde(default)]
    pub title: Option<String>,
    /// The HTTP status code for this occurrence of the problem.
    #[serde(deserialize_with = "deserialize_status_code")]
    pub status: StatusCode,
    /// A human-readable explanation specific to this occurrence of the problem.
    #[serde(default)]
    pub detail: Option<String>,
    /// A URI reference that identifies the specific occurrence of the problem.
    #[serde(default)]
    pub instance: Option<String>,
    /// Extension members, serialized inline next to the standard members.
    #[serde(flatten)]
    pub extensions: BTreeMap<String, Value>,
}

impl ProblemDetails {
    /// Create a bare problem for `status` with the `about:blank` type.
    pub fn new(status: StatusCode) -> Self {
        Self {
            type_url: ABOUT_BLANK.to_owned(),
            title: None,
            status,
            detail: None,
            instance: None,
            extensions: BTreeMap::new(),
        }
    }

    pub fn with_type(mut self, type_url: impl Into<String>) -> Self {
        self.type_url = type_url.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_instance(mut self, uri: impl Into<String>) -> Self {
        self.instance = Some(uri.into());
        self
    }

    /// Add an extension member. Names of standard members are ignored.
    pub fn with_extension(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if RESERVED_MEMBERS.contains(&key.as_str()) {
            tracing::warn!(extension = %key, "ignoring extension shadowing a standard member");
            return self;
        }
        self.extensions.insert(key, value.into());
        self
    }

    /// Attach request-specific context before the problem is rendered.
    ///
    /// An instance already set by the template is left untouched.
    pub fn finalize(mut self, instance: &str, trace_id: Option<&str>) -> Self {
        if self.instance.is_none() && !instance.is_empty() {
            self.instance = Some(instance.to_owned());
        }
        if let Some(tid) = trace_id {
            self.extensions
                .insert(TRACE_ID_EXTENSION.to_owned(), Value::from(tid));
        }
        self
    }

    #[must_use]
    pub fn trace_id(&self) -> Option<&str> {
        self.extensions
            .get(TRACE_ID_EXTENSION)
            .and_then(Value::as_str)
    }

    fn serialize_members<M: SerializeMap>(
        &self,
        map: &mut M,
        also_reserved: &[&str],
    ) -> Result<(), M::Error> {
        map.serialize_entry("type", &self.type_url)?;
        if let Some(title) = &self.title {
            map.serialize_entry("title", title)?;
        }
        map.serialize_entry("status", &self.status.as_u16())?;
        if let Some(detail) = &self.detail {
            map.serialize_entry("detail", detail)?;
        }
        if let Some(instance) = &self.instance {
            map.serialize_entry("instance", instance)?;
        }
        for (key, value) in &self.extensions {
            let key = key.as_str();
            if RESERVED_MEMBERS.contains(&key) || also_reserved.contains(&key) {
                continue;
            }
            map.serialize_entry(key, value)?;
        }
        Ok(())
    }
}

impl Serialize for ProblemDetails {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        self.serialize_members(&mut map, &[])?;
        map.end()
    }
}

/// Problem details enriched with per-field validation messages.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct ValidationProblemDetails {
    pub problem: ProblemDetails,
    /// Field path to the messages reported for it.
    pub errors: BTreeMap<String, Vec<String>>,
}

impl Serialize for ValidationProblemDetails {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        self.problem.serialize_members(&mut map, &[ERRORS_MEMBER])?;
        map.serialize_entry(ERRORS_MEMBER, &self.errors)?;
        map.end()
    }
}

impl ValidationProblemDetails {
    /// Create a 400 validation problem from the collected field errors.
    pub fn new(errors: BTreeMap<String, Vec<String>>) -> Self {
        let problem = crate::defs::BAD_REQUEST
            .as_problem()
            .with_title(VALIDATION_PROBLEM_TITLE);
        // the generic client-error detail does not describe a validation failure
        let problem = ProblemDetails {
            detail: None,
            ..problem
        };
        Self { problem, errors }
    }

    pub fn finalize(mut self, instance: &str, trace_id: Option<&str>) -> Self {
        self.problem = self.problem.finalize(instance, trace_id);
        self
    }
}
