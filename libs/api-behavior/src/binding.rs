//! Advisory binding source rules.
//!
//! The binding layer decides where parameter values are read from; these
//! helpers only report what the policy implies.

use serde::{Deserialize, Serialize};

use crate::options::ApiBehaviorOptions;

/// Content type implied by form-bound file parameters.
pub const MULTIPART_FORM_DATA: &str = "multipart/form-data";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingSource {
    Path,
    Form,
    Body,
    Query,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    /// Scalars and other values convertible from a single string.
    Simple,
    /// Structured types read as a whole.
    Complex,
    FormFile,
    FormFileCollection,
}

/// What the binding layer knows about one action parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDescriptor {
    pub name: String,
    pub kind: ParameterKind,
    /// Set when the route template has a segment with this parameter's name.
    pub in_route: bool,
    /// Source declared explicitly on the parameter, if any.
    pub explicit_source: Option<BindingSource>,
}

impl ParameterDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            kind,
            in_route: false,
            explicit_source: None,
        }
    }

    #[must_use]
    pub fn in_route(mut self) -> Self {
        self.in_route = true;
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: BindingSource) -> Self {
        self.explicit_source = Some(source);
        self
    }

    fn effective_source(&self, options: &ApiBehaviorOptions) -> Option<BindingSource> {
        self.explicit_source
            .or_else(|| infer_binding_source(options, self))
    }
}

/// Source implied for `param`, or `None` when inference is suppressed or the
/// parameter already declares one.
#[must_use]
pub fn infer_binding_source(
    options: &ApiBehaviorOptions,
    param: &ParameterDescriptor,
) -> Option<BindingSource> {
    if options.suppress_infer_binding_sources_for_parameters() || param.explicit_source.is_some() {
        return None;
    }
    let source = if param.in_route {
        BindingSource::Path
    } else {
        match param.kind {
            ParameterKind::FormFile | ParameterKind::FormFileCollection => BindingSource::Form,
            ParameterKind::Complex => BindingSource::Body,
            ParameterKind::Simple => BindingSource::Query,
        }
    };
    Some(source)
}

/// `multipart/form-data` when any parameter binds from the form and the
/// constraint is not suppressed.
#[must_use]
pub fn form_file_consumes_constraint(
    options: &ApiBehaviorOptions,
    params: &[ParameterDescriptor],
) -> Option<&'static str> {
    if options.suppress_consumes_constraint_for_form_file_parameters() {
        return None;
    }
    params
        .iter()
        .any(|p| p.effective_source(options) == Some(BindingSource::Form))
        .then_some(MULTIPART_FORM_DATA)
}
