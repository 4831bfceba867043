//! Error-response policy for HTTP API services
//!
//! [`ApiBehaviorOptions`] is configured once at startup and then shared
//! read-only with request-handling middleware. It owns:
//! - compatibility switches with version-derived defaults (`CompatibilitySwitches`)
//! - the invalid model state response factory (`InvalidModelStateResponseFactory`)
//! - the status code keyed problem details catalog (`ProblemDetailsCatalog`)
//! - flags consumed by the external validation and binding layers
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod binding;
pub mod catalog;
pub mod config;
pub mod context;
pub mod error;
pub mod factory;
pub mod options;
pub mod switches;

pub use binding::{
    BindingSource, MULTIPART_FORM_DATA, ParameterDescriptor, ParameterKind,
    form_file_consumes_constraint, infer_binding_source,
};
pub use catalog::{ProblemDetailsCatalog, ProblemDetailsFactory};
pub use config::{ApiBehaviorConfig, ClientErrorTemplate, ConfigProvider};
pub use context::{ActionContext, ActionResult, ModelState};
pub use error::ConfigError;
pub use factory::InvalidModelStateResponseFactory;
pub use options::{ALLOW_USE_PROBLEM_DETAILS_FOR_CLIENT_ERROR_RESPONSES, ApiBehaviorOptions};
pub use switches::{CompatibilitySwitch, CompatibilitySwitches, CompatibilityVersion, SwitchId};

pub use problem_details::{ProblemDetails, ValidationProblemDetails};
