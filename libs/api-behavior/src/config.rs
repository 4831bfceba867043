//! Loading [`ApiBehaviorOptions`] from host configuration.
//!
//! Sections follow the `modules.<name>.config` layout. Loading is lenient: a
//! missing module, a non-object module value or a missing `config` section all
//! yield default options. A `config` section that is present must be valid.

use std::collections::BTreeMap;

use http::StatusCode;
use problem_details::ProblemDetails;
use serde::Deserialize;

use crate::catalog::ProblemDetailsFactory;
use crate::error::ConfigError;
use crate::options::ApiBehaviorOptions;
use crate::switches::CompatibilityVersion;

/// Provider of module-specific configuration (raw JSON sections only).
pub trait ConfigProvider: Send + Sync {
    /// Returns raw JSON section for the module, if any.
    fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value>;
}

/// Problem template declared in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientErrorTemplate {
    #[serde(rename = "type")]
    pub type_url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

impl ClientErrorTemplate {
    fn into_factory(self, status: StatusCode) -> ProblemDetailsFactory {
        ProblemDetailsFactory::new(move |_| {
            let mut p = ProblemDetails::new(status).with_type(self.type_url.as_str());
            p.title.clone_from(&self.title);
            p.detail.clone_from(&self.detail);
            p
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiBehaviorConfig {
    pub compatibility_version: CompatibilityVersion,
    pub suppress_model_state_invalid_filter: bool,
    pub suppress_infer_binding_sources_for_parameters: bool,
    pub suppress_consumes_constraint_for_form_file_parameters: bool,
    /// Explicit override; the version-derived default applies when absent.
    pub allow_use_problem_details_for_client_error_responses: Option<bool>,
    /// Catalog entries to add or replace, keyed by status code.
    pub client_errors: BTreeMap<u16, ClientErrorTemplate>,
    /// Catalog entries to drop. Applied after `client_errors`.
    pub remove_client_errors: Vec<u16>,
}

impl ApiBehaviorConfig {
    /// Build options from this configuration.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidStatusCode`] for a catalog key outside 100..=999.
    pub fn into_options(self) -> Result<ApiBehaviorOptions, ConfigError> {
        let mut options = ApiBehaviorOptions::new(self.compatibility_version);
        options.set_suppress_model_state_invalid_filter(self.suppress_model_state_invalid_filter);
        options.set_suppress_infer_binding_sources_for_parameters(
            self.suppress_infer_binding_sources_for_parameters,
        );
        options.set_suppress_consumes_constraint_for_form_file_parameters(
            self.suppress_consumes_constraint_for_form_file_parameters,
        );
        if let Some(allow) = self.allow_use_problem_details_for_client_error_responses {
            options.set_allow_use_problem_details_for_client_error_responses(allow);
        }

        let catalog = options.problem_details_factory_mut();
        for (code, template) in self.client_errors {
            let status = status_code(code)?;
            catalog.set(status, template.into_factory(status));
        }
        for code in self.remove_client_errors {
            catalog.remove(status_code(code)?);
        }
        Ok(options)
    }
}

fn status_code(code: u16) -> Result<StatusCode, ConfigError> {
    StatusCode::from_u16(code).map_err(|_| ConfigError::InvalidStatusCode { code })
}

impl ApiBehaviorOptions {
    /// Lenient loader for the `module_name` section of `provider`.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidConfig`] if the config section exists but
    /// cannot be deserialized, or [`ConfigError::InvalidStatusCode`] if it
    /// names an impossible status code.
    pub fn from_provider(
        provider: &dyn ConfigProvider,
        module_name: &str,
    ) -> Result<Self, ConfigError> {
        let Some(config_section) = provider
            .get_module_config(module_name)
            .and_then(serde_json::Value::as_object)
            .and_then(|obj| obj.get("config"))
        else {
            tracing::debug!(module = module_name, "no api behavior config, using defaults");
            return Ok(Self::default());
        };

        let config: ApiBehaviorConfig = serde_json::from_value(config_section.clone())
            .map_err(|e| ConfigError::InvalidConfig {
                module: module_name.to_owned(),
                source: e,
            })?;
        tracing::debug!(
            module = module_name,
            version = %config.compatibility_version,
            "loaded api behavior config"
        );
        config.into_options()
    }
}
