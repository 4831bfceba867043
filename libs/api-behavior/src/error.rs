/// Configuration error raised while the API behavior policy is being set up.
///
/// All variants surface during startup; request handling never produces them.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("invalid model state response factory must not be null")]
    NullResponseFactory,
    #[error("invalid api behavior config for module '{module}': {source}")]
    InvalidConfig {
        module: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid status code {code} in problem details catalog config")]
    InvalidStatusCode { code: u16 },
}
