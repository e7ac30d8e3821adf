use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::basic::dto::Dimension;
use crate::basic::error::ConfError;

/// Environment variable holding the project the v3 api paths are scoped to.
pub const ENV_PROJECT_ID: &str = "CSE_PROJECT_ID";
pub const DEFAULT_PROJECT_ID: &str = "default";

/// Configuration of a configuration source client.
///
/// The same structure feeds every backend, each one reads the fields it needs.
///
/// # Examples
/// ```ignore
/// use confsource::config::config_dto::ConfClientConfig;
/// let config = ConfClientConfig::builder()
///     .server_uri("http://10.0.0.1:30103,http://10.0.0.2:30103")
///     .service_name("billing")
///     .app("shop")
///     .build();
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, TypedBuilder)]
#[serde(default)]
pub struct ConfClientConfig {
    /// Server address, several config-center addresses are separated by `,`
    #[builder(default, setter(into))]
    pub server_uri: String,
    #[builder(default, setter(into))]
    pub service_name: String,
    #[builder(default, setter(into))]
    pub version: String,
    #[builder(default, setter(into))]
    pub app: String,
    /// Environment, sent as `X-Environment` when not empty
    #[builder(default, setter(into))]
    pub env: String,
    #[builder(default = "default".to_string(), setter(into))]
    pub tenant_name: String,
    #[builder(default)]
    pub enable_ssl: bool,
    /// Skip certificate verification, for test environments only
    #[builder(default)]
    pub accept_invalid_certs: bool,
    /// `v2` or `v3`, anything else falls back to `v3`
    #[builder(default, setter(into))]
    pub api_version: String,
    /// Re-query the members api of the known hosts before each dispatch
    #[builder(default)]
    pub auto_discovery: bool,
    /// Port of the config center websocket refresh endpoint, `watch` polls when empty
    #[builder(default, setter(into))]
    pub refresh_port: String,
    /// Poll period of `watch` when no refresh port is set
    #[builder(default = 5)]
    pub refresh_interval_sec: u64,
    #[builder(default = 60)]
    pub connect_timeout_sec: u64,
    #[builder(default = 60)]
    pub request_timeout_sec: u64,
    #[builder(default)]
    pub apollo: ApolloConfig,
    #[builder(default)]
    pub kie: KieConfig,
}

impl Default for ConfClientConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ConfClientConfig {
    /// Dimension described by the service labels of this configuration.
    pub fn default_dimension(&self) -> Dimension {
        Dimension::new(&self.service_name, &self.version, &self.app, &self.env)
    }
}

/// Apollo specific configuration.
#[derive(Debug, Serialize, Deserialize, Clone, TypedBuilder)]
#[serde(default)]
pub struct ApolloConfig {
    #[builder(default, setter(into))]
    pub app_id: String,
    #[builder(default = "default".to_string(), setter(into))]
    pub cluster_name: String,
    #[builder(default = "application".to_string(), setter(into))]
    pub namespace: String,
}

impl Default for ApolloConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Servicecomb-kie specific configuration.
#[derive(Debug, Serialize, Deserialize, Clone, Default, TypedBuilder)]
#[serde(default)]
pub struct KieConfig {
    /// Project the key-values live in, the service name of the dimension when absent
    #[builder(default, setter(strip_option, into))]
    pub project: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiVersion {
    V2,
    V3,
}

impl FromStr for ApiVersion {
    type Err = ConfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "v2" => ApiVersion::V2,
            _ => ApiVersion::V3,
        })
    }
}

/// Api paths of the config center, they depend on the api version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfCenterApiPaths {
    pub members: String,
    pub config: String,
    pub refresh: String,
}

impl ConfCenterApiPaths {
    pub fn new(api_version: ApiVersion, project_id: &str) -> Self {
        match api_version {
            ApiVersion::V2 => ConfCenterApiPaths {
                members: "/members".to_string(),
                config: "/configuration/v2/items".to_string(),
                refresh: "/configuration/v2/refresh/items".to_string(),
            },
            ApiVersion::V3 => ConfCenterApiPaths {
                members: format!("/v3/{project_id}/configuration/members"),
                config: format!("/v3/{project_id}/configuration/items"),
                refresh: format!("/v3/{project_id}/configuration/refresh/items"),
            },
        }
    }

    /// Build the paths taking the project from [`ENV_PROJECT_ID`].
    pub fn from_env(api_version: &str) -> Self {
        let project_id = env::var(ENV_PROJECT_ID).unwrap_or_else(|_| DEFAULT_PROJECT_ID.to_string());
        let api_version = ApiVersion::from_str(api_version).unwrap_or(ApiVersion::V3);
        Self::new(api_version, &project_id)
    }
}
