//! # Member discovery.
//!
//! Keeps the candidate config-center hosts of one client and dispatches requests over them.
//!
//! * [`member_registry::MemberRegistry`] owns the randomized, refreshable address list
//! * [`member_dispatcher::MemberDispatcher`] sends a request to one random host, or pulls from all hosts with failover

use serde::{Deserialize, Serialize};

use crate::basic::json::JSON_CONTENT_TYPE;
use crate::config::config_dto::{ConfCenterApiPaths, ConfClientConfig};

pub mod member_dispatcher;
pub mod member_registry;

pub const STATUS_UP: &str = "UP";
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";
pub const HEADER_USER_AGENT: &str = "User-Agent";
pub const HEADER_TENANT_NAME: &str = "X-Tenant-Name";
pub const HEADER_ENVIRONMENT: &str = "X-Environment";
pub const USER_AGENT: &str = "cse-configcenter-client/1.0.0";

/// Settings a [`member_registry::MemberRegistry`] is created with, fixed for its lifetime.
#[derive(Debug, Clone)]
pub struct MemberOptions {
    pub tenant_name: String,
    pub environment: String,
    pub enable_ssl: bool,
    pub auto_discovery: bool,
    pub api_paths: ConfCenterApiPaths,
}

impl MemberOptions {
    pub fn from_conf(conf: &ConfClientConfig) -> Self {
        MemberOptions {
            tenant_name: conf.tenant_name.clone(),
            environment: conf.env.clone(),
            enable_ssl: conf.enable_ssl,
            auto_discovery: conf.auto_discovery,
            api_paths: ConfCenterApiPaths::from_env(&conf.api_version),
        }
    }

    /// Headers sent with every request to the config center.
    pub fn default_headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![
            (HEADER_CONTENT_TYPE.to_string(), JSON_CONTENT_TYPE.to_string()),
            (HEADER_USER_AGENT.to_string(), USER_AGENT.to_string()),
            (HEADER_TENANT_NAME.to_string(), self.tenant_name.clone()),
        ];
        if !self.environment.is_empty() {
            headers.push((HEADER_ENVIRONMENT.to_string(), self.environment.clone()));
        }
        headers
    }
}

/// One live config server process, as reported by the members api.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Instance {
    pub status: String,
    #[serde(rename = "serviceName")]
    pub service_name: String,
    #[serde(rename = "isHttps")]
    pub is_https: bool,
    #[serde(rename = "endpoints")]
    pub entry_points: Vec<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Members {
    pub instances: Vec<Instance>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::config_dto::ApiVersion;

    #[test]
    fn test_default_headers() {
        let mut options = MemberOptions {
            tenant_name: "tenant-a".to_string(),
            environment: "".to_string(),
            enable_ssl: false,
            auto_discovery: false,
            api_paths: ConfCenterApiPaths::new(ApiVersion::V3, "default"),
        };
        let headers = options.default_headers();
        assert_eq!(headers.len(), 3);
        assert!(headers.contains(&(HEADER_TENANT_NAME.to_string(), "tenant-a".to_string())));
        assert!(headers.contains(&(HEADER_USER_AGENT.to_string(), USER_AGENT.to_string())));

        options.environment = "production".to_string();
        let headers = options.default_headers();
        assert!(headers.contains(&(HEADER_ENVIRONMENT.to_string(), "production".to_string())));
    }

    #[test]
    fn test_decode_members() {
        let members: Members = serde_json::from_str(
            r#"{"instances":[{"status":"UP","serviceName":"CseConfigCenter","isHttps":false,"endpoints":["rest://10.0.0.1:30103"]}]}"#,
        )
        .unwrap();
        assert_eq!(members.instances.len(), 1);
        assert_eq!(members.instances[0].status, STATUS_UP);
        assert_eq!(members.instances[0].entry_points, vec!["rest://10.0.0.1:30103".to_string()]);
    }
}
