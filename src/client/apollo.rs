use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use crate::basic::dto::{ConfigDocument, Dimension, GroupedConfigDocument};
use crate::basic::error::ConfError;
use crate::basic::json::ConfJson;
use crate::basic::result::ConfResult;
use crate::basic::uri::ConfUri;
use crate::client::{ConfChangeListener, ConfClient, ConfErrorHandler, ConfWatchHandle};
use crate::config::config_dto::ConfClientConfig;
use crate::web::web_client::{ConfHttpRequest, ConfTransport, Method};

pub const APOLLO_NAME: &str = "apollo";

/// Body returned by `GET /configs/{appId}/{cluster}/{namespace}`.
#[derive(Deserialize, Serialize, Clone, Debug, Default)]
#[serde(default)]
pub struct ApolloConfigResp {
    #[serde(rename = "appId")]
    pub app_id: String,
    pub cluster: String,
    #[serde(rename = "namespaceName")]
    pub namespace_name: String,
    pub configurations: ConfigDocument,
    #[serde(rename = "releaseKey")]
    pub release_key: String,
}

/// Client of an Apollo config service.
///
/// The app, cluster and namespace come from the options, so the dimension passed
/// to the pull operations is ignored.
pub struct ApolloClient {
    config: ConfClientConfig,
    transport: Arc<dyn ConfTransport>,
    url: String,
}

impl ApolloClient {
    pub fn new(config: ConfClientConfig, transport: Arc<dyn ConfTransport>) -> ConfResult<ApolloClient> {
        if config.server_uri.trim().is_empty() {
            return Err(ConfError::FormatError("[ConfSource.Apollo] server uri can not be empty".to_string()));
        }
        let server_uri = ConfUri.validate(config.server_uri.trim())?;
        let app_id = if config.apollo.app_id.is_empty() { &config.service_name } else { &config.apollo.app_id };
        let url = format!("{}/configs/{}/{}/{}", server_uri, app_id, config.apollo.cluster_name, config.apollo.namespace);
        debug!("[ConfSource.Apollo] Initialized with {}", url);
        Ok(ApolloClient { config, transport, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn fetch(&self) -> ConfResult<ApolloConfigResp> {
        let response = self.transport.execute(ConfHttpRequest::new(Method::GET, self.url.clone())).await.map_err(|error| {
            error!("[ConfSource.Apollo] Error in Querying the Response from Apollo: {}", error);
            error
        })?;
        if response.code != 200 {
            error!("[ConfSource.Apollo] Bad Response from Apollo Server {}", response.code);
            return Err(ConfError::BadStatus(response.code, format!("Bad Response from Apollo Server {}", response.code)));
        }
        ConfJson.str_to_obj::<ApolloConfigResp>(&response.body).map_err(|error| {
            error!("[ConfSource.Apollo] Error in Unmarshalling the Response from Apollo: {}", error);
            error
        })
    }
}

#[async_trait]
impl ConfClient for ApolloClient {
    fn name(&self) -> &'static str {
        APOLLO_NAME
    }

    fn options(&self) -> &ConfClientConfig {
        &self.config
    }

    async fn pull_configs(&self, _: &Dimension) -> ConfResult<ConfigDocument> {
        let resp = self.fetch().await?;
        debug!("[ConfSource.Apollo] Pulled {} configurations, release {}", resp.configurations.len(), resp.release_key);
        Ok(resp.configurations)
    }

    async fn pull_config(&self, _: &Dimension, key: &str) -> ConfResult<Option<Value>> {
        let mut resp = self.fetch().await?;
        match resp.configurations.remove(key) {
            Some(value) => Ok(Some(value)),
            None => {
                error!("[ConfSource.Apollo] No Key found : {}", key);
                Err(ConfError::KeyNotFound(format!("No Key found : {key}")))
            }
        }
    }

    async fn pull_configs_by_di(&self, _: &str) -> ConfResult<GroupedConfigDocument> {
        Ok(GroupedConfigDocument::new())
    }

    async fn push_configs(&self, _: ConfigDocument, _: &Dimension) -> ConfResult<ConfigDocument> {
        Err(ConfError::NotImplemented("[ConfSource.Apollo] push configs is not supported".to_string()))
    }

    async fn delete_configs_by_keys(&self, _: &[String], _: &Dimension) -> ConfResult<ConfigDocument> {
        Err(ConfError::NotImplemented("[ConfSource.Apollo] delete configs is not supported".to_string()))
    }

    async fn watch(&self, _: ConfChangeListener, _: ConfErrorHandler) -> ConfResult<ConfWatchHandle> {
        Err(ConfError::NotImplemented("[ConfSource.Apollo] watch is not supported".to_string()))
    }
}
