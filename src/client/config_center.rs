use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, trace};
use url::Url;

use crate::basic::dto::{encode_dimension_info, ConfigDocument, Dimension, GroupedConfigDocument};
use crate::basic::error::ConfError;
use crate::basic::json::ConfJson;
use crate::basic::result::ConfResult;
use crate::basic::uri::ConfUri;
use crate::client::{ConfChangeListener, ConfClient, ConfErrorHandler, ConfWatchHandle};
use crate::config::config_dto::ConfClientConfig;
use crate::member::member_dispatcher::MemberDispatcher;
use crate::member::member_registry::MemberRegistry;
use crate::member::MemberOptions;
use crate::web::web_client::{ConfTransport, Method};
#[cfg(feature = "ws-client")]
use crate::web::ws_client::ConfWSClient;

pub const CONFIG_CENTER_NAME: &str = "config_center";

#[derive(Serialize)]
struct CreateConfigApi<'a> {
    #[serde(rename = "dimensionsInfo")]
    dimensions_info: String,
    items: &'a ConfigDocument,
}

#[derive(Serialize)]
struct DeleteConfigApi<'a> {
    #[serde(rename = "dimensionsInfo")]
    dimensions_info: String,
    keys: &'a [String],
}

/// Client of the config center, dispatching over the discovered members.
pub struct ConfigCenterClient {
    config: ConfClientConfig,
    dispatcher: MemberDispatcher,
    default_dimension: Dimension,
}

impl ConfigCenterClient {
    pub fn new(config: ConfClientConfig, transport: Arc<dyn ConfTransport>) -> ConfResult<ConfigCenterClient> {
        let servers = ConfUri.split_server_uri(&config.server_uri);
        if servers.is_empty() {
            return Err(ConfError::FormatError("[ConfSource.ConfigCenter] server uri can not be empty".to_string()));
        }
        let default_dimension = config.default_dimension();
        default_dimension.to_dimension_info().map_err(|error| {
            error!("[ConfSource.ConfigCenter] Generate default dimension failed: {}", error);
            error
        })?;
        let registry = Arc::new(MemberRegistry::new(MemberOptions::from_conf(&config), transport));
        registry.initialize(&servers)?;
        info!(
            "[ConfSource.ConfigCenter] Initialized with servers {:?}, api version {}, auto discovery {}",
            servers,
            if config.api_version.is_empty() { "v3" } else { config.api_version.as_str() },
            config.auto_discovery
        );
        Ok(ConfigCenterClient {
            config,
            dispatcher: MemberDispatcher::new(registry),
            default_dimension,
        })
    }

    pub fn dispatcher(&self) -> &MemberDispatcher {
        &self.dispatcher
    }

    fn config_path(&self) -> &str {
        &self.dispatcher.registry().options().api_paths.config
    }

    fn pull_path(&self, dimension_info: &str) -> String {
        format!("{}?dimensionsInfo={}", self.config_path(), encode_dimension_info(dimension_info))
    }
}

#[async_trait]
impl ConfClient for ConfigCenterClient {
    fn name(&self) -> &'static str {
        CONFIG_CENTER_NAME
    }

    fn options(&self) -> &ConfClientConfig {
        &self.config
    }

    async fn pull_configs(&self, dimension: &Dimension) -> ConfResult<ConfigDocument> {
        let dimension_info = dimension.to_dimension_info()?;
        self.dispatcher.pull_all_hosts_flat(&self.pull_path(&dimension_info)).await
    }

    async fn pull_config(&self, dimension: &Dimension, key: &str) -> ConfResult<Option<Value>> {
        let mut document = self.pull_configs(dimension).await?;
        match document.remove(key) {
            Some(value) => Ok(Some(value)),
            None => {
                error!("[ConfSource.ConfigCenter] {} key not exist", key);
                Ok(None)
            }
        }
    }

    async fn pull_configs_by_di(&self, dimension_info: &str) -> ConfResult<GroupedConfigDocument> {
        self.dispatcher.pull_all_hosts(&self.pull_path(dimension_info)).await
    }

    async fn push_configs(&self, items: ConfigDocument, dimension: &Dimension) -> ConfResult<ConfigDocument> {
        if items.is_empty() {
            error!("[ConfSource.ConfigCenter] data is empty , data: {:?}", items);
            return Err(ConfError::EmptyPayload("[ConfSource.ConfigCenter] data is empty".to_string()));
        }
        let body = ConfJson.obj_to_string(&CreateConfigApi {
            dimensions_info: dimension.to_dimension_info()?,
            items: &items,
        })?;
        trace!("[ConfSource.ConfigCenter] Push {} items", items.len());
        self.dispatcher.call::<HashMap<String, Value>>(Method::POST, self.config_path(), None, Some(body)).await
    }

    async fn delete_configs_by_keys(&self, keys: &[String], dimension: &Dimension) -> ConfResult<ConfigDocument> {
        if keys.is_empty() {
            error!("[ConfSource.ConfigCenter] not supported : empty keys");
            return Err(ConfError::EmptyKeys("[ConfSource.ConfigCenter] not supported : empty keys".to_string()));
        }
        let body = ConfJson.obj_to_string(&DeleteConfigApi {
            dimensions_info: dimension.to_dimension_info()?,
            keys,
        })?;
        trace!("[ConfSource.ConfigCenter] Delete keys {:?}", keys);
        self.dispatcher.call::<HashMap<String, Value>>(Method::DELETE, self.config_path(), None, Some(body)).await
    }

    async fn watch(&self, listener: ConfChangeListener, err_handler: ConfErrorHandler) -> ConfResult<ConfWatchHandle> {
        let dimension_info = self.default_dimension.to_dimension_info()?;
        #[cfg(feature = "ws-client")]
        if !self.config.refresh_port.trim().is_empty() {
            return self.watch_by_ws(&dimension_info, listener, err_handler).await;
        }
        self.watch_by_poll(&dimension_info, listener, err_handler)
    }
}

impl ConfigCenterClient {
    /// Websocket url of the refresh endpoint on `host`, at the configured refresh port.
    pub fn refresh_url(&self, host: &str, dimension_info: &str) -> ConfResult<String> {
        let url = Url::parse(host)?;
        let port = self
            .config
            .refresh_port
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfError::FormatError(format!("[ConfSource.ConfigCenter] invalid refresh port: {}", self.config.refresh_port)))?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        Ok(format!(
            "{}://{}:{}{}?dimensionsInfo={}",
            scheme,
            url.host_str().unwrap_or_default(),
            port,
            self.dispatcher.registry().options().api_paths.refresh,
            encode_dimension_info(dimension_info)
        ))
    }

    /// Subscribe to the changes the config center pushes over its refresh websocket.
    ///
    /// Each text frame is a json document handed to `listener`; frames that do not decode
    /// go to `err_handler`.
    #[cfg(feature = "ws-client")]
    async fn watch_by_ws(&self, dimension_info: &str, listener: ConfChangeListener, err_handler: ConfErrorHandler) -> ConfResult<ConfWatchHandle> {
        let hosts = self.dispatcher.registry().get_servers().await?;
        let host = hosts.first().ok_or_else(|| ConfError::NoMembers("[ConfSource.ConfigCenter] empty config server member".to_string()))?;
        let url = self.refresh_url(host, dimension_info)?;
        debug!("[ConfSource.ConfigCenter] Watch {}", url);
        let frame_err_handler = err_handler.clone();
        let task = ConfWSClient::subscribe(
            &url,
            self.config.accept_invalid_certs,
            move |text| match ConfJson.str_to_obj::<ConfigDocument>(&text) {
                Ok(document) => {
                    trace!("[ConfSource.ConfigCenter] Config pushed, {} keys", document.len());
                    listener(document);
                }
                Err(error) => {
                    error!("[ConfSource.ConfigCenter] Decode pushed config failed: {}", error);
                    frame_err_handler(error);
                }
            },
            move |error| err_handler(error),
        )
        .await
        .map_err(|error| {
            error!("[ConfSource.ConfigCenter] Watch {} failed: {}", url, error);
            error
        })?;
        Ok(ConfWatchHandle::new(task))
    }

    /// Pull the default dimension every `refresh_interval_sec` (at least one second).
    ///
    /// The first document is always delivered, after that only changed ones.
    fn watch_by_poll(&self, dimension_info: &str, listener: ConfChangeListener, err_handler: ConfErrorHandler) -> ConfResult<ConfWatchHandle> {
        let path = self.pull_path(dimension_info);
        let dispatcher = self.dispatcher.clone();
        let period = Duration::from_secs(self.config.refresh_interval_sec.max(1));
        debug!("[ConfSource.ConfigCenter] Watch {} every {:?}", path, period);
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            let mut last: Option<ConfigDocument> = None;
            loop {
                interval.tick().await;
                match dispatcher.pull_all_hosts_flat(&path).await {
                    Ok(document) => {
                        if last.as_ref() != Some(&document) {
                            trace!("[ConfSource.ConfigCenter] Config changed, {} keys", document.len());
                            listener(document.clone());
                            last = Some(document);
                        }
                    }
                    Err(error) => err_handler(error),
                }
            }
        });
        Ok(ConfWatchHandle::new(task))
    }
}
