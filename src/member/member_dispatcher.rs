use std::collections::BTreeMap;
use std::sync::Arc;

use rand::Rng;
use serde::de::DeserializeOwned;
use tracing::{error, trace, warn};

use crate::basic::dto::{ConfigDocument, GroupedConfigDocument};
use crate::basic::error::ConfError;
use crate::basic::json::{ConfJson, JSON_CONTENT_TYPE};
use crate::basic::result::ConfResult;
use crate::basic::uri::ConfUri;
use crate::member::member_registry::MemberRegistry;
use crate::web::web_client::{ConfHttpRequest, Method};

/// Sends config-center requests over the hosts of a [`MemberRegistry`].
///
/// [`call`](Self::call) is fail-fast on one random host while
/// [`pull_all_hosts`](Self::pull_all_hosts) walks every host and merges what they return.
#[derive(Clone)]
pub struct MemberDispatcher {
    registry: Arc<MemberRegistry>,
}

impl MemberDispatcher {
    pub fn new(registry: Arc<MemberRegistry>) -> Self {
        MemberDispatcher { registry }
    }

    pub fn registry(&self) -> &Arc<MemberRegistry> {
        &self.registry
    }

    /// Issue the request against exactly one randomly chosen host, without failover.
    pub async fn call<T: DeserializeOwned>(&self, method: Method, path: &str, headers: Option<Vec<(String, String)>>, body: Option<String>) -> ConfResult<T> {
        let hosts = match self.registry.get_servers().await {
            Ok(hosts) => hosts,
            Err(error) => {
                error!("[ConfSource.Dispatcher] Get config server addr failed: {}", error);
                return Err(error);
            }
        };
        if hosts.is_empty() {
            return Err(ConfError::NoMembers("[ConfSource.Dispatcher] empty config server member".to_string()));
        }
        let index = rand::thread_rng().gen_range(0..hosts.len());
        self.request(method, &hosts[index], path, headers, body).await
    }

    /// Pull `{source: {key: value}}` documents from every host in turn, merged per source.
    ///
    /// Transport failures and bad statuses are counted; when every host failed that way
    /// the last error is returned. Undecodable answers only skip the host.
    pub async fn pull_all_hosts(&self, path: &str) -> ConfResult<GroupedConfigDocument> {
        let mut result = GroupedConfigDocument::new();
        self.pull_each_host(path, |grouped| {
            for (source, document) in grouped {
                result.entry(source).or_default().extend(document);
            }
        })
        .await?;
        Ok(result)
    }

    /// Like [`pull_all_hosts`](Self::pull_all_hosts) but merged into one flat document.
    ///
    /// Keys are written in host-list order, so a key reported by several hosts keeps the
    /// value of the last one. Within one host the sources are applied in source id order.
    pub async fn pull_all_hosts_flat(&self, path: &str) -> ConfResult<ConfigDocument> {
        let mut result = ConfigDocument::new();
        self.pull_each_host(path, |grouped| {
            for (_, document) in grouped {
                result.extend(document);
            }
        })
        .await?;
        Ok(result)
    }

    async fn pull_each_host<F>(&self, path: &str, mut merge: F) -> ConfResult<()>
    where
        F: FnMut(BTreeMap<String, ConfigDocument>) + Send,
    {
        let hosts = self.registry.get_servers().await?;
        let mut failures = 0;
        for host in &hosts {
            match self.request::<BTreeMap<String, ConfigDocument>>(Method::GET, host, path, None, None).await {
                Ok(grouped) => merge(grouped),
                Err(error) if error.is_host_failure() => {
                    failures += 1;
                    if failures >= hosts.len() {
                        error!("[ConfSource.Dispatcher] Pull config failed on all {} hosts: {}", hosts.len(), error);
                        return Err(error);
                    }
                    warn!("[ConfSource.Dispatcher] Pull config from {} failed, try next host: {}", host, error);
                }
                Err(error) => {
                    error!("[ConfSource.Dispatcher] Skip host {}: {}", host, error);
                }
            }
        }
        Ok(())
    }

    async fn request<T: DeserializeOwned>(&self, method: Method, host: &str, path: &str, headers: Option<Vec<(String, String)>>, body: Option<String>) -> ConfResult<T> {
        let url = ConfUri.join(host, path);
        let err_msg_prefix = format!("Call {url} failed: ");
        let mut request = ConfHttpRequest::new(method, url.clone()).headers(self.registry.options().default_headers()).body(body);
        if let Some(headers) = headers {
            request = request.headers(headers);
        }
        trace!("[ConfSource.Dispatcher] {} {}", request.method, url);
        let response = self.registry.transport().execute(request).await.map_err(|error| {
            error!("[ConfSource.Dispatcher] {}{}", err_msg_prefix, error);
            error
        })?;
        if !response.is_success() {
            let message = format!("{}statusCode: {}, resp body: {}", err_msg_prefix, response.code, response.body);
            error!("[ConfSource.Dispatcher] {}", message);
            return Err(ConfError::BadStatus(response.code, message));
        }
        ConfJson.body_to_obj(response.content_type(), JSON_CONTENT_TYPE, &response.body).map_err(|error| {
            error!("[ConfSource.Dispatcher] {}{}", err_msg_prefix, error);
            error
        })
    }
}
