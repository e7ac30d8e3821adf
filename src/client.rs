//! # Configuration source clients.
//!
//! Every backend protocol implements [`ConfClient`]:
//!
//! * [`config_center::ConfigCenterClient`] config center with member discovery and multi-host failover
//! * [`apollo::ApolloClient`] Apollo config service, single endpoint
//! * [`kie::KieClient`] Servicecomb-kie key-value store, single endpoint
//!
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::task::JoinHandle;

use crate::basic::dto::{ConfigDocument, Dimension, GroupedConfigDocument};
use crate::basic::error::ConfError;
use crate::basic::result::ConfResult;
use crate::config::config_dto::ConfClientConfig;

pub mod apollo;
pub mod config_center;
pub mod kie;

/// Invoked with the document delivered each time a watched configuration changes.
pub type ConfChangeListener = Arc<dyn Fn(ConfigDocument) + Send + Sync>;
/// Invoked with the failures met while watching.
pub type ConfErrorHandler = Arc<dyn Fn(ConfError) + Send + Sync>;

/// Capabilities shared by every configuration source.
#[async_trait]
pub trait ConfClient: Send + Sync {
    /// Name the client is installed under.
    fn name(&self) -> &'static str;

    fn options(&self) -> &ConfClientConfig;

    /// Pull every configuration of the dimension as one flat document.
    async fn pull_configs(&self, dimension: &Dimension) -> ConfResult<ConfigDocument>;

    /// Pull one configuration value.
    ///
    /// How a missing key is reported depends on the backend.
    async fn pull_config(&self, dimension: &Dimension, key: &str) -> ConfResult<Option<Value>>;

    /// Pull the configurations of a custom dimension, grouped by source.
    async fn pull_configs_by_di(&self, dimension_info: &str) -> ConfResult<GroupedConfigDocument>;

    async fn push_configs(&self, items: ConfigDocument, dimension: &Dimension) -> ConfResult<ConfigDocument>;

    async fn delete_configs_by_keys(&self, keys: &[String], dimension: &Dimension) -> ConfResult<ConfigDocument>;

    /// Start watching the default dimension of the client.
    async fn watch(&self, listener: ConfChangeListener, err_handler: ConfErrorHandler) -> ConfResult<ConfWatchHandle>;
}

/// Handle of a running watch, [`stop`](Self::stop) ends it.
#[derive(Debug)]
pub struct ConfWatchHandle {
    task: Option<JoinHandle<()>>,
}

impl ConfWatchHandle {
    pub fn new(task: JoinHandle<()>) -> Self {
        ConfWatchHandle { task: Some(task) }
    }

    /// Handle of a backend that has nothing to watch.
    pub fn noop() -> Self {
        ConfWatchHandle { task: None }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().map(|task| !task.is_finished()).unwrap_or(false)
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
