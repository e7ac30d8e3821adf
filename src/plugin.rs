//! # Named registry of configuration source constructors.
//!
//! Backends are installed under a name at bootstrap; callers resolve a name to an
//! `Arc<dyn ConfClient>` without depending on the concrete type.
//!
//! # Examples
//! ```ignore
//! use std::sync::Arc;
//! use confsource::config::config_dto::ConfClientConfig;
//! use confsource::plugin::ConfClientRegistry;
//! use confsource::web::web_client::ConfWebClient;
//!
//! let conf = ConfClientConfig::builder().server_uri("http://127.0.0.1:30113".to_string()).service_name("demo".to_string()).build();
//! let registry = ConfClientRegistry::with_builtin(Arc::new(ConfWebClient::init_by_conf(&conf)?));
//! let client = registry.resolve("config_center", conf)?;
//! let configs = client.pull_configs(&client.options().default_dimension()).await?;
//! ```
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::{error, info};

use crate::basic::error::ConfError;
use crate::basic::result::ConfResult;
use crate::client::apollo::{ApolloClient, APOLLO_NAME};
use crate::client::config_center::{ConfigCenterClient, CONFIG_CENTER_NAME};
use crate::client::kie::{KieClient, KIE_NAME};
use crate::client::ConfClient;
use crate::config::config_dto::ConfClientConfig;
use crate::web::web_client::ConfTransport;

/// Builds a client from its options.
pub type ConfClientConstructor = Arc<dyn Fn(ConfClientConfig) -> ConfResult<Arc<dyn ConfClient>> + Send + Sync>;

#[derive(Default)]
pub struct ConfClientRegistry {
    plugins: RwLock<HashMap<String, ConfClientConstructor>>,
    current: RwLock<Option<Arc<dyn ConfClient>>>,
}

impl ConfClientRegistry {
    pub fn new() -> Self {
        ConfClientRegistry::default()
    }

    /// Registry with the config center, Apollo and kie backends installed, all sharing `transport`.
    pub fn with_builtin(transport: Arc<dyn ConfTransport>) -> Self {
        let registry = ConfClientRegistry::new();
        let config_center_transport = transport.clone();
        registry.install(
            CONFIG_CENTER_NAME,
            Arc::new(move |conf: ConfClientConfig| -> ConfResult<Arc<dyn ConfClient>> { Ok(Arc::new(ConfigCenterClient::new(conf, config_center_transport.clone())?)) }),
        );
        let apollo_transport = transport.clone();
        registry.install(
            APOLLO_NAME,
            Arc::new(move |conf: ConfClientConfig| -> ConfResult<Arc<dyn ConfClient>> { Ok(Arc::new(ApolloClient::new(conf, apollo_transport.clone())?)) }),
        );
        registry.install(KIE_NAME, Arc::new(move |conf: ConfClientConfig| -> ConfResult<Arc<dyn ConfClient>> { Ok(Arc::new(KieClient::new(conf, transport.clone())?)) }));
        registry
    }

    /// Registry with the builtin backends, each building its own http client from the options.
    #[cfg(feature = "web-client")]
    pub fn with_builtin_web_client() -> Self {
        use crate::web::web_client::ConfWebClient;

        let registry = ConfClientRegistry::new();
        registry.install(
            CONFIG_CENTER_NAME,
            Arc::new(|conf: ConfClientConfig| -> ConfResult<Arc<dyn ConfClient>> {
                let transport = Arc::new(ConfWebClient::init_by_conf(&conf)?);
                Ok(Arc::new(ConfigCenterClient::new(conf, transport)?))
            }),
        );
        registry.install(
            APOLLO_NAME,
            Arc::new(|conf: ConfClientConfig| -> ConfResult<Arc<dyn ConfClient>> {
                let transport = Arc::new(ConfWebClient::init_by_conf(&conf)?);
                Ok(Arc::new(ApolloClient::new(conf, transport)?))
            }),
        );
        registry.install(
            KIE_NAME,
            Arc::new(|conf: ConfClientConfig| -> ConfResult<Arc<dyn ConfClient>> {
                let transport = Arc::new(ConfWebClient::init_by_conf(&conf)?);
                Ok(Arc::new(KieClient::new(conf, transport)?))
            }),
        );
        registry
    }

    /// Register `constructor` under `name`, replacing any previous one.
    pub fn install(&self, name: &str, constructor: ConfClientConstructor) {
        match self.plugins.write() {
            Ok(mut plugins) => {
                if plugins.insert(name.to_string(), constructor).is_some() {
                    info!("[ConfSource.Plugin] Replaced config client plugin: {}", name);
                } else {
                    info!("[ConfSource.Plugin] Installed config client plugin: {}", name);
                }
            }
            Err(error) => error!("[ConfSource.Plugin] Install plugin {} failed: {}", name, error),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.plugins.read().map(|plugins| plugins.contains_key(name)).unwrap_or(false)
    }

    pub fn names(&self) -> Vec<String> {
        self.plugins.read().map(|plugins| plugins.keys().cloned().collect()).unwrap_or_default()
    }

    /// Build the client installed under `name` and make it the current one.
    pub fn resolve(&self, name: &str, conf: ConfClientConfig) -> ConfResult<Arc<dyn ConfClient>> {
        let constructor = self.plugins.read()?.get(name).cloned();
        let constructor = match constructor {
            Some(constructor) => constructor,
            None => {
                error!("[ConfSource.Plugin] Plugin {} not found", name);
                return Err(ConfError::PluginNotFound(format!("Plugin {name} not found")));
            }
        };
        let client = constructor(conf)?;
        *self.current.write()? = Some(client.clone());
        info!("[ConfSource.Plugin] Config client {} resolved", name);
        Ok(client)
    }

    /// Client built by the last successful [`resolve`](Self::resolve).
    pub fn current(&self) -> Option<Arc<dyn ConfClient>> {
        self.current.read().ok().and_then(|current| current.clone())
    }
}
