use std::env;
use std::path::Path;

use config::{Config, Environment, File};
use tracing::{debug, info};

use crate::basic::result::ConfResult;
use crate::config::config_dto::ConfClientConfig;

/// Prefix of the environment variables overriding file configuration,
/// e.g. `CONF_SOURCE_SERVER_URI` or `CONF_SOURCE_APOLLO__APP_ID`.
pub const ENV_PREFIX: &str = "CONF_SOURCE";

/// Configuration loading
///
/// ## Configure fetch priority
///
/// 1. Local file: <local path>/conf-default.<toml|json|yaml>
/// 1. Local file: <local path>/conf-<profile>.<toml|json|yaml>
/// 1. Environment variables starting with `CONF_SOURCE`
///
impl ConfClientConfig {
    pub fn load(relative_path: Option<&str>, profile: &str) -> ConfResult<ConfClientConfig> {
        info!("[ConfSource.Config] Initializing, relative path:{:?}, profile:{}", relative_path, profile);
        let mut conf = Config::builder();
        if let Some(relative_path) = relative_path {
            let path = Path::new(relative_path);
            let file = path.join("conf-default");
            debug!("[ConfSource.Config] Fetch local file: {:?}", file);
            conf = conf.add_source(File::from(file).required(true));
            if !profile.is_empty() {
                let file = path.join(format!("conf-{profile}"));
                debug!("[ConfSource.Config] Fetch local file: {:?}", file);
                conf = conf.add_source(File::from(file).required(true));
            }
        }
        conf = conf.add_source(Environment::with_prefix(ENV_PREFIX).prefix_separator("_").separator("__"));
        let config = conf.build()?.try_deserialize::<ConfClientConfig>()?;
        info!("[ConfSource.Config] Initialized, relative path:{:?}, profile:{}", relative_path, profile);
        debug!("=====[ConfSource.Config] Content=====\n{:#?}\n=====", config);
        Ok(config)
    }

    /// Load using the profile named by the `PROFILE` environment variable.
    pub fn load_with_env_profile(relative_path: Option<&str>) -> ConfResult<ConfClientConfig> {
        Self::load(relative_path, &fetch_profile())
    }
}

pub fn fetch_profile() -> String {
    env::var("PROFILE").unwrap_or_default()
}
