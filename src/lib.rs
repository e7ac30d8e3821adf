//! **Pluggable remote configuration source client**
//!
//! ## 💖 Core functions
//!
//! * One client api over several configuration backends: config center, Apollo, servicecomb-kie
//! * Backends selected by name at runtime through [`plugin::ConfClientRegistry`]
//! * Config center member discovery with randomized host order and failover on pull
//! * Multi-environment options loaded from files and environment variables
//!
//! ## ⚙️Feature description
//!
//! * ``web-client`` http transport based on [reqwest](https://github.com/seanmonstar/reqwest)
//! * ``ws-client`` config center change subscription based on [tokio-tungstenite](https://github.com/snapview/tokio-tungstenite)
//!
//! ## 🚀 Quick start
//!
//! ```ignore
//! use confsource::basic::logger::ConfLogger;
//! use confsource::config::config_dto::ConfClientConfig;
//! use confsource::plugin::ConfClientRegistry;
//!
//! #[tokio::main]
//! async fn main() -> ConfResult<()> {
//!     ConfLogger::init()?;
//!     // Load conf-default.toml and conf-{PROFILE}.toml from ./config
//!     let conf = ConfClientConfig::load_with_env_profile(Some("config"))?;
//!     let registry = ConfClientRegistry::with_builtin_web_client();
//!     let client = registry.resolve("config_center", conf)?;
//!     let configs = client.pull_configs(&client.options().default_dimension()).await?;
//!     println!("{:?}", configs);
//!     Ok(())
//! }
//! ```
//!

#![cfg_attr(docsrs, feature(doc_cfg))]

#[macro_use]
extern crate lazy_static;

pub use async_trait;
pub use serde;
pub use serde_json;
pub use tokio;
pub use tracing;

pub mod basic;
pub mod client;
pub mod config;
pub mod member;
pub mod plugin;
pub mod web;
