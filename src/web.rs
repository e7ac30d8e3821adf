pub mod web_client;
#[cfg(feature = "ws-client")]
pub mod ws_client;
