use futures_util::StreamExt;
use native_tls::TlsConnector;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::Connector;
use tracing::{info, trace, warn};
use url::Url;

use crate::basic::error::ConfError;
use crate::basic::result::ConfResult;

/// Websocket subscriber, receives the text frames pushed by a server.
pub struct ConfWSClient;

impl ConfWSClient {
    /// Connect to `str_url` and hand every text frame to `fun` until the server closes the stream.
    ///
    /// Connection failures are returned, failures of an established stream go to `err_fun`
    /// and end the subscription. Aborting the returned task closes the connection.
    pub async fn subscribe<F, E>(str_url: &str, accept_invalid_certs: bool, fun: F, err_fun: E) -> ConfResult<JoinHandle<()>>
    where
        F: Fn(String) + Send + 'static,
        E: Fn(ConfError) + Send + 'static,
    {
        let url = Url::parse(str_url).map_err(|_| ConfError::FormatError(format!("[ConfSource.WSClient] Invalid url {str_url}")))?;
        info!("[ConfSource.WSClient] Connecting, host:{}, port:{}", url.host_str().unwrap_or(""), url.port().unwrap_or(0));
        let connect = if url.scheme() == "wss" && accept_invalid_certs {
            let connector = TlsConnector::builder()
                .danger_accept_invalid_certs(true)
                .build()
                .map_err(|error| ConfError::FormatError(format!("[ConfSource.WSClient] Failed to build tls connector {error}")))?;
            tokio_tungstenite::connect_async_tls_with_config(str_url, None, false, Some(Connector::NativeTls(connector))).await
        } else {
            tokio_tungstenite::connect_async(str_url).await
        };
        let (mut stream, _) = connect.map_err(|error| ConfError::TransportFailure(format!("[ConfSource.WSClient] Failed to connect {str_url} {error}")))?;
        info!("[ConfSource.WSClient] Connected, host:{}, port:{}", url.host_str().unwrap_or(""), url.port().unwrap_or(0));
        let str_url = str_url.to_string();
        Ok(tokio::spawn(async move {
            while let Some(message) = stream.next().await {
                match message {
                    Ok(Message::Text(text)) => {
                        trace!("[ConfSource.WSClient] WS receive: {}", text);
                        fun(text);
                    }
                    Ok(Message::Close(_)) => {
                        info!("[ConfSource.WSClient] Closed by server {}", str_url);
                        break;
                    }
                    Ok(_) => {
                        trace!("[ConfSource.WSClient] WS receive: non text frame ignored");
                    }
                    Err(error) => {
                        warn!("[ConfSource.WSClient] Failed to receive from {}: {}", str_url, error);
                        err_fun(ConfError::TransportFailure(format!("[ConfSource.WSClient] Failed to receive from {str_url} {error}")));
                        break;
                    }
                }
            }
        }))
    }
}
