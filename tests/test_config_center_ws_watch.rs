use std::sync::{Arc, Mutex};
use std::time::Duration;

use confsource::basic::dto::ConfigDocument;
use confsource::basic::error::ConfError;
use confsource::basic::result::ConfResult;
use confsource::client::config_center::ConfigCenterClient;
use confsource::client::ConfClient;
use confsource::config::config_dto::ConfClientConfig;
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message;

use crate::mock_transport::MockTransport;

mod mock_transport;

fn conf(refresh_port: &str) -> ConfClientConfig {
    ConfClientConfig::builder().server_uri("127.0.0.1:1").service_name("billing").version("1.0.0").app("shop").api_version("v2").refresh_port(refresh_port).build()
}

#[tokio::test]
async fn test_refresh_url() -> ConfResult<()> {
    let client = ConfigCenterClient::new(conf("30104"), Arc::new(MockTransport::new()))?;
    assert_eq!(
        client.refresh_url("http://10.0.0.1:30103", "billing@shop#1.0.0")?,
        "ws://10.0.0.1:30104/configuration/v2/refresh/items?dimensionsInfo=billing@shop%231.0.0"
    );
    assert_eq!(client.refresh_url("https://10.0.0.1:30103", "billing")?, "wss://10.0.0.1:30104/configuration/v2/refresh/items?dimensionsInfo=billing");

    let client = ConfigCenterClient::new(conf("not-a-port"), Arc::new(MockTransport::new()))?;
    assert!(matches!(client.refresh_url("http://10.0.0.1:30103", "billing"), Err(ConfError::FormatError(_))));
    let result = client.watch(Arc::new(|_: ConfigDocument| {}), Arc::new(|_: ConfError| {})).await;
    assert!(matches!(result, Err(ConfError::FormatError(_))));
    Ok(())
}

#[tokio::test]
async fn test_watch_by_ws() -> ConfResult<()> {
    let server = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = server.local_addr().unwrap().port();
    let requested = Arc::new(Mutex::new(String::new()));
    let requested_clone = requested.clone();
    tokio::spawn(async move {
        let (stream, _) = server.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_hdr_async(stream, move |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
            *requested_clone.lock().unwrap() = request.uri().to_string();
            Ok(response)
        })
        .await
        .unwrap();
        ws.send(Message::Text(json!({"timeout": "500"}).to_string())).await.unwrap();
        ws.send(Message::Text("not json".to_string())).await.unwrap();
        ws.send(Message::Text(json!({"timeout": "800", "retries": 3}).to_string())).await.unwrap();
        // Hold the connection until the client goes away
        while ws.next().await.is_some() {}
    });

    let client = ConfigCenterClient::new(conf(&port.to_string()), Arc::new(MockTransport::new()))?;
    let documents = Arc::new(Mutex::new(Vec::<ConfigDocument>::new()));
    let errors = Arc::new(Mutex::new(Vec::<ConfError>::new()));
    let documents_clone = documents.clone();
    let errors_clone = errors.clone();
    let mut handle = client
        .watch(
            Arc::new(move |document: ConfigDocument| documents_clone.lock().unwrap().push(document)),
            Arc::new(move |error: ConfError| errors_clone.lock().unwrap().push(error)),
        )
        .await?;

    for _ in 0..50 {
        if documents.lock().unwrap().len() >= 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert!(handle.is_running());
    assert_eq!(*requested.lock().unwrap(), "/configuration/v2/refresh/items?dimensionsInfo=billing@shop%231.0.0");
    {
        let documents = documents.lock().unwrap();
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0]["timeout"], json!("500"));
        assert_eq!(documents[1]["timeout"], json!("800"));
        assert_eq!(documents[1]["retries"], json!(3));
        let errors = errors.lock().unwrap();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ConfError::DecodeFailure(_)));
    }
    handle.stop();
    assert!(!handle.is_running());
    Ok(())
}

#[tokio::test]
async fn test_watch_by_ws_refused() -> ConfResult<()> {
    let server = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = server.local_addr().unwrap().port();
    drop(server);

    let client = ConfigCenterClient::new(conf(&port.to_string()), Arc::new(MockTransport::new()))?;
    let result = client.watch(Arc::new(|_: ConfigDocument| {}), Arc::new(|_: ConfError| {})).await;
    assert!(matches!(result, Err(ConfError::TransportFailure(_))));
    Ok(())
}
