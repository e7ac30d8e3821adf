use std::sync::Arc;

use confsource::basic::dto::{ConfigDocument, Dimension};
use confsource::basic::error::ConfError;
use confsource::basic::result::ConfResult;
use confsource::client::kie::{KieClient, RET_DEL_ERR, RET_SUCC};
use confsource::client::ConfClient;
use confsource::config::config_dto::{ConfClientConfig, KieConfig};
use confsource::web::web_client::Method;
use serde_json::{json, Value};

use crate::mock_transport::{MockReply, MockTransport};

mod mock_transport;

const KV_URL: &str = "http://10.0.0.6:30110/v1/calculator/kie/kv";
const QUERY: &str = "q=servicename:calculator+version:0.0.1+app:+env:";

fn conf() -> ConfClientConfig {
    ConfClientConfig::builder().server_uri("10.0.0.6:30110").service_name("calculator").version("0.0.1").build()
}

fn dimension() -> Dimension {
    Dimension::new("calculator", "0.0.1", "", "")
}

#[tokio::test]
async fn test_new_client() -> ConfResult<()> {
    let transport = Arc::new(MockTransport::new());
    let client = KieClient::new(conf(), transport.clone())?;
    assert_eq!(client.name(), "servicecomb-kie");
    assert_eq!(client.endpoint(), "http://10.0.0.6:30110");
    assert!(matches!(KieClient::new(ConfClientConfig::default(), transport), Err(ConfError::FormatError(_))));
    Ok(())
}

#[tokio::test]
async fn test_pull_configs() -> ConfResult<()> {
    let transport = Arc::new(MockTransport::new());
    transport.on(
        Method::GET,
        &format!("{KV_URL}?{QUERY}"),
        MockReply::json(
            200,
            json!([
                {"data": [
                    {"key": "timeout", "value": "500", "labels": {"servicename": "calculator"}},
                    {"key": "app.yaml", "value": "server:\n  port: 8080\n"}
                ]},
                {"data": [
                    {"key": "broken.json", "value": "{"}
                ]}
            ]),
        ),
    );
    let client = KieClient::new(conf(), transport)?;
    let configs = client.pull_configs(&dimension()).await?;
    assert_eq!(configs.len(), 4);
    assert_eq!(configs["timeout"], json!("500"));
    assert_eq!(configs["app.yaml"], json!("server:\n  port: 8080\n"));
    assert_eq!(configs["server.port"], json!(8080));
    assert_eq!(configs["broken.json"], json!("{"));
    Ok(())
}

#[tokio::test]
async fn test_pull_config() -> ConfResult<()> {
    let transport = Arc::new(MockTransport::new());
    transport.on(Method::GET, &format!("{KV_URL}/timeout?{QUERY}"), MockReply::json(200, json!([{"data": [{"key": "timeout", "value": "500"}]}])));
    transport.on(Method::GET, &format!("{KV_URL}/retry?{QUERY}"), MockReply::json(404, json!({"error": "not found"})));
    transport.on(Method::GET, &format!("{KV_URL}/other?{QUERY}"), MockReply::json(200, json!([{"data": [{"key": "timeout", "value": "500"}]}])));
    let client = KieClient::new(conf(), transport)?;

    assert_eq!(client.pull_config(&dimension(), "timeout").await?, Some(json!("500")));
    let error = client.pull_config(&dimension(), "retry").await.unwrap_err();
    assert!(matches!(error, ConfError::KeyNotFound(_)));
    assert!(error.message().contains("retry"));
    assert!(matches!(client.pull_config(&dimension(), "other").await, Err(ConfError::KeyNotFound(_))));
    assert!(matches!(client.pull_config(&dimension(), "unrouted").await, Err(ConfError::TransportFailure(_))));
    Ok(())
}

#[tokio::test]
async fn test_push_configs() -> ConfResult<()> {
    let transport = Arc::new(MockTransport::new());
    transport.on(Method::PUT, &format!("{KV_URL}/timeout"), MockReply::json(200, json!({"id": "1", "key": "timeout", "value": "500"})));
    transport.on(Method::PUT, &format!("{KV_URL}/retry"), MockReply::json(200, json!({"id": "2", "key": "retry", "value": "3"})));
    let client = KieClient::new(conf(), transport.clone())?;

    assert!(matches!(client.push_configs(ConfigDocument::new(), &dimension()).await, Err(ConfError::EmptyPayload(_))));
    assert_eq!(transport.call_count(), 0);

    let items = ConfigDocument::from([("timeout".to_string(), json!("500")), ("retry".to_string(), json!(3))]);
    let result = client.push_configs(items, &dimension()).await?;
    assert_eq!(result, ConfigDocument::from([("timeout".to_string(), json!("500")), ("retry".to_string(), json!("3"))]));

    for request in transport.calls() {
        let body = serde_json::from_str::<Value>(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["labels"], json!({"servicename": "calculator", "version": "0.0.1", "app": "", "env": ""}));
        if request.url.ends_with("/retry") {
            assert_eq!(body["value"], json!("3"));
        }
    }

    let items = ConfigDocument::from([("unrouted".to_string(), json!("1"))]);
    assert!(matches!(client.push_configs(items, &dimension()).await, Err(ConfError::TransportFailure(_))));
    Ok(())
}

#[tokio::test]
async fn test_delete_configs_by_keys() -> ConfResult<()> {
    let transport = Arc::new(MockTransport::new());
    transport.on(Method::DELETE, &format!("{KV_URL}/?kvID=id1"), MockReply::text(204, None, ""));
    transport.on(Method::DELETE, &format!("{KV_URL}/?kvID=id3"), MockReply::json(500, json!({})));
    let client = KieClient::new(conf(), transport.clone())?;

    assert!(matches!(client.delete_configs_by_keys(&[], &dimension()).await, Err(ConfError::EmptyKeys(_))));
    assert_eq!(transport.call_count(), 0);

    let result = client.delete_configs_by_keys(&["id1".to_string(), "id2".to_string(), "id3".to_string()], &dimension()).await?;
    assert_eq!(result["id1"], json!(RET_SUCC));
    assert_eq!(result["id2"], json!(RET_DEL_ERR));
    assert_eq!(result["id3"], json!(RET_DEL_ERR));
    Ok(())
}

#[tokio::test]
async fn test_project_and_unsupported_operations() -> ConfResult<()> {
    let transport = Arc::new(MockTransport::new());
    transport.on(
        Method::GET,
        &format!("http://10.0.0.6:30110/v1/shared/kie/kv?{QUERY}"),
        MockReply::json(200, json!([{"data": [{"key": "timeout", "value": "700"}]}])),
    );
    let mut conf = conf();
    conf.kie = KieConfig::builder().project("shared").build();
    let client = KieClient::new(conf, transport)?;
    assert_eq!(client.pull_configs(&dimension()).await?["timeout"], json!("700"));

    assert!(matches!(client.pull_configs_by_di("calculator").await, Err(ConfError::NotImplemented(_))));
    let handle = client.watch(Arc::new(|_: ConfigDocument| {}), Arc::new(|_: ConfError| {})).await?;
    assert!(!handle.is_running());
    Ok(())
}
