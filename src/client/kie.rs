use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use config::{FileFormat, Format, ValueKind};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, trace};

use crate::basic::dto::{ConfigDocument, Dimension, GroupedConfigDocument};
use crate::basic::error::ConfError;
use crate::basic::json::{ConfJson, JSON_CONTENT_TYPE};
use crate::basic::result::ConfResult;
use crate::basic::uri::ConfUri;
use crate::client::{ConfChangeListener, ConfClient, ConfErrorHandler, ConfWatchHandle};
use crate::config::config_dto::ConfClientConfig;
use crate::member::HEADER_CONTENT_TYPE;
use crate::web::web_client::{ConfHttpRequest, ConfTransport, Method};

pub const KIE_NAME: &str = "servicecomb-kie";

/// Per key result of a successful delete.
pub const RET_SUCC: i32 = 0;
/// Per key result of a failed delete.
pub const RET_DEL_ERR: i32 = 1;

/// One key-value document stored by the kie server.
#[derive(Deserialize, Serialize, Clone, Debug, Default)]
#[serde(default)]
pub struct KvDoc {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub key: String,
    pub value: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub value_type: String,
    pub labels: HashMap<String, String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default)]
#[serde(default)]
pub struct KvResponse {
    pub data: Vec<KvDoc>,
}

/// Client of a servicecomb-kie server.
///
/// Documents are scoped by the labels of the dimension and stored under the
/// project named by the options, or by the service name when none is set.
pub struct KieClient {
    config: ConfClientConfig,
    transport: Arc<dyn ConfTransport>,
    endpoint: String,
}

impl KieClient {
    pub fn new(config: ConfClientConfig, transport: Arc<dyn ConfTransport>) -> ConfResult<KieClient> {
        if config.server_uri.trim().is_empty() {
            return Err(ConfError::FormatError("[ConfSource.Kie] server uri can not be empty".to_string()));
        }
        let endpoint = ConfUri.validate(&ConfUri.ensure_scheme(config.server_uri.trim(), config.enable_ssl))?;
        debug!("[ConfSource.Kie] Initialized with {}", endpoint);
        Ok(KieClient { config, transport, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn project<'a>(&'a self, dimension: &'a Dimension) -> &'a str {
        match &self.config.kie.project {
            Some(project) if !project.is_empty() => project,
            _ => dimension.service_name(),
        }
    }

    fn labels(dimension: &Dimension) -> HashMap<String, String> {
        HashMap::from([
            ("servicename".to_string(), dimension.service_name().to_string()),
            ("version".to_string(), dimension.version().to_string()),
            ("app".to_string(), dimension.app().to_string()),
            ("env".to_string(), dimension.environment().to_string()),
        ])
    }

    fn label_query(dimension: &Dimension) -> String {
        format!(
            "q=servicename:{}+version:{}+app:{}+env:{}",
            urlencoding::encode(dimension.service_name()),
            urlencoding::encode(dimension.version()),
            urlencoding::encode(dimension.app()),
            urlencoding::encode(dimension.environment())
        )
    }

    fn kv_url(&self, dimension: &Dimension, path: &str) -> String {
        ConfUri.join(&self.endpoint, &format!("/v1/{}/kie/kv{}", urlencoding::encode(self.project(dimension)), path))
    }

    async fn request<T: DeserializeOwned>(&self, method: Method, url: String, body: Option<String>) -> ConfResult<T> {
        trace!("[ConfSource.Kie] {} {}", method, url);
        let request = ConfHttpRequest::new(method, url.clone()).headers(vec![(HEADER_CONTENT_TYPE.to_string(), JSON_CONTENT_TYPE.to_string())]).body(body);
        let response = self.transport.execute(request).await?;
        if response.code == 404 {
            return Err(ConfError::KeyNotFound(format!("[ConfSource.Kie] {url} not found")));
        }
        if !response.is_success() {
            return Err(ConfError::BadStatus(response.code, format!("Call {} failed: statusCode: {}, resp body: {}", url, response.code, response.body)));
        }
        ConfJson.body_to_obj(response.content_type(), JSON_CONTENT_TYPE, &response.body)
    }
}

/// Parse the structured value of a `.yaml`/`.yml`/`.json`/`.toml` key into dotted keys.
///
/// Keys with any other suffix yield an empty document.
pub fn parse_structured_value(key: &str, value: &str) -> ConfResult<ConfigDocument> {
    let format = match key.rsplit_once('.').map(|(_, ext)| ext.to_lowercase()) {
        Some(ext) if ext == "yaml" || ext == "yml" => FileFormat::Yaml,
        Some(ext) if ext == "json" => FileFormat::Json,
        Some(ext) if ext == "toml" => FileFormat::Toml,
        _ => return Ok(ConfigDocument::new()),
    };
    let table = format.parse(None, value).map_err(|error| ConfError::FormatError(format!("[ConfSource.Kie] parse {key} failed: {error}")))?;
    let mut document = ConfigDocument::new();
    for (name, value) in table {
        flatten_into(&mut document, name, value);
    }
    Ok(document)
}

fn flatten_into(document: &mut ConfigDocument, prefix: String, value: config::Value) {
    match value.kind {
        ValueKind::Table(table) => {
            for (name, value) in table {
                flatten_into(document, format!("{prefix}.{name}"), value);
            }
        }
        kind => {
            document.insert(prefix, to_json(kind));
        }
    }
}

fn to_json(kind: ValueKind) -> Value {
    match kind {
        ValueKind::Nil => Value::Null,
        ValueKind::Boolean(value) => Value::Bool(value),
        ValueKind::I64(value) => Value::from(value),
        ValueKind::U64(value) => Value::from(value),
        ValueKind::I128(value) => Value::String(value.to_string()),
        ValueKind::U128(value) => Value::String(value.to_string()),
        ValueKind::Float(value) => Value::from(value),
        ValueKind::String(value) => Value::String(value),
        ValueKind::Array(values) => Value::Array(values.into_iter().map(|value| to_json(value.kind)).collect()),
        ValueKind::Table(table) => Value::Object(table.into_iter().map(|(name, value)| (name, to_json(value.kind))).collect()),
    }
}

#[async_trait]
impl ConfClient for KieClient {
    fn name(&self) -> &'static str {
        KIE_NAME
    }

    fn options(&self) -> &ConfClientConfig {
        &self.config
    }

    async fn pull_configs(&self, dimension: &Dimension) -> ConfResult<ConfigDocument> {
        let url = format!("{}?{}", self.kv_url(dimension, ""), Self::label_query(dimension));
        let responses = self.request::<Vec<KvResponse>>(Method::GET, url, None).await.map_err(|error| {
            error!("[ConfSource.Kie] Error in Querying the Response from Kie {} {:?}", error, dimension);
            error
        })?;
        let mut document = ConfigDocument::new();
        for doc in responses.into_iter().flat_map(|response| response.data) {
            let parsed = parse_structured_value(&doc.key, &doc.value);
            document.insert(doc.key, Value::String(doc.value));
            match parsed {
                Ok(parsed) => document.extend(parsed),
                Err(error) => error!("[ConfSource.Kie] Error in Parse the Response from Kie {} {:?}", error, dimension),
            }
        }
        Ok(document)
    }

    async fn pull_config(&self, dimension: &Dimension, key: &str) -> ConfResult<Option<Value>> {
        let url = format!("{}?{}", self.kv_url(dimension, &format!("/{}", urlencoding::encode(key))), Self::label_query(dimension));
        let responses = match self.request::<Vec<KvResponse>>(Method::GET, url, None).await {
            Ok(responses) => responses,
            Err(ConfError::KeyNotFound(_)) => Vec::new(),
            Err(error) => {
                error!("[ConfSource.Kie] Error in Querying the Response from Kie: {}", error);
                return Err(error);
            }
        };
        match responses.into_iter().flat_map(|response| response.data).find(|doc| doc.key == key) {
            Some(doc) => {
                debug!("[ConfSource.Kie] The Key Value of {} : {}", key, doc.value);
                Ok(Some(Value::String(doc.value)))
            }
            None => {
                error!("[ConfSource.Kie] can not find value: {}", key);
                Err(ConfError::KeyNotFound(format!("can not find value: {key}")))
            }
        }
    }

    async fn pull_configs_by_di(&self, _: &str) -> ConfResult<GroupedConfigDocument> {
        Err(ConfError::NotImplemented("[ConfSource.Kie] pull configs by dimension info is not supported".to_string()))
    }

    async fn push_configs(&self, items: ConfigDocument, dimension: &Dimension) -> ConfResult<ConfigDocument> {
        if items.is_empty() {
            return Err(ConfError::EmptyPayload("[ConfSource.Kie] data is empty".to_string()));
        }
        let labels = Self::labels(dimension);
        let mut result = ConfigDocument::new();
        for (key, value) in items {
            let body = ConfJson.obj_to_string(&KvDoc {
                key: key.clone(),
                value: ConfJson.value_to_text(&value),
                labels: labels.clone(),
                ..Default::default()
            })?;
            let url = self.kv_url(dimension, &format!("/{}", urlencoding::encode(&key)));
            let stored = self.request::<KvDoc>(Method::PUT, url, Some(body)).await.map_err(|error| {
                error!("[ConfSource.Kie] Error in PushConfigs to Kie: {}", error);
                error
            })?;
            trace!("[ConfSource.Kie] Stored {}", stored.key);
            result.insert(stored.key, Value::String(stored.value));
        }
        Ok(result)
    }

    async fn delete_configs_by_keys(&self, keys: &[String], dimension: &Dimension) -> ConfResult<ConfigDocument> {
        if keys.is_empty() {
            return Err(ConfError::EmptyKeys("[ConfSource.Kie] not supported : empty keys".to_string()));
        }
        let mut result = ConfigDocument::new();
        for key in keys {
            let url = format!("{}?kvID={}", self.kv_url(dimension, "/"), urlencoding::encode(key));
            let request = ConfHttpRequest::new(Method::DELETE, url).headers(vec![(HEADER_CONTENT_TYPE.to_string(), JSON_CONTENT_TYPE.to_string())]);
            let status = match self.transport.execute(request).await {
                Ok(response) if response.is_success() => {
                    debug!("[ConfSource.Kie] Delete The KeyId: {}", key);
                    RET_SUCC
                }
                Ok(response) => {
                    error!("[ConfSource.Kie] Error in Delete {} from Kie, statusCode: {}", key, response.code);
                    RET_DEL_ERR
                }
                Err(error) => {
                    error!("[ConfSource.Kie] Error in Delete {} from Kie: {}", key, error);
                    RET_DEL_ERR
                }
            };
            result.insert(key.clone(), Value::from(status));
        }
        Ok(result)
    }

    async fn watch(&self, _: ConfChangeListener, _: ConfErrorHandler) -> ConfResult<ConfWatchHandle> {
        Ok(ConfWatchHandle::noop())
    }
}
