#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use confsource::basic::error::ConfError;
use confsource::basic::result::ConfResult;
use confsource::web::web_client::{ConfHttpRequest, ConfHttpResponse, ConfTransport, Method};
use serde_json::Value;

#[derive(Clone)]
pub enum MockReply {
    Response(ConfHttpResponse),
    Fail,
}

impl MockReply {
    pub fn json(code: u16, body: Value) -> Self {
        Self::text(code, Some("application/json; charset=utf-8"), &body.to_string())
    }

    pub fn text(code: u16, content_type: Option<&str>, body: &str) -> Self {
        let mut headers = HashMap::new();
        if let Some(content_type) = content_type {
            headers.insert("content-type".to_string(), content_type.to_string());
        }
        MockReply::Response(ConfHttpResponse {
            code,
            headers,
            body: body.to_string(),
        })
    }
}

/// Scripted transport: replies are matched on `METHOD url`, consumed in order,
/// and the last one of a route repeats. Unknown routes fail like a refused connection.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<String, VecDeque<MockReply>>>,
    calls: Mutex<Vec<ConfHttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        MockTransport::default()
    }

    pub fn on(&self, method: Method, url: &str, reply: MockReply) -> &Self {
        self.routes.lock().unwrap().entry(format!("{method} {url}")).or_default().push_back(reply);
        self
    }

    pub fn calls(&self) -> Vec<ConfHttpRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_to(&self, url_prefix: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|request| request.url.starts_with(url_prefix)).count()
    }
}

#[async_trait]
impl ConfTransport for MockTransport {
    async fn execute(&self, request: ConfHttpRequest) -> ConfResult<ConfHttpResponse> {
        let key = format!("{} {}", request.method, request.url);
        self.calls.lock().unwrap().push(request);
        let reply = {
            let mut routes = self.routes.lock().unwrap();
            match routes.get_mut(&key) {
                Some(replies) if replies.len() > 1 => replies.pop_front(),
                Some(replies) => replies.front().cloned(),
                None => None,
            }
        };
        match reply {
            Some(MockReply::Response(response)) => Ok(response),
            Some(MockReply::Fail) | None => Err(ConfError::TransportFailure(format!("connection refused: {key}"))),
        }
    }
}
