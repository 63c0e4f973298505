//! Transport seam
//!
//! The forwarding engine and health aggregator talk to upstreams through
//! this trait so tests can substitute fakes and count calls.

use async_trait::async_trait;
use std::time::Duration;

use sg_common::ProxyMethod;

/// A fully built outbound call, ready to execute
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: ProxyMethod,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub json_body: Option<serde_json::Value>,
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
}

impl OutboundRequest {
    pub fn get(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            method: ProxyMethod::Get,
            url: url.into(),
            query: Vec::new(),
            json_body: None,
            headers: Vec::new(),
            timeout,
        }
    }
}

/// Raw upstream response before outcome translation
#[derive(Debug, Clone)]
pub struct OutboundResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl OutboundResponse {
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("content-type"))
            .map(|(_, value)| value.as_str())
    }
}

/// Transport-level failure classification
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out")]
    TimedOut,

    #[error("connection failed")]
    Connect,

    #[error("transport failure: {0}")]
    Other(String),
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: OutboundRequest) -> Result<OutboundResponse, TransportError>;
}

/// Production transport backed by a shared reqwest client
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(connect_timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;
        Ok(Self { client })
    }
}

fn to_reqwest_method(method: ProxyMethod) -> reqwest::Method {
    match method {
        ProxyMethod::Get => reqwest::Method::GET,
        ProxyMethod::Post => reqwest::Method::POST,
        ProxyMethod::Put => reqwest::Method::PUT,
        ProxyMethod::Patch => reqwest::Method::PATCH,
        ProxyMethod::Delete => reqwest::Method::DELETE,
    }
}

fn classify(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::TimedOut
    } else if error.is_connect() {
        TransportError::Connect
    } else {
        TransportError::Other(error.to_string())
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: OutboundRequest) -> Result<OutboundResponse, TransportError> {
        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), &request.url)
            .timeout(request.timeout);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        // `.json()` only sets Content-Type when absent, so applying the
        // merged headers first keeps the field a singleton.
        if let Some(body) = &request.json_body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(classify)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.text().await.map_err(classify)?;

        Ok(OutboundResponse { status, headers, body })
    }
}
