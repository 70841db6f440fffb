//! Raw HTTP seam between the typed client and TestRail.
//!
//! TestRail serves its API from `index.php` with the route in the query
//! string: `GET /api/v2/get_plan/5` is sent as
//! `https://host/index.php?/api/v2/get_plan/5&limit=250`. [`HttpTransport`]
//! does this rewriting, attaches Basic auth and JSON headers to every call,
//! and logs unsuccessful responses.

use std::fmt;

use async_trait::async_trait;
use reqwest::Url;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

use crate::config::{ConfigError, TestRailSettings, TransportSettings};

/// API version prefix every route is mounted under.
pub const API_PREFIX: &str = "/api/v2";

/// Longest response body prefix written to the log for a failed call.
pub const MAX_LOGGED_BODY_BYTES: usize = 20_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => f.write_str("GET"),
            Self::Post => f.write_str("POST"),
        }
    }
}

/// One logical API call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Route relative to the API prefix, e.g. `/get_plan/5`
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        ApiRequest {
            method: Method::Get,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        ApiRequest {
            method: Method::Post,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Value of the first query parameter with this key.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Raw outcome of a call that reached the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        ApiResponse {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The call did not produce an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("timed out: {0}")]
    Timeout(String),

    #[error("{0}")]
    Other(String),
}

/// Executes API calls. Implemented over HTTP, and by in-memory fakes in tests.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

/// Build the `index.php?/api/v2/...` URL for a route.
pub fn api_url(base: &Url, path: &str, query: &[(String, String)]) -> Url {
    let mut route = format!("{}{}", API_PREFIX, path);
    for (key, value) in query {
        route.push('&');
        route.push_str(&urlencoding::encode(key));
        route.push('=');
        route.push_str(&urlencoding::encode(value));
    }

    let mut url = base.clone();
    url.set_path("/index.php");
    url.set_query(Some(&route));
    url
}

/// Truncate a body for logging without splitting a character.
fn body_prefix(body: &str) -> &str {
    if body.len() <= MAX_LOGGED_BODY_BYTES {
        return body;
    }
    let mut end = MAX_LOGGED_BODY_BYTES;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

/// reqwest-backed transport.
pub struct HttpTransport {
    http_client: reqwest::Client,
    base_url: Url,
    email: String,
    api_key: SecretString,
}

impl HttpTransport {
    /// Create a transport from connection and transport settings.
    pub fn new(
        testrail: &TestRailSettings,
        transport: &TransportSettings,
    ) -> Result<Self, ConfigError> {
        let base_url = Url::parse(&testrail.url)
            .map_err(|_| ConfigError::InvalidValue("TESTRAIL_URL must be a valid URL"))?;

        let mut builder = reqwest::Client::builder()
            .connect_timeout(transport.connect_timeout)
            .timeout(transport.request_timeout);

        if let Some(proxy) = &transport.proxy {
            let proxy = reqwest::Proxy::all(proxy.as_str())
                .map_err(|_| ConfigError::InvalidValue("TESTRAIL_PROXY must be a valid URL"))?;
            builder = builder.proxy(proxy);
        }

        let http_client = builder
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        info!(
            "TestRail transport initialized (url={}, proxy={:?}, request_timeout={:?})",
            base_url, transport.proxy, transport.request_timeout
        );

        Ok(Self {
            http_client,
            base_url,
            email: testrail.email.clone(),
            api_key: testrail.api_key.clone(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = api_url(&self.base_url, &request.path, &request.query);
        debug!("{} {}", request.method, url);

        let builder = match request.method {
            Method::Get => self.http_client.get(url.clone()),
            Method::Post => self.http_client.post(url.clone()),
        };
        let mut builder = builder
            .basic_auth(&self.email, Some(self.api_key.expose_secret()))
            .header("Accept", "application/json")
            .header("Content-Type", "application/json");
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let to_transport_error = |e: reqwest::Error| {
            if e.is_timeout() {
                TransportError::Timeout(format!("{} {}: {}", request.method, request.path, e))
            } else {
                TransportError::Other(format!("{} {}: {}", request.method, request.path, e))
            }
        };

        let response = builder.send().await.map_err(to_transport_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(to_transport_error)?;

        if !(200..300).contains(&status) {
            info!(
                "TestRail call failed: host={} path={} status={} body={}",
                url.host_str().unwrap_or_default(),
                request.path,
                status,
                body_prefix(&body)
            );
        }

        Ok(ApiResponse { status, body })
    }
}
