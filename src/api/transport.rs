//! Transport abstraction for the bot API.
//!
//! The [`ApiClient`](super::ApiClient) owns status checking, JSON decoding and
//! the request timeout; a transport only moves bytes. This keeps the client
//! testable without a server.

use std::fmt::Debug;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, COOKIE};
use reqwest::Client;
use serde_json::Value;

use super::ApiError;

/// HTTP method used by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// A single outbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the base URL, always starting with `/`.
    pub path: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Option<Value>) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            body,
        }
    }
}

/// Raw response as received from the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Something that can deliver an [`ApiRequest`] and return the raw response.
///
/// Implementations must not interpret the status code; non-2xx answers are
/// returned as `Ok` so the client can classify them.
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, ApiError>;

    /// Human-readable target, shown in the status bar.
    fn describe(&self) -> &str;
}

/// Transport backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport for `base_url`, optionally forwarding a session cookie
    /// so that authenticated endpoints answer.
    pub fn new(base_url: &str, session_cookie: Option<&str>) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(cookie) = session_cookie {
            let value = HeaderValue::from_str(cookie)
                .map_err(|e| ApiError::Transport(format!("Invalid session cookie: {}", e)))?;
            headers.insert(COOKIE, value);
        }

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, ApiError> {
        let url = self.url(&request.path);
        let builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        };
        let builder = match request.body {
            Some(ref body) => builder.json(body),
            None => builder,
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();

        Ok(RawResponse { status, body })
    }

    fn describe(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let transport = HttpTransport::new("http://localhost:8080/", None).unwrap();
        assert_eq!(transport.describe(), "http://localhost:8080");
        assert_eq!(
            transport.url("/api/stats"),
            "http://localhost:8080/api/stats"
        );
    }

    #[test]
    fn test_invalid_cookie_is_rejected() {
        let result = HttpTransport::new("http://localhost", Some("session=\nbroken"));
        assert!(matches!(result, Err(ApiError::Transport(_))));
    }

    #[test]
    fn test_request_constructors() {
        let get = ApiRequest::get("/api/stats");
        assert_eq!(get.method, Method::Get);
        assert!(get.body.is_none());

        let post = ApiRequest::post("/api/bot/reload", None);
        assert_eq!(post.method, Method::Post);
        assert_eq!(post.path, "/api/bot/reload");
    }
}
