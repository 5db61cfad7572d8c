use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::normalizer::{normalize_response, transport_failure};
use crate::models::RequestResult;
use crate::session::session_store::bearer_value;
use crate::session::TokenSource;

/// Per-call knobs for `ApiClient` requests.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// Extra headers; they replace the defaults on a name clash.
    pub headers: Vec<(String, String)>,
    /// Query pairs, URL-encoded onto the path.
    pub query: Vec<(String, String)>,
    /// Attach the bearer token when one is held.
    pub require_auth: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        RequestOptions {
            headers: Vec::new(),
            query: Vec::new(),
            require_auth: true,
        }
    }
}

impl RequestOptions {
    pub fn new() -> Self {
        RequestOptions::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Never send the `Authorization` header, even if a token is held.
    pub fn without_auth(mut self) -> Self {
        self.require_auth = false;
        self
    }
}

/// REST client that attaches the session's bearer token and normalizes
/// every outcome into a `RequestResult`. No method ever returns early
/// with a panic or an `Err`; failures are part of the result.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenSource>,
}

impl ApiClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, tokens: Arc<dyn TokenSource>) -> Self {
        ApiClient {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, options: RequestOptions) -> RequestResult<T> {
        self.request(Method::GET, path, None, options).await
    }

    pub async fn post<T, B>(&self, path: &str, body: Option<&B>, options: RequestOptions) -> RequestResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_with_body(Method::POST, path, body, options).await
    }

    pub async fn put<T, B>(&self, path: &str, body: Option<&B>, options: RequestOptions) -> RequestResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_with_body(Method::PUT, path, body, options).await
    }

    pub async fn patch<T, B>(&self, path: &str, body: Option<&B>, options: RequestOptions) -> RequestResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_with_body(Method::PATCH, path, body, options).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str, options: RequestOptions) -> RequestResult<T> {
        self.request(Method::DELETE, path, None, options).await
    }

    async fn send_with_body<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        options: RequestOptions,
    ) -> RequestResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let payload = match body.map(serde_json::to_vec).transpose() {
            Ok(payload) => payload,
            Err(e) => return RequestResult::failure(format!("Failed to serialize request body: {}", e)),
        };
        self.request(method, path, payload, options).await
    }

    /// Default JSON content type, then caller headers, then the bearer
    /// header when auth is required and a token is held. Unauthenticated
    /// calls never carry `Authorization`, even one the caller supplied.
    pub(crate) fn build_headers(&self, options: &RequestOptions) -> Result<HeaderMap, String> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        for (name, value) in &options.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| format!("Invalid header name '{}': {}", name, e))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| format!("Invalid value for header '{}': {}", name, e))?;
            headers.insert(name, value);
        }

        if options.require_auth {
            match self.tokens.current_token() {
                Some(token) => {
                    if let Some(value) = bearer_value(&token) {
                        headers.insert(AUTHORIZATION, value);
                    }
                }
                None => debug!("No token held; sending request without Authorization"),
            }
        } else if headers.remove(AUTHORIZATION).is_some() {
            debug!("Dropping caller Authorization header on unauthenticated request");
        }

        Ok(headers)
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
        options: RequestOptions,
    ) -> RequestResult<T> {
        let headers = match self.build_headers(&options) {
            Ok(headers) => headers,
            Err(e) => return RequestResult::failure(e),
        };

        let url = format!("{}{}", self.base_url, path);
        debug!(method = %method, path, "Sending API request");

        let mut builder = self.http.request(method.clone(), &url).headers(headers);
        if !options.query.is_empty() {
            builder = builder.query(&options.query);
        }
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(method = %method, path, "API request failed: {}", e);
                return transport_failure(&e);
            }
        };

        let status = response.status();
        let raw_body = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                warn!(method = %method, path, status = status.as_u16(), "Failed to read response body: {}", e);
                return transport_failure(&e);
            }
        };
        debug!(method = %method, path, status = status.as_u16(), "API response received");

        normalize_response(status, &raw_body).and_then(decode)
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, String> {
    serde_json::from_value(value).map_err(|e| format!("Failed to decode response: {}", e))
}
