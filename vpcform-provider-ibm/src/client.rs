//! HTTP access to the IBM Cloud VPC API
//!
//! [`ApiClient`] is the seam between resource operations and the wire:
//! [`HttpClient`] talks to the real endpoint, tests substitute a recording
//! mock.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, trace};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;
use url::Url;
use uuid::Uuid;
use vpcform_core::provider::{ErrorKind, ProviderError};

use crate::config::{ConfigError, ProviderConfig};

/// Items requested per page when listing collections
pub const PAGE_LIMIT: usize = 100;

/// Seconds before expiry at which a cached IAM token is renewed
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

const IAM_GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Patch,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Patch => reqwest::Method::PATCH,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Error answered by the API, or a transport failure (status 0)
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{}{code}: {message}{}", status_prefix(*status), trace_suffix(trace))]
pub struct ApiError {
    pub status: u16,
    pub code: String,
    pub message: String,
    pub trace: Option<String>,
}

fn status_prefix(status: u16) -> String {
    if status == 0 {
        String::new()
    } else {
        format!("HTTP {} ", status)
    }
}

fn trace_suffix(trace: &Option<String>) -> String {
    trace
        .as_ref()
        .map(|t| format!(" (trace {})", t))
        .unwrap_or_default()
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ErrorDetail>,
    trace: Option<String>,
    #[serde(rename = "errorCode")]
    error_code: Option<String>,
    #[serde(rename = "errorMessage")]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    code: Option<String>,
    message: Option<String>,
}

impl ApiError {
    pub fn new(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            trace: None,
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(0, "transport_error", message)
    }

    /// Build from a non-2xx response body
    ///
    /// Understands both the VPC error envelope and the IAM one; anything
    /// else is kept verbatim as the message.
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
        let first = parsed.errors.into_iter().next();
        let code = first
            .as_ref()
            .and_then(|e| e.code.clone())
            .or(parsed.error_code)
            .unwrap_or_else(|| status_code_name(status).to_string());
        let message = first
            .and_then(|e| e.message)
            .or(parsed.error_message)
            .unwrap_or_else(|| body.trim().to_string());
        Self {
            status,
            code,
            message,
            trace: parsed.trace,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    pub fn is_conflict(&self) -> bool {
        self.status == 409
    }
}

fn status_code_name(status: u16) -> &'static str {
    match status {
        400 => "bad_request",
        401 => "unauthorized",
        403 => "forbidden",
        404 => "not_found",
        409 => "conflict",
        429 => "too_many_requests",
        500..=599 => "server_error",
        _ => "unexpected_status",
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::transport(err.to_string())
    }
}

impl From<ApiError> for ProviderError {
    fn from(err: ApiError) -> Self {
        let kind = match err.status {
            404 => ErrorKind::NotFound,
            409 => ErrorKind::Conflict,
            400 | 422 => ErrorKind::InvalidInput,
            _ => ErrorKind::Other,
        };
        ProviderError::with_kind(kind, "API request failed").with_cause(err)
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Access to the VPC REST API
///
/// Paths are relative to the versioned base URL (e.g. `/vpcs/r006-1`).
/// An empty response body is returned as `Value::Null`.
#[async_trait]
pub trait ApiClient: Send + Sync {
    async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<Value>,
    ) -> ApiResult<Value>;

    async fn get(&self, path: &str, query: &[(String, String)]) -> ApiResult<Value> {
        self.request(Method::Get, path, query, None).await
    }

    async fn post(&self, path: &str, body: Value) -> ApiResult<Value> {
        self.request(Method::Post, path, &[], Some(body)).await
    }

    /// Merge-patch of the given fields
    async fn patch(&self, path: &str, body: Value) -> ApiResult<Value> {
        self.request(Method::Patch, path, &[], Some(body)).await
    }

    async fn put(&self, path: &str, body: Value) -> ApiResult<Value> {
        self.request(Method::Put, path, &[], Some(body)).await
    }

    async fn delete(&self, path: &str) -> ApiResult<Value> {
        self.request(Method::Delete, path, &[], None).await
    }
}

/// Fetch every page of a collection
///
/// Follows the `start` token carried in `next.href` until the API stops
/// returning one.
pub async fn list_all(
    client: &dyn ApiClient,
    path: &str,
    collection_key: &str,
    query: &[(String, String)],
) -> ApiResult<Vec<Value>> {
    let mut items = Vec::new();
    let mut start: Option<String> = None;

    loop {
        let mut page_query = query.to_vec();
        page_query.push(("limit".to_string(), PAGE_LIMIT.to_string()));
        if let Some(token) = &start {
            page_query.push(("start".to_string(), token.clone()));
        }

        let page = client.get(path, &page_query).await?;
        if let Some(Value::Array(page_items)) = page.get(collection_key) {
            items.extend(page_items.iter().cloned());
        }

        start = page
            .get("next")
            .and_then(|next| next.get("href"))
            .and_then(Value::as_str)
            .and_then(start_token);
        if start.is_none() {
            break;
        }
        trace!("{}: fetching next page", path);
    }

    debug!("{}: listed {} {}", path, items.len(), collection_key);
    Ok(items)
}

/// Extract the `start` query parameter of a pagination link
fn start_token(href: &str) -> Option<String> {
    let url = Url::parse(href).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "start")
        .map(|(_, value)| value.into_owned())
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    /// Absolute expiry, seconds since the epoch
    expiration: Option<i64>,
    /// Relative lifetime in seconds
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
struct BearerToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl BearerToken {
    fn from_response(response: TokenResponse, now: DateTime<Utc>) -> Self {
        let expires_at = response
            .expiration
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .or_else(|| {
                response
                    .expires_in
                    .map(|secs| now + chrono::Duration::seconds(secs))
            })
            .unwrap_or(now);
        Self {
            value: response.access_token,
            expires_at,
        }
    }

    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + chrono::Duration::seconds(TOKEN_REFRESH_MARGIN_SECS) < self.expires_at
    }
}

/// Exchanges the API key for IAM bearer tokens
struct IamAuthenticator {
    http: reqwest::Client,
    token_url: String,
    api_key: String,
    cached: Mutex<Option<BearerToken>>,
}

impl IamAuthenticator {
    async fn token(&self) -> ApiResult<String> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now();
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.value.clone());
        }

        debug!("requesting IAM token from {}", self.token_url);
        let resp = self
            .http
            .post(&self.token_url)
            .header(ACCEPT, "application/json")
            .form(&[("grant_type", IAM_GRANT_TYPE), ("apikey", self.api_key.as_str())])
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(ApiError::from_response(status.as_u16(), &body));
        }

        let response: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| ApiError::transport(format!("invalid IAM token response: {}", e)))?;
        let token = BearerToken::from_response(response, now);
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }
}

/// [`ApiClient`] backed by reqwest
pub struct HttpClient {
    http: reqwest::Client,
    base_url: String,
    api_version: String,
    generation: String,
    auth: IamAuthenticator,
}

impl HttpClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ConfigError::Http(e.to_string()))?;

        let token_url = format!(
            "{}/identity/token",
            config.iam_endpoint.trim_end_matches('/')
        );

        Ok(Self {
            http: http.clone(),
            base_url: config.vpc_base_url(),
            api_version: config.api_version.clone(),
            generation: config.generation.to_string(),
            auth: IamAuthenticator {
                http,
                token_url,
                api_key: config.api_key.clone(),
                cached: Mutex::new(None),
            },
        })
    }
}

#[async_trait]
impl ApiClient for HttpClient {
    async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<Value>,
    ) -> ApiResult<Value> {
        let token = self.auth.token().await?;
        let correlation_id = Uuid::new_v4().to_string();
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {} (correlation id {})", method, path, correlation_id);

        let mut req = self
            .http
            .request(method.into(), &url)
            .query(&[
                ("version", self.api_version.as_str()),
                ("generation", self.generation.as_str()),
            ])
            .query(query)
            .bearer_auth(token)
            .header("X-Correlation-Id", correlation_id.as_str())
            .header(ACCEPT, "application/json");

        if let Some(body) = body {
            req = match method {
                Method::Patch => req
                    .header(CONTENT_TYPE, "application/merge-patch+json")
                    .body(body.to_string()),
                _ => req.json(&body),
            };
        }

        let resp = req.send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            let err = ApiError::from_response(status.as_u16(), &text);
            debug!("{} {} failed: {}", method, path, err);
            return Err(err);
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| {
            ApiError::new(
                status.as_u16(),
                "invalid_response",
                format!("{} {} returned invalid JSON: {}", method, path, e),
            )
        })
    }
}
