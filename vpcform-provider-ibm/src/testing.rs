//! Recording in-memory `ApiClient` for unit tests

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::client::{ApiClient, ApiError, ApiResult, Method};
use crate::config::ProviderConfig;
use crate::provider::IbmVpcProvider;

#[derive(Debug, Clone)]
pub(crate) struct Call {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

/// Scripted responses keyed by method and path
///
/// Responses queued for one route are replayed in order; the last one
/// repeats forever. Unrouted requests fail with status 599.
#[derive(Default)]
pub(crate) struct MockApi {
    routes: Mutex<HashMap<(Method, String), VecDeque<ApiResult<Value>>>>,
    calls: Mutex<Vec<Call>>,
}

impl MockApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on(&self, method: Method, path: &str, response: ApiResult<Value>) -> &Self {
        self.routes
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(response);
        self
    }

    pub fn not_found(&self, method: Method, path: &str) -> &Self {
        self.on(method, path, Err(ApiError::new(404, "not_found", "not found")))
    }

    pub fn conflict(&self, method: Method, path: &str) -> &Self {
        self.on(method, path, Err(ApiError::new(409, "conflict", "in use")))
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.method == method && c.path == path)
            .count()
    }

    /// Body of the last request to a route
    pub fn last_body(&self, method: Method, path: &str) -> Option<Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|c| c.method == method && c.path == path)
            .and_then(|c| c.body.clone())
    }
}

#[async_trait]
impl ApiClient for MockApi {
    async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<Value>,
    ) -> ApiResult<Value> {
        self.calls.lock().unwrap().push(Call {
            method,
            path: path.to_string(),
            query: query.to_vec(),
            body,
        });

        let mut routes = self.routes.lock().unwrap();
        match routes.get_mut(&(method, path.to_string())) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => Err(ApiError::new(
                599,
                "unrouted",
                format!("no mock response for {} {}", method, path),
            )),
        }
    }
}

/// Provider over `api` polling every millisecond
pub(crate) fn provider_for(api: Arc<MockApi>) -> IbmVpcProvider {
    let config = ProviderConfig::new("test-key", "us-south").with_poll_interval(Duration::from_millis(1));
    IbmVpcProvider::with_client(api, config)
}

/// Like [`provider_for`], with every wait capped at `timeout`
pub(crate) fn provider_with_timeout(api: Arc<MockApi>, timeout: Duration) -> IbmVpcProvider {
    let config = ProviderConfig::new("test-key", "us-south")
        .with_poll_interval(Duration::from_millis(1))
        .with_timeout_override(timeout);
    IbmVpcProvider::with_client(api, config)
}
