//! Provider configuration
//!
//! Settings come from the environment (the same variables the IBM Cloud
//! CLI and SDKs read) and can be overridden by the caller.

use std::time::Duration;

use thiserror::Error;
use url::Url;

/// IBM Cloud regions with VPC endpoints
pub const VPC_REGIONS: &[&str] = &[
    "au-syd", "br-sao", "ca-mon", "ca-tor", "eu-de", "eu-es", "eu-gb", "jp-osa", "jp-tok",
    "us-east", "us-south",
];

pub const DEFAULT_REGION: &str = "us-south";
pub const DEFAULT_IAM_ENDPOINT: &str = "https://iam.cloud.ibm.com";
/// API version date sent with every request
pub const DEFAULT_API_VERSION: &str = "2024-11-12";

/// Errors raised while assembling a [`ProviderConfig`]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing API key: set IC_API_KEY or IBMCLOUD_API_KEY")]
    MissingApiKey,

    #[error("Invalid region '{0}', expected one of: {regions}", regions = VPC_REGIONS.join(", "))]
    InvalidRegion(String),

    #[error("Invalid endpoint '{0}': expected an http:// or https:// URL with a host")]
    InvalidEndpoint(String),

    #[error("Failed to build HTTP client: {0}")]
    Http(String),
}

/// Connection and timing settings for the IBM Cloud VPC provider
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    pub region: String,
    /// Overrides `https://<region>.iaas.cloud.ibm.com`
    pub vpc_endpoint: Option<String>,
    pub iam_endpoint: String,
    pub api_version: String,
    pub generation: u8,
    /// Per-request HTTP timeout
    pub request_timeout: Duration,
    /// Delay between two status polls
    pub poll_interval: Duration,
    /// Replaces every per-kind create/update/delete timeout when set
    pub timeout_override: Option<Duration>,
}

impl ProviderConfig {
    pub fn new(api_key: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            region: region.into(),
            vpc_endpoint: None,
            iam_endpoint: DEFAULT_IAM_ENDPOINT.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            generation: 2,
            request_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_secs(10),
            timeout_override: None,
        }
    }

    /// Build a configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a configuration from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let first = |names: &[&str]| {
            names
                .iter()
                .filter_map(|n| lookup(n))
                .map(|v| v.trim().to_string())
                .find(|v| !v.is_empty())
        };

        let api_key = first(&["IC_API_KEY", "IBMCLOUD_API_KEY"]).ok_or(ConfigError::MissingApiKey)?;
        let region =
            first(&["IC_REGION", "IBMCLOUD_REGION"]).unwrap_or_else(|| DEFAULT_REGION.to_string());

        let mut config = Self::new(api_key, region);
        config.vpc_endpoint = first(&["IBMCLOUD_IS_NG_API_ENDPOINT"]);
        if let Some(iam) = first(&["IBMCLOUD_IAM_API_ENDPOINT"]) {
            config.iam_endpoint = iam;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_vpc_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.vpc_endpoint = Some(endpoint.into());
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_timeout_override(mut self, timeout: Duration) -> Self {
        self.timeout_override = Some(timeout);
        self
    }

    /// Check region and endpoint values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if self.vpc_endpoint.is_none() && !VPC_REGIONS.contains(&self.region.as_str()) {
            return Err(ConfigError::InvalidRegion(self.region.clone()));
        }
        for endpoint in self.vpc_endpoint.iter().chain(Some(&self.iam_endpoint)) {
            validate_endpoint(endpoint)?;
        }
        Ok(())
    }

    /// Base URL of the VPC API, including the `/v1` prefix
    pub fn vpc_base_url(&self) -> String {
        let root = match &self.vpc_endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://{}.iaas.cloud.ibm.com", self.region),
        };
        if root.ends_with("/v1") {
            root
        } else {
            format!("{}/v1", root)
        }
    }

    /// Effective timeout for one operation
    pub fn effective_timeout(&self, default: Duration) -> Duration {
        self.timeout_override.unwrap_or(default)
    }
}

/// Endpoints must be absolute http(s) URLs naming a host
fn validate_endpoint(endpoint: &str) -> Result<(), ConfigError> {
    let invalid = || ConfigError::InvalidEndpoint(endpoint.to_string());
    let url = Url::parse(endpoint).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid());
    }
    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(invalid()),
    }
}

/// Per-kind operation deadlines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub create: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Timeouts {
    pub const fn minutes(create: u64, update: u64, delete: u64) -> Self {
        Self {
            create: Duration::from_secs(create * 60),
            update: Duration::from_secs(update * 60),
            delete: Duration::from_secs(delete * 60),
        }
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self::minutes(10, 10, 10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn missing_api_key_is_an_error() {
        let result = ProviderConfig::from_lookup(lookup(&[("IC_REGION", "eu-de")]));
        assert!(matches!(result, Err(ConfigError::MissingApiKey)));
    }

    #[test]
    fn region_defaults_to_us_south() {
        let config = ProviderConfig::from_lookup(lookup(&[("IBMCLOUD_API_KEY", "key")])).unwrap();
        assert_eq!(config.region, "us-south");
        assert_eq!(config.vpc_base_url(), "https://us-south.iaas.cloud.ibm.com/v1");
    }

    #[test]
    fn ic_variables_take_precedence() {
        let config = ProviderConfig::from_lookup(lookup(&[
            ("IC_API_KEY", "primary"),
            ("IBMCLOUD_API_KEY", "secondary"),
            ("IC_REGION", "jp-tok"),
        ]))
        .unwrap();
        assert_eq!(config.api_key, "primary");
        assert_eq!(config.region, "jp-tok");
    }

    #[test]
    fn unknown_region_is_rejected() {
        let result = ProviderConfig::from_lookup(lookup(&[
            ("IC_API_KEY", "key"),
            ("IC_REGION", "mars-north"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidRegion(ref r)) if r == "mars-north"));
        let message = result.unwrap_err().to_string();
        assert!(message.contains("mars-north"));
        assert!(message.contains("us-south"));
    }

    #[test]
    fn malformed_endpoints_are_rejected() {
        for endpoint in [
            "https://",
            "https://exa mple.com",
            "ftp://us-south.iaas.cloud.ibm.com",
            "us-south.iaas.cloud.ibm.com",
            "http://",
        ] {
            let config = ProviderConfig::new("key", "us-south").with_vpc_endpoint(endpoint);
            assert!(
                matches!(config.validate(), Err(ConfigError::InvalidEndpoint(_))),
                "{} should be rejected",
                endpoint
            );
        }

        let mut config = ProviderConfig::new("key", "us-south");
        config.iam_endpoint = "not a url".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidEndpoint(_))));
    }

    #[test]
    fn well_formed_endpoints_pass() {
        let config = ProviderConfig::new("key", "us-south")
            .with_vpc_endpoint("http://localhost:8080/v1");
        assert!(config.validate().is_ok());
        assert!(ProviderConfig::new("key", "eu-de").validate().is_ok());
    }

    #[test]
    fn endpoint_override_keeps_v1_suffix_once() {
        let config = ProviderConfig::new("key", "us-south")
            .with_vpc_endpoint("https://us-south.private.iaas.cloud.ibm.com/v1/");
        assert_eq!(
            config.vpc_base_url(),
            "https://us-south.private.iaas.cloud.ibm.com/v1"
        );
    }

    #[test]
    fn timeout_override_wins() {
        let config = ProviderConfig::new("key", "us-south")
            .with_timeout_override(Duration::from_secs(5));
        assert_eq!(
            config.effective_timeout(Duration::from_secs(600)),
            Duration::from_secs(5)
        );
    }
}
