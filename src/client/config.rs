//! Client configuration.

use std::time::Duration;

/// Configuration for a [`SlideruleClient`](super::SlideruleClient).
///
/// Controls which deployment the client talks to and how requests are
/// authorized.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Service domain (default: `slideruleearth.io`).
    pub domain: String,
    /// Organization subdomain; empty means the bare domain is used.
    pub organization: String,
    /// Optional JWT attached as a bearer token to every request.
    pub jwt: Option<String>,
    /// Optional per-request timeout (default: none).
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            domain: "slideruleearth.io".to_string(),
            organization: "sliderule".to_string(),
            jwt: None,
            timeout: None,
        }
    }
}

impl ClientConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the service domain.
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    /// Set the organization subdomain (empty disables the subdomain).
    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = organization.into();
        self
    }

    /// Set the bearer token for authorized deployments.
    pub fn with_jwt(mut self, jwt: impl Into<String>) -> Self {
        self.jwt = Some(jwt.into());
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The host requests are addressed to.
    pub fn host(&self) -> String {
        if self.organization.is_empty() {
            self.domain.clone()
        } else {
            format!("{}.{}", self.organization, self.domain)
        }
    }

    /// The endpoint URL for one service API.
    pub fn url_for(&self, api: &str) -> String {
        format!("https://{}/source/{}", self.host(), api)
    }
}
