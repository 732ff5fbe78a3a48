//! Azure DevOps connection settings.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://dev.azure.com";
pub const DEFAULT_RELEASE_URL: &str = "https://vsrm.dev.azure.com";
pub const DEFAULT_EXTMGMT_URL: &str = "https://extmgmt.dev.azure.com";
pub const DEFAULT_API_VERSION: &str = "7.1";

/// Azure DevOps connection configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AzdoConfig {
    /// Core services (projects, builds, pipelines)
    pub base_url: String,
    /// Release management services
    pub release_url: String,
    /// Extension management services (extension data documents)
    pub extmgmt_url: String,
    /// Personal access token, sent as basic auth
    #[serde(skip_serializing)]
    pub token: Option<String>,
    pub api_version: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for AzdoConfig {
    fn default() -> Self {
        AzdoConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            release_url: DEFAULT_RELEASE_URL.to_string(),
            extmgmt_url: DEFAULT_EXTMGMT_URL.to_string(),
            token: None,
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout_secs: 30,
        }
    }
}

impl fmt::Debug for AzdoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzdoConfig")
            .field("base_url", &self.base_url)
            .field("release_url", &self.release_url)
            .field("extmgmt_url", &self.extmgmt_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("api_version", &self.api_version)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl AzdoConfig {
    /// Create a new config from environment variables
    ///
    /// Reads `AZDO_BASE_URL`, `AZDO_RELEASE_URL`, `AZDO_EXTMGMT_URL` and
    /// `AZDO_TOKEN`; unset variables keep their defaults.
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Create config for a single host serving every API (on-premises servers, tests)
    pub fn new(base_url: &str) -> Self {
        let base_url = trim_url(base_url);
        AzdoConfig {
            release_url: base_url.clone(),
            extmgmt_url: base_url.clone(),
            base_url,
            ..Self::default()
        }
    }

    /// Set authentication token
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        AzdoConfig {
            base_url: var("AZDO_BASE_URL")
                .map(|u| trim_url(&u))
                .unwrap_or(defaults.base_url),
            release_url: var("AZDO_RELEASE_URL")
                .map(|u| trim_url(&u))
                .unwrap_or(defaults.release_url),
            extmgmt_url: var("AZDO_EXTMGMT_URL")
                .map(|u| trim_url(&u))
                .unwrap_or(defaults.extmgmt_url),
            token: var("AZDO_TOKEN").filter(|t| !t.is_empty()),
            ..defaults
        }
    }
}

fn trim_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
