//! Client configuration and the organization origin.
//!
//! Configuration is validated once, when a client is constructed, so a bad
//! organization URL or a missing token surfaces immediately instead of on
//! the first request.

use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::ConfigError;

pub const ORG_URL_ENV: &str = "OKTA_CLIENT_ORGURL";
pub const TOKEN_ENV: &str = "OKTA_CLIENT_TOKEN";
pub const CONNECTION_TIMEOUT_ENV: &str = "OKTA_CLIENT_CONNECTIONTIMEOUT";

/// The base URL every request must target, normalized to end with `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin(String);

impl Origin {
    /// Parse an absolute `http(s)://` URL.
    ///
    /// Plain `http` is accepted here so tests can target a local server;
    /// `ClientConfig::validate` is what insists on `https`.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ConfigError::MissingOrgUrl);
        }
        let url = Url::parse(raw).map_err(|e| ConfigError::InvalidOrgUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(ConfigError::InvalidOrgUrl {
                url: raw.to_string(),
                reason: "expected an absolute http(s) url".to_string(),
            });
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(ConfigError::InvalidOrgUrl {
                url: raw.to_string(),
                reason: "organization url must not carry a query or fragment".to_string(),
            });
        }

        let mut normalized = raw.to_string();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `url` lies under this origin (case-insensitive prefix match).
    pub fn contains(&self, url: &str) -> bool {
        let origin = self.0.to_ascii_lowercase();
        let url = url.to_ascii_lowercase();
        url.starts_with(&origin) || url == origin.trim_end_matches('/')
    }

    /// Join a relative href onto the origin. Absolute hrefs are returned as-is.
    pub fn resolve(&self, href: &str) -> String {
        let lower = href.to_ascii_lowercase();
        if lower.starts_with("https://") || lower.starts_with("http://") {
            return href.to_string();
        }
        format!("{}{}", self.0, href.trim_start_matches('/'))
    }
}

/// Raw client settings, as supplied by the caller or the environment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    #[serde(default)]
    pub org_url: String,
    #[serde(default)]
    pub token: String,
    /// Per-request timeout in seconds. `None` means no client-side timeout.
    #[serde(default)]
    pub connection_timeout: Option<u64>,
}

impl ClientConfig {
    pub fn new(org_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            org_url: org_url.into(),
            token: token.into(),
            connection_timeout: None,
        }
    }

    pub fn with_connection_timeout(mut self, seconds: u64) -> Self {
        self.connection_timeout = Some(seconds);
        self
    }

    /// Read `OKTA_CLIENT_ORGURL`, `OKTA_CLIENT_TOKEN` and
    /// `OKTA_CLIENT_CONNECTIONTIMEOUT`. Missing values are left empty and
    /// rejected later by `validate`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let org_url = std::env::var(ORG_URL_ENV).unwrap_or_default();
        let token = std::env::var(TOKEN_ENV).unwrap_or_default();
        let connection_timeout = match std::env::var(CONNECTION_TIMEOUT_ENV) {
            Ok(raw) if !raw.trim().is_empty() => Some(
                raw.trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidTimeout(raw.clone()))?,
            ),
            _ => None,
        };
        Ok(Self {
            org_url,
            token,
            connection_timeout,
        })
    }

    pub fn validate(&self) -> Result<ValidatedConfig, ConfigError> {
        if self.token.trim().is_empty() {
            return Err(ConfigError::MissingToken);
        }
        let org_url = self.org_url.trim();
        if org_url.is_empty() {
            return Err(ConfigError::MissingOrgUrl);
        }
        if !org_url.to_ascii_lowercase().starts_with("https://") {
            return Err(ConfigError::InsecureOrgUrl(org_url.to_string()));
        }

        Ok(ValidatedConfig {
            origin: Origin::parse(org_url)?,
            token: self.token.trim().to_string(),
            connection_timeout: self.connection_timeout.map(Duration::from_secs),
        })
    }
}

/// Configuration that passed validation.
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub origin: Origin,
    pub token: String,
    pub connection_timeout: Option<Duration>,
}
