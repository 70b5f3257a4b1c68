//! The network boundary.
//!
//! # Design
//! `Transport` is the only place that performs I/O. The data store resolves
//! URLs and interprets responses; a transport only moves bytes, and it must
//! refuse any URL outside its origin before touching the network so the
//! organization token is never sent to another host. `HttpTransport` is the
//! production implementation; `mock::MockTransport` is the scripted one used
//! in tests.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONNECTION, CONTENT_TYPE};
use reqwest::{redirect, Method};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::config::{Origin, ValidatedConfig};
use crate::error::{ConfigError, TransportError};
use crate::http::{HttpMethod, HttpResponse};

/// Client identifier sent in the `User-Agent` header.
pub const USER_AGENT_NAME: &str = "oktasdk-rust";

/// Authorization scheme used for API tokens.
pub const AUTH_SCHEME: &str = "SSWS";

/// The `User-Agent` value: client name and crate version.
pub fn user_agent() -> String {
    format!("{USER_AGENT_NAME}/{}", env!("CARGO_PKG_VERSION"))
}

pub type TransportResult<T> = Result<T, TransportError>;

/// Executes raw HTTP calls against a single origin.
///
/// Every method must:
/// - fail with `TransportError::CrossOrigin` before any I/O when `url` is not
///   under `origin()`;
/// - stop waiting and fail with `TransportError::Cancelled` once `cancel`
///   fires;
/// - return `Ok(None)` only if it genuinely has no response to report.
#[async_trait]
pub trait Transport: Send + Sync {
    fn origin(&self) -> &Origin;

    async fn get(&self, url: &str, cancel: &CancellationToken) -> TransportResult<Option<HttpResponse>>;

    async fn post(
        &self,
        url: &str,
        body: Option<&str>,
        cancel: &CancellationToken,
    ) -> TransportResult<Option<HttpResponse>>;

    async fn put(
        &self,
        url: &str,
        body: Option<&str>,
        cancel: &CancellationToken,
    ) -> TransportResult<Option<HttpResponse>>;

    async fn delete(&self, url: &str, cancel: &CancellationToken) -> TransportResult<Option<HttpResponse>>;
}

/// Reject URLs outside `origin`.
pub fn ensure_same_origin(origin: &Origin, url: &str) -> TransportResult<()> {
    if url.is_empty() || !origin.contains(url) {
        return Err(TransportError::CrossOrigin {
            url: url.to_string(),
            origin: origin.as_str().to_string(),
        });
    }
    Ok(())
}

/// `reqwest`-backed transport.
///
/// Sends the user agent, `Authorization: SSWS <token>` and
/// `Connection: close` on every request, and never follows redirects.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    origin: Origin,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &ValidatedConfig) -> Result<Self, ConfigError> {
        Self::with_origin(config.origin.clone(), &config.token, config.connection_timeout)
    }

    /// Build a transport for an already-parsed origin. Unlike
    /// `ClientConfig::validate`, this accepts plain `http` origins.
    pub fn with_origin(origin: Origin, token: &str, timeout: Option<Duration>) -> Result<Self, ConfigError> {
        if token.trim().is_empty() {
            return Err(ConfigError::MissingToken);
        }
        let mut auth = HeaderValue::from_str(&format!("{AUTH_SCHEME} {}", token.trim()))
            .map_err(|_| ConfigError::InvalidToken)?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        // Avoids reusing pooled connections across calls.
        headers.insert(CONNECTION, HeaderValue::from_static("close"));

        let mut builder = reqwest::Client::builder()
            .user_agent(user_agent())
            .default_headers(headers)
            .redirect(redirect::Policy::none());
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(ConfigError::HttpClient)?;

        Ok(Self { origin, client })
    }

    async fn send(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<&str>,
        cancel: &CancellationToken,
    ) -> TransportResult<Option<HttpResponse>> {
        ensure_same_origin(&self.origin, url)?;
        if cancel.is_cancelled() {
            return Err(TransportError::Cancelled);
        }

        let mut request = self.client.request(to_reqwest(method), url);
        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, "application/json")
                .body(body.to_string());
        }

        trace!(%method, url, "sending request");
        let exchange = async {
            let response = request.send().await?;
            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .map(|(name, value)| {
                    (
                        name.as_str().to_string(),
                        String::from_utf8_lossy(value.as_bytes()).into_owned(),
                    )
                })
                .collect();
            let text = response.text().await?;
            Ok::<_, reqwest::Error>(HttpResponse {
                status,
                headers,
                body: Some(text).filter(|t| !t.is_empty()),
            })
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(%method, url, "request cancelled");
                Err(TransportError::Cancelled)
            }
            result = exchange => {
                let response = result?;
                trace!(%method, url, status = response.status, "received response");
                Ok(Some(response))
            }
        }
    }
}

fn to_reqwest(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn origin(&self) -> &Origin {
        &self.origin
    }

    async fn get(&self, url: &str, cancel: &CancellationToken) -> TransportResult<Option<HttpResponse>> {
        self.send(HttpMethod::Get, url, None, cancel).await
    }

    async fn post(
        &self,
        url: &str,
        body: Option<&str>,
        cancel: &CancellationToken,
    ) -> TransportResult<Option<HttpResponse>> {
        self.send(HttpMethod::Post, url, body, cancel).await
    }

    async fn put(
        &self,
        url: &str,
        body: Option<&str>,
        cancel: &CancellationToken,
    ) -> TransportResult<Option<HttpResponse>> {
        self.send(HttpMethod::Put, url, body, cancel).await
    }

    async fn delete(&self, url: &str, cancel: &CancellationToken) -> TransportResult<Option<HttpResponse>> {
        self.send(HttpMethod::Delete, url, None, cancel).await
    }
}
