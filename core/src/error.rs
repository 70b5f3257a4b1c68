//! Error types for the Okta API client.
//!
//! # Design
//! `Api` gets a dedicated struct because callers routinely branch on the
//! status code (404 vs 409) and read the error metadata the server sent back.
//! Transport failures, a transport that hands back no response at all, and
//! bodies that are present but not valid JSON each have their own variant so
//! that none of them can be mistaken for a successful empty response.

use std::fmt;

use thiserror::Error;

use crate::http::HttpMethod;
use crate::types::ErrorDetail;

/// Errors returned by the data store and the client facade.
#[derive(Debug, Error)]
pub enum Error {
    /// The organization URL or API token is missing or malformed.
    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigError),

    /// The transport failed before producing a response.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The transport completed without producing a response envelope.
    #[error("transport returned no response for {method} {url}")]
    MissingResponse { method: HttpMethod, url: String },

    /// The server answered with a non-2xx status.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A response body was present but could not be decoded.
    #[error("failed to decode response body (HTTP {status}): {source}")]
    Decode {
        status: u16,
        #[source]
        source: serde_json::Error,
    },

    /// The request payload could not be encoded to JSON.
    #[error("failed to encode request payload: {0}")]
    Encode(#[source] serde_json::Error),

    /// The request descriptor did not resolve to a usable URL.
    #[error("invalid request url `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl Error {
    /// The API error, if the server rejected the request.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Error::Api(err) => Some(err),
            _ => None,
        }
    }

    /// The HTTP status code, for errors that carry one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Api(err) => Some(err.status_code()),
            Error::Decode { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Transport(TransportError::Cancelled))
    }
}

/// Failures raised by a `Transport` implementation.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request URL is outside the configured origin. Never retryable.
    #[error("request url `{url}` does not begin with organization url `{origin}`")]
    CrossOrigin { url: String, origin: String },

    #[error("request cancelled")]
    Cancelled,

    #[error("request timed out")]
    Timeout,

    #[error("http request failed: {0}")]
    Http(#[source] reqwest::Error),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::Http(err)
        }
    }
}

/// Invalid client configuration, reported at construction time.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("organization url is missing")]
    MissingOrgUrl,

    #[error("organization url must start with https://, got `{0}`")]
    InsecureOrgUrl(String),

    #[error("organization url `{url}` is invalid: {reason}")]
    InvalidOrgUrl { url: String, reason: String },

    #[error("api token is missing")]
    MissingToken,

    #[error("api token contains characters not allowed in a header")]
    InvalidToken,

    #[error("connection timeout `{0}` is not a whole number of seconds")]
    InvalidTimeout(String),

    #[error("failed to build http client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// An error response from the Okta API.
///
/// Built from the decoded error body and the status code. The display
/// message is the server's error summary.
#[derive(Debug, Clone)]
pub struct ApiError {
    status_code: u16,
    detail: ErrorDetail,
}

impl ApiError {
    pub fn new(status_code: u16, detail: ErrorDetail) -> Self {
        Self {
            status_code,
            detail,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn error_code(&self) -> Option<String> {
        self.detail.error_code()
    }

    pub fn error_summary(&self) -> Option<String> {
        self.detail.error_summary()
    }

    pub fn error_link(&self) -> Option<String> {
        self.detail.error_link()
    }

    pub fn error_id(&self) -> Option<String> {
        self.detail.error_id()
    }

    /// Summaries of the individual causes, in the order the server listed them.
    pub fn error_causes(&self) -> Vec<String> {
        self.detail
            .error_causes()
            .iter()
            .filter_map(|cause| cause.error_summary())
            .collect()
    }

    /// The full decoded error body.
    pub fn detail(&self) -> &ErrorDetail {
        &self.detail
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error_summary().unwrap_or_default())
    }
}

impl std::error::Error for ApiError {}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::resource::{Resource, ResourceType};

    fn not_found() -> ApiError {
        let body = json!({
            "errorCode": "E0000007",
            "errorSummary": "Not found: Resource not found: 00u1 (User)",
            "errorLink": "E0000007",
            "errorId": "oaeXyz",
            "errorCauses": [
                { "errorSummary": "first" },
                { "errorSummary": "second" }
            ]
        });
        let serde_json::Value::Object(map) = body else {
            unreachable!()
        };
        ApiError::new(404, ErrorDetail::from_resource(Resource::from_map(map)))
    }

    #[test]
    fn display_is_error_summary() {
        let err = not_found();
        assert_eq!(err.to_string(), "Not found: Resource not found: 00u1 (User)");
        assert_eq!(Error::Api(err).to_string(), "Not found: Resource not found: 00u1 (User)");
    }

    #[test]
    fn accessors_read_through_to_error_body() {
        let err = not_found();
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.error_code().as_deref(), Some("E0000007"));
        assert_eq!(err.error_link().as_deref(), Some("E0000007"));
        assert_eq!(err.error_id().as_deref(), Some("oaeXyz"));
        assert_eq!(err.error_causes(), vec!["first", "second"]);
    }

    #[test]
    fn empty_error_body_has_empty_message() {
        let err = ApiError::new(500, ErrorDetail::default());
        assert_eq!(err.to_string(), "");
        assert!(err.error_code().is_none());
        assert!(err.error_causes().is_empty());
    }

    #[test]
    fn status_code_is_exposed_on_top_level_error() {
        let err = Error::Api(not_found());
        assert_eq!(err.status_code(), Some(404));
        assert!(err.api_error().is_some());
        assert!(!err.is_cancelled());

        let cancelled = Error::Transport(TransportError::Cancelled);
        assert!(cancelled.is_cancelled());
        assert_eq!(cancelled.status_code(), None);
    }
}
