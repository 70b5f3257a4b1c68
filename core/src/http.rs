//! Request descriptors and response envelopes.
//!
//! # Design
//! These types describe HTTP exchanges as plain data. `HttpRequest` is what
//! callers hand to the data store: an href (absolute or relative to the
//! organization URL), an optional JSON payload, and ordered query and path
//! parameters. `HttpResponse` is what a `Transport` hands back. Neither type
//! performs I/O.

use std::fmt;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::config::Origin;
use crate::error::{Error, Result};
use crate::resource::ResourceType;

/// Characters left unescaped when substituting a path parameter.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request against the Okta API, described as plain data.
///
/// `uri` may contain `{name}` placeholders which are replaced by the
/// matching entry of `path_params`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HttpRequest {
    pub uri: String,
    pub payload: Option<Value>,
    pub query_params: Vec<(String, String)>,
    pub path_params: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Self::default()
        }
    }

    /// Attach any serializable value as the JSON payload.
    pub fn with_payload<P: Serialize + ?Sized>(mut self, payload: &P) -> Result<Self> {
        self.payload = Some(serde_json::to_value(payload).map_err(Error::Encode)?);
        Ok(self)
    }

    /// Attach a resource (or typed view) as the JSON payload.
    pub fn with_resource<R: ResourceType>(mut self, resource: &R) -> Self {
        self.payload = Some(resource.resource().to_value());
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.query_params.push((key.into(), value.to_string()));
        self
    }

    pub fn with_path_param(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.path_params.push((key.into(), value.to_string()));
        self
    }

    /// Resolve to the absolute URL the transport will be asked to call.
    ///
    /// Relative hrefs are joined to `origin`; absolute hrefs are kept as-is
    /// and left for the transport to check against the origin.
    pub fn resolve(&self, origin: &Origin) -> Result<String> {
        let mut href = self.uri.clone();
        for (key, value) in &self.path_params {
            let encoded = utf8_percent_encode(value, PATH_SEGMENT).to_string();
            href = href.replace(&format!("{{{key}}}"), &encoded);
        }
        if let Some(start) = href.find('{') {
            if href[start..].contains('}') {
                return Err(Error::InvalidUrl {
                    url: href,
                    reason: "unresolved path parameter".to_string(),
                });
            }
        }

        let absolute = origin.resolve(&href);
        if self.query_params.is_empty() {
            return Ok(absolute);
        }

        let mut url = Url::parse(&absolute).map_err(|e| Error::InvalidUrl {
            url: absolute.clone(),
            reason: e.to_string(),
        })?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.query_params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url.into())
    }
}

/// An HTTP response described as plain data.
///
/// Header names may repeat; each occurrence keeps its own entry, in the
/// order the server sent them. An absent body is a valid response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpResponse {
    pub fn new(status: u16, body: Option<&str>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.map(str::to_string),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// All values of a header, matched case-insensitively.
    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A successful response with a typed payload.
#[derive(Debug, Clone)]
pub struct Response<T> {
    pub status_code: u16,
    pub headers: Vec<(String, String)>,
    pub payload: T,
}
