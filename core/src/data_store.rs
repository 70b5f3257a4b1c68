//! Generic CRUD over the Okta API.
//!
//! # Design
//! `DataStore` holds a transport and a serializer and nothing else, so one
//! instance can serve any number of concurrent callers. Each verb resolves
//! the request descriptor, makes exactly one transport call, and then
//! applies the same response policy:
//!
//! - no response envelope at all is a broken transport (`MissingResponse`),
//!   never an empty success;
//! - a status outside `200..300` becomes `Error::Api`, built from the decoded
//!   error body;
//! - an absent, empty, or `null` success body becomes an empty resource;
//! - a success body that is present but malformed is `Error::Decode`.
//!
//! Cancellation tokens are handed to the transport untouched. The data
//! store never retries.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{ApiError, Error, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Response};
use crate::resource::{Resource, ResourceType};
use crate::serializer::{JsonSerializer, Serializer};
use crate::transport::Transport;
use crate::types::ErrorDetail;

#[derive(Clone)]
pub struct DataStore {
    transport: Arc<dyn Transport>,
    serializer: Arc<dyn Serializer>,
}

impl DataStore {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_serializer(transport, Arc::new(JsonSerializer))
    }

    pub fn with_serializer(transport: Arc<dyn Transport>, serializer: Arc<dyn Serializer>) -> Self {
        Self {
            transport,
            serializer,
        }
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub async fn get<T: ResourceType>(
        &self,
        request: &HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<Response<T>> {
        let response = self.execute(HttpMethod::Get, request, cancel).await?;
        self.decode_payload(response)
    }

    /// GET a JSON array; each element becomes one `T`.
    pub async fn get_array<T: ResourceType>(
        &self,
        request: &HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<Response<Vec<T>>> {
        let response = self.execute(HttpMethod::Get, request, cancel).await?;
        let items = self
            .serializer
            .decode_array(response.body.as_deref())
            .map_err(|source| Error::Decode {
                status: response.status,
                source,
            })?;
        Ok(Response {
            status_code: response.status,
            headers: response.headers,
            payload: items
                .into_iter()
                .map(|map| T::from_resource(Resource::from_map(map)))
                .collect(),
        })
    }

    pub async fn post<T: ResourceType>(
        &self,
        request: &HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<Response<T>> {
        let response = self.execute(HttpMethod::Post, request, cancel).await?;
        self.decode_payload(response)
    }

    pub async fn put<T: ResourceType>(
        &self,
        request: &HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<Response<T>> {
        let response = self.execute(HttpMethod::Put, request, cancel).await?;
        self.decode_payload(response)
    }

    /// DELETE the target. Any response body is ignored.
    pub async fn delete(&self, request: &HttpRequest, cancel: &CancellationToken) -> Result<Response<()>> {
        let response = self.execute(HttpMethod::Delete, request, cancel).await?;
        Ok(Response {
            status_code: response.status,
            headers: response.headers,
            payload: (),
        })
    }

    /// Send one request and return the envelope if its status is a success.
    async fn execute(
        &self,
        method: HttpMethod,
        request: &HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse> {
        let url = request.resolve(self.transport.origin())?;
        let body = match (method, &request.payload) {
            (HttpMethod::Post | HttpMethod::Put, Some(payload)) => {
                Some(self.serializer.encode(payload).map_err(Error::Encode)?)
            }
            _ => None,
        };

        debug!(%method, %url, "dispatching request");
        let response = match method {
            HttpMethod::Get => self.transport.get(&url, cancel).await?,
            HttpMethod::Post => self.transport.post(&url, body.as_deref(), cancel).await?,
            HttpMethod::Put => self.transport.put(&url, body.as_deref(), cancel).await?,
            HttpMethod::Delete => self.transport.delete(&url, cancel).await?,
        };
        let Some(response) = response else {
            return Err(Error::MissingResponse { method, url });
        };
        debug!(%method, %url, status = response.status, "received response");

        if !response.is_success() {
            return Err(self.classify_failure(method, &url, &response));
        }
        Ok(response)
    }

    fn classify_failure(&self, method: HttpMethod, url: &str, response: &HttpResponse) -> Error {
        let map = match self.serializer.decode(response.body.as_deref()) {
            Ok(map) => map,
            Err(source) => {
                return Error::Decode {
                    status: response.status,
                    source,
                }
            }
        };
        let error = ApiError::new(response.status, ErrorDetail::from_resource(Resource::from_map(map)));
        warn!(
            %method,
            url,
            status = error.status_code(),
            error_code = %error.error_code().unwrap_or_default(),
            error_id = %error.error_id().unwrap_or_default(),
            "api error: {error}"
        );
        Error::Api(error)
    }

    fn decode_payload<T: ResourceType>(&self, response: HttpResponse) -> Result<Response<T>> {
        let map = self
            .serializer
            .decode(response.body.as_deref())
            .map_err(|source| Error::Decode {
                status: response.status,
                source,
            })?;
        Ok(Response {
            status_code: response.status,
            headers: response.headers,
            payload: T::from_resource(Resource::from_map(map)),
        })
    }
}
