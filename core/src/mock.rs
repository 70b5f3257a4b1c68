//! Scripted in-memory transport for tests.
//!
//! `MockTransport` answers each call with the next queued `MockReply` and
//! records what it was asked to send. With an empty queue it returns no
//! envelope at all, which is exactly the broken-transport case the data
//! store must reject.
//!
//! ```
//! use std::sync::Arc;
//! use okta_core::mock::MockTransport;
//! use okta_core::{DataStore, HttpRequest, HttpResponse, Origin, Resource};
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let transport = Arc::new(MockTransport::new(Origin::parse("https://foo.dev").unwrap()));
//! transport.push_response(HttpResponse::new(200, Some(r#"{"id":"00u1"}"#)));
//!
//! let store = DataStore::new(transport.clone());
//! let user = store
//!     .get::<Resource>(&HttpRequest::new("/api/v1/users/00u1"), &CancellationToken::new())
//!     .await
//!     .unwrap();
//! assert_eq!(user.payload.get_string("id").as_deref(), Some("00u1"));
//! assert_eq!(transport.calls()[0].url, "https://foo.dev/api/v1/users/00u1");
//! # }
//! ```

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::config::Origin;
use crate::error::TransportError;
use crate::http::{HttpMethod, HttpResponse};
use crate::transport::{ensure_same_origin, Transport, TransportResult};

/// What the mock does for one call.
#[derive(Debug)]
pub enum MockReply {
    Respond(HttpResponse),
    /// Complete without an envelope.
    NoResponse,
    Fail(TransportError),
    /// Wait until the caller's token is cancelled.
    Pending,
}

/// One call the mock received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub method: HttpMethod,
    pub url: String,
    pub body: Option<String>,
}

#[derive(Debug)]
pub struct MockTransport {
    origin: Origin,
    replies: Mutex<VecDeque<MockReply>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTransport {
    pub fn new(origin: Origin) -> Self {
        Self {
            origin,
            replies: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn push_reply(&self, reply: MockReply) {
        lock(&self.replies).push_back(reply);
    }

    pub fn push_response(&self, response: HttpResponse) {
        self.push_reply(MockReply::Respond(response));
    }

    /// Calls received so far, oldest first. Cross-origin calls are rejected
    /// before they count as sent and are not recorded.
    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    async fn call(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<&str>,
        cancel: &CancellationToken,
    ) -> TransportResult<Option<HttpResponse>> {
        ensure_same_origin(&self.origin, url)?;
        lock(&self.calls).push(RecordedCall {
            method,
            url: url.to_string(),
            body: body.map(str::to_string),
        });

        let reply = lock(&self.replies).pop_front().unwrap_or(MockReply::NoResponse);
        match reply {
            MockReply::Respond(response) => Ok(Some(response)),
            MockReply::NoResponse => Ok(None),
            MockReply::Fail(err) => Err(err),
            MockReply::Pending => {
                cancel.cancelled().await;
                Err(TransportError::Cancelled)
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl Transport for MockTransport {
    fn origin(&self) -> &Origin {
        &self.origin
    }

    async fn get(&self, url: &str, cancel: &CancellationToken) -> TransportResult<Option<HttpResponse>> {
        self.call(HttpMethod::Get, url, None, cancel).await
    }

    async fn post(
        &self,
        url: &str,
        body: Option<&str>,
        cancel: &CancellationToken,
    ) -> TransportResult<Option<HttpResponse>> {
        self.call(HttpMethod::Post, url, body, cancel).await
    }

    async fn put(
        &self,
        url: &str,
        body: Option<&str>,
        cancel: &CancellationToken,
    ) -> TransportResult<Option<HttpResponse>> {
        self.call(HttpMethod::Put, url, body, cancel).await
    }

    async fn delete(&self, url: &str, cancel: &CancellationToken) -> TransportResult<Option<HttpResponse>> {
        self.call(HttpMethod::Delete, url, None, cancel).await
    }
}
