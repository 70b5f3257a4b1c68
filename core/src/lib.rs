//! Client core for the Okta management API.
//!
//! # Overview
//! Turns CRUD intents against Okta hrefs into HTTP calls through a pluggable
//! `Transport`, decodes JSON bodies into a dynamic `Resource` property bag
//! with typed views on top, and reports non-2xx responses as structured
//! `ApiError`s.
//!
//! # Design
//! - `Transport` is the only I/O boundary. `HttpTransport` (reqwest) is the
//!   production implementation and `mock::MockTransport` the scripted one.
//! - `DataStore` is stateless apart from its transport and serializer; it
//!   owns the empty-body, missing-response and error-classification policy.
//! - `Resource` is an ordered JSON map behind a shared handle. Typed
//!   resources (`User`, `PasswordPolicyRule`, ...) are views declared with
//!   `resource_type!`.
//! - `Client` layers convenience overloads and per-resource sub-clients on
//!   top of the data store.
//!
//! ```no_run
//! use okta_core::{Client, ClientConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> okta_core::Result<()> {
//! let client = Client::new(ClientConfig::new("https://dev-123.okta.com", "00abc"))?;
//! let user = client.users().get_user("00u1", &CancellationToken::new()).await?;
//! println!("{:?}", user.profile().and_then(|p| p.login()));
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod data_store;
pub mod error;
pub mod http;
pub mod mock;
pub mod resource;
pub mod serializer;
pub mod transport;
pub mod types;

pub use client::{Client, UsersClient};
pub use config::{ClientConfig, Origin, ValidatedConfig};
pub use data_store::DataStore;
pub use error::{ApiError, ConfigError, Error, Result, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Response};
pub use resource::{Resource, ResourceType};
pub use serializer::{JsonSerializer, Serializer};
pub use transport::{user_agent, HttpTransport, Transport};
pub use types::{
    ErrorDetail, PasswordPolicyRule, PasswordPolicyRuleActions, PasswordPolicyRuleConditions, User,
    UserProfile, UserStatus,
};
