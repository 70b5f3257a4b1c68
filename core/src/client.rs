//! Client facade over the data store.
//!
//! # Design
//! `Client` is a cheap, cloneable handle around a shared `DataStore`. It adds
//! the convenience overloads callers reach for (a bare href instead of a
//! request descriptor, a typed result or none) and returns only the payload.
//! Resource-specific operations live on sub-clients such as `UsersClient`.

use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::config::ClientConfig;
use crate::data_store::DataStore;
use crate::error::Result;
use crate::http::HttpRequest;
use crate::resource::{Resource, ResourceType};
use crate::transport::HttpTransport;
use crate::types::User;

const USERS: &str = "/api/v1/users";
const USER: &str = "/api/v1/users/{userId}";
const USER_DEACTIVATE: &str = "/api/v1/users/{userId}/lifecycle/deactivate";

/// Entry point for talking to an Okta organization.
#[derive(Clone)]
pub struct Client {
    data_store: Arc<DataStore>,
}

impl Client {
    /// Validate `config` and connect through an `HttpTransport`.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let config = config.validate()?;
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_data_store(DataStore::new(Arc::new(transport))))
    }

    /// Build a client from `OKTA_CLIENT_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn with_data_store(data_store: DataStore) -> Self {
        Self {
            data_store: Arc::new(data_store),
        }
    }

    pub fn data_store(&self) -> &DataStore {
        &self.data_store
    }

    pub fn users(&self) -> UsersClient<'_> {
        UsersClient { client: self }
    }

    pub async fn get<T: ResourceType>(&self, request: &HttpRequest, cancel: &CancellationToken) -> Result<T> {
        Ok(self.data_store.get(request, cancel).await?.payload)
    }

    pub async fn get_href<T: ResourceType>(&self, href: &str, cancel: &CancellationToken) -> Result<T> {
        self.get(&HttpRequest::new(href), cancel).await
    }

    pub async fn get_array<T: ResourceType>(
        &self,
        request: &HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<T>> {
        Ok(self.data_store.get_array(request, cancel).await?.payload)
    }

    pub async fn post<T: ResourceType>(&self, request: &HttpRequest, cancel: &CancellationToken) -> Result<T> {
        Ok(self.data_store.post(request, cancel).await?.payload)
    }

    pub async fn post_href<T: ResourceType, P: Serialize + ?Sized>(
        &self,
        href: &str,
        model: &P,
        cancel: &CancellationToken,
    ) -> Result<T> {
        self.post(&HttpRequest::new(href).with_payload(model)?, cancel).await
    }

    /// POST and discard whatever the server sends back.
    pub async fn post_void(&self, request: &HttpRequest, cancel: &CancellationToken) -> Result<()> {
        self.post::<Resource>(request, cancel).await.map(|_| ())
    }

    pub async fn put<T: ResourceType>(&self, request: &HttpRequest, cancel: &CancellationToken) -> Result<T> {
        Ok(self.data_store.put(request, cancel).await?.payload)
    }

    pub async fn put_href<T: ResourceType, P: Serialize + ?Sized>(
        &self,
        href: &str,
        model: &P,
        cancel: &CancellationToken,
    ) -> Result<T> {
        self.put(&HttpRequest::new(href).with_payload(model)?, cancel).await
    }

    /// PUT and discard whatever the server sends back.
    pub async fn put_void(&self, request: &HttpRequest, cancel: &CancellationToken) -> Result<()> {
        self.put::<Resource>(request, cancel).await.map(|_| ())
    }

    pub async fn delete(&self, request: &HttpRequest, cancel: &CancellationToken) -> Result<()> {
        self.data_store.delete(request, cancel).await.map(|_| ())
    }

    pub async fn delete_href(&self, href: &str, cancel: &CancellationToken) -> Result<()> {
        self.delete(&HttpRequest::new(href), cancel).await
    }
}

/// Operations on `/api/v1/users`.
pub struct UsersClient<'a> {
    client: &'a Client,
}

impl UsersClient<'_> {
    /// Fetch a user by id or login.
    pub async fn get_user(&self, id: &str, cancel: &CancellationToken) -> Result<User> {
        let request = HttpRequest::new(USER).with_path_param("userId", id);
        self.client.get(&request, cancel).await
    }

    /// List users, optionally filtered by a `q` prefix search.
    pub async fn list_users(
        &self,
        query: Option<&str>,
        limit: Option<u32>,
        cancel: &CancellationToken,
    ) -> Result<Vec<User>> {
        let mut request = HttpRequest::new(USERS);
        if let Some(query) = query {
            request = request.with_query("q", query);
        }
        if let Some(limit) = limit {
            request = request.with_query("limit", limit);
        }
        self.client.get_array(&request, cancel).await
    }

    pub async fn create_user(&self, user: &User, activate: bool, cancel: &CancellationToken) -> Result<User> {
        let request = HttpRequest::new(USERS)
            .with_query("activate", activate)
            .with_resource(user);
        self.client.post(&request, cancel).await
    }

    /// Replace a user's profile and credentials.
    pub async fn update_user(&self, id: &str, user: &User, cancel: &CancellationToken) -> Result<User> {
        let request = HttpRequest::new(USER)
            .with_path_param("userId", id)
            .with_resource(user);
        self.client.put(&request, cancel).await
    }

    pub async fn deactivate_user(&self, id: &str, cancel: &CancellationToken) -> Result<()> {
        let request = HttpRequest::new(USER_DEACTIVATE).with_path_param("userId", id);
        self.client.post_void(&request, cancel).await
    }

    /// Delete a user. Okta deactivates an active user on the first call and
    /// deletes a deactivated one.
    pub async fn delete_user(&self, id: &str, cancel: &CancellationToken) -> Result<()> {
        let request = HttpRequest::new(USER).with_path_param("userId", id);
        self.client.delete(&request, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::config::Origin;
    use crate::error::{ConfigError, Error};
    use crate::http::{HttpMethod, HttpResponse};
    use crate::mock::{MockTransport, RecordedCall};
    use crate::types::UserProfile;

    fn client() -> (Arc<MockTransport>, Client) {
        let transport = Arc::new(MockTransport::new(
            Origin::parse("https://dev-123.okta.com").unwrap(),
        ));
        let client = Client::with_data_store(DataStore::new(transport.clone()));
        (transport, client)
    }

    #[test]
    fn new_rejects_bad_configuration_immediately() {
        let err = Client::new(ClientConfig::new("http://dev-123.okta.com", "token")).err().unwrap();
        assert!(matches!(err, Error::Configuration(ConfigError::InsecureOrgUrl(_))));

        let err = Client::new(ClientConfig::new("https://dev-123.okta.com", "")).err().unwrap();
        assert!(matches!(err, Error::Configuration(ConfigError::MissingToken)));
    }

    #[test]
    fn new_accepts_valid_configuration() {
        let client = Client::new(ClientConfig::new("https://dev-123.okta.com", "token")).unwrap();
        assert_eq!(
            client.data_store().transport().origin().as_str(),
            "https://dev-123.okta.com/"
        );
    }

    #[tokio::test]
    async fn get_href_returns_payload() {
        let (transport, client) = client();
        transport.push_response(HttpResponse::new(200, Some(r#"{"id":"00u1"}"#)));
        let user: User = client
            .get_href("/api/v1/users/00u1", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(user.id().as_deref(), Some("00u1"));
    }

    #[tokio::test]
    async fn put_href_sends_put_not_post() {
        let (transport, client) = client();
        transport.push_response(HttpResponse::new(200, None));
        let _: Resource = client
            .put_href("/api/v1/users/00u1", &json!({ "profile": {} }), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(transport.calls()[0].method, HttpMethod::Put);
    }

    #[tokio::test]
    async fn void_overloads_ignore_body() {
        let (transport, client) = client();
        transport.push_response(HttpResponse::new(200, Some(r#"{"ignored":true}"#)));
        transport.push_response(HttpResponse::new(204, None));
        transport.push_response(HttpResponse::new(204, None));
        let cancel = CancellationToken::new();
        client
            .post_void(&HttpRequest::new("/api/v1/users/00u1/lifecycle/suspend"), &cancel)
            .await
            .unwrap();
        client
            .put_void(&HttpRequest::new("/api/v1/users/00u1"), &cancel)
            .await
            .unwrap();
        client.delete_href("/api/v1/users/00u1", &cancel).await.unwrap();
        let methods: Vec<HttpMethod> = transport.calls().iter().map(|c| c.method).collect();
        assert_eq!(methods, vec![HttpMethod::Post, HttpMethod::Put, HttpMethod::Delete]);
    }

    #[tokio::test]
    async fn users_client_builds_expected_requests() {
        let (transport, client) = client();
        for _ in 0..6 {
            transport.push_response(HttpResponse::new(200, None));
        }
        let cancel = CancellationToken::new();
        let users = client.users();

        let profile = UserProfile::default();
        profile.set_login("ada@example.org");
        let user = User::default();
        user.set_profile(&profile);

        users.get_user("ada@example.org", &cancel).await.unwrap();
        users.list_users(Some("ada"), Some(5), &cancel).await.unwrap();
        users.create_user(&user, true, &cancel).await.unwrap();
        users.update_user("00u1", &user, &cancel).await.unwrap();
        users.deactivate_user("00u1", &cancel).await.unwrap();
        users.delete_user("00u1", &cancel).await.unwrap();

        let body = Some(r#"{"profile":{"login":"ada@example.org"}}"#.to_string());
        assert_eq!(
            transport.calls(),
            vec![
                RecordedCall {
                    method: HttpMethod::Get,
                    url: "https://dev-123.okta.com/api/v1/users/ada%40example.org".to_string(),
                    body: None,
                },
                RecordedCall {
                    method: HttpMethod::Get,
                    url: "https://dev-123.okta.com/api/v1/users?q=ada&limit=5".to_string(),
                    body: None,
                },
                RecordedCall {
                    method: HttpMethod::Post,
                    url: "https://dev-123.okta.com/api/v1/users?activate=true".to_string(),
                    body: body.clone(),
                },
                RecordedCall {
                    method: HttpMethod::Put,
                    url: "https://dev-123.okta.com/api/v1/users/00u1".to_string(),
                    body,
                },
                RecordedCall {
                    method: HttpMethod::Post,
                    url: "https://dev-123.okta.com/api/v1/users/00u1/lifecycle/deactivate"
                        .to_string(),
                    body: None,
                },
                RecordedCall {
                    method: HttpMethod::Delete,
                    url: "https://dev-123.okta.com/api/v1/users/00u1".to_string(),
                    body: None,
                },
            ]
        );
    }
}
