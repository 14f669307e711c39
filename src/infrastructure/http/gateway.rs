//! Authenticated HTTP gateway to the catalog API.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, Response, StatusCode, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, info, warn};

use super::dto::{ApiEnvelope, RefreshTokenRequest, TokenResponse};
use crate::application::services::TokenStore;
use crate::domain::SessionEvent;
use crate::domain::entities::{Credential, CredentialPair};
use crate::domain::errors::ApiError;

pub const REFRESH_PATH: &str = "/api/v1/auth/refresh";
const USER_AGENT: &str = concat!("albumwire/", env!("CARGO_PKG_VERSION"));
const EVENT_CAPACITY: usize = 16;

/// Outbound call description, replayable by the refresh cycle.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
    authenticated: bool,
    retried: bool,
}

impl ApiRequest {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            authenticated: true,
            retried: false,
        }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Adds the pair only when a value is present.
    #[must_use]
    pub fn query_opt(self, key: impl Into<String>, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    /// Attaches a JSON body.
    ///
    /// # Errors
    ///
    /// Returns `Unexpected` if the body cannot be serialized.
    pub fn json(mut self, body: &impl Serialize) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::unexpected(format!("failed to serialize request: {e}")))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Sends the call without credentials and outside the refresh cycle.
    #[must_use]
    pub const fn unauthenticated(mut self) -> Self {
        self.authenticated = false;
        self
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub const fn is_retried(&self) -> bool {
        self.retried
    }
}

/// HTTP client that keeps the session alive across access credential expiry.
///
/// A 401 on an authenticated call triggers one refresh through
/// `POST /api/v1/auth/refresh`, after which the call is replayed once.
/// Concurrent failures share a single refresh: whoever takes the refresh
/// lock first rotates the credentials and the rest replay with them.
pub struct HttpGateway {
    client: Client,
    base_url: String,
    token_store: Arc<TokenStore>,
    refresh_lock: Mutex<()>,
    events: broadcast::Sender<SessionEvent>,
}

impl HttpGateway {
    /// Creates gateway for the given API root.
    ///
    /// # Errors
    /// Returns error if HTTP client creation fails.
    pub fn new(
        base_url: impl Into<String>,
        token_store: Arc<TokenStore>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::unexpected(format!("failed to create HTTP client: {e}")))?;

        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token_store,
            refresh_lock: Mutex::new(()),
            events,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub const fn token_store(&self) -> &Arc<TokenStore> {
        &self.token_store
    }

    /// Receiver of credential rotation and session expiry events.
    #[must_use]
    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Issues the call and unwraps the envelope payload.
    ///
    /// # Errors
    ///
    /// Returns the mapped status, transport, decode or session error.
    pub async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let response = self.dispatch(request).await?;
        let envelope: ApiEnvelope<T> = decode_body(response).await?;
        envelope.into_data()
    }

    /// Issues a call whose payload carries no data.
    ///
    /// # Errors
    ///
    /// Same contract as [`HttpGateway::send`].
    pub async fn send_empty(&self, request: ApiRequest) -> Result<(), ApiError> {
        let response = self.dispatch(request).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(());
        }
        let envelope: ApiEnvelope<serde_json::Value> = decode_body(response).await?;
        envelope.into_unit()
    }

    async fn dispatch(&self, mut request: ApiRequest) -> Result<Response, ApiError> {
        loop {
            let snapshot = self.token_store.authorization();
            let authorization = if request.authenticated {
                snapshot.header.as_deref()
            } else {
                None
            };

            let response = self.execute(&request, authorization).await?;
            let status = response.status();

            if status.is_success() {
                return Ok(response);
            }
            if status != StatusCode::UNAUTHORIZED || !request.authenticated {
                return Err(error_from_response(status, response, request.authenticated).await);
            }
            if request.retried {
                warn!(path = %request.path, "Request rejected again after refresh");
                self.expire().await;
                return Err(ApiError::SessionExpired);
            }
            if snapshot.header.is_none() {
                return Err(error_from_response(status, response, true).await);
            }

            debug!(path = %request.path, "Access credential rejected, refreshing");
            request.retried = true;
            self.refresh(snapshot.generation).await?;
        }
    }

    async fn execute(
        &self,
        request: &ApiRequest,
        authorization: Option<&str>,
    ) -> Result<Response, ApiError> {
        let url = format!("{}{}", self.base_url, request.path);

        let mut builder = self.client.request(request.method.clone(), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(authorization) = authorization {
            builder = builder.header(header::AUTHORIZATION, authorization);
        }

        debug!(method = %request.method, path = %request.path, retried = request.retried, "Sending request");

        builder.send().await.map_err(|e| {
            warn!(error = %e, path = %request.path, "Failed to reach catalog API");
            map_transport_error(&e)
        })
    }

    async fn refresh(&self, seen_generation: u64) -> Result<(), ApiError> {
        let _guard = self.refresh_lock.lock().await;

        if self.token_store.generation() != seen_generation {
            return if self.token_store.is_present() {
                debug!("Credentials already rotated by a concurrent request");
                Ok(())
            } else {
                Err(ApiError::SessionExpired)
            };
        }

        let Some(refresh) = self.token_store.refresh_credential() else {
            return Err(ApiError::SessionExpired);
        };

        match self.request_refresh(&refresh).await {
            Ok(credentials) => {
                if !self
                    .token_store
                    .replace_credentials(seen_generation, credentials)
                    .await
                {
                    return Err(ApiError::SessionExpired);
                }
                info!("Access credential refreshed");
                let _ = self.events.send(SessionEvent::Refreshed);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Credential refresh failed");
                self.expire().await;
                Err(ApiError::SessionExpired)
            }
        }
    }

    async fn request_refresh(&self, refresh: &Credential) -> Result<CredentialPair, ApiError> {
        let request = ApiRequest::post(REFRESH_PATH)
            .unauthenticated()
            .json(&RefreshTokenRequest {
                refresh_token: refresh.as_str(),
            })?;

        let response = self.execute(&request, None).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(error_from_response(status, response, false).await);
        }

        let envelope: ApiEnvelope<TokenResponse> = decode_body(response).await?;
        envelope.into_data()?.credentials()
    }

    async fn expire(&self) {
        // Storage failures are logged by the store; the session is gone in memory.
        let _ = self.token_store.clear().await;
        warn!("Session expired");
        let _ = self.events.send(SessionEvent::Expired);
    }
}

async fn decode_body<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let body = response
        .text()
        .await
        .map_err(|e| map_transport_error(&e))?;

    serde_json::from_str(&body).map_err(|e| {
        warn!(error = %e, "Failed to parse catalog API response");
        ApiError::decode(e.to_string())
    })
}

async fn error_from_response(status: StatusCode, response: Response, authenticated: bool) -> ApiError {
    let message = response
        .text()
        .await
        .ok()
        .and_then(|body| serde_json::from_str::<ApiEnvelope<serde_json::Value>>(&body).ok())
        .and_then(|envelope| envelope.message)
        .unwrap_or_else(|| format!("HTTP {status}"));

    match status {
        StatusCode::UNAUTHORIZED if !authenticated => ApiError::invalid_credentials(message),
        StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited { message },
        _ => ApiError::status(status.as_u16(), message),
    }
}

fn map_transport_error(e: &reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::network("request timed out")
    } else if e.is_connect() {
        ApiError::network("failed to connect to the catalog API")
    } else if e.is_decode() {
        ApiError::decode(e.to_string())
    } else {
        ApiError::network(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{AlbumId, TokenGrant, UserProfile};
    use crate::domain::ports::mocks::MockCredentialStorage;
    use mockito::{Matcher, Server};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct AlbumRef {
        id: AlbumId,
        title: String,
    }

    const ALBUM_BODY: &str = r#"{"success": true, "data": {"id": 1, "title": "Mezmerize"}}"#;

    fn refreshed_body(access: &str, refresh: &str) -> String {
        format!(
            r#"{{"success": true, "data": {{"accessToken": "{access}", "refreshToken": "{refresh}", "tokenType": "Bearer", "expiresIn": 300}}}}"#
        )
    }

    async fn gateway(server: &Server, signed_in: bool) -> (HttpGateway, Arc<MockCredentialStorage>) {
        let storage = Arc::new(MockCredentialStorage::new());
        let token_store = Arc::new(TokenStore::new(storage.clone()));
        if signed_in {
            token_store
                .store_grant(TokenGrant::new(
                    CredentialPair::new(
                        Credential::new_unchecked("access-1"),
                        Credential::new_unchecked("refresh-1"),
                    ),
                    UserProfile::new(1, "user", "user@albumwire.dev", "USER"),
                ))
                .await;
        }
        let gateway = HttpGateway::new(server.url(), token_store, Duration::from_secs(5)).unwrap();
        (gateway, storage)
    }

    #[tokio::test]
    async fn test_attaches_stored_credential() {
        let mut server = Server::new_async().await;
        let album = server
            .mock("GET", "/api/v1/albums/1")
            .match_header("authorization", "Bearer access-1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(ALBUM_BODY)
            .create_async()
            .await;
        let (gateway, _) = gateway(&server, true).await;

        let result: AlbumRef = gateway.send(ApiRequest::get("/api/v1/albums/1")).await.unwrap();

        assert_eq!(result.title, "Mezmerize");
        album.assert_async().await;
    }

    #[tokio::test]
    async fn test_unauthenticated_request_has_no_credential() {
        let mut server = Server::new_async().await;
        let probe = server
            .mock("GET", "/api/v1/albums/1")
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body(ALBUM_BODY)
            .create_async()
            .await;
        let (gateway, _) = gateway(&server, true).await;

        let _: AlbumRef = gateway
            .send(ApiRequest::get("/api/v1/albums/1").unauthenticated())
            .await
            .unwrap();

        probe.assert_async().await;
    }

    #[tokio::test]
    async fn test_refreshes_and_retries_once() {
        let mut server = Server::new_async().await;
        let rejected = server
            .mock("GET", "/api/v1/albums/1")
            .match_header("authorization", "Bearer access-1")
            .with_status(401)
            .expect(1)
            .create_async()
            .await;
        let refresh = server
            .mock("POST", REFRESH_PATH)
            .match_header("authorization", Matcher::Missing)
            .match_body(Matcher::PartialJson(serde_json::json!({"refreshToken": "refresh-1"})))
            .with_status(200)
            .with_body(refreshed_body("access-2", "refresh-2"))
            .expect(1)
            .create_async()
            .await;
        let accepted = server
            .mock("GET", "/api/v1/albums/1")
            .match_header("authorization", "Bearer access-2")
            .with_status(200)
            .with_body(ALBUM_BODY)
            .expect(1)
            .create_async()
            .await;
        let (gateway, storage) = gateway(&server, true).await;
        let mut events = gateway.subscribe_events();

        let result: AlbumRef = gateway.send(ApiRequest::get("/api/v1/albums/1")).await.unwrap();

        assert_eq!(result.id, AlbumId(1));
        rejected.assert_async().await;
        refresh.assert_async().await;
        accepted.assert_async().await;
        assert_eq!(events.try_recv().unwrap(), SessionEvent::Refreshed);
        let store = gateway.token_store();
        assert_eq!(store.access_credential().unwrap().as_str(), "access-2");
        assert_eq!(store.refresh_credential().unwrap().as_str(), "refresh-2");
        assert_eq!(store.user().unwrap().username, "user");
        let persisted = storage.stored().await.unwrap();
        assert_eq!(persisted.credentials.refresh.as_str(), "refresh-2");
    }

    #[tokio::test]
    async fn test_second_rejection_expires_without_second_refresh() {
        let mut server = Server::new_async().await;
        let first = server
            .mock("GET", "/api/v1/albums/1")
            .match_header("authorization", "Bearer access-1")
            .with_status(401)
            .expect(1)
            .create_async()
            .await;
        let refresh = server
            .mock("POST", REFRESH_PATH)
            .with_status(200)
            .with_body(refreshed_body("access-2", "refresh-2"))
            .expect(1)
            .create_async()
            .await;
        let second = server
            .mock("GET", "/api/v1/albums/1")
            .match_header("authorization", "Bearer access-2")
            .with_status(401)
            .expect(1)
            .create_async()
            .await;
        let (gateway, storage) = gateway(&server, true).await;
        let mut events = gateway.subscribe_events();

        let result = gateway
            .send::<AlbumRef>(ApiRequest::get("/api/v1/albums/1"))
            .await;

        assert!(matches!(result, Err(ApiError::SessionExpired)));
        first.assert_async().await;
        refresh.assert_async().await;
        second.assert_async().await;
        assert_eq!(events.try_recv().unwrap(), SessionEvent::Refreshed);
        assert_eq!(events.try_recv().unwrap(), SessionEvent::Expired);
        assert!(!gateway.token_store().is_present());
        assert!(storage.stored().await.is_none());
    }

    #[tokio::test]
    async fn test_failed_refresh_expires_session() {
        let mut server = Server::new_async().await;
        let rejected = server
            .mock("GET", "/api/v1/artists")
            .match_query(Matcher::Any)
            .with_status(401)
            .expect(1)
            .create_async()
            .await;
        let refresh = server
            .mock("POST", REFRESH_PATH)
            .with_status(401)
            .with_body(r#"{"success": false, "message": "Refresh token inválido"}"#)
            .expect(1)
            .create_async()
            .await;
        let (gateway, _) = gateway(&server, true).await;
        let mut events = gateway.subscribe_events();

        let result = gateway
            .send::<serde_json::Value>(ApiRequest::get("/api/v1/artists").query("page", 0))
            .await;

        assert!(matches!(result, Err(ApiError::SessionExpired)));
        rejected.assert_async().await;
        refresh.assert_async().await;
        assert_eq!(events.try_recv().unwrap(), SessionEvent::Expired);
        assert!(!gateway.token_store().is_present());
    }

    #[tokio::test]
    async fn test_rejection_without_session_is_plain_status() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/v1/albums/1")
            .with_status(401)
            .with_body(r#"{"success": false, "message": "Não autenticado"}"#)
            .create_async()
            .await;
        let refresh = server
            .mock("POST", REFRESH_PATH)
            .expect(0)
            .create_async()
            .await;
        let (gateway, _) = gateway(&server, false).await;

        let result = gateway
            .send::<AlbumRef>(ApiRequest::get("/api/v1/albums/1"))
            .await;

        assert!(matches!(
            result,
            Err(ApiError::Status { status: 401, ref message }) if message == "Não autenticado"
        ));
        refresh.assert_async().await;
    }

    #[tokio::test]
    async fn test_concurrent_rejections_share_one_refresh() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", Matcher::Regex(r"^/api/v1/albums/\d$".to_string()))
            .match_header("authorization", "Bearer access-1")
            .with_status(401)
            .create_async()
            .await;
        let refresh = server
            .mock("POST", REFRESH_PATH)
            .with_status(200)
            .with_body(refreshed_body("access-2", "refresh-2"))
            .expect(1)
            .create_async()
            .await;
        server
            .mock("GET", Matcher::Regex(r"^/api/v1/albums/\d$".to_string()))
            .match_header("authorization", "Bearer access-2")
            .with_status(200)
            .with_body(ALBUM_BODY)
            .create_async()
            .await;
        let (gateway, _) = gateway(&server, true).await;

        let (first, second) = tokio::join!(
            gateway.send::<AlbumRef>(ApiRequest::get("/api/v1/albums/1")),
            gateway.send::<AlbumRef>(ApiRequest::get("/api/v1/albums/2")),
        );

        assert!(first.is_ok());
        assert!(second.is_ok());
        refresh.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_mapping() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/v1/albums/404")
            .with_status(404)
            .with_body(r#"{"success": false, "message": "Álbum não encontrado"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/api/v1/albums/429")
            .with_status(429)
            .with_body("slow down")
            .create_async()
            .await;
        server
            .mock("GET", "/api/v1/albums/200")
            .with_status(200)
            .with_body(r#"{"success": false, "message": "falhou"}"#)
            .create_async()
            .await;
        let (gateway, _) = gateway(&server, true).await;

        let missing = gateway.send::<AlbumRef>(ApiRequest::get("/api/v1/albums/404")).await;
        let limited = gateway.send::<AlbumRef>(ApiRequest::get("/api/v1/albums/429")).await;
        let rejected = gateway.send::<AlbumRef>(ApiRequest::get("/api/v1/albums/200")).await;

        assert!(matches!(missing, Err(ApiError::Status { status: 404, .. })));
        assert!(matches!(limited, Err(ApiError::RateLimited { .. })));
        assert!(matches!(rejected, Err(ApiError::Rejected { .. })));
        assert!(gateway.token_store().is_present());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        let token_store = Arc::new(TokenStore::new(Arc::new(MockCredentialStorage::new())));
        let gateway =
            HttpGateway::new("http://127.0.0.1:1", token_store, Duration::from_secs(2)).unwrap();

        let result = gateway.send_empty(ApiRequest::delete("/api/v1/albums/1")).await;

        assert!(matches!(result, Err(ApiError::Network { .. })));
    }

    #[test]
    fn test_request_builder() {
        let request = ApiRequest::get("/api/v1/albums")
            .query("page", 0)
            .query_opt("title", None::<&str>)
            .query_opt("artistId", Some(3));

        assert_eq!(request.path(), "/api/v1/albums");
        assert_eq!(request.query.len(), 2);
        assert!(!request.is_retried());
    }
}
