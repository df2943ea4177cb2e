//! Session-aware API client.
//!
//! `SessionClient` attaches the bearer credential to each request, and on a
//! 401 performs at most one reissue-and-retry before giving up and purging
//! the stored token pair.

use std::sync::Arc;

use anyhow::Result as AnyResult;
use reqwest::{header, Client, Response};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::attempt::{Attempt, RefreshOutcome, Step};
use super::refresh::Refresher;
use super::{ApiError, ApiRequest, RefreshError};
use crate::auth::{
    CredentialPair, FederatedIdentity, SessionState, SessionWatch, TokenStore,
};
use crate::config::ClientConfig;
use crate::models::ApiEnvelope;

/// API client for the cellarnote backend.
/// Clone is cheap - all state sits behind one Arc, so clones share the
/// connection pool and the in-flight reissue slot.
#[derive(Clone)]
pub struct SessionClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: Client,
    config: ClientConfig,
    store: Arc<dyn TokenStore>,
    identity: Option<Arc<dyn FederatedIdentity>>,
    session: SessionWatch,
    refresher: Refresher,
}

pub struct SessionClientBuilder {
    config: ClientConfig,
    store: Option<Arc<dyn TokenStore>>,
    identity: Option<Arc<dyn FederatedIdentity>>,
}

impl SessionClientBuilder {
    pub fn store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Fallback credential source used only while no access token is stored.
    pub fn identity(mut self, identity: Arc<dyn FederatedIdentity>) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn build(self) -> AnyResult<SessionClient> {
        let store: Arc<dyn TokenStore> = match self.store {
            Some(store) => store,
            None => Arc::from(crate::auth::default_store()?),
        };

        let mut default_headers = header::HeaderMap::new();
        default_headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        let http = Client::builder()
            .timeout(self.config.timeout)
            .default_headers(default_headers)
            .build()?;

        let initial = match store.load() {
            Ok(pair) => SessionState::from_pair(pair.as_ref()),
            Err(e) => {
                warn!(error = %e, "Could not read stored credentials, starting signed out");
                SessionState::SignedOut
            }
        };
        let session = SessionWatch::new(initial);

        let refresher = Refresher::new(
            http.clone(),
            self.config.url_for(&self.config.reissue_path),
            Arc::clone(&store),
            session.clone(),
        );

        debug!(
            base_url = %self.config.base_url,
            storage = %store.describe(),
            ?initial,
            "Session client ready"
        );

        Ok(SessionClient {
            inner: Arc::new(Inner {
                http,
                config: self.config,
                store,
                identity: self.identity,
                session,
                refresher,
            }),
        })
    }
}

impl SessionClient {
    pub fn builder(config: ClientConfig) -> SessionClientBuilder {
        SessionClientBuilder {
            config,
            store: None,
            identity: None,
        }
    }

    /// Client with the given config and token store, no federated fallback.
    pub fn new(config: ClientConfig, store: Arc<dyn TokenStore>) -> AnyResult<Self> {
        Self::builder(config).store(store).build()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn storage_description(&self) -> String {
        self.inner.store.describe()
    }

    // ===== Credentials =====

    /// Persist a new token pair, replacing both tokens at once.
    pub fn save_credentials(&self, access_token: &str, refresh_token: &str) -> AnyResult<()> {
        self.inner
            .store
            .save(&CredentialPair::new(access_token, refresh_token))?;
        self.inner.session.publish(SessionState::Authenticated);
        Ok(())
    }

    /// Remove both tokens.
    pub fn clear_credentials(&self) -> AnyResult<()> {
        self.inner.store.clear()?;
        self.inner.session.publish(SessionState::SignedOut);
        Ok(())
    }

    pub fn access_token(&self) -> AnyResult<Option<String>> {
        Ok(self.inner.store.load()?.map(|pair| pair.access_token))
    }

    pub fn refresh_token(&self) -> AnyResult<Option<String>> {
        Ok(self.inner.store.load()?.map(|pair| pair.refresh_token))
    }

    pub fn stored_credentials(&self) -> AnyResult<Option<CredentialPair>> {
        self.inner.store.load()
    }

    pub fn session_state(&self) -> SessionState {
        self.inner.session.current()
    }

    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<SessionState> {
        self.inner.session.subscribe()
    }

    /// Clear credentials after an unrecoverable failure. Storage errors are
    /// logged rather than masking the error being reported.
    fn purge(&self, reason: &str) {
        info!(reason, "Clearing stored credentials");
        if let Err(e) = self.clear_credentials() {
            warn!(error = %e, "Failed to clear stored credentials");
        }
    }

    // ===== Request protocol =====

    /// Send a request with the current credentials, refreshing once on 401.
    pub async fn request(&self, mut request: ApiRequest) -> Result<Response, ApiError> {
        let is_reissue = self.inner.config.is_reissue_path(&request.path);
        let bearer = if is_reissue {
            None
        } else {
            self.resolve_bearer().await?
        };

        let attempt = Attempt::start(&request);
        let response = self.send(&request, bearer.as_deref()).await?;
        let (attempt, step) = attempt.on_response(response.status(), is_reissue);

        match step {
            Step::Deliver => return Ok(response),
            Step::Fail => return Err(Self::error_from(response).await),
            Step::PurgeAndFail => {
                let error = Self::error_from(response).await;
                self.purge("reissue endpoint rejected the request");
                return Err(error);
            }
            Step::Refresh => {}
        }

        let rejected = Self::error_from(response).await;
        debug!(path = %request.path, "Access token rejected, refreshing");

        let renewed = self.renew_after_rejection(bearer.as_deref()).await;
        let attempt = attempt.on_refresh(match &renewed {
            Ok(_) => RefreshOutcome::Renewed,
            Err(RefreshError::MissingRefreshToken) => RefreshOutcome::MissingToken,
            Err(_) => RefreshOutcome::Failed,
        });
        let token = match renewed {
            Ok(token) => token,
            // Nothing to refresh with: the caller sees the original 401
            Err(RefreshError::MissingRefreshToken) => return Err(rejected),
            Err(e) => return Err(ApiError::RefreshFailed(e)),
        };
        debug_assert_eq!(attempt, Attempt::Retried);

        request.mark_retried();
        let response = self.send(&request, Some(&token)).await?;
        match attempt.on_response(response.status(), false) {
            (_, Step::Deliver) => Ok(response),
            _ => Err(Self::error_from(response).await),
        }
    }

    /// Stored access token first; the federated identity token only when
    /// nothing is stored.
    async fn resolve_bearer(&self) -> Result<Option<String>, ApiError> {
        if let Some(token) = self.access_token()? {
            return Ok(Some(token));
        }

        let Some(identity) = self.inner.identity.as_ref() else {
            return Ok(None);
        };
        let Some(user) = identity.current_user().await else {
            debug!("No stored token and no federated user, sending unauthenticated");
            return Ok(None);
        };
        match identity.fresh_id_token().await {
            Ok(token) => {
                debug!(uid = %user.uid, "Using federated identity token");
                Ok(Some(token))
            }
            Err(e) => {
                warn!(error = %e, "Could not mint federated identity token");
                Ok(None)
            }
        }
    }

    /// Token to retry with after `rejected` got a 401.
    async fn renew_after_rejection(&self, rejected: Option<&str>) -> Result<String, RefreshError> {
        // Another request may already have rotated the pair
        if let Some(rejected) = rejected {
            match self.access_token() {
                Ok(Some(current)) if current != rejected => {
                    debug!("Stored token changed since request was sent, retrying with it");
                    return Ok(current);
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "Could not re-read stored access token"),
            }
        }
        self.inner
            .refresher
            .refresh()
            .await
            .map(|pair| pair.access_token)
    }

    async fn send(&self, request: &ApiRequest, bearer: Option<&str>) -> Result<Response, ApiError> {
        let url = self.inner.config.url_for(&request.path);
        let mut builder = self.inner.http.request(request.method.clone(), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        debug!(
            method = %request.method,
            path = %request.path,
            authenticated = bearer.is_some(),
            retried = request.is_retried(),
            "Sending request"
        );
        let response = builder.send().await?;
        debug!(path = %request.path, status = response.status().as_u16(), "Response received");
        Ok(response)
    }

    async fn error_from(response: Response) -> ApiError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        ApiError::from_status(status, &body)
    }

    // ===== Convenience wrappers =====

    pub async fn request_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let path = request.path.clone();
        let response = self.request(request).await?;
        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse {}: {}", path, e)))
    }

    /// Send `request` and unwrap the `result` of its response envelope.
    pub async fn request_result<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<T, ApiError> {
        let path = request.path.clone();
        // Check isSuccess before the payload: rejections often carry `result: null`
        let result = self
            .request_json::<ApiEnvelope<Value>>(request)
            .await?
            .into_result()?;
        serde_json::from_value(result).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse {} result: {}", path, e))
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request_json(ApiRequest::get(path)).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.request_json(ApiRequest::post(path).json(body)?).await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.request_json(ApiRequest::patch(path).json(body)?).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request_json(ApiRequest::delete(path)).await
    }

    /// Send without credentials and without the refresh protocol, for the
    /// login endpoints.
    pub(crate) async fn send_anonymous(&self, request: &ApiRequest) -> Result<Response, ApiError> {
        let response = self.send(request, None).await?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(Self::error_from(response).await)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{FederatedUser, MemoryTokenStore};
    use async_trait::async_trait;
    use mockito::{Matcher, Server, ServerGuard};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn client(server: &ServerGuard, store: Arc<MemoryTokenStore>) -> SessionClient {
        SessionClient::new(ClientConfig::new(server.url()), store).unwrap()
    }

    fn store_with(access: &str, refresh: &str) -> Arc<MemoryTokenStore> {
        Arc::new(MemoryTokenStore::with_pair(CredentialPair::new(access, refresh)))
    }

    fn reissue_body(access: &str, refresh: &str) -> String {
        json!({
            "isSuccess": true,
            "code": "COMMON200",
            "message": "OK",
            "result": { "accessToken": access, "refreshToken": refresh }
        })
        .to_string()
    }

    struct CountingIdentity {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl FederatedIdentity for CountingIdentity {
        async fn current_user(&self) -> Option<FederatedUser> {
            Some(FederatedUser {
                uid: "fed-user".to_string(),
                email: None,
            })
        }

        async fn fresh_id_token(&self) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("fed-token".to_string())
        }
    }

    #[test]
    fn test_save_then_read_back() {
        let store = Arc::new(MemoryTokenStore::new());
        let client = SessionClient::new(ClientConfig::default(), store).unwrap();
        assert_eq!(client.session_state(), SessionState::SignedOut);

        client.save_credentials("a", "r").unwrap();
        assert_eq!(client.access_token().unwrap().as_deref(), Some("a"));
        assert_eq!(client.refresh_token().unwrap().as_deref(), Some("r"));
        assert_eq!(client.session_state(), SessionState::Authenticated);
    }

    #[test]
    fn test_clear_removes_both() {
        let client = SessionClient::new(ClientConfig::default(), store_with("a", "r")).unwrap();
        assert_eq!(client.session_state(), SessionState::Authenticated);

        client.clear_credentials().unwrap();
        assert_eq!(client.access_token().unwrap(), None);
        assert_eq!(client.refresh_token().unwrap(), None);
        assert_eq!(client.session_state(), SessionState::SignedOut);
    }

    #[tokio::test]
    async fn test_valid_token_passes_through() {
        let mut server = Server::new_async().await;
        let ok = server
            .mock("GET", "/member/name")
            .match_header("authorization", "Bearer a")
            .with_status(200)
            .with_body(r#"{"isSuccess":true,"code":"COMMON200","message":"OK","result":"kim"}"#)
            .expect(1)
            .create_async()
            .await;
        let reissue = server.mock("POST", "/reissue").expect(0).create_async().await;

        let client = client(&server, store_with("a", "r"));
        let body: Value = client.get("/member/name").await.unwrap();

        assert_eq!(body["result"], "kim");
        ok.assert_async().await;
        reissue.assert_async().await;
    }

    #[tokio::test]
    async fn test_no_tokens_surfaces_original_unauthorized() {
        let mut server = Server::new_async().await;
        let rejected = server
            .mock("GET", "/member/info")
            .match_header("authorization", Matcher::Missing)
            .with_status(401)
            .expect(1)
            .create_async()
            .await;
        let reissue = server.mock("POST", "/reissue").expect(0).create_async().await;

        let store = Arc::new(MemoryTokenStore::new());
        let client = client(&server, Arc::clone(&store));
        let err = client.request(ApiRequest::get("/member/info")).await.unwrap_err();

        assert!(matches!(err, ApiError::Unauthorized));
        assert!(store.load().unwrap().is_none());
        rejected.assert_async().await;
        reissue.assert_async().await;
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed_and_retried() {
        let mut server = Server::new_async().await;
        let expired = server
            .mock("GET", "/member/info")
            .match_header("authorization", "Bearer old-a")
            .with_status(401)
            .expect(1)
            .create_async()
            .await;
        let reissue = server
            .mock("POST", "/reissue")
            .match_header("authorization", Matcher::Missing)
            .match_body(Matcher::Json(json!({ "refreshToken": "old-r" })))
            .with_status(200)
            .with_body(reissue_body("new-a", "new-r"))
            .expect(1)
            .create_async()
            .await;
        let retried = server
            .mock("GET", "/member/info")
            .match_header("authorization", "Bearer new-a")
            .with_status(200)
            .with_body(r#"{"result":{"username":"kim","authType":"KAKAO"}}"#)
            .expect(1)
            .create_async()
            .await;

        let store = store_with("old-a", "old-r");
        let client = client(&server, Arc::clone(&store));
        let response = client.request(ApiRequest::get("/member/info")).await.unwrap();

        assert_eq!(response.status(), 200);
        let pair = store.load().unwrap().unwrap();
        assert_eq!(pair.access_token, "new-a");
        assert_eq!(pair.refresh_token, "new-r");
        assert_eq!(client.session_state(), SessionState::Authenticated);
        expired.assert_async().await;
        reissue.assert_async().await;
        retried.assert_async().await;
    }

    #[tokio::test]
    async fn test_retry_replays_body() {
        let mut server = Server::new_async().await;
        server
            .mock("PATCH", "/member/info")
            .match_header("authorization", "Bearer old-a")
            .with_status(401)
            .create_async()
            .await;
        server
            .mock("POST", "/reissue")
            .with_status(200)
            .with_body(reissue_body("new-a", "new-r"))
            .create_async()
            .await;
        let retried = server
            .mock("PATCH", "/member/info")
            .match_header("authorization", "Bearer new-a")
            .match_body(Matcher::Json(json!({ "name": "park" })))
            .with_status(200)
            .with_body(r#"{"result":"ok"}"#)
            .expect(1)
            .create_async()
            .await;

        let client = client(&server, store_with("old-a", "old-r"));
        let body: Value = client
            .patch("/member/info", &json!({ "name": "park" }))
            .await
            .unwrap();

        assert_eq!(body["result"], "ok");
        retried.assert_async().await;
    }

    #[tokio::test]
    async fn test_malformed_reissue_purges_credentials() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/member/info")
            .with_status(401)
            .expect(1)
            .create_async()
            .await;
        let reissue = server
            .mock("POST", "/reissue")
            .with_status(200)
            .with_body(r#"{"isSuccess":true,"result":{"accessToken":"new-a"}}"#)
            .expect(1)
            .create_async()
            .await;

        let store = store_with("old-a", "old-r");
        let client = client(&server, Arc::clone(&store));
        let err = client.request(ApiRequest::get("/member/info")).await.unwrap_err();

        assert!(matches!(
            err,
            ApiError::RefreshFailed(RefreshError::Malformed(_))
        ));
        assert!(store.load().unwrap().is_none());
        assert_eq!(client.session_state(), SessionState::SignedOut);
        reissue.assert_async().await;
    }

    #[tokio::test]
    async fn test_reissue_rejection_purges_without_loop() {
        let mut server = Server::new_async().await;
        let rejected = server
            .mock("GET", "/wine/my")
            .with_status(401)
            .expect(1)
            .create_async()
            .await;
        let reissue = server
            .mock("POST", "/reissue")
            .with_status(401)
            .with_body("refresh token expired")
            .expect(1)
            .create_async()
            .await;

        let store = store_with("old-a", "old-r");
        let client = client(&server, Arc::clone(&store));
        let err = client.request(ApiRequest::get("/wine/my")).await.unwrap_err();

        match err {
            ApiError::RefreshFailed(RefreshError::Status { status, .. }) => assert_eq!(status, 401),
            other => panic!("expected reissue failure, got {:?}", other),
        }
        assert!(store.load().unwrap().is_none());
        rejected.assert_async().await;
        reissue.assert_async().await;
    }

    #[tokio::test]
    async fn test_direct_reissue_call_unauthorized_purges() {
        let mut server = Server::new_async().await;
        let reissue = server
            .mock("POST", "/reissue")
            .match_header("authorization", Matcher::Missing)
            .with_status(401)
            .expect(1)
            .create_async()
            .await;

        let store = store_with("a", "r");
        let client = client(&server, Arc::clone(&store));
        let request = ApiRequest::post("/reissue").with_body(json!({ "refreshToken": "r" }));
        let err = client.request(request).await.unwrap_err();

        assert!(matches!(err, ApiError::Unauthorized));
        assert!(store.load().unwrap().is_none());
        reissue.assert_async().await;
    }

    #[tokio::test]
    async fn test_second_unauthorized_is_not_refreshed_again() {
        let mut server = Server::new_async().await;
        let first = server
            .mock("GET", "/member/info")
            .match_header("authorization", "Bearer old-a")
            .with_status(401)
            .expect(1)
            .create_async()
            .await;
        let reissue = server
            .mock("POST", "/reissue")
            .with_status(200)
            .with_body(reissue_body("new-a", "new-r"))
            .expect(1)
            .create_async()
            .await;
        let second = server
            .mock("GET", "/member/info")
            .match_header("authorization", "Bearer new-a")
            .with_status(401)
            .expect(1)
            .create_async()
            .await;

        let store = store_with("old-a", "old-r");
        let client = client(&server, Arc::clone(&store));
        let err = client.request(ApiRequest::get("/member/info")).await.unwrap_err();

        assert!(matches!(err, ApiError::Unauthorized));
        // The retried request's own failure does not touch the fresh pair
        assert_eq!(client.access_token().unwrap().as_deref(), Some("new-a"));
        first.assert_async().await;
        reissue.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_auth_errors_leave_credentials() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/wine/999")
            .with_status(404)
            .with_body("no such wine")
            .create_async()
            .await;
        let reissue = server.mock("POST", "/reissue").expect(0).create_async().await;

        let store = store_with("a", "r");
        let client = client(&server, Arc::clone(&store));
        let err = client.request(ApiRequest::get("/wine/999")).await.unwrap_err();

        assert!(matches!(err, ApiError::NotFound(ref body) if body == "no such wine"));
        assert!(store.load().unwrap().is_some());
        reissue.assert_async().await;
    }

    #[tokio::test]
    async fn test_federated_token_used_when_nothing_stored() {
        let mut server = Server::new_async().await;
        let ok = server
            .mock("GET", "/banner")
            .match_header("authorization", "Bearer fed-token")
            .with_status(200)
            .with_body(r#"{"result":[]}"#)
            .expect(1)
            .create_async()
            .await;

        let identity = Arc::new(CountingIdentity {
            calls: AtomicUsize::new(0),
        });
        let client = SessionClient::builder(ClientConfig::new(server.url()))
            .store(Arc::new(MemoryTokenStore::new()))
            .identity(identity.clone())
            .build()
            .unwrap();

        let _: Value = client.get("/banner").await.unwrap();
        assert_eq!(identity.calls.load(Ordering::SeqCst), 1);
        ok.assert_async().await;
    }

    #[tokio::test]
    async fn test_federated_fallback_skipped_when_primary_stored() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/member/info")
            .match_header("authorization", "Bearer old-a")
            .with_status(401)
            .create_async()
            .await;
        server
            .mock("POST", "/reissue")
            .with_status(401)
            .create_async()
            .await;
        let federated = server
            .mock("GET", "/member/info")
            .match_header("authorization", "Bearer fed-token")
            .expect(0)
            .create_async()
            .await;

        let identity = Arc::new(CountingIdentity {
            calls: AtomicUsize::new(0),
        });
        let client = SessionClient::builder(ClientConfig::new(server.url()))
            .store(store_with("old-a", "old-r"))
            .identity(identity.clone())
            .build()
            .unwrap();

        assert!(client.request(ApiRequest::get("/member/info")).await.is_err());
        assert_eq!(identity.calls.load(Ordering::SeqCst), 0);
        federated.assert_async().await;
    }

    struct FailingIdentity;

    #[async_trait]
    impl FederatedIdentity for FailingIdentity {
        async fn current_user(&self) -> Option<FederatedUser> {
            Some(FederatedUser {
                uid: "fed-user".to_string(),
                email: None,
            })
        }

        async fn fresh_id_token(&self) -> anyhow::Result<String> {
            anyhow::bail!("identity provider offline")
        }
    }

    #[tokio::test]
    async fn test_federated_failure_sends_unauthenticated() {
        let mut server = Server::new_async().await;
        let anonymous = server
            .mock("GET", "/banner")
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body(r#"{"result":[]}"#)
            .expect(1)
            .create_async()
            .await;

        let client = SessionClient::builder(ClientConfig::new(server.url()))
            .store(Arc::new(MemoryTokenStore::new()))
            .identity(Arc::new(FailingIdentity))
            .build()
            .unwrap();

        let _: Value = client.get("/banner").await.unwrap();
        anonymous.assert_async().await;
    }

    #[tokio::test]
    async fn test_rotated_token_is_reused_without_reissue() {
        let mut server = Server::new_async().await;
        let store = store_with("old-a", "old-r");

        // Another caller rotates the pair while this request is in flight
        let rotating = Arc::clone(&store);
        let rejected = server
            .mock("GET", "/member/info")
            .match_header("authorization", "Bearer old-a")
            .with_status(401)
            .with_body_from_request(move |_| {
                rotating
                    .save(&CredentialPair::new("new-a", "new-r"))
                    .unwrap();
                Vec::new()
            })
            .expect(1)
            .create_async()
            .await;
        let reissue = server.mock("POST", "/reissue").expect(0).create_async().await;
        let resent = server
            .mock("GET", "/member/info")
            .match_header("authorization", "Bearer new-a")
            .with_status(200)
            .with_body(r#"{"result":{"username":"kim","authType":"KAKAO"}}"#)
            .expect(1)
            .create_async()
            .await;

        let client = client(&server, Arc::clone(&store));
        let response = client.request(ApiRequest::get("/member/info")).await.unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(store.load().unwrap().unwrap().refresh_token, "new-r");
        rejected.assert_async().await;
        reissue.assert_async().await;
        resent.assert_async().await;
    }

    #[tokio::test]
    async fn test_concurrent_unauthorized_share_one_reissue() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", Matcher::Regex(r"^/wine/(1|2)$".to_string()))
            .match_header("authorization", "Bearer old-a")
            .with_status(401)
            .expect(2)
            .create_async()
            .await;
        let reissue = server
            .mock("POST", "/reissue")
            .with_status(200)
            .with_body(reissue_body("new-a", "new-r"))
            .expect(1)
            .create_async()
            .await;
        let retried = server
            .mock("GET", Matcher::Regex(r"^/wine/(1|2)$".to_string()))
            .match_header("authorization", "Bearer new-a")
            .with_status(200)
            .with_body(r#"{"result":{}}"#)
            .expect(2)
            .create_async()
            .await;

        let client = client(&server, store_with("old-a", "old-r"));
        let (first, second) = tokio::join!(
            client.request(ApiRequest::get("/wine/1")),
            client.request(ApiRequest::get("/wine/2")),
        );

        assert_eq!(first.unwrap().status(), 200);
        assert_eq!(second.unwrap().status(), 200);
        reissue.assert_async().await;
        retried.assert_async().await;
    }

    #[tokio::test]
    async fn test_session_observer_sees_purge() {
        let mut server = Server::new_async().await;
        server.mock("GET", "/member/name").with_status(401).create_async().await;
        server.mock("POST", "/reissue").with_status(500).create_async().await;

        let client = client(&server, store_with("old-a", "old-r"));
        let mut rx = client.subscribe();
        assert_eq!(*rx.borrow_and_update(), SessionState::Authenticated);

        let err = client.request(ApiRequest::get("/member/name")).await.unwrap_err();
        assert!(err.is_session_terminal());
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), SessionState::SignedOut);
    }
}
