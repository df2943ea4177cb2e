//! Token reissue with single-flight coalescing.
//!
//! Concurrent 401s share one in-flight reissue call: the first caller
//! installs a shared future in the slot, later callers clone and await it,
//! and the slot is emptied once the call settles. Purging credentials on
//! failure happens inside the shared future, so it runs once per reissue.

use std::sync::{Arc, Mutex, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::error::truncate_body;
use super::RefreshError;
use crate::auth::{CredentialPair, SessionState, SessionWatch, TokenStore};
use crate::models::ApiEnvelope;

type SharedReissue = Shared<BoxFuture<'static, Result<CredentialPair, RefreshError>>>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReissueRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReissueTokens {
    access_token: Option<String>,
    refresh_token: Option<String>,
}

pub(crate) struct Refresher {
    http: Client,
    url: String,
    store: Arc<dyn TokenStore>,
    session: SessionWatch,
    inflight: Mutex<Option<SharedReissue>>,
}

impl Refresher {
    pub(crate) fn new(
        http: Client,
        url: String,
        store: Arc<dyn TokenStore>,
        session: SessionWatch,
    ) -> Self {
        Self {
            http,
            url,
            store,
            session,
            inflight: Mutex::new(None),
        }
    }

    /// Obtain a new credential pair, joining a reissue already in flight.
    pub(crate) async fn refresh(&self) -> Result<CredentialPair, RefreshError> {
        let reissue = {
            let mut slot = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
            match slot.as_ref() {
                Some(pending) => {
                    debug!("Joining in-flight token reissue");
                    pending.clone()
                }
                None => {
                    let pending = Self::reissue_and_settle(
                        self.http.clone(),
                        self.url.clone(),
                        Arc::clone(&self.store),
                        self.session.clone(),
                    )
                    .boxed()
                    .shared();
                    *slot = Some(pending.clone());
                    pending
                }
            }
        };

        let result = reissue.clone().await;

        let mut slot = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|pending| pending.ptr_eq(&reissue)) {
            *slot = None;
        }
        result
    }

    async fn reissue_and_settle(
        http: Client,
        url: String,
        store: Arc<dyn TokenStore>,
        session: SessionWatch,
    ) -> Result<CredentialPair, RefreshError> {
        match Self::reissue(&http, &url, store.as_ref()).await {
            Ok(pair) => {
                info!("Access token reissued");
                session.publish(SessionState::Authenticated);
                Ok(pair)
            }
            Err(e) => {
                warn!(error = %e, "Token reissue failed, clearing stored credentials");
                if let Err(clear_err) = store.clear() {
                    warn!(error = %clear_err, "Failed to clear stored credentials");
                }
                session.publish(SessionState::SignedOut);
                Err(e)
            }
        }
    }

    async fn reissue(
        http: &Client,
        url: &str,
        store: &dyn TokenStore,
    ) -> Result<CredentialPair, RefreshError> {
        let refresh_token = store
            .load()
            .map_err(|e| RefreshError::Storage(format!("{:#}", e)))?
            .map(|pair| pair.refresh_token)
            .ok_or(RefreshError::MissingRefreshToken)?;

        let response = http
            .post(url)
            .json(&ReissueRequest {
                refresh_token: &refresh_token,
            })
            .send()
            .await
            .map_err(|e| RefreshError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RefreshError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(RefreshError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let pair = parse_reissue_body(&body)?;
        store
            .save(&pair)
            .map_err(|e| RefreshError::Storage(format!("{:#}", e)))?;
        Ok(pair)
    }
}

/// Extract the new pair from `{ result: { accessToken, refreshToken } }`.
fn parse_reissue_body(body: &str) -> Result<CredentialPair, RefreshError> {
    let envelope: ApiEnvelope<Option<ReissueTokens>> =
        serde_json::from_str(body).map_err(|e| RefreshError::Malformed(e.to_string()))?;
    if !envelope.is_success {
        return Err(RefreshError::Malformed(format!(
            "{}: {}",
            envelope.code, envelope.message
        )));
    }
    let tokens = envelope
        .result
        .ok_or_else(|| RefreshError::Malformed("missing result".to_string()))?;

    let present = |token: Option<String>, name: &str| {
        token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| RefreshError::Malformed(format!("missing {}", name)))
    };
    let access_token = present(tokens.access_token, "accessToken")?;
    let refresh_token = present(tokens.refresh_token, "refreshToken")?;
    Ok(CredentialPair::new(access_token, refresh_token))
}
