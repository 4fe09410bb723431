use std::sync::Arc;

use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;
use url::Url;

use crate::error::Error;
use crate::store::SessionStore;
use crate::token::Credential;
use crate::transport::{HttpRequest, HttpTransport};

/// Wire shape of the refresh response. The backend rotates the refresh token
/// only sometimes; an absent `refresh` keeps the stored one.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access: String,
    #[serde(default)]
    refresh: Option<String>,
}

/// Exchanges the stored refresh token for a new access token.
///
/// Failure policy is fail-closed: any refresh failure — no refresh token,
/// endpoint rejection, network error — clears the whole session. There is no
/// "retry later" state; a session that cannot refresh is gone.
///
/// Concurrent callers are coalesced into a single network exchange. Two
/// simultaneous 401s must not race to rotate the refresh token twice: the
/// second rotation would invalidate the refresh token the first one just
/// received.
pub struct SessionRefresher<T: HttpTransport> {
    transport: Arc<T>,
    refresh_url: Url,
    store: SessionStore,
    /// Single-flight gate. Holders of the lock are the only task allowed to
    /// talk to the refresh endpoint.
    flight: Mutex<()>,
}

impl<T: HttpTransport> SessionRefresher<T> {
    #[must_use]
    pub fn new(transport: Arc<T>, refresh_url: Url, store: SessionStore) -> Self {
        Self {
            transport,
            refresh_url,
            store,
            flight: Mutex::new(()),
        }
    }

    /// Refresh the session, coalescing with concurrent refreshes.
    ///
    /// `stale_access` is the access token the caller just saw rejected. When
    /// the stored access token no longer matches it, a concurrent task
    /// already rotated the credential while this one waited on the gate — the
    /// rotated credential is returned without a second network call. Pass
    /// `None` to force an exchange.
    ///
    /// On success the new credential is persisted before this returns; on
    /// failure the store is cleared (all four fields) before the error is
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Refresh`] when no refresh token is stored, the
    /// endpoint rejects the token, or the exchange fails in transit.
    pub async fn refresh(&self, stale_access: Option<&str>) -> Result<Credential, Error> {
        let _flight = self.flight.lock().await;

        if let Some(stale) = stale_access {
            if let Some(current) = self.store.credential() {
                if current.access != stale {
                    tracing::debug!("refresh coalesced; credential already rotated");
                    return Ok(current);
                }
            }
        }

        let Some(current) = self.store.credential() else {
            self.store.clear();
            return Err(Error::Refresh("no refresh token stored".into()));
        };

        let request = HttpRequest::new(Method::POST, self.refresh_url.clone())
            .with_json(json!({ "refresh": current.refresh }));

        let response = match self.transport.execute(request).await {
            Ok(response) => response,
            Err(e) => return Err(self.fail(format!("refresh exchange failed: {e}"))),
        };

        if !response.is_success() {
            return Err(self.fail(format!("refresh rejected with HTTP {}", response.status)));
        }

        let body: RefreshResponse = match response.json() {
            Ok(body) => body,
            Err(e) => return Err(self.fail(format!("bad refresh response: {e}"))),
        };

        let rotated = Credential::new(body.access, body.refresh.unwrap_or(current.refresh));
        self.store.set_credential(&rotated);
        tracing::debug!("access token refreshed");
        Ok(rotated)
    }

    /// Fail-closed teardown: clear everything, log, build the error.
    fn fail(&self, detail: String) -> Error {
        self.store.clear();
        tracing::warn!(detail = %detail, "session cleared after refresh failure");
        Error::Refresh(detail)
    }
}
