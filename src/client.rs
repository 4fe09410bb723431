use std::sync::Arc;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::ApiConfig;
use crate::error::Error;
use crate::refresh::SessionRefresher;
use crate::route::{self, AuthSnapshot, PageAccess, RouteDecision};
use crate::status::{StatusResolver, UserRole};
use crate::store::SessionStore;
use crate::token::Credential;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
use crate::types::Phone;

/// UI-side hooks for session outcomes.
///
/// The session layer never renders anything and never touches the router
/// directly; it reports through this seam and the page shell decides how a
/// notification looks and how navigation happens. The default
/// implementation, [`LogEvents`], only logs.
pub trait SessionEvents: Send + Sync + 'static {
    /// The session is gone (refresh failed or the refreshed token was still
    /// rejected). Fired once per teardown, right before `navigate`.
    fn session_expired(&self);
    /// The backend answered 5xx. Show a dismissible notice; nothing was
    /// done to the session.
    fn transient_failure(&self, status: u16);
    /// The session layer wants the app at `path` (sign-in after teardown).
    fn navigate(&self, path: &str);
}

/// [`SessionEvents`] that reports through `tracing` only.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogEvents;

impl SessionEvents for LogEvents {
    fn session_expired(&self) {
        tracing::warn!("session expired; sign-in required");
    }

    fn transient_failure(&self, status: u16) {
        tracing::warn!(status, "transient server error");
    }

    fn navigate(&self, path: &str) {
        tracing::info!(path, "navigation requested");
    }
}

/// Interceptor attempt state. "Retry exactly once" is structural: there is
/// no transition out of `Retry` other than returning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    First,
    Retry,
}

struct Inner<T: HttpTransport> {
    config: ApiConfig,
    transport: Arc<T>,
    store: SessionStore,
    refresher: SessionRefresher<T>,
    events: Arc<dyn SessionEvents>,
}

/// Authenticated API client for the TradePost backend.
///
/// Every resource call goes through the request interceptor: the current
/// access token is attached, a 401 triggers one refresh exchange and one
/// retry, and an unrecoverable failure tears the session down and requests
/// navigation to sign-in. Cheap to clone; all clones share the store and the
/// single-flight refresh gate.
pub struct ApiClient<T: HttpTransport = ReqwestTransport> {
    inner: Arc<Inner<T>>,
}

// Manual Clone: avoid derive adding a `T: Clone` bound.
impl<T: HttpTransport> Clone for ApiClient<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl ApiClient<ReqwestTransport> {
    /// Client over a fresh `reqwest` transport.
    #[must_use]
    pub fn new(config: ApiConfig, store: SessionStore) -> Self {
        Self::with_transport(config, store, ReqwestTransport::new())
    }
}

impl<T: HttpTransport> ApiClient<T> {
    /// Client over a custom transport (tests, instrumented stacks).
    #[must_use]
    pub fn with_transport(config: ApiConfig, store: SessionStore, transport: T) -> Self {
        let transport = Arc::new(transport);
        let refresher = SessionRefresher::new(
            transport.clone(),
            config.endpoint(&config.refresh_path),
            store.clone(),
        );
        Self {
            inner: Arc::new(Inner {
                config,
                transport,
                store,
                refresher,
                events: Arc::new(LogEvents),
            }),
        }
    }

    /// Replace the [`SessionEvents`] sink. Call at construction time, before
    /// the client is cloned around.
    #[must_use]
    pub fn with_events(self, events: impl SessionEvents) -> Self {
        let inner = &self.inner;
        let refresher = SessionRefresher::new(
            inner.transport.clone(),
            inner.config.endpoint(&inner.config.refresh_path),
            inner.store.clone(),
        );
        Self {
            inner: Arc::new(Inner {
                config: inner.config.clone(),
                transport: inner.transport.clone(),
                store: inner.store.clone(),
                refresher,
                events: Arc::new(events),
            }),
        }
    }

    #[must_use]
    pub fn store(&self) -> &SessionStore {
        &self.inner.store
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Status resolver bound to this client.
    #[must_use]
    pub fn status(&self) -> StatusResolver<T> {
        StatusResolver::new(self.clone())
    }

    // ── Interceptor ────────────────────────────────────────────────────

    /// Send an intercepted request.
    ///
    /// The bearer token is re-read from the store at every attempt, so a
    /// retry after refresh carries the token current at retry time, never a
    /// stale captured value.
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<HttpResponse, Error> {
        let url = self.inner.config.endpoint(path);
        let mut attempt = Attempt::First;
        loop {
            let bearer = self.inner.store.credential().map(|c| c.access);
            let mut request = HttpRequest::new(method.clone(), url.clone());
            if let Some(token) = &bearer {
                request = request.with_bearer(token.clone());
            }
            if let Some(body) = &body {
                request = request.with_json(body.clone());
            }

            let response = self.inner.transport.execute(request).await?;
            match (response.status, attempt) {
                (200..=299, _) => return Ok(response),
                (401, Attempt::First) => {
                    if let Err(e) = self.inner.refresher.refresh(bearer.as_deref()).await {
                        tracing::warn!(error = %e, path, "session expired during request");
                        self.expire();
                        return Err(Error::Auth);
                    }
                    attempt = Attempt::Retry;
                }
                (401, Attempt::Retry) => {
                    // A freshly refreshed token was rejected: the session is
                    // gone server-side, and retrying again would loop forever
                    // against a permanently rejecting endpoint.
                    tracing::warn!(path, "refreshed token rejected; session torn down");
                    self.inner.store.clear();
                    self.expire();
                    return Err(Error::Auth);
                }
                (status @ 500..=599, _) => {
                    self.inner.events.transient_failure(status);
                    return Err(Error::Server { status });
                }
                (status, _) => {
                    return Err(Error::Resource {
                        status,
                        detail: snippet(&response.body),
                    });
                }
            }
        }
    }

    fn expire(&self) {
        self.inner.events.session_expired();
        self.inner.events.navigate(&self.inner.config.routes.login);
    }

    // ── Intercepted resource calls ─────────────────────────────────────

    /// GET an intercepted JSON resource.
    ///
    /// # Errors
    ///
    /// [`Error::Auth`] after session teardown, [`Error::Server`] on 5xx,
    /// [`Error::Resource`] on other non-2xx or an undecodable body,
    /// [`Error::Http`] on transport failure.
    pub async fn get_json<R: DeserializeOwned>(&self, path: &str) -> Result<R, Error> {
        self.send(Method::GET, path, None).await?.json()
    }

    /// POST a JSON body to an intercepted resource.
    ///
    /// # Errors
    ///
    /// As [`get_json`](Self::get_json).
    pub async fn post_json<R: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<R, Error> {
        self.send(Method::POST, path, Some(to_json(body)?)).await?.json()
    }

    /// PUT a JSON body to an intercepted resource.
    ///
    /// # Errors
    ///
    /// As [`get_json`](Self::get_json).
    pub async fn put_json<R: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<R, Error> {
        self.send(Method::PUT, path, Some(to_json(body)?)).await?.json()
    }

    /// DELETE an intercepted resource.
    ///
    /// # Errors
    ///
    /// As [`get_json`](Self::get_json).
    pub async fn delete(&self, path: &str) -> Result<(), Error> {
        self.send(Method::DELETE, path, None).await.map(|_| ())
    }

    // ── Auth endpoints ─────────────────────────────────────────────────

    /// Sign in with phone and password; persists the issued credential.
    ///
    /// Not intercepted: a 401 here means bad credentials, not an expired
    /// session, and there is no session to refresh yet.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] on an empty password, [`Error::Resource`] /
    /// [`Error::Server`] on rejection, [`Error::Http`] on transport failure.
    pub async fn login(&self, phone: &Phone, password: &str) -> Result<Credential, Error> {
        if password.is_empty() {
            return Err(Error::Validation("password must not be empty".into()));
        }

        let request = HttpRequest::new(
            Method::POST,
            self.inner.config.endpoint(&self.inner.config.login_path),
        )
        .with_json(json!({ "phone": phone, "password": password }));

        let response = check_status(self.inner.transport.execute(request).await?)?;
        let body: LoginResponse = response.json()?;

        let credential = Credential::new(body.access, body.refresh);
        self.inner.store.set_credential(&credential);
        tracing::info!("signed in");
        Ok(credential)
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] when a field fails its local constraint (handle
    /// inline at the form), otherwise as [`login`](Self::login).
    pub async fn register(&self, params: &RegisterParams) -> Result<(), Error> {
        params.validate()?;

        let request = HttpRequest::new(
            Method::POST,
            self.inner.config.endpoint(&self.inner.config.register_path),
        )
        .with_json(to_json(params)?);

        check_status(self.inner.transport.execute(request).await?)?;
        Ok(())
    }

    /// Request an SMS verification code. Returns the code's validity window
    /// in seconds.
    ///
    /// # Errors
    ///
    /// As [`login`](Self::login).
    pub async fn send_code(&self, phone: &Phone) -> Result<u64, Error> {
        let request = HttpRequest::new(
            Method::POST,
            self.inner.config.endpoint(&self.inner.config.send_code_path),
        )
        .with_json(json!({ "phone": phone }));

        let response = check_status(self.inner.transport.execute(request).await?)?;
        let body: SendCodeResponse = response.json()?;
        Ok(body.expires_in_seconds)
    }

    /// Sign out. The local session is cleared even when the server call
    /// fails — the user asked to leave.
    pub async fn logout(&self) {
        if let Some(credential) = self.inner.store.credential() {
            let request = HttpRequest::new(
                Method::POST,
                self.inner.config.endpoint(&self.inner.config.logout_path),
            )
            .with_bearer(credential.access)
            .with_json(json!({ "refresh": credential.refresh }));

            match self.inner.transport.execute(request).await {
                Ok(response) if !response.is_success() => {
                    tracing::warn!(status = response.status, "logout rejected by server");
                }
                Err(e) => tracing::warn!(error = %e, "logout request failed"),
                Ok(_) => {}
            }
        }
        self.inner.store.clear();
        tracing::info!("signed out");
    }

    // ── Page-mount control flow ────────────────────────────────────────

    /// Decide where a mounting page should send the user.
    ///
    /// Validates the stored credential, fetches a fresh status when the
    /// credential is usable, and runs the pure decision rules. A failed
    /// status fetch degrades to "treat as unauthenticated" instead of
    /// crashing the page: public pages stay, protected pages go to sign-in.
    pub async fn route_on_entry(&self, page: PageAccess) -> RouteDecision {
        let routes = self.inner.config.routes();
        let usable = self
            .inner
            .store
            .credential()
            .is_some_and(|c| c.is_valid());
        if !usable {
            return route::decide(page, &AuthSnapshot::Anonymous, routes);
        }

        match self.status().fetch_status().await {
            Ok(status) => route::decide(page, &AuthSnapshot::Authenticated(&status), routes),
            Err(e) => {
                tracing::warn!(error = %e, "status fetch failed; treating as unauthenticated");
                route::decide(page, &AuthSnapshot::Anonymous, routes)
            }
        }
    }
}

/// Wire shape of the login response. Unlike refresh, both tokens are
/// mandatory here.
#[derive(Debug, Deserialize)]
struct LoginResponse {
    access: String,
    refresh: String,
}

#[derive(Debug, Deserialize)]
struct SendCodeResponse {
    expires_in_seconds: u64,
}

/// Registration form fields.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterParams {
    pub role: UserRole,
    pub phone: Phone,
    pub name: String,
    pub password: String,
    pub verification_code: String,
}

impl RegisterParams {
    fn validate(&self) -> Result<(), Error> {
        if self.role == UserRole::Unknown {
            return Err(Error::Validation("role must be buyer or seller".into()));
        }
        if self.name.trim().is_empty() {
            return Err(Error::Validation("name must not be empty".into()));
        }
        if self.password.is_empty() {
            return Err(Error::Validation("password must not be empty".into()));
        }
        if self.verification_code.is_empty()
            || !self.verification_code.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(Error::Validation("verification code must be digits".into()));
        }
        Ok(())
    }
}

/// Non-2xx on a non-intercepted call: 5xx transient, anything else a
/// resource rejection.
fn check_status(response: HttpResponse) -> Result<HttpResponse, Error> {
    if response.is_success() {
        return Ok(response);
    }
    let status = response.status;
    if (500..600).contains(&status) {
        Err(Error::Server { status })
    } else {
        Err(Error::Resource {
            status,
            detail: snippet(&response.body),
        })
    }
}

fn to_json(body: &impl Serialize) -> Result<serde_json::Value, Error> {
    serde_json::to_value(body)
        .map_err(|e| Error::Validation(format!("unencodable request body: {e}")))
}

/// First 200 chars of a body for error details.
fn snippet(body: &str) -> String {
    body.chars().take(200).collect()
}
