use std::future::Future;

use reqwest::Method;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::Error;

/// One outbound API call, fully described.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    /// Access token for the `Authorization: Bearer` header, when present.
    pub bearer: Option<String>,
    /// JSON body, when present.
    pub body: Option<serde_json::Value>,
}

impl HttpRequest {
    #[must_use]
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            bearer: None,
            body: None,
        }
    }

    #[must_use]
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    #[must_use]
    pub fn with_json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Status and body of a completed API call.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Resource`] when the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_str(&self.body).map_err(|e| Error::Resource {
            status: self.status,
            detail: format!("invalid JSON body: {e}"),
        })
    }
}

/// The network seam.
///
/// Everything above this trait is synchronous logic; the suspension points of
/// the whole session layer are exactly the `execute` calls. Production uses
/// [`ReqwestTransport`]; tests implement this with scripted fakes.
pub trait HttpTransport: Send + Sync + 'static {
    /// Perform the call and return the response, whatever its status.
    ///
    /// Errors are reserved for transport-level failures (connection refused,
    /// DNS, timeouts); HTTP error statuses come back as `Ok` responses.
    fn execute(&self, req: HttpRequest) -> impl Future<Output = Result<HttpResponse, Error>> + Send;
}

impl<T: HttpTransport> HttpTransport for std::sync::Arc<T> {
    fn execute(&self, req: HttpRequest) -> impl Future<Output = Result<HttpResponse, Error>> + Send {
        (**self).execute(req)
    }
}

/// [`HttpTransport`] over a shared `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom `reqwest` client (for connection pool reuse or custom TLS).
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl HttpTransport for ReqwestTransport {
    async fn execute(&self, req: HttpRequest) -> Result<HttpResponse, Error> {
        let mut builder = self.client.request(req.method, req.url);
        if let Some(token) = &req.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &req.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }
}
