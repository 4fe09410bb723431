use url::Url;

use crate::error::Error;
use crate::route::RoutePaths;

/// TradePost API client configuration.
///
/// The required field (`base_url`) is a constructor parameter — no runtime
/// "missing field" errors. Endpoint paths and front-end route targets default
/// to the production layout and can be overridden by chaining.
///
/// ```rust,ignore
/// use tradepost_client::ApiConfig;
///
/// let config = ApiConfig::new("https://api.tradepost.example".parse()?);
/// // Optional overrides via chaining:
/// let config = config
///     .with_status_path("/v2/companies/my_status/")
///     .with_login_route("/signin");
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ApiConfig {
    pub(crate) base_url: Url,
    pub(crate) login_path: String,
    pub(crate) register_path: String,
    pub(crate) send_code_path: String,
    pub(crate) logout_path: String,
    pub(crate) refresh_path: String,
    pub(crate) status_path: String,
    pub(crate) routes: RoutePaths,
}

impl ApiConfig {
    /// Create a new configuration against the given API base URL.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            login_path: "/auth/login/".into(),
            register_path: "/auth/register/".into(),
            send_code_path: "/auth/send-code/".into(),
            logout_path: "/auth/logout/".into(),
            refresh_path: "/auth/jwt/refresh/".into(),
            status_path: "/companies/my_status/".into(),
            routes: RoutePaths::default(),
        }
    }

    /// Create configuration from environment variables.
    ///
    /// # Required env vars
    /// - `TRADEPOST_API_URL`: API base URL
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `TRADEPOST_API_URL` is missing or not a
    /// valid URL.
    pub fn from_env() -> Result<Self, Error> {
        let base = std::env::var("TRADEPOST_API_URL")
            .map_err(|_| Error::Config("TRADEPOST_API_URL is required".into()))?;
        let base_url: Url = base
            .parse()
            .map_err(|e| Error::Config(format!("TRADEPOST_API_URL: {e}")))?;
        Ok(Self::new(base_url))
    }

    #[must_use]
    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    #[must_use]
    pub fn with_register_path(mut self, path: impl Into<String>) -> Self {
        self.register_path = path.into();
        self
    }

    #[must_use]
    pub fn with_send_code_path(mut self, path: impl Into<String>) -> Self {
        self.send_code_path = path.into();
        self
    }

    #[must_use]
    pub fn with_logout_path(mut self, path: impl Into<String>) -> Self {
        self.logout_path = path.into();
        self
    }

    #[must_use]
    pub fn with_refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    #[must_use]
    pub fn with_status_path(mut self, path: impl Into<String>) -> Self {
        self.status_path = path.into();
        self
    }

    /// Override the sign-in route target.
    #[must_use]
    pub fn with_login_route(mut self, path: impl Into<String>) -> Self {
        self.routes.login = path.into();
        self
    }

    /// Override the company-onboarding route target.
    #[must_use]
    pub fn with_company_setup_route(mut self, path: impl Into<String>) -> Self {
        self.routes.company_setup = path.into();
        self
    }

    /// Override the seller dashboard route target.
    #[must_use]
    pub fn with_seller_dashboard_route(mut self, path: impl Into<String>) -> Self {
        self.routes.seller_dashboard = path.into();
        self
    }

    /// Override the buyer home route target.
    #[must_use]
    pub fn with_buyer_home_route(mut self, path: impl Into<String>) -> Self {
        self.routes.buyer_home = path.into();
        self
    }

    /// API base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn status_path(&self) -> &str {
        &self.status_path
    }

    /// Front-end route targets for the decision rules.
    #[must_use]
    pub fn routes(&self) -> &RoutePaths {
        &self.routes
    }

    /// Resolve an API path against the base URL, preserving any base path
    /// prefix (`https://host/api` + `/items/` → `https://host/api/items/`).
    #[must_use]
    pub fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        let joined = format!(
            "{}/{}",
            url.path().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        url.set_path(&joined);
        url
    }
}
