use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::error::Error;
use crate::transport::HttpTransport;
use crate::types::{CompanyId, UserId};

/// User role, normalized at the wire boundary.
///
/// The backend sends the role as a loosely-cased string; it is mapped into
/// this closed set exactly once, in [`UserRole::normalize`]. Raw role strings
/// are compared nowhere else in the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    Buyer,
    Seller,
    /// Unrecognized or missing role. Routed like a buyer (see DESIGN.md).
    Unknown,
}

impl UserRole {
    /// Map a wire role string into the closed set, case-insensitively.
    /// Anything unrecognized becomes [`UserRole::Unknown`]; never fails.
    #[must_use]
    pub fn normalize(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "buyer" => Self::Buyer,
            "seller" => Self::Seller,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buyer => "BUYER",
            Self::Seller => "SELLER",
            Self::Unknown => "UNKNOWN",
        }
    }
}

/// Identity and onboarding state from `GET /companies/my_status/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    /// Whether the account is linked to a company profile. Gates access to
    /// the role dashboards.
    pub has_company: bool,
    pub role: UserRole,
    pub company_id: Option<CompanyId>,
    pub user_id: Option<UserId>,
}

/// Wire shape of the my-status response.
#[derive(Debug, Deserialize)]
struct RawStatus {
    has_company: bool,
    #[serde(default)]
    user_role: String,
    #[serde(default)]
    company_id: Option<CompanyId>,
    #[serde(default)]
    user_id: Option<UserId>,
}

/// Fetches the my-status endpoint through the intercepted client and caches
/// the normalized result in the session store.
pub struct StatusResolver<T: HttpTransport> {
    api: ApiClient<T>,
}

impl<T: HttpTransport> StatusResolver<T> {
    #[must_use]
    pub fn new(api: ApiClient<T>) -> Self {
        Self { api }
    }

    /// Fetch, normalize, and cache the session status.
    ///
    /// Goes through the request interceptor, so an expired access token is
    /// refreshed transparently first. Does not clear the session on failure —
    /// that is the interceptor's job on its 401 path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Auth`] when the interceptor tore the session down,
    /// or [`Error::Status`] for any other fetch or decode failure.
    pub async fn fetch_status(&self) -> Result<SessionStatus, Error> {
        let path = self.api.config().status_path().to_owned();
        let raw: RawStatus = self.api.get_json(&path).await.map_err(|e| match e {
            Error::Auth => Error::Auth,
            other => Error::Status(other.to_string()),
        })?;

        let status = SessionStatus {
            has_company: raw.has_company,
            role: UserRole::normalize(&raw.user_role),
            company_id: raw.company_id,
            user_id: raw.user_id,
        };
        self.api
            .store()
            .set_cached_status(status.role, status.has_company);
        Ok(status)
    }
}
