//! Route decisioning for page mounts.
//!
//! Pure and I/O-free by design: the decision depends only on its arguments,
//! so the rules are testable without any of the async plumbing around them.
//! The async side (credential check + status fetch) lives in
//! [`ApiClient::route_on_entry`](crate::client::ApiClient::route_on_entry).

use crate::status::{SessionStatus, UserRole};

/// Whether the mounting page is reachable without a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAccess {
    /// Landing, sign-in, registration: anonymous users stay.
    Public,
    /// Dashboards, catalog, orders: anonymous users go to sign-in.
    Protected,
}

/// Authentication state at decision time.
///
/// `Authenticated` carries a status fetched in the same decision cycle —
/// never the display cache — so onboarding gating always runs on fresh data.
#[derive(Debug, Clone, Copy)]
pub enum AuthSnapshot<'a> {
    /// No credential, or a credential that no longer validates.
    Anonymous,
    Authenticated(&'a SessionStatus),
}

/// Where the mounting page should send the user, if anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Stay,
    Redirect(String),
}

impl RouteDecision {
    #[must_use]
    pub fn is_redirect(&self) -> bool {
        matches!(self, Self::Redirect(_))
    }

    #[must_use]
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Stay => None,
            Self::Redirect(target) => Some(target),
        }
    }
}

/// Front-end route targets used by the decision rules.
#[derive(Debug, Clone)]
pub struct RoutePaths {
    pub login: String,
    pub company_setup: String,
    pub seller_dashboard: String,
    pub buyer_home: String,
}

impl Default for RoutePaths {
    fn default() -> Self {
        Self {
            login: "/login".into(),
            company_setup: "/company-setup".into(),
            seller_dashboard: "/seller-dashboard".into(),
            buyer_home: "/buyer".into(),
        }
    }
}

/// Decide the target route for a mounting page.
///
/// Rules, in order:
/// 1. Anonymous → stay on public pages, sign-in on protected ones.
/// 2. No company yet → company setup, regardless of role.
/// 3. Seller → seller dashboard.
/// 4. Buyer, and any unrecognized role → buyer home (the deliberate
///    fallback; see DESIGN.md).
#[must_use]
pub fn decide(page: PageAccess, auth: &AuthSnapshot<'_>, routes: &RoutePaths) -> RouteDecision {
    match auth {
        AuthSnapshot::Anonymous => match page {
            PageAccess::Public => RouteDecision::Stay,
            PageAccess::Protected => RouteDecision::Redirect(routes.login.clone()),
        },
        AuthSnapshot::Authenticated(status) => {
            if !status.has_company {
                return RouteDecision::Redirect(routes.company_setup.clone());
            }
            match status.role {
                UserRole::Seller => RouteDecision::Redirect(routes.seller_dashboard.clone()),
                UserRole::Buyer | UserRole::Unknown => {
                    RouteDecision::Redirect(routes.buyer_home.clone())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(role: UserRole, has_company: bool) -> SessionStatus {
        SessionStatus {
            has_company,
            role,
            company_id: None,
            user_id: None,
        }
    }

    fn routes() -> RoutePaths {
        RoutePaths::default()
    }

    #[test]
    fn anonymous_stays_on_public_pages() {
        let d = decide(PageAccess::Public, &AuthSnapshot::Anonymous, &routes());
        assert_eq!(d, RouteDecision::Stay);
    }

    #[test]
    fn anonymous_redirects_to_login_on_protected_pages() {
        let d = decide(PageAccess::Protected, &AuthSnapshot::Anonymous, &routes());
        assert_eq!(d.target(), Some("/login"));
    }

    #[test]
    fn missing_company_wins_over_role() {
        for role in [UserRole::Buyer, UserRole::Seller, UserRole::Unknown] {
            let s = status(role, false);
            let d = decide(PageAccess::Public, &AuthSnapshot::Authenticated(&s), &routes());
            assert_eq!(d.target(), Some("/company-setup"), "role {role:?}");
        }
    }

    #[test]
    fn seller_goes_to_seller_dashboard() {
        let s = status(UserRole::Seller, true);
        let d = decide(PageAccess::Public, &AuthSnapshot::Authenticated(&s), &routes());
        assert_eq!(d.target(), Some("/seller-dashboard"));
    }

    #[test]
    fn buyer_and_unknown_go_to_buyer_home() {
        for role in [UserRole::Buyer, UserRole::Unknown] {
            let s = status(role, true);
            let d = decide(PageAccess::Public, &AuthSnapshot::Authenticated(&s), &routes());
            assert_eq!(d.target(), Some("/buyer"), "role {role:?}");
        }
    }

    #[test]
    fn deterministic_for_identical_inputs() {
        let s = status(UserRole::Seller, true);
        let snapshot = AuthSnapshot::Authenticated(&s);
        let first = decide(PageAccess::Protected, &snapshot, &routes());
        let second = decide(PageAccess::Protected, &snapshot, &routes());
        assert_eq!(first, second);
    }

    #[test]
    fn custom_route_targets_are_honored() {
        let mut paths = routes();
        paths.login = "/signin".into();
        let d = decide(PageAccess::Protected, &AuthSnapshot::Anonymous, &paths);
        assert_eq!(d.target(), Some("/signin"));
    }
}
