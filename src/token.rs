use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::Value as JsonValue;

/// Stored credential pair.
///
/// Both tokens are self-describing (three dot-delimited segments, base64url
/// JSON payload) and carry their own `exp` claim in Unix seconds. The pair is
/// owned by [`SessionStore`](crate::store::SessionStore); it lives until
/// explicit logout, refresh-replacement, or an irrecoverable refresh failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub access: String,
    pub refresh: String,
}

impl Credential {
    #[must_use]
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: access.into(),
            refresh: refresh.into(),
        }
    }

    /// Whether this credential is currently usable.
    ///
    /// Usable means the access token's `exp` is in the future, or — when the
    /// access token is expired — the refresh token's `exp` is (the refresh
    /// will then happen on the first 401). A token that cannot be decoded
    /// reads as expired: corrupted storage degrades to "not authenticated"
    /// instead of crashing the page.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(now_unix())
    }

    /// [`is_valid`](Self::is_valid) against an explicit clock, in Unix seconds.
    #[must_use]
    pub fn is_valid_at(&self, now: i64) -> bool {
        match claim_exp(&self.access) {
            Some(exp) if now < exp => true,
            _ => claim_exp(&self.refresh).is_some_and(|exp| now < exp),
        }
    }
}

/// Extracts the `exp` claim (Unix seconds) from a self-describing token.
///
/// Returns `None` on any malformation: wrong segment count, non-base64url
/// payload, non-JSON payload, or a missing/non-numeric `exp`.
fn claim_exp(token: &str) -> Option<i64> {
    let mut segments = token.split('.');
    let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => return None,
    };
    // Issuers vary on padding; base64url claims are canonically unpadded.
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: JsonValue = serde_json::from_slice(&bytes).ok()?;
    claims.get("exp")?.as_i64()
}

fn now_unix() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}
