use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use crate::status::UserRole;
use crate::token::Credential;

/// Fixed storage keys. The four fields live and die together: logout or an
/// irrecoverable refresh failure removes all of them in one step.
pub const ACCESS_TOKEN_KEY: &str = "tradepost_access";
pub const REFRESH_TOKEN_KEY: &str = "tradepost_refresh";
pub const USER_ROLE_KEY: &str = "tradepost_role";
pub const HAS_COMPANY_KEY: &str = "tradepost_has_company";

/// Consumer-provided durable storage (the localStorage bridge in the browser
/// build, a keychain or plain file elsewhere).
///
/// Operations are synchronous, keyed string reads/writes. Implementations do
/// not need to coordinate multi-key atomicity — [`SessionStore`] provides
/// that on top.
///
/// # Example
///
/// ```rust,ignore
/// impl StorageBackend for LocalStorageBridge {
///     fn read(&self, key: &str) -> Option<String> {
///         self.window.local_storage().get_item(key)
///     }
///     fn write(&self, key: &str, value: &str) {
///         self.window.local_storage().set_item(key, value);
///     }
///     fn remove(&self, key: &str) {
///         self.window.local_storage().remove_item(key);
///     }
/// }
/// ```
pub trait StorageBackend: Send + Sync + 'static {
    fn read(&self, key: &str) -> Option<String>;
    fn write(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-memory [`StorageBackend`]. The default backend and the test backend.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl StorageBackend for MemoryStorage {
    fn read(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .expect("storage lock poisoned")
            .get(key)
            .cloned()
    }

    fn write(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .expect("storage lock poisoned")
            .insert(key.to_owned(), value.to_owned());
    }

    fn remove(&self, key: &str) {
        self.entries
            .lock()
            .expect("storage lock poisoned")
            .remove(key);
    }
}

/// Cached my-status result, kept next to the credential for display purposes.
///
/// Display-only: navigation-critical gating re-fetches the status in the same
/// decision cycle instead of trusting this cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedStatus {
    pub role: UserRole,
    pub has_company: bool,
}

/// The single shared mutable resource of the session layer.
///
/// Wraps a [`StorageBackend`] and owns the four persisted fields. Constructed
/// once per process and passed by clone — cheap, all clones share state.
/// Multi-key operations hold a lock across the backend so no concurrent
/// reader observes a half-written credential pair or a partially cleared
/// session.
#[derive(Clone)]
pub struct SessionStore {
    backend: Arc<RwLock<Box<dyn StorageBackend>>>,
}

impl SessionStore {
    #[must_use]
    pub fn new(backend: impl StorageBackend) -> Self {
        Self {
            backend: Arc::new(RwLock::new(Box::new(backend))),
        }
    }

    /// Store over a fresh [`MemoryStorage`].
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::default())
    }

    /// The stored credential, or `None` when absent.
    ///
    /// A partial pair (one token only — interrupted write, manual storage
    /// edit) also reads as `None`: the validator and interceptor treat it as
    /// "not authenticated" rather than working with half a credential.
    #[must_use]
    pub fn credential(&self) -> Option<Credential> {
        let backend = self.backend.read().expect("session store lock poisoned");
        let access = backend.read(ACCESS_TOKEN_KEY)?;
        let refresh = backend.read(REFRESH_TOKEN_KEY)?;
        Some(Credential::new(access, refresh))
    }

    /// Replace the stored credential pair.
    ///
    /// Also drops the cached status: it was derived under the previous
    /// credential and must be re-fetched before it is trusted again.
    pub fn set_credential(&self, credential: &Credential) {
        let backend = self.backend.write().expect("session store lock poisoned");
        backend.write(ACCESS_TOKEN_KEY, &credential.access);
        backend.write(REFRESH_TOKEN_KEY, &credential.refresh);
        backend.remove(USER_ROLE_KEY);
        backend.remove(HAS_COMPANY_KEY);
    }

    /// Remove all four fields. Atomic from a reader's point of view;
    /// idempotent.
    pub fn clear(&self) {
        let backend = self.backend.write().expect("session store lock poisoned");
        backend.remove(ACCESS_TOKEN_KEY);
        backend.remove(REFRESH_TOKEN_KEY);
        backend.remove(USER_ROLE_KEY);
        backend.remove(HAS_COMPANY_KEY);
    }

    #[must_use]
    pub fn cached_status(&self) -> Option<CachedStatus> {
        let backend = self.backend.read().expect("session store lock poisoned");
        let role = backend.read(USER_ROLE_KEY)?;
        let has_company = backend.read(HAS_COMPANY_KEY)?;
        Some(CachedStatus {
            role: UserRole::normalize(&role),
            has_company: has_company == "true",
        })
    }

    pub fn set_cached_status(&self, role: UserRole, has_company: bool) {
        let backend = self.backend.write().expect("session store lock poisoned");
        backend.write(USER_ROLE_KEY, role.as_str());
        backend.write(HAS_COMPANY_KEY, if has_company { "true" } else { "false" });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_roundtrip() {
        let store = SessionStore::in_memory();
        assert!(store.credential().is_none());

        let cred = Credential::new("acc", "ref");
        store.set_credential(&cred);
        assert_eq!(store.credential(), Some(cred));
    }

    #[test]
    fn partial_pair_reads_as_absent() {
        let backend = MemoryStorage::default();
        backend.write(ACCESS_TOKEN_KEY, "acc-only");
        let store = SessionStore::new(backend);
        assert!(store.credential().is_none());

        let backend = MemoryStorage::default();
        backend.write(REFRESH_TOKEN_KEY, "ref-only");
        let store = SessionStore::new(backend);
        assert!(store.credential().is_none());
    }

    #[test]
    fn clear_removes_all_four_fields() {
        let store = SessionStore::in_memory();
        store.set_credential(&Credential::new("acc", "ref"));
        store.set_cached_status(UserRole::Seller, true);

        store.clear();

        assert!(store.credential().is_none());
        assert!(store.cached_status().is_none());
    }

    #[test]
    fn clear_is_idempotent() {
        let store = SessionStore::in_memory();
        store.clear();
        store.clear();
        assert!(store.credential().is_none());
    }

    #[test]
    fn cached_status_roundtrip() {
        let store = SessionStore::in_memory();
        assert!(store.cached_status().is_none());

        store.set_cached_status(UserRole::Buyer, false);
        assert_eq!(
            store.cached_status(),
            Some(CachedStatus {
                role: UserRole::Buyer,
                has_company: false,
            })
        );
    }

    #[test]
    fn new_credential_invalidates_cached_status() {
        let store = SessionStore::in_memory();
        store.set_credential(&Credential::new("a1", "r1"));
        store.set_cached_status(UserRole::Seller, true);

        store.set_credential(&Credential::new("a2", "r2"));
        assert!(store.cached_status().is_none());
    }

    #[test]
    fn clones_share_state() {
        let store = SessionStore::in_memory();
        let clone = store.clone();
        store.set_credential(&Credential::new("acc", "ref"));
        assert!(clone.credential().is_some());
        clone.clear();
        assert!(store.credential().is_none());
    }
}
