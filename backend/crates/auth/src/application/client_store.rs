//! Browser-side storage for one request
//!
//! Wires the three media the browser offers into a [`RobustStore`]: the
//! cookie jar (seen by the server), plus `sessionStorage` and
//! `localStorage`, whose writes are deferred to the page script.

use std::sync::Arc;

use axum_extra::extract::cookie::CookieJar;
use platform::storage::{
    ClientStorageOp, CookieBackend, DeferredBackend, RobustStore, StorageBackend, collect_ops,
};

use crate::domain::pkce::PkceTransaction;

pub const PKCE_VERIFIER_KEY: &str = "pkce_code_verifier";
pub const PKCE_STATE_KEY: &str = "pkce_state";
/// Convenience copy of the session, UI personalization only
pub const SESSION_COPY_KEY: &str = "portal_session";

pub struct ClientStores {
    session_storage: Arc<DeferredBackend>,
    local_storage: Arc<DeferredBackend>,
    cookies: Arc<CookieBackend>,
}

impl ClientStores {
    pub fn new(jar: CookieJar, secure: bool) -> Self {
        Self {
            session_storage: Arc::new(DeferredBackend::session_storage()),
            local_storage: Arc::new(DeferredBackend::local_storage()),
            cookies: Arc::new(CookieBackend::new(jar, secure)),
        }
    }

    pub fn store(&self) -> RobustStore {
        let backends: Vec<Box<dyn StorageBackend>> = vec![
            Box::new(self.session_storage.clone()),
            Box::new(self.local_storage.clone()),
            Box::new(self.cookies.clone()),
        ];
        RobustStore::new(backends)
    }

    /// Cookie jar to send back and the client-store ops for the page script
    pub fn finish(self) -> (CookieJar, Vec<ClientStorageOp>) {
        let ops = collect_ops([&*self.session_storage, &*self.local_storage]);
        (self.cookies.jar(), ops)
    }
}

/// Read the PKCE pair back from whichever medium still has it
pub fn load_pkce(store: &RobustStore) -> Option<PkceTransaction> {
    let code_verifier = store.get(PKCE_VERIFIER_KEY).filter(|v| !v.is_empty())?;
    let state = store.get(PKCE_STATE_KEY).filter(|v| !v.is_empty())?;
    Some(PkceTransaction {
        code_verifier,
        state,
    })
}

/// Drop PKCE material from every medium
pub fn clear_pkce(store: &RobustStore) {
    store.remove(PKCE_VERIFIER_KEY);
    store.remove(PKCE_STATE_KEY);
}
