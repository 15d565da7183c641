//! Relay Callback Use Case
//!
//! Retrieves the PKCE pair stored at login and discards it. Single use,
//! whether or not anything was found.

use platform::storage::RobustStore;

use crate::application::client_store::{clear_pkce, load_pkce};
use crate::domain::pkce::PkceTransaction;

pub struct RelayCallbackUseCase;

impl RelayCallbackUseCase {
    /// `None` when the server-visible media lost the pair; the page then
    /// falls back to the browser stores.
    pub fn execute(store: &RobustStore) -> Option<PkceTransaction> {
        let pkce = load_pkce(store);
        clear_pkce(store);

        if pkce.is_none() {
            tracing::debug!("PKCE not visible server-side, relaying to client stores");
        }
        pkce
    }
}
