//! Auth Router

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use crate::application::config::AuthConfig;
use crate::domain::provider::IdentityProvider;
use crate::presentation::handlers::{self, AuthAppState};

/// Auth routes, to be nested under `/api/auth`.
///
/// Handlers read the session left by [`route_guard`](super::middleware::route_guard),
/// so the guard must wrap the application this router is mounted in.
pub fn auth_router<P>(provider: Arc<P>, config: Arc<AuthConfig>) -> Router
where
    P: IdentityProvider + Send + Sync + 'static,
{
    let state = AuthAppState { provider, config };

    Router::new()
        .route("/login", get(handlers::login::<P>))
        .route("/callback", get(handlers::callback::<P>))
        .route("/complete", post(handlers::complete::<P>))
        .route("/logout", get(handlers::logout::<P>))
        .route("/session", get(handlers::session_status))
        .route("/refresh", post(handlers::refresh::<P>))
        .route("/userinfo", get(handlers::userinfo::<P>))
        .with_state(state)
}
