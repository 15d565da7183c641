//! Route Guard
//!
//! Runs before every handler. Decodes the httpOnly session cookie, decides
//! whether the request is authenticated, and turns away requests for
//! protected paths that are not. No network I/O happens here: the outcome
//! depends only on the cookie, the clock and the path.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar};

use crate::application::config::AuthConfig;
use crate::application::session_manager::{SessionManager, now_ms};
use crate::domain::codec::SessionCodec;
use crate::domain::session::Session;
use crate::presentation::extractor::CurrentSession;

/// Per-request authentication state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Unauthenticated,
    Authenticated,
    Expired,
}

/// Result of inspecting the session cookie
#[derive(Debug, Clone)]
pub struct GuardOutcome {
    pub state: GuardState,
    /// Present only when `state` is `Authenticated`
    pub session: Option<Session>,
    /// The stored cookie is unusable and should be deleted
    pub clear_cookie: bool,
}

/// Decide the request's state from the raw session cookie value
pub fn resolve_session(raw: Option<&str>, now_ms: i64) -> GuardOutcome {
    let Some(raw) = raw else {
        return GuardOutcome {
            state: GuardState::Unauthenticated,
            session: None,
            clear_cookie: false,
        };
    };

    let session = match SessionCodec::decode(raw) {
        Ok(session) => session,
        Err(e) => {
            tracing::debug!(error = %e, "Discarding undecodable session cookie");
            return GuardOutcome {
                state: GuardState::Unauthenticated,
                session: None,
                clear_cookie: true,
            };
        }
    };

    if !SessionManager::is_valid_at(Some(&session), now_ms) {
        tracing::debug!(sub = %session.sub(), expires_at = session.expires_at(), "Session expired");
        return GuardOutcome {
            state: GuardState::Expired,
            session: None,
            clear_cookie: true,
        };
    }

    GuardOutcome {
        state: GuardState::Authenticated,
        session: Some(session),
        clear_cookie: false,
    }
}

/// `prefix` matches `path` on a segment boundary
fn matches_prefix(prefix: &str, path: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Middleware state
#[derive(Clone)]
pub struct RouteGuard {
    config: Arc<AuthConfig>,
}

impl RouteGuard {
    pub fn new(config: Arc<AuthConfig>) -> Self {
        Self { config }
    }

    pub fn is_protected(&self, path: &str) -> bool {
        self.config
            .protected_routes
            .iter()
            .any(|prefix| matches_prefix(prefix, path))
    }

    /// Removals for the session and marker cookies, minus any the response
    /// already sets. A handler that issues a fresh session wins.
    fn removal_jar(&self, already_set: &[String]) -> CookieJar {
        let secure = self.config.cookie_secure;
        [
            self.config.session_cookie(secure).removal(),
            self.config.marker_cookie(secure).removal(),
        ]
        .into_iter()
        .filter(|cookie| !already_set.iter().any(|name| name == cookie.name()))
        .fold(CookieJar::new(), |jar, cookie| jar.add(cookie))
    }
}

/// Guard middleware, for `axum::middleware::from_fn_with_state`
pub async fn route_guard(
    State(guard): State<RouteGuard>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let raw = jar
        .get(&guard.config.session_cookie_name)
        .map(|cookie| cookie.value().to_string());
    let outcome = resolve_session(raw.as_deref(), now_ms());

    if outcome.state != GuardState::Authenticated && guard.is_protected(req.uri().path()) {
        tracing::debug!(
            path = %req.uri().path(),
            state = ?outcome.state,
            "Blocked unauthenticated request"
        );
        let clear = outcome.clear_cookie.then(|| guard.removal_jar(&[]));
        let redirect = Redirect::to(&guard.config.unauthenticated_redirect);
        return (clear, redirect).into_response();
    }

    req.extensions_mut().insert(CurrentSession(outcome.session));
    let response = next.run(req).await;

    let clear = outcome
        .clear_cookie
        .then(|| guard.removal_jar(&set_cookie_names(&response)));
    (clear, response).into_response()
}

/// Names of the cookies a response sets or removes
fn set_cookie_names(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| Cookie::parse_encoded(value).ok())
        .map(|cookie| cookie.name().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::fixtures;

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn test_resolve_no_cookie() {
        let outcome = resolve_session(None, NOW);
        assert_eq!(outcome.state, GuardState::Unauthenticated);
        assert!(!outcome.clear_cookie);
    }

    #[test]
    fn test_resolve_garbage_cookie() {
        for raw in ["not json", "{}", r#"{"accessToken":""}"#] {
            let outcome = resolve_session(Some(raw), NOW);
            assert_eq!(outcome.state, GuardState::Unauthenticated);
            assert!(outcome.clear_cookie);
            assert!(outcome.session.is_none());
        }
    }

    #[test]
    fn test_resolve_expiry_boundary() {
        let raw = SessionCodec::encode(&fixtures::session(NOW - 1000, NOW)).unwrap();

        let before = resolve_session(Some(&raw), NOW - 1);
        assert_eq!(before.state, GuardState::Authenticated);
        assert!(before.session.is_some());

        let at = resolve_session(Some(&raw), NOW);
        assert_eq!(at.state, GuardState::Expired);
        assert!(at.clear_cookie);
        assert!(at.session.is_none());
    }

    #[test]
    fn test_prefix_matching() {
        assert!(matches_prefix("/services", "/services"));
        assert!(matches_prefix("/services", "/services/"));
        assert!(matches_prefix("/services", "/services/grafana"));
        assert!(matches_prefix("/services/", "/services/grafana"));
        assert!(!matches_prefix("/services", "/servicesx"));
        assert!(!matches_prefix("/services", "/"));
        assert!(!matches_prefix("/services", "/api/services"));
    }

    #[test]
    fn test_is_protected_uses_config() {
        let config = AuthConfig::development().with_protected_routes(["/services", "/api/cdn"]);
        let guard = RouteGuard::new(Arc::new(config));
        assert!(guard.is_protected("/api/cdn/docs/a.pdf"));
        assert!(guard.is_protected("/services"));
        assert!(!guard.is_protected("/api/auth/login"));
    }
}
