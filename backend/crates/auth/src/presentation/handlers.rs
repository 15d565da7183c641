//! HTTP Handlers

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::{Html, IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use platform::cookie::{MAX_COOKIE_BYTES, encoded_len};

use crate::application::config::AuthConfig;
use crate::application::{
    BeginLoginUseCase, ClientStores, CompleteLoginInput, CompleteLoginUseCase,
    RefreshSessionUseCase, RelayCallbackUseCase, SignOutUseCase,
};
use crate::domain::codec::SessionCodec;
use crate::domain::provider::IdentityProvider;
use crate::domain::session::Session;
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    CompleteRequest, CompleteResponse, RefreshResponse, SessionStatusResponse,
};
use crate::presentation::extractor::{CurrentSession, RequireSession};
use crate::presentation::pages::{self, CallbackData, with_error};

/// Shared state for auth handlers
pub struct AuthAppState<P> {
    pub provider: Arc<P>,
    pub config: Arc<AuthConfig>,
}

impl<P> Clone for AuthAppState<P> {
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
            config: self.config.clone(),
        }
    }
}

// ============================================================================
// Login
// ============================================================================

/// GET /api/auth/login
pub async fn login<P>(
    State(state): State<AuthAppState<P>>,
    jar: CookieJar,
) -> AuthResult<impl IntoResponse>
where
    P: IdentityProvider + Send + Sync + 'static,
{
    let stores = ClientStores::new(jar, state.config.cookie_secure);
    let use_case = BeginLoginUseCase::new(state.provider.clone(), state.config.clone());

    let output = use_case.execute(&stores.store()).await?;

    let (jar, ops) = stores.finish();
    let page = pages::login_page(&ops, output.authorization_url.as_str())?;
    Ok((jar, Html(page)))
}

// ============================================================================
// Callback
// ============================================================================

/// GET /api/auth/callback
///
/// Never talks to the provider; the page posts to `/complete`.
pub async fn callback<P>(
    State(state): State<AuthAppState<P>>,
    jar: CookieJar,
) -> AuthResult<impl IntoResponse>
where
    P: IdentityProvider + Send + Sync + 'static,
{
    let stores = ClientStores::new(jar, state.config.cookie_secure);
    let pkce = RelayCallbackUseCase::execute(&stores.store());
    let (jar, ops) = stores.finish();

    let home = &state.config.unauthenticated_redirect;
    let page = pages::callback_page(&CallbackData {
        code_verifier: pkce.as_ref().map(|p| p.code_verifier.as_str()),
        expected_state: pkce.as_ref().map(|p| p.state.as_str()),
        ops: &ops,
        success_url: &state.config.post_login_redirect,
        missing_pkce_url: with_error(home, "missing_pkce"),
        failure_url: with_error(home, "auth_failed"),
    })?;

    Ok((jar, Html(page)))
}

// ============================================================================
// Complete
// ============================================================================

/// POST /api/auth/complete
pub async fn complete<P>(
    State(state): State<AuthAppState<P>>,
    jar: CookieJar,
    body: Result<Json<CompleteRequest>, JsonRejection>,
) -> AuthResult<impl IntoResponse>
where
    P: IdentityProvider + Send + Sync + 'static,
{
    let Json(req) = body.map_err(|e| AuthError::InvalidBody(e.body_text()))?;

    let (callback_url, code_verifier, expected_state) =
        match (req.callback_url, req.code_verifier, req.expected_state) {
            (Some(url), Some(verifier), Some(state))
                if !url.is_empty() && !verifier.is_empty() && !state.is_empty() =>
            {
                (url, verifier, state)
            }
            _ => return Err(AuthError::MissingParameters),
        };

    let use_case = CompleteLoginUseCase::new(state.provider.clone());
    let output = use_case
        .execute(CompleteLoginInput {
            callback_url,
            code_verifier,
            expected_state,
        })
        .await?;

    let jar = set_session_cookies(jar, &state.config, &output.session, output.secure)?;

    Ok((
        jar,
        Json(CompleteResponse {
            success: true,
            session: state.config.echo_session.then_some(output.session),
        }),
    ))
}

// ============================================================================
// Logout
// ============================================================================

/// GET /api/auth/logout
pub async fn logout<P>(
    State(state): State<AuthAppState<P>>,
    jar: CookieJar,
) -> AuthResult<impl IntoResponse>
where
    P: IdentityProvider + Send + Sync + 'static,
{
    // Expired sessions still get their tokens revoked
    let session = jar
        .get(&state.config.session_cookie_name)
        .and_then(|cookie| SessionCodec::decode(cookie.value()).ok());

    let stores = ClientStores::new(jar, state.config.cookie_secure);
    let use_case = SignOutUseCase::new(state.provider.clone());
    use_case.execute(session.as_ref(), &stores.store()).await;

    let (jar, ops) = stores.finish();
    let jar = clear_session_cookies(jar, &state.config);

    let page = pages::logout_page(&ops, &state.config.unauthenticated_redirect)?;
    Ok((jar, Html(page)))
}

// ============================================================================
// Session Status
// ============================================================================

/// GET /api/auth/session
pub async fn session_status(CurrentSession(session): CurrentSession) -> Json<SessionStatusResponse> {
    Json(SessionStatusResponse::from_session(session.as_ref()))
}

// ============================================================================
// Refresh
// ============================================================================

/// POST /api/auth/refresh
pub async fn refresh<P>(
    State(state): State<AuthAppState<P>>,
    jar: CookieJar,
    RequireSession(session): RequireSession,
) -> Response
where
    P: IdentityProvider + Send + Sync + 'static,
{
    let use_case = RefreshSessionUseCase::new(state.provider.clone());

    let renewed = match use_case.execute(&session).await {
        Ok(renewed) => renewed,
        Err(e) => return (clear_session_cookies(jar, &state.config), e).into_response(),
    };

    match set_session_cookies(jar, &state.config, &renewed, state.config.cookie_secure) {
        Ok(jar) => (
            jar,
            Json(RefreshResponse {
                success: true,
                expires_at: renewed.expires_at(),
            }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

// ============================================================================
// User Info
// ============================================================================

/// GET /api/auth/userinfo
pub async fn userinfo<P>(
    State(state): State<AuthAppState<P>>,
    RequireSession(session): RequireSession,
) -> AuthResult<impl IntoResponse>
where
    P: IdentityProvider + Send + Sync + 'static,
{
    let info = state.provider.fetch_user_info(session.access_token()).await?;
    Ok(Json(info))
}

// ============================================================================
// Helper Functions
// ============================================================================

fn set_session_cookies(
    jar: CookieJar,
    config: &AuthConfig,
    session: &Session,
    secure: bool,
) -> AuthResult<CookieJar> {
    let cookie = config.session_cookie(secure).build(SessionCodec::encode(session)?);

    let size = encoded_len(&cookie);
    if size > MAX_COOKIE_BYTES {
        tracing::warn!(size, limit = MAX_COOKIE_BYTES, "Session cookie exceeds browser limit");
    }

    Ok(jar
        .add(cookie)
        .add(config.marker_cookie(secure).build("true")))
}

fn clear_session_cookies(jar: CookieJar, config: &AuthConfig) -> CookieJar {
    let secure = config.cookie_secure;
    jar.add(config.session_cookie(secure).removal())
        .add(config.marker_cookie(secure).removal())
}
