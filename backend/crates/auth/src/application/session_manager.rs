//! Session Manager
//!
//! Builds sessions from token responses and owns the one expiry predicate
//! every trust decision goes through.

use chrono::Utc;

use crate::domain::session::{Session, SessionDraft, SessionUser};
use crate::domain::token::{IdTokenClaims, TokenResponse};
use crate::error::{AuthError, AuthResult};

/// Lifetime assumed when the provider omits `expires_in`
pub const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// Current time in epoch milliseconds
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

pub struct SessionManager;

impl SessionManager {
    pub fn create_session(tokens: &TokenResponse) -> AuthResult<Session> {
        Self::create_session_at(tokens, now_ms())
    }

    /// Build a session from a validated token response
    pub fn create_session_at(tokens: &TokenResponse, now_ms: i64) -> AuthResult<Session> {
        let id_token = tokens
            .id_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingIdToken)?;
        let claims = IdTokenClaims::decode_payload(id_token)?;

        Session::new(
            SessionDraft {
                access_token: tokens.access_token.clone(),
                refresh_token: tokens.refresh_token.clone(),
                id_token: id_token.to_string(),
                expires_at: expires_at(tokens, now_ms),
                user: SessionUser {
                    sub: claims.sub,
                    email: claims.email,
                    name: claims.name,
                },
                groups: claims.groups.into_iter().collect(),
            },
            now_ms,
        )
    }

    pub fn renew_session(previous: &Session, tokens: &TokenResponse) -> AuthResult<Session> {
        Self::renew_session_at(previous, tokens, now_ms())
    }

    /// Session from a refresh response. Providers may omit the ID token and
    /// the refresh token on refresh; the previous ones carry over.
    pub fn renew_session_at(
        previous: &Session,
        tokens: &TokenResponse,
        now_ms: i64,
    ) -> AuthResult<Session> {
        if tokens.id_token.as_deref().is_some_and(|t| !t.is_empty()) {
            let mut tokens = tokens.clone();
            if tokens.refresh_token.is_none() {
                tokens.refresh_token = previous.refresh_token().map(str::to_string);
            }
            return Self::create_session_at(&tokens, now_ms);
        }

        Session::new(
            SessionDraft {
                access_token: tokens.access_token.clone(),
                refresh_token: tokens
                    .refresh_token
                    .clone()
                    .or_else(|| previous.refresh_token().map(str::to_string)),
                id_token: previous.id_token().to_string(),
                expires_at: expires_at(tokens, now_ms),
                user: previous.user().clone(),
                groups: previous.groups().clone(),
            },
            now_ms,
        )
    }

    pub fn is_valid(session: Option<&Session>) -> bool {
        Self::is_valid_at(session, now_ms())
    }

    /// `now < expiresAt`; the boundary itself is already expired
    pub fn is_valid_at(session: Option<&Session>, now_ms: i64) -> bool {
        session.is_some_and(|s| now_ms < s.expires_at())
    }
}

fn expires_at(tokens: &TokenResponse, now_ms: i64) -> i64 {
    let expires_in = tokens.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
    now_ms.saturating_add(expires_in.saturating_mul(1000))
}
