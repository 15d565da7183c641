//! Session extractors
//!
//! The route guard decodes the session cookie once per request and leaves
//! the result in the request extensions. Handlers read it from there.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::domain::session::Session;
use crate::error::AuthError;

/// The request's valid session, if any. Also the extension type the guard
/// inserts.
#[derive(Debug, Clone, Default)]
pub struct CurrentSession(pub Option<Session>);

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<CurrentSession>()
            .cloned()
            .unwrap_or_default())
    }
}

/// A valid session, or 401
#[derive(Debug, Clone)]
pub struct RequireSession(pub Session);

impl<S> FromRequestParts<S> for RequireSession
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentSession>()
            .and_then(|current| current.0.clone())
            .map(RequireSession)
            .ok_or(AuthError::SessionRequired)
    }
}
