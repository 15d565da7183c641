//! Session Codec
//!
//! JSON string form of a [`Session`], as stored in cookies and client stores.

use super::session::Session;
use crate::error::{AuthError, AuthResult};

pub struct SessionCodec;

impl SessionCodec {
    pub fn encode(session: &Session) -> AuthResult<String> {
        serde_json::to_string(session)
            .map_err(|e| AuthError::Internal(format!("session serialization: {e}")))
    }

    /// Parse a stored session. Expired sessions decode fine, expiry is the
    /// caller's decision.
    pub fn decode(raw: &str) -> AuthResult<Session> {
        let session: Session =
            serde_json::from_str(raw).map_err(|e| AuthError::MalformedSession(e.to_string()))?;
        session.check_integrity()?;
        Ok(session)
    }
}
