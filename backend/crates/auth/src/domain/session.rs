//! Session Entity
//!
//! An authenticated user's standing with the portal. Sessions are immutable:
//! a refresh builds a new one.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};

/// Identity claims carried by a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Everything needed to build a [`Session`]
#[derive(Debug, Clone)]
pub struct SessionDraft {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub id_token: String,
    /// Epoch milliseconds
    pub expires_at: i64,
    pub user: SessionUser,
    pub groups: BTreeSet<String>,
}

/// Session entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    id_token: String,
    expires_at: i64,
    user: SessionUser,
    #[serde(default)]
    groups: BTreeSet<String>,
}

impl Session {
    /// Build a session, enforcing that it is still valid at `now_ms`
    pub fn new(draft: SessionDraft, now_ms: i64) -> AuthResult<Self> {
        if draft.expires_at <= now_ms {
            return Err(AuthError::MalformedSession(format!(
                "expiresAt {} is not after creation time {}",
                draft.expires_at, now_ms
            )));
        }

        let session = Self {
            access_token: draft.access_token,
            refresh_token: draft.refresh_token,
            id_token: draft.id_token,
            expires_at: draft.expires_at,
            user: draft.user,
            groups: draft.groups,
        };
        session.check_integrity()?;
        Ok(session)
    }

    /// Structural invariants that hold regardless of time
    pub(crate) fn check_integrity(&self) -> AuthResult<()> {
        if self.user.sub.is_empty() {
            return Err(AuthError::MalformedSession("empty subject".into()));
        }
        if self.access_token.is_empty() {
            return Err(AuthError::MalformedSession("empty access token".into()));
        }
        if self.id_token.is_empty() {
            return Err(AuthError::MalformedSession("empty ID token".into()));
        }
        Ok(())
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    pub fn id_token(&self) -> &str {
        &self.id_token
    }

    /// Absolute deadline in epoch milliseconds
    pub fn expires_at(&self) -> i64 {
        self.expires_at
    }

    pub fn user(&self) -> &SessionUser {
        &self.user
    }

    pub fn sub(&self) -> &str {
        &self.user.sub
    }

    pub fn groups(&self) -> &BTreeSet<String> {
        &self.groups
    }

    pub fn group_list(&self) -> Vec<String> {
        self.groups.iter().cloned().collect()
    }
}
