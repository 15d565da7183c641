//! API DTOs (Data Transfer Objects)

use serde::{Deserialize, Serialize};

use crate::domain::session::{Session, SessionUser};

// ============================================================================
// Complete
// ============================================================================

/// Code exchange request posted by the callback page.
///
/// Fields are optional so a missing one maps to 400 rather than a
/// deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteRequest {
    pub callback_url: Option<String>,
    pub code_verifier: Option<String>,
    pub expected_state: Option<String>,
}

/// Code exchange response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteResponse {
    pub success: bool,
    /// Convenience copy for client storage, never trusted by the server
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<Session>,
}

// ============================================================================
// Session Status
// ============================================================================

/// Session status response. Never carries tokens.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<SessionUser>,
    pub groups: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

impl SessionStatusResponse {
    pub fn from_session(session: Option<&Session>) -> Self {
        match session {
            Some(session) => Self {
                authenticated: true,
                user: Some(session.user().clone()),
                groups: session.group_list(),
                expires_at: Some(session.expires_at()),
            },
            None => Self {
                authenticated: false,
                user: None,
                groups: Vec::new(),
                expires_at: None,
            },
        }
    }
}

// ============================================================================
// Refresh
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub success: bool,
    pub expires_at: i64,
}
