//! Error classes

use std::fmt;

use serde::Serialize;

/// Coarse error class. Each one answers with exactly one HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    InternalServerError,
    /// The identity provider or another upstream failed us
    BadGateway,
}

impl ErrorKind {
    pub const fn status_code(self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::Unauthorized => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::InternalServerError => 500,
            ErrorKind::BadGateway => 502,
        }
    }

    /// What the client is told when nothing more specific applies
    pub const fn public_message(self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "Bad request",
            ErrorKind::Unauthorized => "Authentication required",
            ErrorKind::Forbidden => "Access denied",
            ErrorKind::NotFound => "Not found",
            ErrorKind::InternalServerError => "Internal server error",
            ErrorKind::BadGateway => "Upstream service failed",
        }
    }

    pub const fn is_server_error(self) -> bool {
        self.status_code() >= 500
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status_code(), self.public_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let codes: Vec<_> = [
            ErrorKind::BadRequest,
            ErrorKind::Unauthorized,
            ErrorKind::Forbidden,
            ErrorKind::NotFound,
            ErrorKind::InternalServerError,
            ErrorKind::BadGateway,
        ]
        .into_iter()
        .map(ErrorKind::status_code)
        .collect();
        assert_eq!(codes, vec![400, 401, 403, 404, 500, 502]);
    }

    #[test]
    fn test_server_errors() {
        assert!(ErrorKind::BadGateway.is_server_error());
        assert!(!ErrorKind::Unauthorized.is_server_error());
        assert_eq!(ErrorKind::Forbidden.to_string(), "403 Access denied");
    }
}
