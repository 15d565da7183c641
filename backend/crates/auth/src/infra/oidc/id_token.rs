//! ID token signature and claim checks

use jsonwebtoken::{Algorithm, DecodingKey, Header, Validation};

use crate::error::{AuthError, AuthResult};

/// Expected audience and issuer for ID tokens
pub struct IdTokenExpectations<'a> {
    pub client_id: &'a str,
    pub issuer: &'a str,
    pub leeway_secs: u64,
}

pub fn decode_header(id_token: &str) -> AuthResult<Header> {
    jsonwebtoken::decode_header(id_token)
        .map_err(|e| AuthError::IdTokenRejected(format!("header: {e}")))
}

/// HS* tokens are keyed by the client secret instead of the JWKS
pub fn is_symmetric(alg: Algorithm) -> bool {
    matches!(alg, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)
}

/// Verify signature, `aud`, `iss` and `exp`
pub fn verify(
    id_token: &str,
    alg: Algorithm,
    key: &DecodingKey,
    expected: &IdTokenExpectations<'_>,
) -> AuthResult<()> {
    let mut validation = Validation::new(alg);
    validation.set_audience(&[expected.client_id]);
    let trimmed = expected.issuer.trim_end_matches('/');
    validation.set_issuer(&[expected.issuer, trimmed]);
    validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
    validation.leeway = expected.leeway_secs;

    jsonwebtoken::decode::<serde_json::Value>(id_token, key, &validation)
        .map(|_| ())
        .map_err(|e| AuthError::IdTokenRejected(e.to_string()))
}
