//! PKCE (RFC 7636) and callback state binding

use platform::crypto::{constant_time_eq, random_token, sha256, to_base64url};
use url::Url;

use crate::error::{AuthError, AuthResult};

/// Verifier entropy in bytes (43 base64url characters)
const VERIFIER_BYTES: usize = 32;
/// State entropy in bytes
const STATE_BYTES: usize = 16;

/// Verifier/challenge pair for the S256 method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pkce {
    code_verifier: String,
    code_challenge: String,
}

impl Pkce {
    pub const METHOD: &'static str = "S256";

    pub fn generate() -> Self {
        Self::from_verifier(random_token(VERIFIER_BYTES))
    }

    pub fn from_verifier(code_verifier: String) -> Self {
        let code_challenge = challenge_for(&code_verifier);
        Self {
            code_verifier,
            code_challenge,
        }
    }

    pub fn code_verifier(&self) -> &str {
        &self.code_verifier
    }

    pub fn code_challenge(&self) -> &str {
        &self.code_challenge
    }
}

/// base64url(SHA-256(verifier))
pub fn challenge_for(code_verifier: &str) -> String {
    to_base64url(&sha256(code_verifier.as_bytes()))
}

/// Random anti-CSRF token
pub fn generate_state() -> String {
    random_token(STATE_BYTES)
}

/// PKCE material persisted across the provider round trip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkceTransaction {
    pub code_verifier: String,
    pub state: String,
}

/// Check the callback against the stored state and pull out the code.
///
/// Runs before any network call, so a forged callback never reaches the
/// provider.
pub fn authorization_code(callback_url: &Url, expected_state: &str) -> AuthResult<String> {
    let mut state = None;
    let mut code = None;
    let mut error = None;
    let mut error_description = None;

    for (key, value) in callback_url.query_pairs() {
        match key.as_ref() {
            "state" => state = Some(value.into_owned()),
            "code" => code = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            "error_description" => error_description = Some(value.into_owned()),
            _ => {}
        }
    }

    match state {
        Some(state) if constant_time_eq(state.as_bytes(), expected_state.as_bytes()) => {}
        _ => return Err(AuthError::StateMismatch),
    }

    if let Some(error) = error {
        return Err(AuthError::TokenExchangeFailed(match error_description {
            Some(description) => format!("{error}: {description}"),
            None => error,
        }));
    }

    code.filter(|c| !c.is_empty())
        .ok_or_else(|| AuthError::TokenExchangeFailed("callback carried no code".into()))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_rfc7636_appendix_b_vector() {
        let pkce = Pkce::from_verifier("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk".into());
        assert_eq!(
            pkce.code_challenge(),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn test_challenge_is_pure_function_of_verifier() {
        let pkce = Pkce::generate();
        assert_eq!(challenge_for(pkce.code_verifier()), pkce.code_challenge());
    }

    #[test]
    fn test_verifiers_are_distinct() {
        let verifiers: HashSet<String> = (0..500)
            .map(|_| Pkce::generate().code_verifier().to_string())
            .collect();
        assert_eq!(verifiers.len(), 500);
    }

    #[test]
    fn test_lengths() {
        assert_eq!(Pkce::generate().code_verifier().len(), 43);
        assert_eq!(generate_state().len(), 22);
    }

    fn callback(query: &str) -> Url {
        Url::parse(&format!("https://portal.example/api/auth/callback?{query}")).unwrap()
    }

    #[test]
    fn test_matching_state_yields_code() {
        let code = authorization_code(&callback("code=abc&state=s1"), "s1").unwrap();
        assert_eq!(code, "abc");
    }

    #[test]
    fn test_state_mismatch_for_distinct_states() {
        for (actual, expected) in [("a", "b"), ("s1", "s2"), ("abc", "ab"), ("", "x")] {
            let url = callback(&format!("code=abc&state={actual}"));
            assert!(matches!(
                authorization_code(&url, expected),
                Err(AuthError::StateMismatch)
            ));
        }
        assert!(matches!(
            authorization_code(&callback("code=abc"), "s1"),
            Err(AuthError::StateMismatch)
        ));
    }

    #[test]
    fn test_provider_error_is_exchange_failure() {
        let url = callback("error=access_denied&error_description=nope&state=s1");
        match authorization_code(&url, "s1") {
            Err(AuthError::TokenExchangeFailed(msg)) => assert_eq!(msg, "access_denied: nope"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_missing_code() {
        assert!(matches!(
            authorization_code(&callback("state=s1"), "s1"),
            Err(AuthError::TokenExchangeFailed(_))
        ));
    }
}
