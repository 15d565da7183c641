//! Domain Layer
//!
//! Contains the session entity, PKCE, token payloads and the identity
//! provider trait.

pub mod codec;
pub mod pkce;
pub mod provider;
pub mod session;
pub mod token;

// Re-exports
pub use codec::SessionCodec;
pub use pkce::{Pkce, PkceTransaction, authorization_code, generate_state};
pub use provider::IdentityProvider;
pub use session::{Session, SessionDraft, SessionUser};
pub use token::{IdTokenClaims, TokenResponse, TokenTypeHint, UserInfo};
