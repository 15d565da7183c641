//! OpenID Connect provider integration

pub mod client;
pub mod discovery;
pub mod id_token;
pub mod jwks;

pub use client::OidcClient;
pub use discovery::{Discovery, ProviderMetadata};
pub use jwks::JwksCache;
