//! Application Layer
//!
//! Use cases and application services.

pub mod begin_login;
pub mod client_store;
pub mod complete_login;
pub mod config;
pub mod refresh_session;
pub mod relay_callback;
pub mod session_manager;
pub mod sign_out;

// Re-exports
pub use begin_login::{BeginLoginOutput, BeginLoginUseCase};
pub use client_store::ClientStores;
pub use complete_login::{CompleteLoginInput, CompleteLoginOutput, CompleteLoginUseCase};
pub use config::{AuthConfig, OidcConfig};
pub use refresh_session::RefreshSessionUseCase;
pub use relay_callback::RelayCallbackUseCase;
pub use session_manager::SessionManager;
pub use sign_out::SignOutUseCase;
