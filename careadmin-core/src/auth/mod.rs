//! Authentication module for the CareAdmin console
//!
//! Handles authentication via a Cognito user pool:
//! - Email/password sign-in with challenge detection
//! - First-login password change
//! - Session persistence and token refresh

mod claims;
mod http_client;
mod manager;
mod provider;
mod storage;
pub mod types;

pub use claims::{IdTokenClaims, decode_id_token};
pub use http_client::CognitoClient;
pub use manager::SessionManager;
pub use provider::IdentityProvider;
pub use storage::{FileSessionStore, MemorySessionStore, SessionStore};
pub use types::*;
