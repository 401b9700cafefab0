//! CareAdmin Core Library
//!
//! Session management against a Cognito user pool and the authenticated
//! client for the CareAdmin admin API. Used by the CareAdmin console.

pub mod api;
pub mod auth;
pub mod config;

// Re-export commonly used items
pub use api::{AdminApiClient, ApiResponse, LoginRedirect, RedirectReason, TokenSource};
pub use auth::{AuthError, CognitoClient, FileSessionStore, SessionManager};
pub use config::AppConfig;
