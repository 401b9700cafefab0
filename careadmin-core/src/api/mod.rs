//! Admin API client
//!
//! Authenticated calls against the admin backend, normalized into [`ApiResponse`].

mod client;
mod redirect;
mod response;
pub mod types;

pub use client::{AdminApiClient, TokenSource};
pub use redirect::{ChannelRedirect, LoginRedirect, NoopRedirect, RedirectReason};
pub use response::{ApiError, ApiResponse};
pub use types::*;
