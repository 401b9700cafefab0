//! Identity provider seam

use super::types::{AuthError, AuthOutcome, AuthTokens};
use async_trait::async_trait;

/// External identity service that issues signed sessions.
///
/// Implementations translate provider-specific failures into [`AuthError`]:
/// rejected secrets become `InvalidCredentials` and a rejected refresh token
/// becomes `SessionExpired`.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Authenticate with identifier and secret
    async fn authenticate(&self, identifier: &str, secret: &str)
    -> Result<AuthOutcome, AuthError>;

    /// Answer a `NEW_PASSWORD_REQUIRED` challenge
    async fn respond_new_password(
        &self,
        identifier: &str,
        new_secret: &str,
        challenge_session: &str,
    ) -> Result<AuthTokens, AuthError>;

    /// Exchange a refresh token for new tokens
    async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens, AuthError>;
}
