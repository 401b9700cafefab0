//! Session manager - handles sign-in/sign-out and token lifecycle

use super::claims::session_from_tokens;
use super::provider::IdentityProvider;
use super::storage::SessionStore;
use super::types::{AuthError, AuthOutcome, AuthState, Identity, NEW_PASSWORD_REQUIRED, Session};
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::sync::Arc;

/// Session manager
///
/// Owns the cached [`Session`]. Every API call reads it through
/// [`SessionManager::token`]; only `sign_in`, `refresh` and `sign_out`
/// replace it.
pub struct SessionManager {
    state: Arc<Mutex<AuthState>>,
    provider: Box<dyn IdentityProvider>,
    store: Box<dyn SessionStore>,
}

impl SessionManager {
    /// Create a new SessionManager, restoring any stored session
    pub fn new(provider: Box<dyn IdentityProvider>, store: Box<dyn SessionStore>) -> Self {
        let initial_state = match store.load() {
            Ok(Some(session)) => {
                info!("Found stored session for {}", session.identity.email);
                info!("  Expires at: {}", session.expires_at);
                if session.is_expired() {
                    info!("Session is expired and will be refreshed on first use");
                }
                AuthState::LoggedIn(session)
            }
            Ok(None) => {
                info!("No stored session found, sign-in required");
                AuthState::LoggedOut
            }
            Err(e) => {
                // Start logged out rather than failing
                error!("Failed to load stored session: {}. Starting fresh.", e);
                AuthState::LoggedOut
            }
        };

        info!("SessionManager initialized with state: {}", initial_state.label());

        Self {
            state: Arc::new(Mutex::new(initial_state)),
            provider,
            store,
        }
    }

    /// Get the current auth state
    pub fn state(&self) -> AuthState {
        self.state.lock().clone()
    }

    /// Check if a session is cached (it may still need a refresh)
    pub fn is_authenticated(&self) -> bool {
        matches!(self.state(), AuthState::LoggedIn(_))
    }

    fn cached_session(&self) -> Option<Session> {
        match self.state() {
            AuthState::LoggedIn(session) => Some(session),
            _ => None,
        }
    }

    fn set_state(&self, state: AuthState) {
        *self.state.lock() = state;
    }

    /// Cache and persist a session. Persistence failures are logged only.
    fn install_session(&self, session: Session) {
        let mut state = self.state.lock();
        if let Err(e) = self.store.store(&session) {
            warn!("Failed to store session (kept in memory): {}", e);
        }
        *state = AuthState::LoggedIn(session);
    }

    /// Sign in with identifier (email) and secret
    ///
    /// A session that is already cached stays in use until the new one is
    /// installed, and survives a failed attempt.
    pub async fn sign_in(&self, identifier: &str, secret: &str) -> Result<Identity, AuthError> {
        info!("Signing in user: {}", identifier);
        let had_session = self.cached_session().is_some();
        if !had_session {
            self.set_state(AuthState::LoggingIn);
        }

        let result = match self.provider.authenticate(identifier, secret).await {
            Ok(AuthOutcome::Authenticated(tokens)) => session_from_tokens(tokens, identifier, None),
            Ok(AuthOutcome::Challenge(challenge)) => Err(challenge.into_error()),
            Err(e) => Err(e),
        };

        match result {
            Ok(session) => {
                let identity = session.identity.clone();
                self.install_session(session);
                info!("Sign in successful for {}", identity.email);
                Ok(identity)
            }
            Err(e) => {
                error!("Sign in failed: {}", e);
                if had_session {
                    warn!("Keeping the existing session");
                } else {
                    self.set_state(AuthState::Error(e.to_string()));
                }
                Err(e)
            }
        }
    }

    /// Return a session whose ID token is still valid, refreshing one that has
    /// expired or is about to.
    ///
    /// `Ok(None)` covers both "no session" and "refresh token rejected".
    async fn valid_session(&self) -> Result<Option<Session>, AuthError> {
        let session = match self.cached_session() {
            Some(session) => session,
            None => return Ok(None),
        };

        if !session.expires_soon() {
            return Ok(Some(session));
        }

        let expired = session.is_expired();
        if expired {
            info!("ID token expired, attempting refresh...");
        } else {
            info!("ID token expires soon, attempting refresh...");
        }

        match self.refresh().await {
            Ok(()) => Ok(self.cached_session()),
            Err(AuthError::SessionExpired) | Err(AuthError::NotAuthenticated) => Ok(None),
            // The current token is still usable for a few minutes
            Err(e) if !expired => {
                warn!("Early refresh failed, using current token: {}", e);
                Ok(Some(session))
            }
            Err(e) => Err(e),
        }
    }

    /// Identity of the current valid session
    pub async fn current_identity(&self) -> Result<Option<Identity>, AuthError> {
        Ok(self.valid_session().await?.map(|s| s.identity))
    }

    /// Signed ID token of the current valid session, for use as a bearer credential
    pub async fn token(&self) -> Result<Option<String>, AuthError> {
        let session = self.valid_session().await?;
        if let Some(session) = &session {
            debug!("Using ID token ({} chars)", session.id_token.len());
        }
        Ok(session.map(|s| s.id_token))
    }

    /// Exchange the refresh token for a new session
    ///
    /// A rejected refresh token clears the cached session. New tokens are
    /// discarded if the session was signed out or replaced in the meantime.
    pub async fn refresh(&self) -> Result<(), AuthError> {
        let session = self.cached_session().ok_or(AuthError::NotAuthenticated)?;

        match self.provider.refresh(&session.refresh_token).await {
            Ok(tokens) => {
                let new_session = session_from_tokens(tokens, "", Some(&session))?;
                if self.replace_session(&session, Some(new_session)) {
                    info!("Session refreshed");
                    Ok(())
                } else if self.is_authenticated() {
                    debug!("Session replaced during refresh, discarding new tokens");
                    Ok(())
                } else {
                    info!("Signed out during refresh, discarding new tokens");
                    Err(AuthError::NotAuthenticated)
                }
            }
            Err(AuthError::SessionExpired) => {
                warn!("Refresh token rejected, clearing session");
                self.replace_session(&session, None);
                Err(AuthError::SessionExpired)
            }
            Err(e) => {
                error!("Refresh session error: {}", e);
                Err(e)
            }
        }
    }

    /// Swap `previous` for `next` (or sign out on `None`) if it is still the cached session
    fn replace_session(&self, previous: &Session, next: Option<Session>) -> bool {
        let mut state = self.state.lock();
        match &*state {
            AuthState::LoggedIn(current) if current.id_token == previous.id_token => {}
            _ => return false,
        }

        let stored = match &next {
            Some(session) => self.store.store(session),
            None => self.store.clear(),
        };
        if let Err(e) = stored {
            warn!("Failed to update stored session: {}", e);
        }

        *state = match next {
            Some(session) => AuthState::LoggedIn(session),
            None => AuthState::LoggedOut,
        };
        true
    }

    /// Clear the cached and stored session. Idempotent.
    pub fn sign_out(&self) {
        let mut state = self.state.lock();
        if let Err(e) = self.store.clear() {
            warn!("Failed to clear stored session: {}", e);
        }

        if matches!(*state, AuthState::LoggedIn(_)) {
            info!("User signed out");
        }
        *state = AuthState::LoggedOut;
    }

    /// Replace a temporary password on first login
    ///
    /// Does not sign the user in; callers route back to sign-in afterwards.
    pub async fn complete_password_change(
        &self,
        identifier: &str,
        temporary_secret: &str,
        new_secret: &str,
    ) -> Result<(), AuthError> {
        info!("Changing temporary password for {}", identifier);

        let challenge = match self.provider.authenticate(identifier, temporary_secret).await? {
            AuthOutcome::Authenticated(_) => return Err(AuthError::PasswordChangeNotNeeded),
            AuthOutcome::Challenge(challenge) if challenge.name == NEW_PASSWORD_REQUIRED => {
                challenge
            }
            AuthOutcome::Challenge(challenge) => return Err(challenge.into_error()),
        };

        let challenge_session = challenge.session.unwrap_or_default();
        self.provider
            .respond_new_password(identifier, new_secret, &challenge_session)
            .await
            .map_err(|e| {
                error!("Password change failed: {}", e);
                e
            })?;

        info!("Password changed successfully");
        Ok(())
    }
}
