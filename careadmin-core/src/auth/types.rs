//! Authentication types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authentication state
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AuthState {
    /// Not logged in
    #[default]
    LoggedOut,
    /// Sign-in in progress
    LoggingIn,
    /// Logged in with a cached session
    LoggedIn(Session),
    /// Last sign-in attempt failed
    Error(String),
}

impl AuthState {
    /// Short label for logs (never includes token material)
    pub fn label(&self) -> &'static str {
        match self {
            AuthState::LoggedOut => "LoggedOut",
            AuthState::LoggingIn => "LoggingIn",
            AuthState::LoggedIn(_) => "LoggedIn",
            AuthState::Error(_) => "Error",
        }
    }
}

/// Signed identity session issued by the identity provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    /// Signed ID token, sent as the bearer credential
    pub id_token: String,
    pub access_token: String,
    pub refresh_token: String,
    /// Expiry of the ID token
    pub expires_at: DateTime<Utc>,
    pub identity: Identity,
}

impl Session {
    /// Check if the ID token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Check if the token will expire soon (within 5 minutes)
    pub fn expires_soon(&self) -> bool {
        Utc::now() + chrono::Duration::minutes(5) >= self.expires_at
    }
}

/// Authenticated user's display attributes, projected from the ID token claims
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub email: String,
    pub name: String,
    /// Subject identifier
    pub sub: String,
}

/// Tokens returned by a successful authentication or refresh
#[derive(Debug, Clone, PartialEq)]
pub struct AuthTokens {
    pub id_token: String,
    pub access_token: String,
    /// Absent on refresh responses; the previous refresh token stays valid
    pub refresh_token: Option<String>,
    /// Lifetime in seconds
    pub expires_in: i64,
}

/// Challenge raised by the identity provider instead of issuing tokens
#[derive(Debug, Clone, PartialEq)]
pub struct AuthChallenge {
    pub name: String,
    /// Opaque challenge session to echo back when answering
    pub session: Option<String>,
}

/// Result of a password authentication
#[derive(Debug, Clone, PartialEq)]
pub enum AuthOutcome {
    Authenticated(AuthTokens),
    Challenge(AuthChallenge),
}

pub const NEW_PASSWORD_REQUIRED: &str = "NEW_PASSWORD_REQUIRED";

const MFA_CHALLENGES: &[&str] = &["SMS_MFA", "SOFTWARE_TOKEN_MFA", "MFA_SETUP", "SELECT_MFA_TYPE"];

impl AuthChallenge {
    /// Map an unanswered challenge to the error surfaced by sign-in
    pub fn into_error(self) -> AuthError {
        if self.name == NEW_PASSWORD_REQUIRED {
            AuthError::PasswordChangeRequired
        } else if MFA_CHALLENGES.contains(&self.name.as_str()) {
            AuthError::MultiFactorRequired
        } else {
            AuthError::Provider(format!("Unsupported challenge: {}", self.name))
        }
    }
}

/// Cognito `InitiateAuth` / `RespondToAuthChallenge` response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CognitoAuthResponse {
    #[serde(default)]
    pub authentication_result: Option<CognitoAuthenticationResult>,
    #[serde(default)]
    pub challenge_name: Option<String>,
    #[serde(default)]
    pub session: Option<String>,
}

/// Token bundle inside a Cognito auth response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CognitoAuthenticationResult {
    pub id_token: String,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_in: i64,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl From<CognitoAuthenticationResult> for AuthTokens {
    fn from(result: CognitoAuthenticationResult) -> Self {
        AuthTokens {
            id_token: result.id_token,
            access_token: result.access_token,
            refresh_token: result.refresh_token,
            expires_in: result.expires_in,
        }
    }
}

/// Cognito error body, e.g. `{"__type":"NotAuthorizedException","message":"..."}`
#[derive(Debug, Default, Deserialize)]
pub struct CognitoErrorBody {
    #[serde(rename = "__type", default)]
    pub error_type: Option<String>,
    #[serde(alias = "Message", default)]
    pub message: Option<String>,
}

impl CognitoErrorBody {
    /// Exception name without the service namespace prefix
    pub fn kind(&self) -> &str {
        let raw = self.error_type.as_deref().unwrap_or_default();
        raw.rsplit('#').next().unwrap_or(raw)
    }
}

/// Error types for authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Incorrect email or password")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("You must change your password before signing in")]
    PasswordChangeRequired,

    #[error("MFA is required. Please contact support for assistance.")]
    MultiFactorRequired,

    #[error("Password change not needed")]
    PasswordChangeNotNeeded,

    #[error("Session expired. Please login again.")]
    SessionExpired,

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Identity provider error: {0}")]
    Provider(String),

    #[error("Storage error: {0}")]
    Storage(String),
}
