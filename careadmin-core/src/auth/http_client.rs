//! HTTP client for the Cognito user pool API

use super::provider::IdentityProvider;
use super::types::{
    AuthChallenge, AuthError, AuthOutcome, AuthTokens, CognitoAuthResponse, CognitoErrorBody,
    NEW_PASSWORD_REQUIRED,
};
use crate::config::CognitoConfig;
use async_trait::async_trait;
use log::{debug, error, info};
use reqwest::Client;
use serde_json::{Value, json};

const AMZ_JSON: &str = "application/x-amz-json-1.1";
const TARGET_PREFIX: &str = "AWSCognitoIdentityProviderService";

/// Which call an error response belongs to; decides how `NotAuthorizedException` maps
#[derive(Debug, Clone, Copy, PartialEq)]
enum Flow {
    SignIn,
    Refresh,
}

/// HTTP client for identity provider calls
pub struct CognitoClient {
    client: Client,
    endpoint: String,
    client_id: String,
}

impl CognitoClient {
    /// Create a new CognitoClient
    pub fn new(config: &CognitoConfig) -> Result<Self, AuthError> {
        let client = Client::builder()
            .user_agent(concat!("CareAdmin/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| AuthError::Network(format!("Failed to create HTTP client: {}", e)))?;

        let endpoint = config
            .endpoint()
            .map_err(|e| AuthError::Provider(e.to_string()))?;
        info!("Identity provider endpoint: {}", endpoint);

        Ok(Self {
            client,
            endpoint,
            client_id: config.client_id.clone(),
        })
    }

    /// POST one action to the user pool API and return the parsed body
    async fn call(
        &self,
        action: &str,
        payload: Value,
        flow: Flow,
    ) -> Result<CognitoAuthResponse, AuthError> {
        debug!("Calling identity provider action {}", action);

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", AMZ_JSON)
            .header("X-Amz-Target", format!("{}.{}", TARGET_PREFIX, action))
            .json(&payload)
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let parsed: CognitoErrorBody = serde_json::from_str(&body).unwrap_or_default();
            error!("{} failed: {} - {}", action, status, parsed.kind());
            return Err(classify_error(&parsed, flow));
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::Provider(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl IdentityProvider for CognitoClient {
    async fn authenticate(
        &self,
        identifier: &str,
        secret: &str,
    ) -> Result<AuthOutcome, AuthError> {
        debug!("Authenticating user: {}", identifier);

        let response = self
            .call(
                "InitiateAuth",
                json!({
                    "AuthFlow": "USER_PASSWORD_AUTH",
                    "ClientId": self.client_id,
                    "AuthParameters": {
                        "USERNAME": identifier,
                        "PASSWORD": secret,
                    },
                }),
                Flow::SignIn,
            )
            .await?;

        into_outcome(response)
    }

    async fn respond_new_password(
        &self,
        identifier: &str,
        new_secret: &str,
        challenge_session: &str,
    ) -> Result<AuthTokens, AuthError> {
        debug!("Answering new password challenge for {}", identifier);

        let response = self
            .call(
                "RespondToAuthChallenge",
                json!({
                    "ChallengeName": NEW_PASSWORD_REQUIRED,
                    "ClientId": self.client_id,
                    "Session": challenge_session,
                    "ChallengeResponses": {
                        "USERNAME": identifier,
                        "NEW_PASSWORD": new_secret,
                    },
                }),
                Flow::SignIn,
            )
            .await?;

        match into_outcome(response)? {
            AuthOutcome::Authenticated(tokens) => {
                info!("New password accepted");
                Ok(tokens)
            }
            AuthOutcome::Challenge(challenge) => Err(challenge.into_error()),
        }
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens, AuthError> {
        debug!("Refreshing session via identity provider");

        let response = self
            .call(
                "InitiateAuth",
                json!({
                    "AuthFlow": "REFRESH_TOKEN_AUTH",
                    "ClientId": self.client_id,
                    "AuthParameters": {
                        "REFRESH_TOKEN": refresh_token,
                    },
                }),
                Flow::Refresh,
            )
            .await?;

        match into_outcome(response)? {
            AuthOutcome::Authenticated(tokens) => {
                info!("Token refresh successful");
                Ok(tokens)
            }
            AuthOutcome::Challenge(challenge) => Err(AuthError::Provider(format!(
                "Unexpected challenge on refresh: {}",
                challenge.name
            ))),
        }
    }
}

fn into_outcome(response: CognitoAuthResponse) -> Result<AuthOutcome, AuthError> {
    if let Some(result) = response.authentication_result {
        return Ok(AuthOutcome::Authenticated(result.into()));
    }
    match response.challenge_name {
        Some(name) => {
            info!("Identity provider raised challenge {}", name);
            Ok(AuthOutcome::Challenge(AuthChallenge {
                name,
                session: response.session,
            }))
        }
        None => Err(AuthError::Provider(
            "Response carried neither tokens nor a challenge".to_string(),
        )),
    }
}

/// Map a user pool error body onto the auth error taxonomy
fn classify_error(body: &CognitoErrorBody, flow: Flow) -> AuthError {
    match (body.kind(), flow) {
        ("NotAuthorizedException", Flow::SignIn) => AuthError::InvalidCredentials,
        ("NotAuthorizedException", Flow::Refresh) => AuthError::SessionExpired,
        ("UserNotFoundException", _) => AuthError::UserNotFound,
        ("PasswordResetRequiredException", _) => AuthError::PasswordChangeRequired,
        (kind, _) => AuthError::Provider(
            body.message
                .clone()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| {
                    if kind.is_empty() {
                        "Unknown identity provider error".to_string()
                    } else {
                        kind.to_string()
                    }
                }),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(kind: &str, message: Option<&str>) -> CognitoErrorBody {
        CognitoErrorBody {
            error_type: Some(kind.to_string()),
            message: message.map(str::to_string),
        }
    }

    #[test]
    fn test_not_authorized_depends_on_flow() {
        let err = body("NotAuthorizedException", Some("Incorrect username or password."));
        assert!(matches!(
            classify_error(&err, Flow::SignIn),
            AuthError::InvalidCredentials
        ));
        assert!(matches!(
            classify_error(&err, Flow::Refresh),
            AuthError::SessionExpired
        ));
    }

    #[test]
    fn test_user_errors() {
        assert!(matches!(
            classify_error(&body("UserNotFoundException", None), Flow::SignIn),
            AuthError::UserNotFound
        ));
        assert!(matches!(
            classify_error(&body("PasswordResetRequiredException", None), Flow::SignIn),
            AuthError::PasswordChangeRequired
        ));
    }

    #[test]
    fn test_unknown_errors_keep_message() {
        match classify_error(
            &body("TooManyRequestsException", Some("Rate exceeded")),
            Flow::SignIn,
        ) {
            AuthError::Provider(msg) => assert_eq!(msg, "Rate exceeded"),
            other => panic!("unexpected error: {:?}", other),
        }
        match classify_error(&CognitoErrorBody::default(), Flow::Refresh) {
            AuthError::Provider(msg) => assert_eq!(msg, "Unknown identity provider error"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_outcome_without_tokens_or_challenge_is_error() {
        let response = CognitoAuthResponse {
            authentication_result: None,
            challenge_name: None,
            session: None,
        };
        assert!(into_outcome(response).is_err());
    }
}
