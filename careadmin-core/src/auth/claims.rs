//! ID token claim decoding
//!
//! Claims are read without signature validation. Signatures are checked by the admin API.

use super::types::{AuthError, AuthTokens, Identity, Session};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;

const DEFAULT_NAME: &str = "Admin";

/// Claims the admin console reads from an ID token
#[derive(Debug, Default, Deserialize)]
pub struct IdTokenClaims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Expiry as seconds since the epoch
    #[serde(default)]
    pub exp: Option<i64>,
}

impl IdTokenClaims {
    /// Project the claims into an Identity, falling back to the sign-in identifier
    pub fn identity(&self, fallback_email: &str) -> Identity {
        Identity {
            email: self
                .email
                .clone()
                .unwrap_or_else(|| fallback_email.to_string()),
            name: self
                .name
                .clone()
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| DEFAULT_NAME.to_string()),
            sub: self.sub.clone().unwrap_or_default(),
        }
    }

    fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }
}

/// Decode the claims of an ID token without checking its signature
pub fn decode_id_token(token: &str) -> Result<IdTokenClaims, AuthError> {
    let mut validation = Validation::new(Algorithm::RS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    decode::<IdTokenClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|e| AuthError::Provider(format!("Malformed ID token: {}", e)))
}

/// Build a session from freshly issued tokens
///
/// `previous` supplies the refresh token and identity fallbacks when the
/// provider omits them (refresh responses carry no refresh token).
pub fn session_from_tokens(
    tokens: AuthTokens,
    fallback_email: &str,
    previous: Option<&Session>,
) -> Result<Session, AuthError> {
    let claims = decode_id_token(&tokens.id_token)?;

    let refresh_token = match (tokens.refresh_token, previous) {
        (Some(token), _) => token,
        (None, Some(prev)) => prev.refresh_token.clone(),
        (None, None) => {
            return Err(AuthError::Provider(
                "Identity provider returned no refresh token".to_string(),
            ));
        }
    };

    let expires_at = claims
        .expires_at()
        .unwrap_or_else(|| Utc::now() + Duration::seconds(tokens.expires_in));

    let fallback = previous
        .map(|prev| prev.identity.email.as_str())
        .unwrap_or(fallback_email);

    Ok(Session {
        identity: claims.identity(fallback),
        id_token: tokens.id_token,
        access_token: tokens.access_token,
        refresh_token,
        expires_at,
    })
}

/// Build a JWT with the given claims, signed with a throwaway key (tests only)
#[cfg(test)]
pub(crate) fn unsigned_token(claims: &serde_json::Value) -> String {
    use jsonwebtoken::{EncodingKey, Header, encode};

    encode(&Header::default(), claims, &EncodingKey::from_secret(b"test-only"))
        .expect("test token encodes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tokens(id_token: String, refresh: Option<&str>) -> AuthTokens {
        AuthTokens {
            id_token,
            access_token: "access".to_string(),
            refresh_token: refresh.map(str::to_string),
            expires_in: 3600,
        }
    }

    #[test]
    fn test_decode_claims() {
        let token = unsigned_token(&json!({
            "sub": "abc-123",
            "email": "ops@clinic.example",
            "name": "Ops Lead",
            "exp": 4_102_444_800i64
        }));
        let claims = decode_id_token(&token).unwrap();
        assert_eq!(claims.sub.as_deref(), Some("abc-123"));
        assert_eq!(claims.email.as_deref(), Some("ops@clinic.example"));
        assert_eq!(claims.exp, Some(4_102_444_800));
    }

    #[test]
    fn test_identity_fallbacks() {
        let claims = IdTokenClaims {
            sub: Some("s".to_string()),
            ..Default::default()
        };
        let identity = claims.identity("typed@example.com");
        assert_eq!(identity.email, "typed@example.com");
        assert_eq!(identity.name, "Admin");
        assert_eq!(identity.sub, "s");
    }

    #[test]
    fn test_malformed_token_is_rejected() {
        assert!(matches!(
            decode_id_token("not-a-jwt"),
            Err(AuthError::Provider(_))
        ));
        assert!(matches!(
            decode_id_token("a.!!!.c"),
            Err(AuthError::Provider(_))
        ));
    }

    #[test]
    fn test_signature_and_audience_are_not_checked() {
        let mut token = unsigned_token(&json!({
            "sub": "abc-123",
            "aud": "some-client",
            "exp": 1
        }));
        token.push_str("tampered");
        let claims = decode_id_token(&token).unwrap();
        assert_eq!(claims.sub.as_deref(), Some("abc-123"));
        assert_eq!(claims.exp, Some(1));
    }

    #[test]
    fn test_session_uses_exp_claim() {
        let token = unsigned_token(&json!({"sub": "s", "exp": 4_102_444_800i64}));
        let session = session_from_tokens(tokens(token, Some("r")), "a@b.c", None).unwrap();
        assert_eq!(session.expires_at.timestamp(), 4_102_444_800);
        assert_eq!(session.refresh_token, "r");
        assert_eq!(session.identity.email, "a@b.c");
    }

    #[test]
    fn test_refresh_keeps_previous_refresh_token() {
        let first = unsigned_token(&json!({"sub": "s", "email": "a@b.c"}));
        let previous = session_from_tokens(tokens(first, Some("keep-me")), "a@b.c", None).unwrap();

        let second = unsigned_token(&json!({"sub": "s"}));
        let refreshed = session_from_tokens(tokens(second, None), "", Some(&previous)).unwrap();
        assert_eq!(refreshed.refresh_token, "keep-me");
        assert_eq!(refreshed.identity.email, "a@b.c");
        assert!(!refreshed.is_expired());
    }

    #[test]
    fn test_missing_refresh_token_without_previous_session() {
        let token = unsigned_token(&json!({"sub": "s"}));
        assert!(session_from_tokens(tokens(token, None), "a@b.c", None).is_err());
    }
}
