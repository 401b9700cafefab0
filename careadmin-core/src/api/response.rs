//! Normalized response envelope

use serde::{Deserialize, Serialize};

/// Envelope returned by every admin API call
///
/// `success == true` never carries an `error`; `success == false` always does.
/// Build values through [`ApiResponse::ok`] and [`ApiResponse::failure`] to
/// keep that invariant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: Option<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message,
        }
    }

    pub fn failure(error: impl Into<String>, message: Option<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            message,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Error text to show in an alert, if the call failed
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Convert into a `Result`, using the error text on failure
    pub fn into_result(self) -> Result<T, String> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            (true, None) => Err("Response carried no data".to_string()),
            (false, _) => Err(self.error.unwrap_or_else(|| "Request failed".to_string())),
        }
    }
}

pub const NOT_AUTHENTICATED: &str = "Not authenticated";
pub const SESSION_EXPIRED: &str = "Session expired. Please login again.";
pub const REQUEST_FAILED: &str = "Request failed";
pub const NETWORK_ERROR: &str = "Network error";

/// Failure of a single admin API call
///
/// Never returned to callers directly; converted into a failed [`ApiResponse`].
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ApiError {
    #[error("{}", NOT_AUTHENTICATED)]
    NotAuthenticated,

    #[error("{}", SESSION_EXPIRED)]
    Unauthorized,

    #[error("{message}")]
    RequestFailed {
        status: u16,
        message: String,
        /// Body `message`, echoed on the envelope
        detail: Option<String>,
    },

    #[error("{0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("{0}")]
    NotFound(&'static str),
}

impl<T> From<ApiError> for ApiResponse<T> {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::RequestFailed {
                message, detail, ..
            } => ApiResponse::failure(message, detail),
            other => ApiResponse::failure(other.to_string(), None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_conversion() {
        let resp: ApiResponse<()> = ApiError::NotAuthenticated.into();
        assert_eq!(resp.error_message(), Some("Not authenticated"));

        let resp: ApiResponse<()> = ApiError::Unauthorized.into();
        assert_eq!(resp.error_message(), Some("Session expired. Please login again."));

        let resp: ApiResponse<()> = ApiError::RequestFailed {
            status: 409,
            message: "Provider already verified".to_string(),
            detail: Some("Provider already verified".to_string()),
        }
        .into();
        assert_eq!(resp.error_message(), Some("Provider already verified"));
        assert_eq!(resp.message.as_deref(), Some("Provider already verified"));

        let resp: ApiResponse<()> = ApiError::Decode("expected struct".to_string()).into();
        assert_eq!(resp.error_message(), Some("Invalid response: expected struct"));
    }

    #[test]
    fn test_ok_invariants() {
        let resp = ApiResponse::ok(json!({"foo": 1}), Some("done".to_string()));
        assert!(resp.is_success());
        assert!(resp.error.is_none());
        assert_eq!(resp.data, Some(json!({"foo": 1})));
    }

    #[test]
    fn test_failure_invariants() {
        let resp: ApiResponse<()> = ApiResponse::failure("Request failed", None);
        assert!(!resp.is_success());
        assert_eq!(resp.error_message(), Some("Request failed"));
        assert!(resp.data.is_none());
        assert_eq!(resp.into_result(), Err("Request failed".to_string()));
    }

    #[test]
    fn test_serialized_shape_omits_absent_fields() {
        let resp: ApiResponse<u32> = ApiResponse::failure("Not authenticated", None);
        assert_eq!(
            serde_json::to_value(&resp).unwrap(),
            json!({"success": false, "error": "Not authenticated"})
        );
        let ok = ApiResponse::ok(7u32, None);
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({"success": true, "data": 7})
        );
    }
}
