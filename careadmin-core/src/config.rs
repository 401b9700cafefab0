//! Runtime configuration
//!
//! Read once at process start from the environment.

use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_API_URL: &str = "CAREADMIN_API_URL";
pub const ENV_USER_POOL_ID: &str = "CAREADMIN_COGNITO_USER_POOL_ID";
pub const ENV_CLIENT_ID: &str = "CAREADMIN_COGNITO_CLIENT_ID";
pub const ENV_COGNITO_ENDPOINT: &str = "CAREADMIN_COGNITO_ENDPOINT";
pub const ENV_DATA_DIR: &str = "CAREADMIN_DATA_DIR";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "CAREADMIN_HTTP_TIMEOUT_SECS";

const APP_DIR_NAME: &str = "CareAdmin";

/// Configuration errors
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid user pool id: {0}")]
    InvalidPoolId(String),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Could not determine data directory")]
    NoDataDir,
}

/// Admin API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL, endpoints are appended verbatim
    pub base_url: String,
    /// Request timeout; `None` keeps the transport default
    #[serde(default)]
    pub timeout: Option<Duration>,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: None,
        }
    }
}

/// Identity provider settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CognitoConfig {
    pub user_pool_id: String,
    pub client_id: String,
    /// Overrides the regional endpoint (local emulators, tests)
    #[serde(default)]
    pub endpoint_override: Option<String>,
}

impl CognitoConfig {
    /// AWS region encoded in the pool id (`eu-west-1_AbC123` -> `eu-west-1`)
    pub fn region(&self) -> Result<&str, ConfigError> {
        match self.user_pool_id.split_once('_') {
            Some((region, rest)) if !region.is_empty() && !rest.is_empty() => Ok(region),
            _ => Err(ConfigError::InvalidPoolId(self.user_pool_id.clone())),
        }
    }

    /// URL every user pool action is posted to
    pub fn endpoint(&self) -> Result<String, ConfigError> {
        if let Some(endpoint) = &self.endpoint_override {
            return Ok(endpoint.clone());
        }
        Ok(format!("https://cognito-idp.{}.amazonaws.com/", self.region()?))
    }
}

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub cognito: CognitoConfig,
    /// Directory for the persisted session
    pub data_dir: PathBuf,
}

impl AppConfig {
    /// Load configuration from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let require = |key: &'static str| {
            get(key).ok_or_else(|| {
                error!("Missing {} configuration", key);
                ConfigError::Missing(key)
            })
        };

        let base_url = require(ENV_API_URL)?;
        let user_pool_id = require(ENV_USER_POOL_ID)?;
        let client_id = require(ENV_CLIENT_ID)?;

        let timeout = match get(ENV_HTTP_TIMEOUT_SECS) {
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|_| ConfigError::InvalidValue {
                    key: ENV_HTTP_TIMEOUT_SECS,
                    value: raw.clone(),
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        let data_dir = match get(ENV_DATA_DIR) {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir()?,
        };

        let config = Self {
            api: ApiConfig {
                base_url: base_url.trim_end_matches('/').to_string(),
                timeout,
            },
            cognito: CognitoConfig {
                user_pool_id,
                client_id,
                endpoint_override: get(ENV_COGNITO_ENDPOINT),
            },
            data_dir,
        };

        // Fail early on a malformed pool id
        config.cognito.endpoint()?;

        info!("Loaded configuration for API {}", config.api.base_url);
        debug!("Data directory: {}", config.data_dir.display());
        Ok(config)
    }
}

/// Per-user data directory for CareAdmin
pub fn default_data_dir() -> Result<PathBuf, ConfigError> {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR_NAME))
        .ok_or(ConfigError::NoDataDir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const BASE: &[(&str, &str)] = &[
        (ENV_API_URL, "https://api.example.com/prod/"),
        (ENV_USER_POOL_ID, "ap-south-1_AbCdEf123"),
        (ENV_CLIENT_ID, "client-123"),
        (ENV_DATA_DIR, "/tmp/careadmin-test"),
    ];

    #[test]
    fn test_from_lookup() {
        let config = AppConfig::from_lookup(lookup(BASE)).unwrap();
        assert_eq!(config.api.base_url, "https://api.example.com/prod");
        assert_eq!(config.api.timeout, None);
        assert_eq!(config.cognito.region().unwrap(), "ap-south-1");
        assert_eq!(
            config.cognito.endpoint().unwrap(),
            "https://cognito-idp.ap-south-1.amazonaws.com/"
        );
        assert_eq!(config.data_dir, PathBuf::from("/tmp/careadmin-test"));
    }

    #[test]
    fn test_missing_api_url() {
        let err = AppConfig::from_lookup(lookup(&BASE[1..])).unwrap_err();
        assert_eq!(err, ConfigError::Missing(ENV_API_URL));
    }

    #[test]
    fn test_blank_values_count_as_missing() {
        let mut pairs = BASE.to_vec();
        pairs[2] = (ENV_CLIENT_ID, "   ");
        let err = AppConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert_eq!(err, ConfigError::Missing(ENV_CLIENT_ID));
    }

    #[test]
    fn test_invalid_pool_id() {
        let mut pairs = BASE.to_vec();
        pairs[1] = (ENV_USER_POOL_ID, "nounderscore");
        let err = AppConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPoolId(_)));
    }

    #[test]
    fn test_timeout_and_endpoint_override() {
        let mut pairs = BASE.to_vec();
        pairs.push((ENV_HTTP_TIMEOUT_SECS, "15"));
        pairs.push((ENV_COGNITO_ENDPOINT, "http://localhost:9229/"));
        let config = AppConfig::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.api.timeout, Some(Duration::from_secs(15)));
        assert_eq!(config.cognito.endpoint().unwrap(), "http://localhost:9229/");
    }

    #[test]
    fn test_invalid_timeout() {
        let mut pairs = BASE.to_vec();
        pairs.push((ENV_HTTP_TIMEOUT_SECS, "soon"));
        assert!(matches!(
            AppConfig::from_lookup(lookup(&pairs)),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
