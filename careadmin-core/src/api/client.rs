//! Authenticated HTTP client for the admin API

use super::redirect::{LoginRedirect, RedirectReason};
use super::response::{ApiError, ApiResponse, NETWORK_ERROR, REQUEST_FAILED};
use super::types::{
    Appointment, AppointmentList, AppointmentStatus, AssignProviderRequest, DashboardStats,
    LabOrder, LabOrderList, LabOrderStatus, PendingProviders, ProviderDetailsResponse,
    ProviderList, RejectProviderRequest, StatusUpdateRequest, VerificationStatus,
};
use crate::auth::{AuthError, SessionManager};
use crate::config::ApiConfig;
use async_trait::async_trait;
use log::{debug, error, info, warn};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// Source of the bearer credential for API calls
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Current bearer token, `None` when signed out or expired
    async fn bearer_token(&self) -> Result<Option<String>, AuthError>;

    /// Drop the session after the API rejected it
    fn sign_out(&self);
}

#[async_trait]
impl TokenSource for SessionManager {
    async fn bearer_token(&self) -> Result<Option<String>, AuthError> {
        self.token().await
    }

    fn sign_out(&self) {
        SessionManager::sign_out(self);
    }
}

/// Percent-encode a path segment or query value (RFC 3986 unreserved chars pass through)
fn percent_encode(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(byte as char);
            }
            _ => {
                result.push_str(&format!("%{:02X}", byte));
            }
        }
    }
    result
}

/// Append `?status=` when a non-empty filter is given
fn with_status_filter(path: &str, status: Option<&str>) -> String {
    match status.filter(|s| !s.is_empty()) {
        Some(status) => format!("{}?status={}", path, percent_encode(status)),
        None => path.to_string(),
    }
}

/// Failure text for a non-2xx body: `message`, then `error`, then a generic fallback
fn failure_message(body: &Value) -> String {
    ["message", "error"]
        .iter()
        .find_map(|key| body.get(key).and_then(Value::as_str).filter(|s| !s.is_empty()))
        .unwrap_or(REQUEST_FAILED)
        .to_string()
}

fn body_message(body: &Value) -> Option<String> {
    body.get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// The `data` field when present and non-null, otherwise the whole body
fn unwrap_data(body: Value) -> Value {
    match body {
        Value::Object(mut map) => match map.remove("data") {
            Some(data) if !data.is_null() => data,
            Some(data) => {
                map.insert("data".to_string(), data);
                Value::Object(map)
            }
            None => Value::Object(map),
        },
        other => other,
    }
}

/// Admin API client
///
/// Every call resolves to an [`ApiResponse`]; nothing is retried.
pub struct AdminApiClient {
    client: Client,
    base_url: String,
    session: Arc<dyn TokenSource>,
    redirect: Arc<dyn LoginRedirect>,
}

impl AdminApiClient {
    /// Create a new AdminApiClient
    pub fn new(
        config: &ApiConfig,
        session: Arc<dyn TokenSource>,
        redirect: Arc<dyn LoginRedirect>,
    ) -> Result<Self, ApiError> {
        let mut builder = Client::builder().user_agent(concat!(
            "CareAdmin/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to create HTTP client: {}", e)))?;

        if config.base_url.is_empty() {
            error!("Missing API URL configuration");
        }

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
            redirect,
        })
    }

    /// Make an authenticated request and normalize the outcome
    async fn authenticated_request<T, B>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
    ) -> ApiResponse<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        match self.send(method, endpoint, body).await {
            Ok((data, message)) => ApiResponse::ok(data, message),
            Err(e) => {
                error!("Request error: {}", e);
                e.into()
            }
        }
    }

    async fn send<T, B>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
    ) -> Result<(T, Option<String>), ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        let token = match self.session.bearer_token().await {
            Ok(Some(token)) => token,
            Ok(None) => {
                self.redirect
                    .redirect_to_login(RedirectReason::NotAuthenticated);
                return Err(ApiError::NotAuthenticated);
            }
            Err(e) => {
                warn!("Could not obtain token: {}", e);
                self.redirect
                    .redirect_to_login(RedirectReason::NotAuthenticated);
                return Err(ApiError::NotAuthenticated);
            }
        };

        let url = format!("{}{}", self.base_url, endpoint);
        info!("{} {}", method, url);

        let mut request = self
            .client
            .request(method, &url)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            let message = e.to_string();
            ApiError::Network(if message.is_empty() {
                NETWORK_ERROR.to_string()
            } else {
                message
            })
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            warn!("API rejected the session (401), signing out");
            self.session.sign_out();
            self.redirect
                .redirect_to_login(RedirectReason::SessionExpired);
            return Err(ApiError::Unauthorized);
        }

        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let body: Value = if text.trim().is_empty() {
            Value::Null
        } else {
            match serde_json::from_str(&text) {
                Ok(value) => value,
                Err(e) if status.is_success() => return Err(ApiError::Decode(e.to_string())),
                Err(_) => Value::Null,
            }
        };

        if !status.is_success() {
            error!("Request failed: {} - {}", status, body);
            return Err(ApiError::RequestFailed {
                status: status.as_u16(),
                message: failure_message(&body),
                detail: body_message(&body),
            });
        }

        debug!("Request successful ({})", status);
        let message = body_message(&body);
        let data = serde_json::from_value(unwrap_data(body))
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok((data, message))
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> ApiResponse<T> {
        self.authenticated_request::<T, Value>(Method::GET, endpoint, None)
            .await
    }

    async fn post<T, B>(&self, endpoint: &str, body: Option<&B>) -> ApiResponse<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        self.authenticated_request(Method::POST, endpoint, body)
            .await
    }

    // ========================================
    // Provider verification
    // ========================================

    /// Providers waiting for verification
    pub async fn list_pending_providers(&self) -> ApiResponse<PendingProviders> {
        self.get("/admin/providers/pending").await
    }

    /// Provider record with documents and the linked user profile
    pub async fn get_provider_details(&self, provider_id: &str) -> ApiResponse<ProviderDetailsResponse> {
        self.get(&format!("/admin/providers/{}", percent_encode(provider_id)))
            .await
    }

    /// Approve a provider application
    pub async fn verify_provider(&self, provider_id: &str) -> ApiResponse<Value> {
        self.post::<Value, Value>(
            &format!("/admin/providers/{}/verify", percent_encode(provider_id)),
            None,
        )
        .await
    }

    /// Reject a provider application
    pub async fn reject_provider(
        &self,
        provider_id: &str,
        reason: &str,
        details: Option<&str>,
    ) -> ApiResponse<Value> {
        let body = RejectProviderRequest { reason, details };
        self.post(
            &format!("/admin/providers/{}/reject", percent_encode(provider_id)),
            Some(&body),
        )
        .await
    }

    /// All providers, optionally filtered by verification status
    pub async fn list_providers(
        &self,
        status: Option<&VerificationStatus>,
    ) -> ApiResponse<ProviderList> {
        self.get(&with_status_filter(
            "/admin/providers",
            status.map(VerificationStatus::as_str),
        ))
        .await
    }

    // ========================================
    // Appointments
    // ========================================

    /// Appointments, optionally filtered by status
    pub async fn list_appointments(
        &self,
        status: Option<&AppointmentStatus>,
    ) -> ApiResponse<AppointmentList> {
        self.get(&with_status_filter(
            "/admin/appointments",
            status.map(AppointmentStatus::as_str),
        ))
        .await
    }

    /// Look up a single appointment from the full list
    pub async fn find_appointment(&self, appointment_id: &str) -> ApiResponse<Appointment> {
        let list = self.list_appointments(None).await;
        let message = list.message.clone();
        match list.into_result() {
            Ok(list) => list
                .appointments
                .into_iter()
                .find(|a| a.appointment_id == appointment_id)
                .map(|a| ApiResponse::ok(a, message))
                .unwrap_or_else(|| ApiError::NotFound("Appointment not found").into()),
            Err(e) => ApiResponse::failure(e, None),
        }
    }

    /// Set an appointment's status
    pub async fn update_appointment_status(
        &self,
        appointment_id: &str,
        status: &AppointmentStatus,
        notes: Option<&str>,
    ) -> ApiResponse<Value> {
        let body = StatusUpdateRequest {
            status: status.as_str(),
            notes,
        };
        self.post(
            &format!("/admin/appointments/{}/status", percent_encode(appointment_id)),
            Some(&body),
        )
        .await
    }

    /// Assign a verified provider to an unassigned appointment
    pub async fn assign_provider(
        &self,
        appointment_id: &str,
        provider_id: &str,
    ) -> ApiResponse<Value> {
        let body = AssignProviderRequest { provider_id };
        self.post(
            &format!("/admin/appointments/{}/assign", percent_encode(appointment_id)),
            Some(&body),
        )
        .await
    }

    // ========================================
    // Lab orders
    // ========================================

    /// Lab orders, optionally filtered by status
    pub async fn list_lab_orders(&self, status: Option<&LabOrderStatus>) -> ApiResponse<LabOrderList> {
        self.get(&with_status_filter(
            "/admin/lab-orders",
            status.map(LabOrderStatus::as_str),
        ))
        .await
    }

    /// Look up a single lab order from the full list
    pub async fn find_lab_order(&self, order_id: &str) -> ApiResponse<LabOrder> {
        let list = self.list_lab_orders(None).await;
        let message = list.message.clone();
        match list.into_result() {
            Ok(list) => list
                .lab_orders
                .into_iter()
                .find(|o| o.order_id == order_id)
                .map(|o| ApiResponse::ok(o, message))
                .unwrap_or_else(|| ApiError::NotFound("Lab order not found").into()),
            Err(e) => ApiResponse::failure(e, None),
        }
    }

    /// Set a lab order's status
    pub async fn update_lab_order_status(
        &self,
        order_id: &str,
        status: &LabOrderStatus,
        notes: Option<&str>,
    ) -> ApiResponse<Value> {
        let body = StatusUpdateRequest {
            status: status.as_str(),
            notes,
        };
        self.post(
            &format!("/admin/lab-orders/{}/status", percent_encode(order_id)),
            Some(&body),
        )
        .await
    }

    // ========================================
    // Dashboard
    // ========================================

    pub async fn dashboard_stats(&self) -> ApiResponse<DashboardStats> {
        self.get("/admin/dashboard/stats").await
    }
}
