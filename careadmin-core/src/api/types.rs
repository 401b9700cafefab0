//! Admin API payload types
//!
//! Payloads are passed through unvalidated: identifiers default to empty,
//! everything else is optional, and unknown fields land in `extra`.
//! Field names use serde rename to match the API's camelCase format.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Provider id the booking flow stores on appointments nobody has picked up yet
pub const UNASSIGNED_PROVIDER_ID: &str = "QUICK_BOOK";

/// Treats an explicit `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Declares a status vocabulary with a catch-all for values this client does not know
macro_rules! status_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $($variant,)+
            /// Value not known to this client, kept verbatim
            Other(String),
        }

        impl $name {
            /// Every known value, in display order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire value
            pub fn as_str(&self) -> &str {
                match self {
                    $($name::$variant => $wire,)+
                    $name::Other(value) => value,
                }
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                match value {
                    $($wire => $name::$variant,)+
                    other => $name::Other(other.to_string()),
                }
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                $name::from(value.as_str())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.as_str().to_string()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

status_enum!(
    /// Provider verification state
    VerificationStatus {
        Pending => "pending",
        Verified => "verified",
        Rejected => "rejected",
    }
);

status_enum!(
    /// Appointment lifecycle state
    AppointmentStatus {
        Pending => "pending",
        PendingAssignment => "pending_assignment",
        Confirmed => "confirmed",
        InProgress => "in-progress",
        Completed => "completed",
        Cancelled => "cancelled",
        CancellationRequested => "cancellation_requested",
        NoShow => "no-show",
    }
);

status_enum!(
    /// Lab order lifecycle state
    LabOrderStatus {
        Pending => "pending",
        Confirmed => "confirmed",
        SampleCollected => "sample_collected",
        Processing => "processing",
        Completed => "completed",
        Cancelled => "cancelled",
    }
);

/// Provider summary from the pending list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    #[serde(default, deserialize_with = "null_as_default")]
    pub provider_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub provider_type: Option<String>,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default)]
    pub license_number: Option<String>,
    #[serde(default)]
    pub document_count: Option<u32>,
    #[serde(default)]
    pub profile_photo_url: Option<String>,
    #[serde(default)]
    pub verification_status: Option<VerificationStatus>,
    #[serde(default)]
    pub submitted_at: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Uploaded verification document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderDocument {
    #[serde(rename = "type", default)]
    pub doc_type: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub s3_key: Option<String>,
    #[serde(default)]
    pub uploaded_at: Option<String>,
    /// Pre-signed download URL
    #[serde(default)]
    pub signed_url: Option<String>,
    /// Set by the API when signing the URL failed
    #[serde(default)]
    pub error: Option<String>,
}

/// Full provider record with documents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderDetails {
    #[serde(default, deserialize_with = "null_as_default")]
    pub provider_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub provider_type: Option<String>,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default)]
    pub experience: Option<f64>,
    #[serde(default)]
    pub license_number: Option<String>,
    #[serde(default)]
    pub qualification: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub documents: Vec<ProviderDocument>,
    #[serde(default)]
    pub profile_photo_url: Option<String>,
    #[serde(default)]
    pub profile_photo_signed_url: Option<String>,
    #[serde(default)]
    pub verification_status: Option<VerificationStatus>,
    /// 1 when the provider accepts bookings
    #[serde(default)]
    pub is_available: Option<i64>,
    #[serde(default)]
    pub consultation_fee: Option<f64>,
    #[serde(default)]
    pub home_visit_fee: Option<f64>,
    #[serde(default)]
    pub submitted_at: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Account profile linked to a provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_id: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// "patient" or "provider"
    #[serde(default)]
    pub user_type: Option<String>,
    #[serde(default)]
    pub provider_id: Option<String>,
    #[serde(default)]
    pub provider_type: Option<String>,
    #[serde(default)]
    pub verification_status: Option<String>,
    #[serde(default)]
    pub onboarding_completed: Option<bool>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Patient booking
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    #[serde(default, deserialize_with = "null_as_default")]
    pub appointment_id: String,
    #[serde(default)]
    pub status: Option<AppointmentStatus>,
    #[serde(default)]
    pub patient_id: Option<String>,
    #[serde(default)]
    pub patient_name: Option<String>,
    #[serde(default)]
    pub patient_phone: Option<String>,
    #[serde(default)]
    pub provider_id: Option<String>,
    #[serde(default)]
    pub provider_name: Option<String>,
    #[serde(default)]
    pub provider_type: Option<String>,
    #[serde(default)]
    pub consultation_type: Option<String>,
    #[serde(default)]
    pub consultation_fee: Option<f64>,
    #[serde(default)]
    pub appointment_date: Option<String>,
    #[serde(default)]
    pub appointment_time: Option<String>,
    #[serde(default)]
    pub booked_by: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub admin_notes: Option<String>,
    #[serde(default)]
    pub assigned_at: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub updated_by: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Appointment {
    /// Booked without a provider and waiting for an admin to assign one
    pub fn is_unassigned(&self) -> bool {
        self.provider_id.as_deref() == Some(UNASSIGNED_PROVIDER_ID)
    }
}

/// Lab test order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabOrder {
    #[serde(default, deserialize_with = "null_as_default")]
    pub order_id: String,
    #[serde(default)]
    pub status: Option<LabOrderStatus>,
    #[serde(default)]
    pub patient_name: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_phone: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub test_names: Vec<String>,
    #[serde(default)]
    pub total_amount: Option<f64>,
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub collection_type: Option<String>,
    #[serde(default)]
    pub preferred_date: Option<String>,
    #[serde(default)]
    pub address: Option<Value>,
    #[serde(default)]
    pub admin_notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub updated_by: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Headline numbers for the dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    #[serde(default)]
    pub new_signups: Option<u64>,
    #[serde(default)]
    pub pending_providers: Option<u64>,
    #[serde(default)]
    pub lab_bookings: Option<u64>,
    #[serde(default)]
    pub total_appointments: Option<u64>,
    #[serde(default)]
    pub revenue_today: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `GET /admin/providers/pending`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PendingProviders {
    #[serde(default, deserialize_with = "null_as_default")]
    pub providers: Vec<Provider>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub count: usize,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `GET /admin/providers`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderList {
    #[serde(default, deserialize_with = "null_as_default")]
    pub providers: Vec<ProviderDetails>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub count: usize,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `GET /admin/providers/{providerId}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderDetailsResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub provider: ProviderDetails,
    #[serde(default)]
    pub user_profile: Option<UserProfile>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `GET /admin/appointments`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppointmentList {
    #[serde(default, deserialize_with = "null_as_default")]
    pub appointments: Vec<Appointment>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub count: usize,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `GET /admin/lab-orders`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabOrderList {
    #[serde(default, deserialize_with = "null_as_default")]
    pub lab_orders: Vec<LabOrder>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub count: usize,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `POST /admin/providers/{providerId}/reject`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectProviderRequest<'a> {
    pub reason: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<&'a str>,
}

/// `POST /admin/appointments/{id}/status` and `/admin/lab-orders/{id}/status`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusUpdateRequest<'a> {
    pub status: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<&'a str>,
}

/// `POST /admin/appointments/{id}/assign`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignProviderRequest<'a> {
    pub provider_id: &'a str,
}
