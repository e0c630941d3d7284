//! Wire DTOs for the booking API.
//!
//! # Design
//! These types mirror the backend's JSON but are defined independently from
//! the mock-server crate; integration tests catch schema drift. Fields the
//! backend sometimes omits are `#[serde(default)]` so a sparse payload still
//! parses.

use serde::{Deserialize, Serialize};

use crate::role::{resolve_role, Role};

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Cached user profile, persisted under `userInfo`.
///
/// Fields this crate does not model are kept in `extra` so the blob
/// survives a read/write cycle unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personal_phone_number: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderProfile>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl UserInfo {
    pub fn role(&self) -> Role {
        resolve_role(&self.roles)
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

/// Provider-specific part of a user profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderProfile {
    pub id: u64,
    pub ced: String,
    pub contact_email: String,
    pub phone_number: String,
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    pub experience_years: u32,
    pub schedule_type: bool,
    pub likes: u32,
    pub img: Option<String>,
    pub services: u32,
}

/// `{success, message, data}` wrapper the profile endpoints answer with.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    pub data: UserInfo,
}

/// Partial profile update; unset fields are omitted from the body.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personal_phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_password_confirmation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ced: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience_years: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule_type: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub services: Option<u32>,
}

// ---------------------------------------------------------------------------
// Appointments
// ---------------------------------------------------------------------------

/// Server-side appointment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl AppointmentStatus {
    /// Display text written locally after a confirm or cancel succeeds.
    pub fn label(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "Pendiente",
            AppointmentStatus::Confirmed => "Confirmada",
            AppointmentStatus::Cancelled => "Cancelada",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentClient {
    pub id: u64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentProvider {
    pub id: u64,
    #[serde(default)]
    pub user_id: u64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub experience_years: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedRef {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSubcategory {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub category_id: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentService {
    pub subcategory: ServiceSubcategory,
    pub category: NamedRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentSchedule {
    pub id: u64,
    #[serde(default)]
    pub day: String,
    #[serde(default)]
    pub hours_per_session: u32,
}

/// An appointment exactly as the backend returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentRecord {
    pub id: u64,
    /// `YYYY-MM-DD`, possibly followed by a `T...` time part.
    pub appointment_date: String,
    #[serde(default)]
    pub start_at: String,
    #[serde(default)]
    pub end_at: String,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    pub client: AppointmentClient,
    pub provider: AppointmentProvider,
    pub service: AppointmentService,
    pub schedule: AppointmentSchedule,
    #[serde(default)]
    pub status_text: String,
    #[serde(default)]
    pub formatted_date: String,
    #[serde(default)]
    pub formatted_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_id: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderInfo {
    pub user_id: u64,
    pub provider_id: u64,
}

/// Body of `GET /appointments/provider/user/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProviderAppointmentsPayload {
    pub appointments: Vec<AppointmentRecord>,
    pub provider_info: ProviderInfo,
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subcategory {
    pub id: u64,
    pub category_id: u64,
    pub name: String,
    #[serde(default)]
    pub img: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub subcategories: Vec<Subcategory>,
}

// ---------------------------------------------------------------------------
// Providers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Coordinates arrive as strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderData {
    pub user_id: u64,
    #[serde(default)]
    pub ced: String,
    #[serde(default)]
    pub contact_email: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub long: String,
    #[serde(default)]
    pub lat: String,
    #[serde(default)]
    pub experience_years: u32,
    #[serde(default)]
    pub schedule_type: i64,
    #[serde(default)]
    pub likes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSubcategory {
    pub id: u64,
    pub category_id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub user: ProviderUser,
    pub provider: ProviderData,
    pub subcategory: ProviderSubcategory,
    pub category: NamedRef,
    #[serde(default)]
    pub role: Vec<String>,
}

impl Provider {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.user.first_name, self.user.last_name)
    }

    /// Parsed coordinates, if both strings are valid numbers.
    pub fn coordinates(&self) -> Option<UserLocation> {
        let latitude = self.provider.lat.trim().parse().ok()?;
        let longitude = self.provider.long.trim().parse().ok()?;
        Some(UserLocation {
            latitude,
            longitude,
        })
    }
}

/// Filters for the category search endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProviderFilters {
    pub category_id: Option<u64>,
    pub subcategory_id: Option<u64>,
}

/// Body of `POST /providers/geo-search`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoSearchParams {
    pub long: f64,
    pub lat: f64,
    pub range_km: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategories_id: Option<Vec<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience_years: Option<u32>,
}

impl GeoSearchParams {
    pub fn around(location: UserLocation, range_km: f64) -> Self {
        Self {
            long: location.longitude,
            lat: location.latitude,
            range_km,
            subcategories_id: None,
            experience_years: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientRegistration {
    pub first_name: String,
    pub last_name: String,
    pub cedula: String,
    pub email: String,
    pub personal_phone_number: String,
    pub password: String,
    pub password_confirmation: String,
}

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UserLocation {
    pub latitude: f64,
    pub longitude: f64,
}
