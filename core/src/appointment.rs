//! View-friendly appointment shapes.
//!
//! The backend returns nested `AppointmentRecord`s; the view layer wants one
//! flat row per appointment, and which row it wants depends on who is
//! looking. Clients see the provider, providers see the client.

use serde::Serialize;

use crate::types::{AppointmentRecord, AppointmentStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientAppointment {
    pub id: u64,
    pub date: String,
    pub time: String,
    pub service_type: String,
    pub service_name: String,
    pub location: String,
    /// Display text; mirrors the server's `status_text` until a local action.
    pub status: String,
    pub state: AppointmentStatus,
    pub provider_name: String,
    pub formatted_date: String,
    pub formatted_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderAppointment {
    pub id: u64,
    pub date: String,
    pub time: String,
    pub service_type: String,
    pub service_name: String,
    pub location: String,
    pub status: String,
    pub state: AppointmentStatus,
    pub client_name: String,
    pub client_email: String,
    pub formatted_date: String,
    pub formatted_time: String,
}

/// `"<category> - <subcategory>"`.
fn service_name(record: &AppointmentRecord) -> String {
    format!(
        "{} - {}",
        record.service.category.name, record.service.subcategory.name
    )
}

/// Strip any time part from an ISO date.
fn date_only(raw: &str) -> String {
    raw.split('T').next().unwrap_or(raw).to_string()
}

impl From<&AppointmentRecord> for ClientAppointment {
    fn from(record: &AppointmentRecord) -> Self {
        Self {
            id: record.id,
            date: date_only(&record.appointment_date),
            time: record.formatted_time.clone(),
            service_type: record.service.category.name.clone(),
            service_name: service_name(record),
            location: record.provider.location.clone(),
            status: record.status_text.clone(),
            state: record.status,
            provider_name: record.provider.full_name.clone(),
            formatted_date: record.formatted_date.clone(),
            formatted_time: record.formatted_time.clone(),
        }
    }
}

impl From<&AppointmentRecord> for ProviderAppointment {
    fn from(record: &AppointmentRecord) -> Self {
        Self {
            id: record.id,
            date: date_only(&record.appointment_date),
            time: record.formatted_time.clone(),
            service_type: record.service.category.name.clone(),
            service_name: service_name(record),
            location: record.provider.location.clone(),
            status: record.status_text.clone(),
            state: record.status,
            client_name: record.client.full_name.clone(),
            client_email: record.client.email.clone(),
            formatted_date: record.formatted_date.clone(),
            formatted_time: record.formatted_time.clone(),
        }
    }
}

/// Either view shape; disjoint by viewer role.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Appointment {
    Client(ClientAppointment),
    Provider(ProviderAppointment),
}

impl Appointment {
    pub fn id(&self) -> u64 {
        match self {
            Appointment::Client(a) => a.id,
            Appointment::Provider(a) => a.id,
        }
    }

    pub fn status(&self) -> &str {
        match self {
            Appointment::Client(a) => &a.status,
            Appointment::Provider(a) => &a.status,
        }
    }

    pub fn state(&self) -> AppointmentStatus {
        match self {
            Appointment::Client(a) => a.state,
            Appointment::Provider(a) => a.state,
        }
    }

    /// Client name, present only on provider-side rows.
    pub fn client_name(&self) -> Option<&str> {
        match self {
            Appointment::Client(_) => None,
            Appointment::Provider(a) => Some(&a.client_name),
        }
    }

    /// Set both the status code and its display text.
    pub fn set_status(&mut self, state: AppointmentStatus) {
        let (slot, text) = match self {
            Appointment::Client(a) => (&mut a.state, &mut a.status),
            Appointment::Provider(a) => (&mut a.state, &mut a.status),
        };
        *slot = state;
        *text = state.label().to_string();
    }
}

impl From<ClientAppointment> for Appointment {
    fn from(a: ClientAppointment) -> Self {
        Appointment::Client(a)
    }
}

impl From<ProviderAppointment> for Appointment {
    fn from(a: ProviderAppointment) -> Self {
        Appointment::Provider(a)
    }
}
