//! Appointment lists and status changes for clients and providers.
//!
//! # Design
//! Lists are reshaped into flat view rows before they leave this module.
//! The caller's id comes from the session unless one is passed in, and a
//! missing user fails before any request is built.

use crate::appointment::{ClientAppointment, ProviderAppointment};
use crate::envelope::Envelope;
use crate::error::ApiError;
use crate::services::Api;
use crate::types::{AppointmentRecord, AppointmentStatus};

/// Appointments as seen by clients and providers.
#[derive(Clone)]
pub struct AppointmentService {
    api: Api,
}

impl AppointmentService {
    pub fn new(api: Api) -> Self {
        Self { api }
    }

    /// All appointments of `client_id`, or of the stored user when `None`.
    pub async fn client_appointments(
        &self,
        client_id: Option<u64>,
    ) -> Envelope<Vec<ClientAppointment>> {
        let result = self.fetch_client_appointments(client_id).await;
        Envelope::from_result(reshape(result), "Appointments retrieved successfully")
    }

    async fn fetch_client_appointments(
        &self,
        client_id: Option<u64>,
    ) -> Result<Vec<AppointmentRecord>, ApiError> {
        let client_id = match client_id {
            Some(id) => id,
            None => self.stored_user_id()?,
        };
        let token = self.api.token()?;
        let req = self.api.client().build_client_appointments(&token, client_id);
        let resp = self.api.send(req).await?;
        self.api.client().parse_appointments(resp)
    }

    /// The authenticated client's appointments in one status.
    pub async fn client_appointments_with_status(
        &self,
        status: AppointmentStatus,
    ) -> Envelope<Vec<ClientAppointment>> {
        let result = async {
            let token = self.api.token()?;
            let req = self
                .api
                .client()
                .build_client_appointments_with_status(&token, status);
            let resp = self.api.send(req).await?;
            self.api.client().parse_appointments(resp)
        }
        .await;
        Envelope::from_result(
            reshape(result),
            format!("{} appointments retrieved successfully", status_word(status)),
        )
    }

    pub async fn client_pending(&self) -> Envelope<Vec<ClientAppointment>> {
        self.client_appointments_with_status(AppointmentStatus::Pending)
            .await
    }

    pub async fn client_confirmed(&self) -> Envelope<Vec<ClientAppointment>> {
        self.client_appointments_with_status(AppointmentStatus::Confirmed)
            .await
    }

    pub async fn client_cancelled(&self) -> Envelope<Vec<ClientAppointment>> {
        self.client_appointments_with_status(AppointmentStatus::Cancelled)
            .await
    }

    /// All appointments of the stored user acting as a provider.
    pub async fn provider_appointments(&self) -> Envelope<Vec<ProviderAppointment>> {
        let result = async {
            let user_id = self.stored_user_id()?;
            let token = self.api.token()?;
            let req = self.api.client().build_provider_appointments(&token, user_id);
            let resp = self.api.send(req).await?;
            self.api.client().parse_provider_appointments(resp)
        }
        .await;

        match result {
            Ok(payload) => {
                let count = payload.appointments.len();
                tracing::info!(
                    count,
                    user_id = payload.provider_info.user_id,
                    provider_id = payload.provider_info.provider_id,
                    "provider appointments retrieved"
                );
                Envelope::ok(
                    payload.appointments.iter().map(ProviderAppointment::from).collect(),
                    format!("Provider appointments retrieved successfully ({count} found)"),
                )
            }
            Err(err) => Envelope::from_result(Err(err), ""),
        }
    }

    pub async fn provider_appointments_with_status(
        &self,
        status: AppointmentStatus,
    ) -> Envelope<Vec<ProviderAppointment>> {
        let result = async {
            let token = self.api.token()?;
            let req = self
                .api
                .client()
                .build_provider_appointments_with_status(&token, status);
            let resp = self.api.send(req).await?;
            self.api.client().parse_appointments(resp)
        }
        .await;
        Envelope::from_result(
            reshape(result),
            format!(
                "{} provider appointments retrieved successfully",
                status_word(status)
            ),
        )
    }

    pub async fn provider_pending(&self) -> Envelope<Vec<ProviderAppointment>> {
        self.provider_appointments_with_status(AppointmentStatus::Pending)
            .await
    }

    pub async fn provider_confirmed(&self) -> Envelope<Vec<ProviderAppointment>> {
        self.provider_appointments_with_status(AppointmentStatus::Confirmed)
            .await
    }

    pub async fn provider_cancelled(&self) -> Envelope<Vec<ProviderAppointment>> {
        self.provider_appointments_with_status(AppointmentStatus::Cancelled)
            .await
    }

    /// Confirm an appointment. Only providers may do this.
    pub async fn confirm(&self, id: u64) -> Envelope<()> {
        let result = async {
            let token = self.api.token()?;
            let req = self.api.client().build_confirm_appointment(&token, id);
            let resp = self.api.send(req).await?;
            self.api.client().parse_confirm_appointment(resp)
        }
        .await;
        Envelope::from_result(result, "Appointment confirmed successfully")
    }

    pub async fn cancel(&self, id: u64) -> Envelope<()> {
        let result = async {
            let token = self.api.token()?;
            let req = self.api.client().build_cancel_appointment(&token, id);
            let resp = self.api.send(req).await?;
            self.api.client().parse_cancel_appointment(resp)
        }
        .await;
        Envelope::from_result(result, "Appointment cancelled successfully")
    }

    fn stored_user_id(&self) -> Result<u64, ApiError> {
        let info = self.api.session().user_info().ok_or(ApiError::MissingUser)?;
        info.id.ok_or(ApiError::MissingUser)
    }
}

fn reshape<T: for<'a> From<&'a AppointmentRecord>>(
    result: Result<Vec<AppointmentRecord>, ApiError>,
) -> Result<Vec<T>, ApiError> {
    result.map(|records| records.iter().map(T::from).collect())
}

fn status_word(status: AppointmentStatus) -> &'static str {
    match status {
        AppointmentStatus::Pending => "Pending",
        AppointmentStatus::Confirmed => "Confirmed",
        AppointmentStatus::Cancelled => "Cancelled",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appointment::tests::record_json;
    use crate::events::SessionEvent;
    use crate::http::HttpMethod;
    use crate::services::testing::{api, BASE};
    use crate::types::UserInfo;

    fn login(session: &crate::session::Session, id: u64, roles: &[&str]) {
        let info = UserInfo {
            id: Some(id),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            ..UserInfo::default()
        };
        session.complete_login("tok", &info).unwrap();
    }

    #[tokio::test]
    async fn client_appointments_use_cached_user_id() {
        let (api, transport, session) = api();
        login(&session, 5, &["Client"]);
        transport.reply(
            200,
            serde_json::json!([record_json(1, "pending", "Pendiente")]).to_string(),
        );

        let env = AppointmentService::new(api).client_appointments(None).await;

        assert!(env.success);
        let list = env.data.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].status, "Pendiente");
        assert_eq!(list[0].service_name, "Informática - Redes");
        assert_eq!(
            transport.paths(),
            vec![format!("{BASE}/appointments/client/all/5")]
        );
        let req = &transport.requests.lock()[0];
        assert_eq!(req.header("authorization"), Some("Bearer tok"));
    }

    #[tokio::test]
    async fn missing_user_fails_before_any_request() {
        let (api, transport, _session) = api();
        let env = AppointmentService::new(api).client_appointments(None).await;
        assert!(!env.success);
        assert!(!env.message.is_empty());
        assert!(transport.paths().is_empty());
    }

    #[tokio::test]
    async fn explicit_client_id_skips_user_lookup() {
        let (api, transport, session) = api();
        session.set_token("tok").unwrap();
        transport.reply(200, "[]");
        let env = AppointmentService::new(api).client_appointments(Some(9)).await;
        assert!(env.success);
        assert_eq!(env.data.unwrap().len(), 0);
        assert!(transport.paths()[0].ends_with("/appointments/client/all/9"));
    }

    #[tokio::test]
    async fn provider_appointments_unwrap_payload() {
        let (api, transport, session) = api();
        login(&session, 7, &["Provider"]);
        let body = serde_json::json!({
            "appointments": [record_json(1, "pending", "Pendiente"), record_json(2, "confirmed", "Confirmada")],
            "provider_info": {"user_id": 7, "provider_id": 2}
        });
        transport.reply(200, body.to_string());

        let env = AppointmentService::new(api).provider_appointments().await;

        assert!(env.success);
        let list = env.data.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[1].client_name, "Ana Mora");
        assert!(transport.paths()[0].ends_with("/appointments/provider/user/7"));
    }

    #[tokio::test]
    async fn provider_not_found_message() {
        let (api, transport, session) = api();
        login(&session, 7, &["Provider"]);
        transport.reply(404, "");
        let env = AppointmentService::new(api).provider_appointments().await;
        assert!(!env.success);
        assert_eq!(env.message, "User not found.");
    }

    #[tokio::test]
    async fn status_lists_hit_status_paths() {
        let (api, transport, session) = api();
        login(&session, 7, &["Provider"]);
        transport.reply(200, "[]");
        transport.reply(200, "[]");
        let service = AppointmentService::new(api);
        assert!(service.client_confirmed().await.success);
        assert!(service.provider_cancelled().await.success);
        let paths = transport.paths();
        assert!(paths[0].ends_with("/appointments/client/confirmed"));
        assert!(paths[1].ends_with("/appointments/provider/cancelled"));
    }

    #[tokio::test]
    async fn unauthorized_forces_logout() {
        let (api, transport, session) = api();
        login(&session, 5, &["Client"]);
        let mut rx = session.events().subscribe();
        transport.reply(401, "");

        let env = AppointmentService::new(api).client_pending().await;

        assert!(!env.success);
        assert_eq!(env.message, "Session expired. Please log in again.");
        assert!(session.token().is_none());
        assert_eq!(rx.recv().await.unwrap(), SessionEvent::LoggedOut);
    }

    #[tokio::test]
    async fn confirm_patches_and_reports() {
        let (api, transport, session) = api();
        login(&session, 7, &["Provider"]);
        transport.reply(200, r#"{"success":true}"#);
        let env = AppointmentService::new(api).confirm(42).await;
        assert!(env.success);
        assert_eq!(env.message, "Appointment confirmed successfully");
        let req = &transport.requests.lock()[0];
        assert_eq!(req.method, HttpMethod::Patch);
        assert!(req.path.ends_with("/appointments/42/confirm"));
    }

    #[tokio::test]
    async fn network_failure_becomes_envelope() {
        let (api, transport, session) = api();
        login(&session, 7, &["Provider"]);
        transport.fail("connection refused");
        let env = AppointmentService::new(api).cancel(42).await;
        assert!(!env.success);
        assert!(env.message.contains("Check your connection"));
    }
}
