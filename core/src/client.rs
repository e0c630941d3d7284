//! Stateless HTTP request builder and response parser for the booking API.
//!
//! # Design
//! `BookingClient` holds only a `base_url` and carries no mutable state
//! between calls. Each endpoint is split into a `build_*` method that
//! produces an `HttpRequest` and a `parse_*` method that consumes an
//! `HttpResponse`. Authenticated builders take the bearer token as an
//! argument; resolving it is the caller's job.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{check_status, ApiError, StatusMessages};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    AppointmentRecord, AppointmentStatus, Category, ClientRegistration, GeoSearchParams,
    ProfileResponse, ProfileUpdate, Provider, ProviderAppointmentsPayload, ProviderFilters,
    UserInfo,
};

const APPOINTMENT_LIST: StatusMessages = StatusMessages::GENERIC
    .forbidden("You do not have permission to view these appointments.");

const PROVIDER_BY_USER: StatusMessages = APPOINTMENT_LIST
    .not_found("User not found.")
    .bad_request("The user is not a valid provider.");

const CONFIRM: StatusMessages = StatusMessages::GENERIC
    .forbidden("You do not have permission to confirm this appointment.")
    .not_found("Appointment not found.");

const CANCEL: StatusMessages = StatusMessages::GENERIC
    .forbidden("You do not have permission to cancel this appointment.")
    .not_found("Appointment not found.");

const PROVIDER_LOOKUP: StatusMessages = StatusMessages::GENERIC.not_found("Provider not found.");

const REGISTRATION_FAILED: &str = "Client registration failed.";

/// Path segment the category search expects when no subcategory is chosen.
const ANY_SUBCATEGORY: &str = "null";

/// Synchronous, stateless client for the booking API.
#[derive(Debug, Clone)]
pub struct BookingClient {
    base_url: String,
}

impl BookingClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: HttpMethod, path: &str, token: Option<&str>) -> HttpRequest {
        let mut headers = vec![
            ("accept".to_string(), "application/json".to_string()),
            ("content-type".to_string(), "application/json".to_string()),
        ];
        if let Some(token) = token {
            headers.push(("authorization".to_string(), format!("Bearer {token}")));
        }
        HttpRequest {
            method,
            path: format!("{}{path}", self.base_url),
            headers,
            body: None,
        }
    }

    fn request_with_body<B: Serialize>(
        &self,
        method: HttpMethod,
        path: &str,
        token: Option<&str>,
        body: &B,
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(body).map_err(|e| ApiError::Serialization(e.to_string()))?;
        let mut req = self.request(method, path, token);
        req.body = Some(body);
        Ok(req)
    }

    // --- appointments ---

    pub fn build_client_appointments(&self, token: &str, client_id: u64) -> HttpRequest {
        self.request(
            HttpMethod::Get,
            &format!("/appointments/client/all/{client_id}"),
            Some(token),
        )
    }

    pub fn build_client_appointments_with_status(
        &self,
        token: &str,
        status: AppointmentStatus,
    ) -> HttpRequest {
        self.request(
            HttpMethod::Get,
            &format!("/appointments/client/{}", status_segment(status)),
            Some(token),
        )
    }

    pub fn build_provider_appointments(&self, token: &str, user_id: u64) -> HttpRequest {
        self.request(
            HttpMethod::Get,
            &format!("/appointments/provider/user/{user_id}"),
            Some(token),
        )
    }

    pub fn build_provider_appointments_with_status(
        &self,
        token: &str,
        status: AppointmentStatus,
    ) -> HttpRequest {
        self.request(
            HttpMethod::Get,
            &format!("/appointments/provider/{}", status_segment(status)),
            Some(token),
        )
    }

    pub fn build_confirm_appointment(&self, token: &str, id: u64) -> HttpRequest {
        self.request(
            HttpMethod::Patch,
            &format!("/appointments/{id}/confirm"),
            Some(token),
        )
    }

    pub fn build_cancel_appointment(&self, token: &str, id: u64) -> HttpRequest {
        self.request(
            HttpMethod::Patch,
            &format!("/appointments/{id}/cancel"),
            Some(token),
        )
    }

    pub fn parse_appointments(
        &self,
        response: HttpResponse,
    ) -> Result<Vec<AppointmentRecord>, ApiError> {
        check_status(&response, &APPOINTMENT_LIST)?;
        decode(&response.body)
    }

    pub fn parse_provider_appointments(
        &self,
        response: HttpResponse,
    ) -> Result<ProviderAppointmentsPayload, ApiError> {
        check_status(&response, &PROVIDER_BY_USER)?;
        decode(&response.body)
    }

    pub fn parse_confirm_appointment(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, &CONFIRM)?;
        decode::<serde_json::Value>(&response.body).map(|_| ())
    }

    pub fn parse_cancel_appointment(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, &CANCEL)?;
        decode::<serde_json::Value>(&response.body).map(|_| ())
    }

    // --- categories ---

    pub fn build_categories(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/categories", None)
    }

    pub fn parse_categories(&self, response: HttpResponse) -> Result<Vec<Category>, ApiError> {
        check_status(&response, &StatusMessages::GENERIC)?;
        decode(&response.body)
    }

    // --- providers ---

    pub fn build_providers(&self, filters: &ProviderFilters) -> Result<HttpRequest, ApiError> {
        let category = filters.category_id.ok_or_else(|| {
            ApiError::Validation(vec!["A category is required to search providers.".into()])
        })?;
        let subcategory = filters
            .subcategory_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| ANY_SUBCATEGORY.to_string());
        Ok(self.request(
            HttpMethod::Get,
            &format!("/providers/category-search/{category}/{subcategory}"),
            None,
        ))
    }

    pub fn build_provider(&self, id: u64) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/providers/{id}"), None)
    }

    /// Accepts a bare array or an object carrying `providers` or `data`.
    pub fn parse_providers(&self, response: HttpResponse) -> Result<Vec<Provider>, ApiError> {
        check_status(&response, &StatusMessages::GENERIC)?;
        let mut value: serde_json::Value = decode(&response.body)?;
        let list = if value.is_array() {
            value
        } else {
            ["providers", "data"]
                .iter()
                .find_map(|key| value.get_mut(*key).filter(|v| v.is_array()).map(serde_json::Value::take))
                .unwrap_or_else(|| serde_json::Value::Array(Vec::new()))
        };
        serde_json::from_value(list).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    pub fn parse_provider(&self, response: HttpResponse) -> Result<Provider, ApiError> {
        check_status(&response, &PROVIDER_LOOKUP)?;
        decode(&response.body)
    }

    // --- geo search ---

    pub fn build_geo_search(&self, params: &GeoSearchParams) -> Result<HttpRequest, ApiError> {
        self.request_with_body(HttpMethod::Post, "/providers/geo-search", None, params)
    }

    /// A `null` body is an empty result.
    pub fn parse_geo_search(&self, response: HttpResponse) -> Result<Vec<Provider>, ApiError> {
        check_status(&response, &StatusMessages::GENERIC)?;
        let providers: Option<Vec<Provider>> = decode(&response.body)?;
        Ok(providers.unwrap_or_default())
    }

    // --- registration ---

    pub fn build_register_client(
        &self,
        input: &ClientRegistration,
    ) -> Result<HttpRequest, ApiError> {
        self.request_with_body(HttpMethod::Post, "/register/client", None, input)
    }

    pub fn parse_register_client(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, &StatusMessages::GENERIC).map_err(|err| match err {
            ApiError::BadRequest(_) | ApiError::Http { .. } => ApiError::BadRequest(
                server_message(&response.body).unwrap_or_else(|| REGISTRATION_FAILED.to_string()),
            ),
            other => other,
        })
    }

    // --- profile & session ---

    pub fn build_logout(&self, token: &str) -> HttpRequest {
        self.request(HttpMethod::Post, "/logout", Some(token))
    }

    pub fn build_profile(&self, token: &str) -> HttpRequest {
        self.request(HttpMethod::Get, "/profile", Some(token))
    }

    pub fn build_update_profile(
        &self,
        token: &str,
        update: &ProfileUpdate,
    ) -> Result<HttpRequest, ApiError> {
        self.request_with_body(HttpMethod::Put, "/profile", Some(token), update)
    }

    pub fn parse_logout(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, &StatusMessages::GENERIC)
    }

    /// Non-401 failures surface the server's own `message` when it sent one.
    pub fn parse_profile(&self, response: HttpResponse) -> Result<UserInfo, ApiError> {
        check_status(&response, &StatusMessages::GENERIC).map_err(|err| match err {
            ApiError::Unauthorized => ApiError::Unauthorized,
            other => server_message(&response.body)
                .map(ApiError::BadRequest)
                .unwrap_or(other),
        })?;
        let wrapped: ProfileResponse = decode(&response.body)?;
        Ok(wrapped.data)
    }
}

fn status_segment(status: AppointmentStatus) -> &'static str {
    match status {
        AppointmentStatus::Pending => "pending",
        AppointmentStatus::Confirmed => "confirmed",
        AppointmentStatus::Cancelled => "cancelled",
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

/// The `message` field of a JSON error body, if any.
fn server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .and_then(|m| m.as_str())
        .filter(|m| !m.trim().is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appointment::tests::record_json;

    fn client() -> BookingClient {
        BookingClient::new("http://localhost:8000/api")
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn authenticated_request_carries_bearer_and_json_headers() {
        let req = client().build_client_appointments("tok", 5);
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "http://localhost:8000/api/appointments/client/all/5");
        assert_eq!(req.header("Authorization"), Some("Bearer tok"));
        assert_eq!(req.header("accept"), Some("application/json"));
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert!(req.is_authenticated());
        assert!(req.body.is_none());
    }

    #[test]
    fn public_request_has_no_authorization() {
        let req = client().build_categories();
        assert_eq!(req.path, "http://localhost:8000/api/categories");
        assert!(req.header("authorization").is_none());
        assert!(!req.is_authenticated());
    }

    #[test]
    fn status_filtered_paths() {
        let c = client();
        assert!(c
            .build_client_appointments_with_status("t", AppointmentStatus::Pending)
            .path
            .ends_with("/appointments/client/pending"));
        assert!(c
            .build_provider_appointments_with_status("t", AppointmentStatus::Cancelled)
            .path
            .ends_with("/appointments/provider/cancelled"));
        assert!(c
            .build_provider_appointments("t", 7)
            .path
            .ends_with("/appointments/provider/user/7"));
    }

    #[test]
    fn confirm_and_cancel_are_patch() {
        let c = client();
        let req = c.build_confirm_appointment("t", 42);
        assert_eq!(req.method, HttpMethod::Patch);
        assert!(req.path.ends_with("/appointments/42/confirm"));
        let req = c.build_cancel_appointment("t", 42);
        assert_eq!(req.method, HttpMethod::Patch);
        assert!(req.path.ends_with("/appointments/42/cancel"));
    }

    #[test]
    fn providers_path_requires_category() {
        let c = client();
        let err = c.build_providers(&ProviderFilters::default()).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let req = c
            .build_providers(&ProviderFilters {
                category_id: Some(1),
                subcategory_id: Some(3),
            })
            .unwrap();
        assert!(req.path.ends_with("/providers/category-search/1/3"));

        let req = c
            .build_providers(&ProviderFilters {
                category_id: Some(1),
                subcategory_id: None,
            })
            .unwrap();
        assert!(req.path.ends_with("/providers/category-search/1/null"));
    }

    #[test]
    fn geo_search_body() {
        let params = GeoSearchParams {
            long: -85.4,
            lat: 10.6,
            range_km: 30.0,
            subcategories_id: Some(vec![3, 4]),
            experience_years: Some(2),
        };
        let req = client().build_geo_search(&params).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert!(req.path.ends_with("/providers/geo-search"));
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["subcategories_id"], serde_json::json!([3, 4]));
        assert_eq!(body["experience_years"], 2);
    }

    #[test]
    fn update_profile_omits_unset_fields() {
        let update = ProfileUpdate {
            first_name: Some("Ana".into()),
            ..ProfileUpdate::default()
        };
        let req = client().build_update_profile("t", &update).unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"first_name": "Ana"}));
    }

    #[test]
    fn parse_appointments_success() {
        let body = serde_json::json!([record_json(1, "pending", "Pendiente")]).to_string();
        let list = client().parse_appointments(response(200, &body)).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].status, AppointmentStatus::Pending);
    }

    #[test]
    fn parse_provider_appointments_errors_are_specific() {
        let c = client();
        let err = c.parse_provider_appointments(response(404, "")).unwrap_err();
        assert_eq!(err.to_string(), "User not found.");
        let err = c.parse_provider_appointments(response(400, "")).unwrap_err();
        assert_eq!(err.to_string(), "The user is not a valid provider.");
        let err = c.parse_provider_appointments(response(403, "")).unwrap_err();
        assert_eq!(err.to_string(), "You do not have permission to view these appointments.");
    }

    #[test]
    fn parse_provider_appointments_missing_fields_default() {
        let payload = client()
            .parse_provider_appointments(response(200, "{}"))
            .unwrap();
        assert!(payload.appointments.is_empty());
        assert_eq!(payload.provider_info.provider_id, 0);
    }

    #[test]
    fn parse_confirm_schema_defect() {
        let err = client()
            .parse_confirm_appointment(response(500, "Unknown column 'services' in 'field list'"))
            .unwrap_err();
        assert!(matches!(err, ApiError::SchemaOutdated));
    }

    #[test]
    fn parse_providers_accepts_wrapped_shapes() {
        let provider = serde_json::json!({
            "user": {"first_name": "Luis", "last_name": "Vega", "email": "l@v.cr"},
            "provider": {"user_id": 9},
            "subcategory": {"id": 3, "category_id": 1, "name": "Redes"},
            "category": {"id": 1, "name": "Informática"}
        });
        let c = client();
        for body in [
            serde_json::json!([provider.clone()]),
            serde_json::json!({"providers": [provider.clone()]}),
            serde_json::json!({"data": [provider.clone()], "pagination": {"current_page": 1}}),
        ] {
            let list = c.parse_providers(response(200, &body.to_string())).unwrap();
            assert_eq!(list.len(), 1);
        }
        let list = c.parse_providers(response(200, r#"{"other":1}"#)).unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn parse_geo_search_null_is_empty() {
        let list = client().parse_geo_search(response(200, "null")).unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn parse_register_surfaces_server_message() {
        let c = client();
        assert!(c.parse_register_client(response(201, "{}")).is_ok());
        let err = c
            .parse_register_client(response(422, r#"{"message":"The email has already been taken."}"#))
            .unwrap_err();
        assert_eq!(err.to_string(), "The email has already been taken.");
        let err = c.parse_register_client(response(422, "")).unwrap_err();
        assert_eq!(err.to_string(), "Client registration failed.");
    }

    #[test]
    fn parse_profile_unwraps_data() {
        let body = r#"{"success":true,"message":"ok","data":{"id":5,"roles":["Provider"]}}"#;
        let info = client().parse_profile(response(200, body)).unwrap();
        assert_eq!(info.id, Some(5));
        let err = client().parse_profile(response(401, "")).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let client = BookingClient::new("http://localhost:8000/api/");
        let req = client.build_categories();
        assert_eq!(req.path, "http://localhost:8000/api/categories");
    }

    #[test]
    fn parse_categories_bad_json() {
        let err = client().parse_categories(response(200, "not json")).unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }
}
