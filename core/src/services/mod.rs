//! Async resource clients.
//!
//! Each service pairs a `BookingClient` build/parse call with an
//! `HttpTransport` round-trip and returns an `Envelope`. Services never
//! return a bare error: every failure, including a missing session, comes
//! back as `Envelope { success: false, .. }`.

pub mod appointments;
pub mod categories;
pub mod geo_search;
pub mod profile;
pub mod providers;
pub mod register;

use std::sync::Arc;

use crate::client::BookingClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::session::Session;
use crate::transport::HttpTransport;

pub use appointments::AppointmentService;
pub use categories::CategoryService;
pub use geo_search::GeoSearchService;
pub use profile::ProfileService;
pub use providers::ProviderService;
pub use register::RegisterService;

/// Shared plumbing for the services: request builder, transport and session.
#[derive(Clone)]
pub struct Api {
    client: BookingClient,
    transport: Arc<dyn HttpTransport>,
    session: Arc<Session>,
}

impl Api {
    pub fn new(config: &ClientConfig, transport: Arc<dyn HttpTransport>, session: Arc<Session>) -> Self {
        Self {
            client: BookingClient::new(&config.base_url),
            transport,
            session,
        }
    }

    pub fn client(&self) -> &BookingClient {
        &self.client
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub(crate) fn token(&self) -> Result<String, ApiError> {
        self.session.token().ok_or(ApiError::MissingToken)
    }

    /// Execute `request`. A 401 on an authenticated request signs the
    /// session out before the response is handed back for parsing.
    pub(crate) async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let authenticated = request.is_authenticated();
        let response = self.transport.execute(request).await?;
        if response.status == 401 && authenticated {
            tracing::warn!("token rejected by server, signing out");
            self.session.sign_out();
        }
        Ok(response)
    }
}

/// Every service in one bundle, sharing one `Api`.
#[derive(Clone)]
pub struct Services {
    pub appointments: AppointmentService,
    pub categories: CategoryService,
    pub providers: ProviderService,
    pub geo_search: GeoSearchService,
    pub register: RegisterService,
    pub profile: ProfileService,
}

impl Services {
    pub fn new(api: Api) -> Self {
        Self {
            appointments: AppointmentService::new(api.clone()),
            categories: CategoryService::new(api.clone()),
            providers: ProviderService::new(api.clone()),
            geo_search: GeoSearchService::new(api.clone()),
            register: RegisterService::new(api.clone()),
            profile: ProfileService::new(api),
        }
    }
}
