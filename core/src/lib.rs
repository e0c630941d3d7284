//! Client-side access layer for the services marketplace booking API.
//!
//! # Overview
//! `BookingClient` builds `HttpRequest` values and parses `HttpResponse`
//! values without touching the network. The async `services` pair each
//! build/parse with an `HttpTransport` round-trip and hand back an
//! `Envelope`, so callers never see a raw error. `stores` hold the view
//! state a UI binds to and react to `SessionEvent`s.
//!
//! # Design
//! - `Session` is an explicit context (`Arc<Session>`) passed into every
//!   service and store; there is no global state.
//! - Session changes are announced on a typed broadcast channel only after
//!   they are persisted, so listeners reload without waiting.
//! - Roles are derived in one place, `role::resolve_role`.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod appointment;
pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod events;
pub mod geolocation;
pub mod http;
pub mod role;
pub mod services;
pub mod session;
pub mod storage;
pub mod stores;
pub mod transport;
pub mod types;

pub use appointment::{Appointment, ClientAppointment, ProviderAppointment};
pub use client::BookingClient;
pub use config::ClientConfig;
pub use envelope::Envelope;
pub use error::ApiError;
pub use events::{EventBus, SessionEvent};
pub use geolocation::{Geolocator, LocationFix, LocationOrigin, PositionSource};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use role::{resolve_role, Role};
pub use services::{Api, Services};
pub use session::Session;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use stores::{ActionOutcome, AppointmentsStore, CategoriesStore, ProfileActions, Prompt, Prompter};
pub use transport::{HttpTransport, ReqwestTransport};
pub use types::{
    AppointmentStatus, Category, ClientRegistration, GeoSearchParams, Provider, ProviderFilters,
    Subcategory, UserInfo, UserLocation,
};
