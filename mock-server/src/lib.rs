//! In-memory stand-in for the booking backend.
//!
//! Serves the same routes and JSON shapes as the real API from a seeded
//! data set (see [`model::seed`]). Bearer tokens are opaque strings handed
//! out by [`MockState::issue_token`]; there is no login route.

pub mod model;

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;

use model::{haversine_km, Db, Status, User};

/// Shared server state; cloning shares the same data.
#[derive(Clone, Debug)]
pub struct MockState {
    db: Arc<RwLock<Db>>,
}

impl Default for MockState {
    fn default() -> Self {
        Self::seeded()
    }
}

impl MockState {
    pub fn seeded() -> Self {
        Self {
            db: Arc::new(RwLock::new(model::seed())),
        }
    }

    /// Mint a bearer token for `user_id`.
    pub async fn issue_token(&self, user_id: u64) -> String {
        self.db.write().await.issue_token(user_id)
    }

    /// Current status of appointment `id`, if it exists.
    pub async fn appointment_status(&self, id: u64) -> Option<Status> {
        self.db
            .read()
            .await
            .appointments
            .iter()
            .find(|a| a.id == id)
            .map(|a| a.status)
    }
}

type ApiResult = Result<Json<Value>, (StatusCode, Json<Value>)>;

fn reject(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "message": message })))
}

pub fn app() -> Router {
    app_with_state(MockState::seeded())
}

pub fn app_with_state(state: MockState) -> Router {
    Router::new()
        .route("/categories", get(list_categories))
        .route(
            "/providers/category-search/{category}/{subcategory}",
            get(search_by_category),
        )
        .route("/providers/geo-search", post(geo_search))
        .route("/providers/{id}", get(get_provider))
        .route("/register/client", post(register_client))
        .route("/logout", post(logout))
        .route("/profile", get(get_profile).put(update_profile))
        .route("/appointments/client/all/{id}", get(client_all))
        .route("/appointments/client/{status}", get(client_by_status))
        .route("/appointments/provider/user/{id}", get(provider_by_user))
        .route("/appointments/provider/{status}", get(provider_by_status))
        .route("/appointments/{id}/confirm", patch(confirm))
        .route("/appointments/{id}/cancel", patch(cancel))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_state(listener, MockState::seeded()).await
}

pub async fn run_with_state(listener: TcpListener, state: MockState) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "mock booking API listening");
    }
    axum::serve(listener, app_with_state(state)).await
}

/// Resolve the bearer token to a user id.
fn caller(db: &Db, headers: &HeaderMap) -> Result<u64, (StatusCode, Json<Value>)> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .and_then(|token| db.tokens.get(token).copied())
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "Unauthenticated."))
}

// --- catalog ---

async fn list_categories(State(state): State<MockState>) -> Json<Value> {
    Json(state.db.read().await.categories_json())
}

async fn search_by_category(
    State(state): State<MockState>,
    Path((category, subcategory)): Path<(String, String)>,
) -> ApiResult {
    let category: u64 = category
        .parse()
        .map_err(|_| reject(StatusCode::BAD_REQUEST, "Invalid category id."))?;
    let subcategory: Option<u64> = match subcategory.as_str() {
        "null" => None,
        raw => Some(
            raw.parse()
                .map_err(|_| reject(StatusCode::BAD_REQUEST, "Invalid subcategory id."))?,
        ),
    };

    let db = state.db.read().await;
    let providers: Vec<Value> = db
        .users
        .iter()
        .filter(|u| {
            u.provider.as_ref().is_some_and(|p| {
                db.subcategory(p.subcategory_id).is_some_and(|(c, s)| {
                    c.id == category && subcategory.map_or(true, |id| s.id == id)
                })
            })
        })
        .filter_map(|u| db.provider_json(u))
        .collect();

    let total = providers.len();
    Ok(Json(json!({
        "providers": providers,
        "pagination": {"current_page": 1, "per_page": 20, "total": total, "last_page": 1},
    })))
}

async fn get_provider(State(state): State<MockState>, Path(id): Path<u64>) -> ApiResult {
    let db = state.db.read().await;
    db.provider_user(id)
        .and_then(|u| db.provider_json(u))
        .map(Json)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "Provider not found."))
}

#[derive(Debug, Deserialize)]
pub struct GeoSearch {
    pub long: f64,
    pub lat: f64,
    pub range_km: f64,
    #[serde(default)]
    pub subcategories_id: Option<Vec<u64>>,
    #[serde(default)]
    pub experience_years: Option<u32>,
}

async fn geo_search(State(state): State<MockState>, Json(query): Json<GeoSearch>) -> ApiResult {
    if query.range_km <= 0.0 {
        return Err(reject(StatusCode::UNPROCESSABLE_ENTITY, "range_km must be positive."));
    }
    let db = state.db.read().await;
    let mut hits: Vec<(f64, &User)> = db
        .users
        .iter()
        .filter_map(|u| {
            let p = u.provider.as_ref()?;
            let distance = haversine_km(query.lat, query.long, p.lat, p.long);
            let in_subcategory = query
                .subcategories_id
                .as_ref()
                .map_or(true, |ids| ids.is_empty() || ids.contains(&p.subcategory_id));
            let experienced = query.experience_years.map_or(true, |y| p.experience_years >= y);
            (distance <= query.range_km && in_subcategory && experienced).then_some((distance, u))
        })
        .collect();
    hits.sort_by(|a, b| a.0.total_cmp(&b.0));

    let list: Vec<Value> = hits.into_iter().filter_map(|(_, u)| db.provider_json(u)).collect();
    tracing::debug!(count = list.len(), range_km = query.range_km, "geo search");
    Ok(Json(Value::Array(list)))
}

// --- accounts ---

#[derive(Debug, Deserialize)]
pub struct Registration {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub cedula: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub personal_phone_number: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirmation: String,
}

async fn register_client(
    State(state): State<MockState>,
    Json(input): Json<Registration>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    let required = [
        &input.first_name,
        &input.last_name,
        &input.cedula,
        &input.email,
        &input.personal_phone_number,
        &input.password,
    ];
    if required.iter().any(|v| v.trim().is_empty()) {
        return Err(reject(StatusCode::UNPROCESSABLE_ENTITY, "All fields are required."));
    }
    if input.password != input.password_confirmation {
        return Err(reject(
            StatusCode::UNPROCESSABLE_ENTITY,
            "The password confirmation does not match.",
        ));
    }

    let mut db = state.db.write().await;
    if db.users.iter().any(|u| u.email.eq_ignore_ascii_case(&input.email)) {
        return Err(reject(
            StatusCode::UNPROCESSABLE_ENTITY,
            "The email has already been taken.",
        ));
    }

    let id = db.next_user_id;
    db.next_user_id += 1;
    let user = User {
        id,
        first_name: input.first_name,
        last_name: input.last_name,
        cedula: input.cedula,
        email: input.email,
        personal_phone_number: input.personal_phone_number,
        password: input.password,
        roles: vec!["Client".to_string()],
        provider: None,
    };
    let body = json!({
        "message": "Client registered successfully.",
        "user": db.user_json(&user),
    });
    tracing::info!(user_id = id, "client registered");
    db.users.push(user);
    Ok((StatusCode::CREATED, Json(body)))
}

async fn logout(State(state): State<MockState>, headers: HeaderMap) -> ApiResult {
    let mut db = state.db.write().await;
    caller(&db, &headers)?;
    if let Some(token) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        db.tokens.remove(token);
    }
    Ok(Json(json!({ "message": "Logged out successfully." })))
}

async fn get_profile(State(state): State<MockState>, headers: HeaderMap) -> ApiResult {
    let db = state.db.read().await;
    let id = caller(&db, &headers)?;
    let user = db
        .user(id)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "User not found."))?;
    Ok(Json(json!({
        "success": true,
        "message": "Profile retrieved.",
        "data": db.user_json(user),
    })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProfileChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub personal_phone_number: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
    pub new_password_confirmation: Option<String>,
    pub contact_email: Option<String>,
    pub phone_number: Option<String>,
    pub location: Option<String>,
    pub lat: Option<f64>,
    pub long: Option<f64>,
    pub experience_years: Option<u32>,
    pub schedule_type: Option<bool>,
}

async fn update_profile(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(changes): Json<ProfileChanges>,
) -> ApiResult {
    let mut db = state.db.write().await;
    let id = caller(&db, &headers)?;
    if let Some(email) = &changes.email {
        if db.users.iter().any(|u| u.id != id && u.email.eq_ignore_ascii_case(email)) {
            return Err(reject(
                StatusCode::UNPROCESSABLE_ENTITY,
                "The email has already been taken.",
            ));
        }
    }

    let user = db
        .users
        .iter_mut()
        .find(|u| u.id == id)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "User not found."))?;

    if let Some(new_password) = changes.new_password {
        if changes.current_password.as_deref() != Some(user.password.as_str()) {
            return Err(reject(
                StatusCode::UNPROCESSABLE_ENTITY,
                "The current password is incorrect.",
            ));
        }
        if changes.new_password_confirmation.as_deref() != Some(new_password.as_str()) {
            return Err(reject(
                StatusCode::UNPROCESSABLE_ENTITY,
                "The new password confirmation does not match.",
            ));
        }
        user.password = new_password;
    }

    if let Some(v) = changes.first_name {
        user.first_name = v;
    }
    if let Some(v) = changes.last_name {
        user.last_name = v;
    }
    if let Some(v) = changes.email {
        user.email = v;
    }
    if let Some(v) = changes.personal_phone_number {
        user.personal_phone_number = v;
    }
    if let Some(p) = user.provider.as_mut() {
        if let Some(v) = changes.contact_email {
            p.contact_email = v;
        }
        if let Some(v) = changes.phone_number {
            p.phone_number = v;
        }
        if let Some(v) = changes.location {
            p.location = v;
        }
        if let Some(v) = changes.lat {
            p.lat = v;
        }
        if let Some(v) = changes.long {
            p.long = v;
        }
        if let Some(v) = changes.experience_years {
            p.experience_years = v;
        }
        if let Some(v) = changes.schedule_type {
            p.schedule_type = v;
        }
    }

    let user = user.clone();
    Ok(Json(json!({
        "success": true,
        "message": "Profile updated successfully.",
        "data": db.user_json(&user),
    })))
}

// --- appointments ---

fn parse_status(raw: &str) -> Result<Status, (StatusCode, Json<Value>)> {
    Status::parse(raw).ok_or_else(|| reject(StatusCode::NOT_FOUND, "Unknown appointment status."))
}

async fn client_all(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(client_id): Path<u64>,
) -> ApiResult {
    let db = state.db.read().await;
    let me = caller(&db, &headers)?;
    let admin = db.user(me).is_some_and(User::is_admin);
    if me != client_id && !admin {
        return Err(reject(
            StatusCode::FORBIDDEN,
            "You can only view your own appointments.",
        ));
    }
    let list: Vec<Value> = db
        .appointments
        .iter()
        .filter(|a| a.client_id == client_id)
        .map(|a| db.appointment_json(a))
        .collect();
    Ok(Json(Value::Array(list)))
}

async fn client_by_status(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(status): Path<String>,
) -> ApiResult {
    let db = state.db.read().await;
    let me = caller(&db, &headers)?;
    let status = parse_status(&status)?;
    let list: Vec<Value> = db
        .appointments
        .iter()
        .filter(|a| a.client_id == me && a.status == status)
        .map(|a| db.appointment_json(a))
        .collect();
    Ok(Json(Value::Array(list)))
}

async fn provider_by_user(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(user_id): Path<u64>,
) -> ApiResult {
    let db = state.db.read().await;
    caller(&db, &headers)?;
    let user = db
        .user(user_id)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "User not found."))?;
    let profile = user
        .provider
        .as_ref()
        .ok_or_else(|| reject(StatusCode::BAD_REQUEST, "The user is not a provider."))?;
    let list: Vec<Value> = db
        .appointments
        .iter()
        .filter(|a| a.provider_id == profile.id)
        .map(|a| db.appointment_json(a))
        .collect();
    Ok(Json(json!({
        "appointments": list,
        "provider_info": {"user_id": user.id, "provider_id": profile.id},
    })))
}

async fn provider_by_status(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(status): Path<String>,
) -> ApiResult {
    let db = state.db.read().await;
    let me = caller(&db, &headers)?;
    let status = parse_status(&status)?;
    let provider_id = db
        .user(me)
        .and_then(|u| u.provider.as_ref())
        .map(|p| p.id)
        .ok_or_else(|| reject(StatusCode::FORBIDDEN, "Only providers can view these appointments."))?;
    let list: Vec<Value> = db
        .appointments
        .iter()
        .filter(|a| a.provider_id == provider_id && a.status == status)
        .map(|a| db.appointment_json(a))
        .collect();
    Ok(Json(Value::Array(list)))
}

async fn confirm(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> ApiResult {
    let mut db = state.db.write().await;
    let me = caller(&db, &headers)?;
    let my_provider = db.user(me).and_then(|u| u.provider.as_ref()).map(|p| p.id);
    let appt = db
        .appointments
        .iter_mut()
        .find(|a| a.id == id)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "Appointment not found."))?;
    if my_provider != Some(appt.provider_id) {
        return Err(reject(
            StatusCode::FORBIDDEN,
            "Only the provider can confirm this appointment.",
        ));
    }
    appt.status = Status::Confirmed;
    tracing::info!(id, "appointment confirmed");
    Ok(Json(json!({ "success": true, "message": "Appointment confirmed." })))
}

async fn cancel(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> ApiResult {
    let mut db = state.db.write().await;
    let me = caller(&db, &headers)?;
    let my_provider = db.user(me).and_then(|u| u.provider.as_ref()).map(|p| p.id);
    let appt = db
        .appointments
        .iter_mut()
        .find(|a| a.id == id)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "Appointment not found."))?;
    if appt.client_id != me && my_provider != Some(appt.provider_id) {
        return Err(reject(
            StatusCode::FORBIDDEN,
            "You cannot cancel this appointment.",
        ));
    }
    appt.status = Status::Cancelled;
    tracing::info!(id, "appointment cancelled");
    Ok(Json(json!({ "success": true, "message": "Appointment cancelled." })))
}
