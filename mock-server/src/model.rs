//! In-memory records and the JSON shapes the booking API answers with.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pending,
    Confirmed,
    Cancelled,
}

impl Status {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(Status::Pending),
            "confirmed" => Some(Status::Confirmed),
            "cancelled" => Some(Status::Cancelled),
            _ => None,
        }
    }

    pub fn text(self) -> &'static str {
        match self {
            Status::Pending => "Pendiente",
            Status::Confirmed => "Confirmada",
            Status::Cancelled => "Cancelada",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Subcategory {
    pub id: u64,
    pub category_id: u64,
    pub name: String,
}

#[derive(Clone, Debug)]
pub struct Category {
    pub id: u64,
    pub name: String,
    pub subcategories: Vec<Subcategory>,
}

#[derive(Clone, Debug)]
pub struct ProviderProfile {
    pub id: u64,
    pub ced: String,
    pub contact_email: String,
    pub phone_number: String,
    pub location: String,
    pub lat: f64,
    pub long: f64,
    pub experience_years: u32,
    pub schedule_type: bool,
    pub likes: u32,
    pub subcategory_id: u64,
}

#[derive(Clone, Debug)]
pub struct User {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    pub cedula: String,
    pub email: String,
    pub personal_phone_number: String,
    pub password: String,
    pub roles: Vec<String>,
    pub provider: Option<ProviderProfile>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|r| r == "Admin")
    }
}

#[derive(Clone, Debug)]
pub struct Appointment {
    pub id: u64,
    pub client_id: u64,
    /// Provider profile id, not user id.
    pub provider_id: u64,
    pub subcategory_id: u64,
    pub schedule_id: u64,
    pub day: String,
    pub date: String,
    pub start_at: String,
    pub end_at: String,
    pub status: Status,
}

#[derive(Debug, Default)]
pub struct Db {
    pub categories: Vec<Category>,
    pub users: Vec<User>,
    pub appointments: Vec<Appointment>,
    pub tokens: HashMap<String, u64>,
    pub next_user_id: u64,
    pub next_token: u64,
}

impl Db {
    pub fn user(&self, id: u64) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn provider_user(&self, provider_id: u64) -> Option<&User> {
        self.users
            .iter()
            .find(|u| u.provider.as_ref().is_some_and(|p| p.id == provider_id))
    }

    pub fn subcategory(&self, id: u64) -> Option<(&Category, &Subcategory)> {
        self.categories.iter().find_map(|c| {
            c.subcategories
                .iter()
                .find(|s| s.id == id)
                .map(|s| (c, s))
        })
    }

    pub fn issue_token(&mut self, user_id: u64) -> String {
        self.next_token += 1;
        let token = format!("mock-{user_id}-{}", self.next_token);
        self.tokens.insert(token.clone(), user_id);
        token
    }

    pub fn categories_json(&self) -> Value {
        Value::Array(
            self.categories
                .iter()
                .map(|c| {
                    json!({
                        "id": c.id,
                        "name": c.name,
                        "created_at": TIMESTAMP,
                        "updated_at": TIMESTAMP,
                        "subcategories": c.subcategories.iter().map(|s| json!({
                            "id": s.id,
                            "category_id": s.category_id,
                            "name": s.name,
                            "img": null,
                            "created_at": TIMESTAMP,
                            "updated_at": TIMESTAMP,
                        })).collect::<Vec<_>>(),
                    })
                })
                .collect(),
        )
    }

    /// Provider search row, or `None` for users without a provider profile.
    pub fn provider_json(&self, user: &User) -> Option<Value> {
        let profile = user.provider.as_ref()?;
        let (category, subcategory) = self.subcategory(profile.subcategory_id)?;
        Some(json!({
            "user": {
                "first_name": user.first_name,
                "last_name": user.last_name,
                "email": user.email,
            },
            "provider": {
                "user_id": user.id,
                "ced": profile.ced,
                "contact_email": profile.contact_email,
                "phone_number": profile.phone_number,
                "location": profile.location,
                "long": profile.long.to_string(),
                "lat": profile.lat.to_string(),
                "experience_years": profile.experience_years,
                "schedule_type": i64::from(profile.schedule_type),
                "likes": profile.likes,
            },
            "subcategory": {
                "id": subcategory.id,
                "category_id": subcategory.category_id,
                "name": subcategory.name,
            },
            "category": {"id": category.id, "name": category.name},
            "role": user.roles,
        }))
    }

    pub fn user_json(&self, user: &User) -> Value {
        let mut value = json!({
            "id": user.id,
            "first_name": user.first_name,
            "last_name": user.last_name,
            "email": user.email,
            "cedula": user.cedula,
            "personal_phone_number": user.personal_phone_number,
            "roles": user.roles,
            "created_at": TIMESTAMP,
        });
        if let Some(p) = &user.provider {
            let services = self
                .appointments
                .iter()
                .filter(|a| a.provider_id == p.id)
                .count();
            value["provider"] = json!({
                "id": p.id,
                "ced": p.ced,
                "contact_email": p.contact_email,
                "phone_number": p.phone_number,
                "location": p.location,
                "latitude": p.lat,
                "longitude": p.long,
                "experience_years": p.experience_years,
                "schedule_type": p.schedule_type,
                "likes": p.likes,
                "img": null,
                "services": services,
            });
        }
        value
    }

    pub fn appointment_json(&self, appt: &Appointment) -> Value {
        let client = self.user(appt.client_id);
        let provider_user = self.provider_user(appt.provider_id);
        let profile = provider_user.and_then(|u| u.provider.as_ref());
        let (category, subcategory) = match self.subcategory(appt.subcategory_id) {
            Some((c, s)) => (
                json!({"id": c.id, "name": c.name}),
                json!({"id": s.id, "name": s.name, "category_id": s.category_id}),
            ),
            None => (json!({"id": 0, "name": ""}), json!({"id": 0, "name": ""})),
        };

        json!({
            "id": appt.id,
            "appointment_date": format!("{}T00:00:00.000000Z", appt.date),
            "start_at": appt.start_at,
            "end_at": appt.end_at,
            "status": appt.status,
            "created_at": TIMESTAMP,
            "updated_at": TIMESTAMP,
            "client": {
                "id": appt.client_id,
                "first_name": client.map(|u| u.first_name.as_str()).unwrap_or_default(),
                "last_name": client.map(|u| u.last_name.as_str()).unwrap_or_default(),
                "full_name": client.map(User::full_name).unwrap_or_default(),
                "email": client.map(|u| u.email.as_str()).unwrap_or_default(),
            },
            "provider": {
                "id": appt.provider_id,
                "user_id": provider_user.map(|u| u.id).unwrap_or_default(),
                "first_name": provider_user.map(|u| u.first_name.as_str()).unwrap_or_default(),
                "last_name": provider_user.map(|u| u.last_name.as_str()).unwrap_or_default(),
                "full_name": provider_user.map(User::full_name).unwrap_or_default(),
                "email": provider_user.map(|u| u.email.as_str()).unwrap_or_default(),
                "location": profile.map(|p| p.location.as_str()).unwrap_or_default(),
                "experience_years": profile.map(|p| p.experience_years).unwrap_or_default(),
            },
            "service": {"subcategory": subcategory, "category": category},
            "schedule": {"id": appt.schedule_id, "day": appt.day, "hours_per_session": 1},
            "status_text": appt.status.text(),
            "formatted_date": formatted_date(&appt.date),
            "formatted_time": format!("{} - {}", short_time(&appt.start_at), short_time(&appt.end_at)),
        })
    }
}

const TIMESTAMP: &str = "2025-01-15T12:00:00.000000Z";

/// `YYYY-MM-DD` to `DD/MM/YYYY`.
fn formatted_date(date: &str) -> String {
    let parts: Vec<&str> = date.split('-').collect();
    match parts.as_slice() {
        [y, m, d] => format!("{d}/{m}/{y}"),
        _ => date.to_string(),
    }
}

fn short_time(time: &str) -> &str {
    time.get(..5).unwrap_or(time)
}

/// Great-circle distance in km.
pub fn haversine_km(lat1: f64, long1: f64, lat2: f64, long2: f64) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;
    let d_lat = (lat2 - lat1).to_radians();
    let d_long = (long2 - long1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_long / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

fn user(
    id: u64,
    (first_name, last_name): (&str, &str),
    email: &str,
    roles: &[&str],
    provider: Option<ProviderProfile>,
) -> User {
    User {
        id,
        first_name: first_name.into(),
        last_name: last_name.into(),
        cedula: format!("5{id:08}"),
        email: email.into(),
        personal_phone_number: format!("8800{id:04}"),
        password: "secreto123".into(),
        roles: roles.iter().map(|r| r.to_string()).collect(),
        provider,
    }
}

fn profile(
    id: u64,
    location: &str,
    (lat, long): (f64, f64),
    experience_years: u32,
    subcategory_id: u64,
) -> ProviderProfile {
    ProviderProfile {
        id,
        ced: format!("1{id:08}"),
        contact_email: format!("contacto{id}@example.com"),
        phone_number: format!("2660{id:04}"),
        location: location.into(),
        lat,
        long,
        experience_years,
        schedule_type: true,
        likes: 0,
        subcategory_id,
    }
}

#[allow(clippy::too_many_arguments)]
fn appointment(
    id: u64,
    client_id: u64,
    provider_id: u64,
    subcategory_id: u64,
    date: &str,
    start_at: &str,
    end_at: &str,
    status: Status,
) -> Appointment {
    Appointment {
        id,
        client_id,
        provider_id,
        subcategory_id,
        schedule_id: provider_id * 10,
        day: "Friday".into(),
        date: date.into(),
        start_at: start_at.into(),
        end_at: end_at.into(),
        status,
    }
}

fn category(id: u64, name: &str, subcategories: &[(u64, &str)]) -> Category {
    Category {
        id,
        name: name.into(),
        subcategories: subcategories
            .iter()
            .map(|(sid, sname)| Subcategory {
                id: *sid,
                category_id: id,
                name: (*sname).into(),
            })
            .collect(),
    }
}

/// Fixed data set shared by the binary and the tests.
///
/// Users: 1 admin, 5 Ana Mora (client), 7 Luis Vega (provider 2, Liberia),
/// 8 Marta Solís (provider 3, Santa Cruz), 9 Carlos Rojas (provider 4,
/// San José). Every password is `secreto123`.
pub fn seed() -> Db {
    Db {
        categories: vec![
            category(1, "Informática", &[(3, "Redes"), (4, "Soporte técnico")]),
            category(2, "Hogar", &[(5, "Fontanería"), (6, "Electricidad")]),
        ],
        users: vec![
            user(1, ("Admin", "General"), "admin@example.com", &["Admin"], None),
            user(5, ("Ana", "Mora"), "ana@example.com", &["Client"], None),
            user(
                7,
                ("Luis", "Vega"),
                "luis@example.com",
                &["Client", "Provider"],
                Some(profile(2, "Liberia", (10.6346, -85.4407), 4, 3)),
            ),
            user(
                8,
                ("Marta", "Solís"),
                "marta@example.com",
                &["Provider"],
                Some(profile(3, "Santa Cruz", (10.2610, -85.5850), 10, 5)),
            ),
            user(
                9,
                ("Carlos", "Rojas"),
                "carlos@example.com",
                &["Provider"],
                Some(profile(4, "San José", (9.9281, -84.0907), 2, 4)),
            ),
        ],
        appointments: vec![
            appointment(42, 5, 2, 3, "2025-03-14", "09:00:00", "10:00:00", Status::Pending),
            appointment(43, 5, 3, 5, "2025-03-20", "14:00:00", "15:00:00", Status::Confirmed),
            appointment(44, 5, 2, 3, "2025-02-02", "08:00:00", "09:00:00", Status::Cancelled),
        ],
        tokens: HashMap::new(),
        next_user_id: 100,
        next_token: 0,
    }
}
