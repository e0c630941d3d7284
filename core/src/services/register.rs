//! Client sign-up.
//!
//! `validate` mirrors the backend's rules so an invalid form never costs a
//! round trip. Values are checked as typed, without trimming.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::envelope::Envelope;
use crate::error::ApiError;
use crate::services::Api;
use crate::types::ClientRegistration;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{8}$").expect("phone pattern compiles"));

/// Every problem with `input`, in field order. Empty means valid.
pub fn validate(input: &ClientRegistration) -> Vec<String> {
    let mut errors = Vec::new();

    let required = [
        (&input.first_name, "First name is required"),
        (&input.last_name, "Last name is required"),
        (&input.cedula, "ID number is required"),
        (&input.email, "Email is required"),
        (&input.personal_phone_number, "Phone number is required"),
        (&input.password, "Password is required"),
        (&input.password_confirmation, "Password confirmation is required"),
    ];
    for (value, message) in required {
        if value.is_empty() {
            errors.push(message.to_string());
        }
    }

    if input.password != input.password_confirmation {
        errors.push("Passwords do not match".to_string());
    }
    // format checks run on the raw values; empty fields already have a message
    if !input.email.is_empty() && !EMAIL_RE.is_match(&input.email) {
        errors.push("Email format is invalid".to_string());
    }
    if !input.personal_phone_number.is_empty() && !PHONE_RE.is_match(&input.personal_phone_number) {
        errors.push("Phone number must have exactly 8 digits".to_string());
    }

    errors
}

#[derive(Clone)]
pub struct RegisterService {
    api: Api,
}

impl RegisterService {
    pub fn new(api: Api) -> Self {
        Self { api }
    }

    /// Validate locally, then create the account. Invalid input never
    /// reaches the server.
    pub async fn register_client(&self, input: &ClientRegistration) -> Envelope<()> {
        let result = async {
            let errors = validate(input);
            if !errors.is_empty() {
                return Err(ApiError::Validation(errors));
            }
            let req = self.api.client().build_register_client(input)?;
            let resp = self.api.send(req).await?;
            self.api.client().parse_register_client(resp)
        }
        .await;
        Envelope::from_result(result, "Client registered successfully")
    }
}
