//! Error types for the booking API client.
//!
//! # Design
//! `Display` on every variant is the user-facing text that ends up in an
//! `Envelope` message, so variants carry finished sentences rather than
//! codes. Status codes that have endpoint-specific wording (403, 404, 400)
//! take their text from a `StatusMessages` table supplied by the caller.

use thiserror::Error;

use crate::http::HttpResponse;

/// Body fragments the backend emits when its schema is missing a migration.
const SCHEMA_DEFECT_MARKERS: [&str; 2] = ["Unknown column 'services'", "Column not found"];

/// Errors produced while building, executing or parsing an API call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 401: the token is missing, expired or revoked.
    #[error("Session expired. Please log in again.")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    /// 5xx caused by the known backend migration defect.
    #[error("Server error: the database needs to be updated. Please contact the system administrator.")]
    SchemaOutdated,

    #[error("Internal server error ({status}). Please try again later.")]
    Server { status: u16 },

    /// Any other non-2xx status.
    #[error("HTTP error {status}")]
    Http { status: u16, body: String },

    /// The request never produced a response.
    #[error("Network error: {0}. Check your connection.")]
    Transport(String),

    #[error("Unexpected response from server: {0}")]
    Deserialization(String),

    #[error("Could not encode request: {0}")]
    Serialization(String),

    /// Client-side validation failures, reported as one joined message.
    #[error("{}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("No user information found. Please log in again.")]
    MissingUser,

    #[error("No authentication token available. Please log in.")]
    MissingToken,
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized => Some(401),
            ApiError::Server { status } | ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Endpoint-specific wording for the statuses that have one.
#[derive(Debug, Clone, Copy)]
pub struct StatusMessages {
    pub forbidden: &'static str,
    pub not_found: &'static str,
    pub bad_request: &'static str,
}

impl StatusMessages {
    pub const GENERIC: StatusMessages = StatusMessages {
        forbidden: "You are not authorized to perform this action.",
        not_found: "The requested resource was not found.",
        bad_request: "The request was rejected by the server.",
    };

    pub const fn forbidden(self, msg: &'static str) -> Self {
        StatusMessages { forbidden: msg, ..self }
    }

    pub const fn not_found(self, msg: &'static str) -> Self {
        StatusMessages { not_found: msg, ..self }
    }

    pub const fn bad_request(self, msg: &'static str) -> Self {
        StatusMessages { bad_request: msg, ..self }
    }
}

impl Default for StatusMessages {
    fn default() -> Self {
        Self::GENERIC
    }
}

/// Map non-success status codes to the appropriate `ApiError` variant.
pub fn check_status(response: &HttpResponse, messages: &StatusMessages) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    Err(match response.status {
        401 => ApiError::Unauthorized,
        403 => ApiError::Forbidden(messages.forbidden.to_string()),
        404 => ApiError::NotFound(messages.not_found.to_string()),
        400 => ApiError::BadRequest(messages.bad_request.to_string()),
        status @ 500..=599 => {
            if SCHEMA_DEFECT_MARKERS.iter().any(|m| response.body.contains(m)) {
                ApiError::SchemaOutdated
            } else {
                ApiError::Server { status }
            }
        }
        status => ApiError::Http {
            status,
            body: response.body.clone(),
        },
    })
}
