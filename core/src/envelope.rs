//! Uniform result wrapper returned by every resource client.

use serde::Serialize;

use crate::error::ApiError;

const FALLBACK_FAILURE: &str = "The request could not be completed. Check your connection.";

/// `{success, message, data?}` as handed to the view layer.
///
/// A failed envelope always has a non-empty `message` and no `data`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            success: false,
            message: if message.trim().is_empty() {
                FALLBACK_FAILURE.to_string()
            } else {
                message
            },
            data: None,
        }
    }

    /// Wrap a client result, logging failures at the boundary.
    pub fn from_result(result: Result<T, ApiError>, success_message: impl Into<String>) -> Self {
        match result {
            Ok(data) => Self::ok(data, success_message),
            Err(err) => {
                tracing::warn!(error = ?err, "request failed");
                Self::fail(err.to_string())
            }
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Envelope<U> {
        Envelope {
            success: self.success,
            message: self.message,
            data: self.data.map(f),
        }
    }

    pub fn into_result(self) -> Result<T, String> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            _ => Err(self.message),
        }
    }
}
