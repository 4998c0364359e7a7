//! Caller-facing result envelope.

use crate::error::{AppError, AppResult};
use serde::Serialize;

/// Uniform `{ success, message, data }` shape returned to the UI layer.
///
/// Services return [`AppResult`]; the envelope is how that result is
/// surfaced, with `message` ready to show as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

impl<T: Serialize> Envelope<T> {
    /// Create a success envelope.
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            code: None,
        }
    }

    /// Create a failure envelope from an error.
    #[must_use]
    pub fn fail(err: &AppError) -> Self {
        if err.is_expected() {
            tracing::debug!(error = %err, code = err.error_code(), "Operation rejected");
        } else {
            tracing::error!(error = %err, code = err.error_code(), "Operation failed");
        }

        Self {
            success: false,
            message: err.to_string(),
            data: None,
            code: Some(err.error_code()),
        }
    }

    /// Wrap a service result, deriving the success message from the value.
    pub fn from_result<F, M>(result: AppResult<T>, message: F) -> Self
    where
        F: FnOnce(&T) -> M,
        M: Into<String>,
    {
        match result {
            Ok(value) => {
                let message = message(&value).into();
                Self::ok(message, value)
            }
            Err(err) => Self::fail(&err),
        }
    }
}

impl Envelope<()> {
    /// Create a success envelope with no payload.
    pub fn done(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            code: None,
        }
    }
}
