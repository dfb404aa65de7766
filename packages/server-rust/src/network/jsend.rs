//! JSend response envelope.
//!
//! Every HTTP response carries a status plus either payload data
//! (`success`, `fail`) or a human-readable message (`error`), as described
//! at <https://github.com/omniti-labs/jsend>.

use serde::{Deserialize, Serialize};

/// Envelope status discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JSendStatus {
    /// All went well; `data` holds the result.
    Success,
    /// The request was at fault; `data` explains how.
    Fail,
    /// The server failed processing; `message` explains.
    Error,
}

/// The response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JSend {
    /// Outcome class of the request.
    pub status: JSendStatus,
    /// Payload on success, problem description on fail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Human-readable message; set on error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Optional machine-readable error code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl JSend {
    /// All went well, and (usually) some data is returned.
    #[must_use]
    pub fn success(data: serde_json::Value) -> Self {
        Self {
            status: JSendStatus::Success,
            data: Some(data),
            message: None,
            code: None,
        }
    }

    /// There was a problem with the submitted data, or some precondition
    /// of the call was not satisfied.
    #[must_use]
    pub fn fail(data: serde_json::Value) -> Self {
        Self {
            status: JSendStatus::Fail,
            data: Some(data),
            message: None,
            code: None,
        }
    }

    /// An error occurred while processing the request.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: JSendStatus::Error,
            data: None,
            message: Some(message.into()),
            code: None,
        }
    }

    /// Attaches a machine-readable code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Whether this envelope reports success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == JSendStatus::Success
    }

    /// Whether this envelope reports a client-side fail.
    #[must_use]
    pub fn is_fail(&self) -> bool {
        self.status == JSendStatus::Fail
    }

    /// Whether this envelope reports a server-side error.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.status == JSendStatus::Error
    }
}
