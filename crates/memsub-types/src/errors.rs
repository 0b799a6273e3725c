//! The wire-shaped error envelope every crate boundary converges on.
//!
//! Library crates (`memsub-store`, `memsub-policy`, `memsub-engine`, …) each
//! define their own `thiserror` enum at their boundary; each implements
//! `From<TheirError> for ApiError` so a handler can always `?`-propagate into
//! one envelope shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ApiErrorCode {
    ValidationError,
    AuthenticationError,
    AuthorizationError,
    NotFound,
    RateLimitExceeded,
    InternalServerError,
}

impl ApiErrorCode {
    pub fn as_upper_snake(self) -> &'static str {
        match self {
            ApiErrorCode::ValidationError => "VALIDATION_ERROR",
            ApiErrorCode::AuthenticationError => "AUTHENTICATION_ERROR",
            ApiErrorCode::AuthorizationError => "AUTHORIZATION_ERROR",
            ApiErrorCode::NotFound => "NOT_FOUND",
            ApiErrorCode::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            ApiErrorCode::InternalServerError => "INTERNAL_SERVER_ERROR",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
    pub request_id: Uuid,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorBody,
}

impl ApiError {
    pub fn new(code: ApiErrorCode, message: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            error: ApiErrorBody {
                code: code.as_upper_snake().to_string(),
                message: message.into(),
                request_id: Uuid::new_v4(),
                timestamp: now,
                details: None,
                hint: None,
            },
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.error.details = Some(details);
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.error.hint = Some(hint.into());
        self
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error.code, self.error.message)
    }
}

impl std::error::Error for ApiError {}
