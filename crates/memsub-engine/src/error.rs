use memsub_types::{ApiError, ApiErrorCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("policy denied: {0}")]
    PolicyDenied(String),
    #[error("not found")]
    NotFound,
    #[error("revoked")]
    Revoked,
    #[error(transparent)]
    Store(#[from] memsub_store::StoreError),
    #[error(transparent)]
    Audit(#[from] memsub_audit::AuditError),
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        let now = chrono::Utc::now();
        match e {
            EngineError::Validation(msg) => ApiError::new(ApiErrorCode::ValidationError, msg, now),
            EngineError::PolicyDenied(msg) => ApiError::new(ApiErrorCode::AuthorizationError, msg, now),
            EngineError::NotFound => ApiError::new(ApiErrorCode::NotFound, "not found", now),
            EngineError::Revoked => ApiError::new(ApiErrorCode::AuthorizationError, "REVOKED", now).with_details(serde_json::json!({"reason": "REVOKED"})),
            EngineError::Store(e) => ApiError::from(e),
            EngineError::Audit(e) => ApiError::new(ApiErrorCode::InternalServerError, e.to_string(), now),
        }
    }
}
