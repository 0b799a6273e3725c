use memsub_types::{ApiError, ApiErrorCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("underlying redb error: {0}")]
    Redb(String),
    #[error("value failed to (de)serialize: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("not found")]
    NotFound,
}

impl From<redb::Error> for StoreError {
    fn from(e: redb::Error) -> Self {
        StoreError::Redb(e.to_string())
    }
}

impl From<redb::TransactionError> for StoreError {
    fn from(e: redb::TransactionError) -> Self {
        StoreError::Redb(e.to_string())
    }
}

impl From<redb::TableError> for StoreError {
    fn from(e: redb::TableError) -> Self {
        StoreError::Redb(e.to_string())
    }
}

impl From<redb::StorageError> for StoreError {
    fn from(e: redb::StorageError) -> Self {
        StoreError::Redb(e.to_string())
    }
}

impl From<redb::CommitError> for StoreError {
    fn from(e: redb::CommitError) -> Self {
        StoreError::Redb(e.to_string())
    }
}

impl From<redb::DatabaseError> for StoreError {
    fn from(e: redb::DatabaseError) -> Self {
        StoreError::Redb(e.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        let now = chrono::Utc::now();
        match e {
            StoreError::NotFound => ApiError::new(ApiErrorCode::NotFound, "resource not found", now),
            other => ApiError::new(ApiErrorCode::InternalServerError, other.to_string(), now),
        }
    }
}
