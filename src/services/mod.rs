pub mod item_service;

pub use item_service::ItemService;

use thiserror::Error;
use uuid::Uuid;

use crate::error::FieldErrors;
use crate::store::StoreError;

/// Domain-level outcomes of an item operation
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation failed: {0:?}")]
    Validation(FieldErrors),

    #[error("item {0} not found")]
    NotFound(Uuid),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("external service error: {0}")]
    External(String),

    #[error("malformed response from external service: {0}")]
    MalformedResponse(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Rejected(msg) => ServiceError::Forbidden(msg),
            StoreError::Conflict(msg) => ServiceError::Conflict(msg),
            StoreError::Decode(msg) => ServiceError::MalformedResponse(msg),
            StoreError::Transport(_) | StoreError::Upstream { .. } => {
                ServiceError::External(err.to_string())
            }
        }
    }
}
