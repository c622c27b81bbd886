//! Access to the hosted `items` table.
//!
//! The service talks to the store only through [`ItemStore`], so handlers can
//! be exercised against [`InMemoryStore`] while production uses
//! [`PostgrestStore`]. A missing record is `Ok(None)`; errors are reserved for
//! transport and upstream failures.

pub mod memory;
pub mod postgrest;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::schemas::{Item, ItemUpdate, NewItem};

pub use memory::InMemoryStore;
pub use postgrest::PostgrestStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("request to store failed: {0}")]
    Transport(String),

    /// The store's row-level policies refused the operation (403)
    #[error("store rejected the request: {0}")]
    Rejected(String),

    #[error("store reported a conflict: {0}")]
    Conflict(String),

    #[error("store returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("could not decode store response: {0}")]
    Decode(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Filter and page for listing items, newest first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemFilter {
    pub owner_id: Option<Uuid>,
    pub offset: usize,
    pub limit: usize,
}

#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Insert a row and return it as stored
    async fn insert(&self, item: NewItem) -> StoreResult<Item>;

    async fn fetch(&self, id: Uuid) -> StoreResult<Option<Item>>;

    async fn list(&self, filter: ItemFilter) -> StoreResult<Vec<Item>>;

    /// Apply a non-empty patch; `None` when no row matched
    async fn update(&self, id: Uuid, changes: &ItemUpdate) -> StoreResult<Option<Item>>;

    /// Remove a row; returns the deleted row, `None` when no row matched
    async fn delete(&self, id: Uuid) -> StoreResult<Option<Item>>;

    /// Cheap reachability check used by the health endpoint
    async fn ping(&self) -> StoreResult<()>;
}
