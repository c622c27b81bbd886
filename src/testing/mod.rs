use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::schemas::{Item, ItemUpdate, NewItem};
use crate::store::{InMemoryStore, ItemFilter, ItemStore, StoreError, StoreResult};

/// A fresh authenticated identity
pub fn user() -> AuthUser {
    AuthUser {
        user_id: Uuid::new_v4(),
        email: None,
        role: Some("authenticated".to_string()),
    }
}

/// In-memory store that records how many calls (and writes) it served
#[derive(Clone, Default)]
pub struct CountingStore {
    inner: InMemoryStore,
    calls: Arc<AtomicUsize>,
    writes: Arc<AtomicUsize>,
}

impl CountingStore {
    pub fn new(inner: InMemoryStore) -> Self {
        Self {
            inner,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn record(&self, write: bool) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if write {
            self.writes.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl ItemStore for CountingStore {
    async fn insert(&self, item: NewItem) -> StoreResult<Item> {
        self.record(true);
        self.inner.insert(item).await
    }

    async fn fetch(&self, id: Uuid) -> StoreResult<Option<Item>> {
        self.record(false);
        self.inner.fetch(id).await
    }

    async fn list(&self, filter: ItemFilter) -> StoreResult<Vec<Item>> {
        self.record(false);
        self.inner.list(filter).await
    }

    async fn update(&self, id: Uuid, changes: &ItemUpdate) -> StoreResult<Option<Item>> {
        self.record(true);
        self.inner.update(id, changes).await
    }

    async fn delete(&self, id: Uuid) -> StoreResult<Option<Item>> {
        self.record(true);
        self.inner.delete(id).await
    }

    async fn ping(&self) -> StoreResult<()> {
        self.inner.ping().await
    }
}

/// Store whose every call fails with the produced error
pub struct FailingStore(pub fn() -> StoreError);

#[async_trait]
impl ItemStore for FailingStore {
    async fn insert(&self, _item: NewItem) -> StoreResult<Item> {
        Err((self.0)())
    }

    async fn fetch(&self, _id: Uuid) -> StoreResult<Option<Item>> {
        Err((self.0)())
    }

    async fn list(&self, _filter: ItemFilter) -> StoreResult<Vec<Item>> {
        Err((self.0)())
    }

    async fn update(&self, _id: Uuid, _changes: &ItemUpdate) -> StoreResult<Option<Item>> {
        Err((self.0)())
    }

    async fn delete(&self, _id: Uuid) -> StoreResult<Option<Item>> {
        Err((self.0)())
    }

    async fn ping(&self) -> StoreResult<()> {
        Err((self.0)())
    }
}

/// Store that panics on every call
pub struct PanickingStore;

#[async_trait]
impl ItemStore for PanickingStore {
    async fn insert(&self, _item: NewItem) -> StoreResult<Item> {
        panic!("store exploded on insert")
    }

    async fn fetch(&self, _id: Uuid) -> StoreResult<Option<Item>> {
        panic!("store exploded on fetch")
    }

    async fn list(&self, _filter: ItemFilter) -> StoreResult<Vec<Item>> {
        panic!("store exploded on list")
    }

    async fn update(&self, _id: Uuid, _changes: &ItemUpdate) -> StoreResult<Option<Item>> {
        panic!("store exploded on update")
    }

    async fn delete(&self, _id: Uuid) -> StoreResult<Option<Item>> {
        panic!("store exploded on delete")
    }

    async fn ping(&self) -> StoreResult<()> {
        panic!("store exploded on ping")
    }
}
