use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ItemFilter, ItemStore, StoreResult};
use crate::schemas::{Item, ItemUpdate, NewItem};

/// Process-local store for tests and `serve --in-memory`
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    items: Arc<RwLock<HashMap<Uuid, Item>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

#[async_trait]
impl ItemStore for InMemoryStore {
    async fn insert(&self, item: NewItem) -> StoreResult<Item> {
        let record = Item {
            id: Uuid::new_v4(),
            title: item.title,
            description: item.description,
            owner_id: item.owner_id,
            created_at: Utc::now(),
            updated_at: None,
        };

        self.items.write().await.insert(record.id, record.clone());
        tracing::debug!(item_id = %record.id, "Inserted item in memory");
        Ok(record)
    }

    async fn fetch(&self, id: Uuid) -> StoreResult<Option<Item>> {
        Ok(self.items.read().await.get(&id).cloned())
    }

    async fn list(&self, filter: ItemFilter) -> StoreResult<Vec<Item>> {
        let items = self.items.read().await;

        let mut result: Vec<Item> = items
            .values()
            .filter(|item| filter.owner_id.map_or(true, |owner| item.owner_id == owner))
            .cloned()
            .collect();

        // Newest first; ids break ties so pages are stable
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        Ok(result
            .into_iter()
            .skip(filter.offset)
            .take(filter.limit)
            .collect())
    }

    async fn update(&self, id: Uuid, changes: &ItemUpdate) -> StoreResult<Option<Item>> {
        let mut items = self.items.write().await;

        Ok(items.get_mut(&id).map(|item| {
            *item = changes.apply_to(item);
            item.updated_at = Some(Utc::now());
            item.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> StoreResult<Option<Item>> {
        Ok(self.items.write().await.remove(&id))
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_item(title: &str, owner_id: Uuid) -> NewItem {
        NewItem {
            title: title.to_string(),
            description: None,
            owner_id,
        }
    }

    #[tokio::test]
    async fn insert_fetch_delete() {
        let store = InMemoryStore::new();
        let owner = Uuid::new_v4();

        let item = store.insert(new_item("a", owner)).await.unwrap();
        assert_eq!(store.len().await, 1);
        assert_eq!(store.fetch(item.id).await.unwrap(), Some(item.clone()));

        assert_eq!(store.delete(item.id).await.unwrap(), Some(item.clone()));
        assert_eq!(store.delete(item.id).await.unwrap(), None);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn list_filters_by_owner_and_pages() {
        let store = InMemoryStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        for i in 0..3 {
            store.insert(new_item(&format!("a{}", i), alice)).await.unwrap();
        }
        store.insert(new_item("b0", bob)).await.unwrap();

        let all = ItemFilter { owner_id: None, offset: 0, limit: 100 };
        assert_eq!(store.list(all).await.unwrap().len(), 4);

        let alices = ItemFilter { owner_id: Some(alice), offset: 0, limit: 100 };
        let listed = store.list(alices).await.unwrap();
        assert_eq!(listed.len(), 3);
        assert!(listed.iter().all(|item| item.owner_id == alice));

        let page = ItemFilter { owner_id: Some(alice), offset: 1, limit: 1 };
        assert_eq!(store.list(page).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_sets_timestamp_and_fields() {
        let store = InMemoryStore::new();
        let item = store.insert(new_item("old", Uuid::new_v4())).await.unwrap();

        let changes = ItemUpdate {
            title: Some("new".to_string()),
            description: Some(Some("details".to_string())),
        };
        let updated = store.update(item.id, &changes).await.unwrap().unwrap();
        assert_eq!(updated.title, "new");
        assert_eq!(updated.description.as_deref(), Some("details"));
        assert!(updated.updated_at.is_some());
        assert_eq!(updated.owner_id, item.owner_id);

        assert!(store.update(Uuid::new_v4(), &changes).await.unwrap().is_none());
    }
}
