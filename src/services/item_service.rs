use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use super::{ServiceError, ServiceResult};

use crate::auth::AuthUser;
use crate::error::FieldErrors;
use crate::schemas::{
    field_errors, Item, ItemCreate, ItemUpdate, ListParams, NewItem, DEFAULT_LIST_LIMIT,
};
use crate::store::{ItemFilter, ItemStore, StoreResult};

/// Forwards item operations to the external store.
///
/// Input is validated before any store call. Each operation makes at most the
/// calls it needs (ownership checks read first, then write) with no retries.
#[derive(Clone)]
pub struct ItemService {
    store: Arc<dyn ItemStore>,
    max_list_limit: usize,
}

impl ItemService {
    pub fn new(store: Arc<dyn ItemStore>, max_list_limit: usize) -> Self {
        Self {
            store,
            max_list_limit,
        }
    }

    pub async fn create(&self, owner: &AuthUser, payload: ItemCreate) -> ServiceResult<Item> {
        validate(&payload)?;

        let item = self
            .store
            .insert(NewItem::from_payload(payload, owner.user_id))
            .await?;

        tracing::info!(item_id = %item.id, owner_id = %owner.user_id, "Created item");
        Ok(item)
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<Item> {
        self.store.fetch(id).await?.ok_or(ServiceError::NotFound(id))
    }

    pub async fn list(&self, params: ListParams) -> ServiceResult<Vec<Item>> {
        validate(&params)?;
        let limit = match params.limit {
            Some(limit) if limit > self.max_list_limit => {
                let mut errors = FieldErrors::new();
                errors.insert(
                    "limit".to_string(),
                    format!("limit must be at most {}", self.max_list_limit),
                );
                return Err(ServiceError::Validation(errors));
            }
            Some(limit) => limit,
            None => DEFAULT_LIST_LIMIT.min(self.max_list_limit),
        };

        let filter = ItemFilter {
            owner_id: params.owner_id,
            offset: params.skip,
            limit,
        };
        Ok(self.store.list(filter).await?)
    }

    pub async fn update(
        &self,
        id: Uuid,
        owner: &AuthUser,
        patch: ItemUpdate,
    ) -> ServiceResult<Item> {
        validate(&patch)?;

        let existing = self.owned(id, owner, "update").await?;
        if patch.is_empty() {
            return Ok(existing);
        }

        let item = self
            .store
            .update(id, &patch)
            .await?
            .ok_or(ServiceError::NotFound(id))?;

        tracing::info!(item_id = %id, owner_id = %owner.user_id, "Updated item");
        Ok(item)
    }

    pub async fn delete(&self, id: Uuid, owner: &AuthUser) -> ServiceResult<()> {
        self.owned(id, owner, "delete").await?;

        // Gone between the ownership read and the delete
        self.store
            .delete(id)
            .await?
            .ok_or(ServiceError::NotFound(id))?;

        tracing::info!(item_id = %id, owner_id = %owner.user_id, "Deleted item");
        Ok(())
    }

    /// Reachability of the external store
    pub async fn ping(&self) -> StoreResult<()> {
        self.store.ping().await
    }

    /// Fetch `id` and require that `owner` created it
    async fn owned(&self, id: Uuid, owner: &AuthUser, action: &str) -> ServiceResult<Item> {
        let item = self.get(id).await?;

        if item.owner_id != owner.user_id {
            tracing::warn!(
                item_id = %id,
                user_id = %owner.user_id,
                "Rejected {} by non-owner",
                action
            );
            return Err(ServiceError::Forbidden(format!(
                "Not authorized to {} this item",
                action
            )));
        }

        Ok(item)
    }
}

fn validate<T: Validate>(input: &T) -> ServiceResult<()> {
    input
        .validate()
        .map_err(|e| ServiceError::Validation(field_errors(&e)))
}
