// handlers/items.rs - /items CRUD handlers
//
// Authentication runs as route middleware ahead of these handlers, so a
// handler that takes `Extension<AuthUser>` only ever sees verified callers.

use axum::{extract::State, Extension};

use crate::app::AppState;
use crate::auth::AuthUser;
use crate::error::ErrorBody;
use crate::middleware::{ApiResponse, ApiResult, ItemId, JsonBody, QueryParams};
use crate::schemas::{Item, ItemCreate, ItemUpdate, ListParams};

/// List items, newest first
#[utoipa::path(
    get,
    path = "/items",
    tag = "items",
    params(ListParams),
    security((), ("bearer_auth" = [])),
    responses(
        (status = 200, description = "Items wrapped in the success envelope", body = [Item]),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 422, description = "Invalid paging parameters", body = ErrorBody),
        (status = 502, description = "Data service unavailable", body = ErrorBody)
    )
)]
pub async fn list_items(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<ListParams>,
) -> ApiResult<Vec<Item>> {
    let items = state.items.list(params).await?;
    Ok(ApiResponse::success(items))
}

/// Create an item owned by the caller
#[utoipa::path(
    post,
    path = "/items",
    tag = "items",
    request_body = ItemCreate,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Created item wrapped in the success envelope", body = Item),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 422, description = "Invalid payload", body = ErrorBody),
        (status = 502, description = "Data service unavailable", body = ErrorBody)
    )
)]
pub async fn create_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    JsonBody(payload): JsonBody<ItemCreate>,
) -> ApiResult<Item> {
    let item = state.items.create(&user, payload).await?;
    Ok(ApiResponse::created(item))
}

/// Get an item by id
#[utoipa::path(
    get,
    path = "/items/{id}",
    tag = "items",
    params(("id" = Uuid, Path, description = "Item id")),
    security((), ("bearer_auth" = [])),
    responses(
        (status = 200, description = "Item wrapped in the success envelope", body = Item),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 404, description = "No such item", body = ErrorBody),
        (status = 422, description = "Malformed id", body = ErrorBody)
    )
)]
pub async fn get_item(State(state): State<AppState>, ItemId(id): ItemId) -> ApiResult<Item> {
    let item = state.items.get(id).await?;
    Ok(ApiResponse::success(item))
}

/// Update an item the caller owns; only provided fields change
#[utoipa::path(
    put,
    path = "/items/{id}",
    tag = "items",
    params(("id" = Uuid, Path, description = "Item id")),
    request_body = ItemUpdate,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Updated item wrapped in the success envelope", body = Item),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 403, description = "Caller does not own the item", body = ErrorBody),
        (status = 404, description = "No such item", body = ErrorBody),
        (status = 422, description = "Invalid payload", body = ErrorBody)
    )
)]
pub async fn update_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ItemId(id): ItemId,
    JsonBody(patch): JsonBody<ItemUpdate>,
) -> ApiResult<Item> {
    let item = state.items.update(id, &user, patch).await?;
    Ok(ApiResponse::success(item))
}

/// Delete an item the caller owns
#[utoipa::path(
    delete,
    path = "/items/{id}",
    tag = "items",
    params(("id" = Uuid, Path, description = "Item id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Item deleted"),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 403, description = "Caller does not own the item", body = ErrorBody),
        (status = 404, description = "No such item", body = ErrorBody)
    )
)]
pub async fn delete_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ItemId(id): ItemId,
) -> ApiResult<()> {
    state.items.delete(id, &user).await?;
    Ok(ApiResponse::no_content())
}
