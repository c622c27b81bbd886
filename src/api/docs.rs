use axum::{extract::State, Json};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::openapi::server::Server;
use utoipa::{Modify, OpenApi};

use crate::app::AppState;
use crate::error::ErrorBody;
use crate::handlers::{health, items};
use crate::schemas::{Item, ItemCreate, ItemUpdate};

/// OpenAPI documentation for the versioned API
#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        items::list_items,
        items::create_item,
        items::get_item,
        items::update_item,
        items::delete_item,
    ),
    components(schemas(Item, ItemCreate, ItemUpdate, ErrorBody)),
    modifiers(&SecurityAddon),
    tags(
        (name = "items", description = "Item CRUD, owned by the authenticated user"),
        (name = "health", description = "Service liveness")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// The document with paths rooted at the configured prefix
pub fn openapi(title: &str, prefix: &str) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.info.title = title.to_string();
    doc.info.version = env!("CARGO_PKG_VERSION").to_string();
    if !prefix.is_empty() {
        doc.servers = Some(vec![Server::new(prefix)]);
    }
    doc
}

/// GET {prefix}/openapi.json
pub async fn openapi_json(State(state): State<AppState>) -> Json<utoipa::openapi::OpenApi> {
    Json(openapi(&state.config.api.project_name, &state.config.api.prefix))
}
