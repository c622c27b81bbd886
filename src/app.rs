use std::any::Any;
use std::sync::Arc;

use axum::{
    http::{HeaderValue, Method},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put, MethodRouter},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowHeaders, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use utoipa_redoc::{Redoc, Servable};

use crate::api::docs;
use crate::auth::TokenVerifier;
use crate::config::{AppConfig, SecurityConfig};
use crate::error::ApiError;
use crate::handlers::{health, items};
use crate::middleware::{jwt_auth_middleware, optional_jwt_auth_middleware};
use crate::services::ItemService;
use crate::store::ItemStore;

/// Shared, read-only request context
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub verifier: Arc<TokenVerifier>,
    pub items: ItemService,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn ItemStore>) -> Self {
        let verifier = TokenVerifier::new(&config.security);
        let items = ItemService::new(store, config.api.max_list_limit);

        Self {
            config: Arc::new(config),
            verifier: Arc::new(verifier),
            items,
        }
    }
}

/// Full application router with global middleware applied
pub fn app(state: AppState) -> Router {
    let prefix = state.config.api.prefix.clone();
    let doc = docs::openapi(&state.config.api.project_name, &prefix);

    let api = Router::new()
        .route("/health", get(health::health))
        .route("/openapi.json", get(docs::openapi_json))
        .merge(item_routes(&state));

    let router = if prefix.is_empty() {
        Router::new().merge(api)
    } else {
        Router::new().nest(&prefix, api)
    };

    router
        .route("/", get(health::root))
        .fallback(health::not_found)
        .with_state(state.clone())
        .merge(Redoc::with_url(format!("{}/docs", prefix), doc))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors_layer(&state.config.security))
        .layer(TraceLayer::new_for_http())
}

fn item_routes(state: &AppState) -> Router<AppState> {
    let anonymous_read = state.config.security.allow_anonymous_read;

    let read = |route: MethodRouter<AppState>| {
        if anonymous_read {
            route.route_layer(middleware::from_fn_with_state(
                state.clone(),
                optional_jwt_auth_middleware,
            ))
        } else {
            route.route_layer(middleware::from_fn_with_state(
                state.clone(),
                jwt_auth_middleware,
            ))
        }
    };
    let write = |route: MethodRouter<AppState>| {
        route.route_layer(middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_middleware,
        ))
    };

    Router::new()
        .route(
            "/items",
            read(get(items::list_items)).merge(write(post(items::create_item))),
        )
        .route(
            "/items/:id",
            read(get(items::get_item)).merge(write(
                put(items::update_item)
                    .patch(items::update_item)
                    .delete(items::delete_item),
            )),
        )
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    if origins.is_empty() || security.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!("Handler panicked: {}", detail);

    ApiError::internal_server_error("Internal Server Error").into_response()
}
