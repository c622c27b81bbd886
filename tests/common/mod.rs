#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use items_api::auth::{issue_token, Claims};
use items_api::config::AppConfig;
use items_api::store::{InMemoryStore, ItemStore};
use items_api::{app, AppState};
use uuid::Uuid;

pub const JWT_SECRET: &str = "integration-test-secret";

pub struct TestServer {
    pub base_url: String,
    pub store: InMemoryStore,
    pub client: reqwest::Client,
}

impl TestServer {
    /// `{base}/api/v1{path}`
    pub fn api(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }
}

/// Configuration as the server would read it, with `overrides` applied on top
pub fn config(overrides: &[(&str, &str)]) -> Result<AppConfig> {
    let mut env: HashMap<String, String> = [
        ("SUPABASE_URL", "http://127.0.0.1:1"),
        ("SUPABASE_KEY", "anon-key"),
        ("SUPABASE_JWT_SECRET", JWT_SECRET),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    for (k, v) in overrides {
        env.insert(k.to_string(), v.to_string());
    }

    AppConfig::from_lookup(|key| env.get(key).cloned()).context("invalid test configuration")
}

/// Serve the app over a real socket backed by an in-memory store
pub async fn spawn(overrides: &[(&str, &str)]) -> Result<TestServer> {
    let store = InMemoryStore::new();
    let base_url = spawn_with_store(config(overrides)?, Arc::new(store.clone())).await?;

    Ok(TestServer {
        base_url,
        store,
        client: reqwest::Client::new(),
    })
}

/// Serve the app with an arbitrary store; returns the base URL
pub async fn spawn_with_store(config: AppConfig, store: Arc<dyn ItemStore>) -> Result<String> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind test listener")?;

    let router = app(AppState::new(config, store));
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    Ok(format!("http://127.0.0.1:{}", port))
}

pub fn token_for(user_id: Uuid) -> String {
    let claims = Claims::new(user_id, None, chrono::Duration::minutes(5)).expect("token claims");
    issue_token(JWT_SECRET, &claims).expect("sign test token")
}

pub fn expired_token_for(user_id: Uuid) -> String {
    let claims = Claims::new(user_id, None, chrono::Duration::minutes(-10)).expect("token claims");
    issue_token(JWT_SECRET, &claims).expect("sign test token")
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

