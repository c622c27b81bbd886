use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use url::Url;
use uuid::Uuid;

use super::{ItemFilter, ItemStore, StoreError, StoreResult};
use crate::config::SupabaseConfig;
use crate::schemas::{Item, ItemUpdate, NewItem};

const PREFER: HeaderName = HeaderName::from_static("prefer");
const API_KEY: HeaderName = HeaderName::from_static("apikey");
const RETURN_REPRESENTATION: HeaderValue = HeaderValue::from_static("return=representation");

/// Error body produced by the REST gateway
#[derive(Debug, Deserialize)]
struct GatewayError {
    message: Option<String>,
    code: Option<String>,
}

/// Client for the platform's auto-generated REST API (`/rest/v1/<table>`).
///
/// Built once at start-up; the inner reqwest client pools connections and is
/// cheap to clone.
#[derive(Clone)]
pub struct PostgrestStore {
    client: Client,
    table_url: Url,
    base_url: Url,
}

impl PostgrestStore {
    pub fn new(config: &SupabaseConfig) -> StoreResult<Self> {
        let bearer = match &config.service_role_key {
            Some(key) => {
                tracing::warn!(
                    "Using service role key for store calls; row-level policies are bypassed"
                );
                key.as_str()
            }
            None => config.api_key.as_str(),
        };

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY, sensitive_header(&config.api_key)?);
        headers.insert(AUTHORIZATION, sensitive_header(&format!("Bearer {}", bearer))?);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let base_url = rest_base(&config.url)?;
        let table_url = base_url
            .join(&config.items_table)
            .map_err(|e| StoreError::Transport(format!("invalid table name: {}", e)))?;

        Ok(Self {
            client,
            table_url,
            base_url,
        })
    }

    pub fn table_url(&self) -> &Url {
        &self.table_url
    }

    async fn send_for_rows(&self, request: RequestBuilder) -> StoreResult<Vec<Item>> {
        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(upstream_error(status, &body));
        }

        serde_json::from_slice(&body).map_err(|e| StoreError::Decode(e.to_string()))
    }
}

fn sensitive_header(value: &str) -> StoreResult<HeaderValue> {
    let mut header = HeaderValue::from_str(value).map_err(|_| {
        StoreError::Transport("credential contains invalid header characters".to_string())
    })?;
    header.set_sensitive(true);
    Ok(header)
}

/// `<project url>/rest/v1/`, keeping any path the project URL already has
fn rest_base(project_url: &Url) -> StoreResult<Url> {
    let mut base = project_url.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("rest/v1/")
        .map_err(|e| StoreError::Transport(format!("invalid store url: {}", e)))
}

fn upstream_error(status: StatusCode, body: &[u8]) -> StoreError {
    let parsed = serde_json::from_slice::<GatewayError>(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|e| e.message.clone())
        .unwrap_or_else(|| String::from_utf8_lossy(body).trim().to_string());
    let code = parsed.and_then(|e| e.code);

    tracing::warn!(status = status.as_u16(), code = ?code, "Store request failed: {}", message);

    match status {
        // 401 from the gateway means our own credentials were refused
        StatusCode::FORBIDDEN => StoreError::Rejected(message),
        StatusCode::CONFLICT => StoreError::Conflict(message),
        _ => StoreError::Upstream {
            status: status.as_u16(),
            message,
        },
    }
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{}", value)
}

fn single(rows: Vec<Item>) -> Option<Item> {
    rows.into_iter().next()
}

#[async_trait]
impl ItemStore for PostgrestStore {
    async fn insert(&self, item: NewItem) -> StoreResult<Item> {
        tracing::debug!(owner_id = %item.owner_id, "Inserting item");
        let request = self
            .client
            .post(self.table_url.clone())
            .header(PREFER, RETURN_REPRESENTATION)
            .json(&item);

        single(self.send_for_rows(request).await?)
            .ok_or_else(|| StoreError::Decode("insert returned no rows".to_string()))
    }

    async fn fetch(&self, id: Uuid) -> StoreResult<Option<Item>> {
        tracing::debug!(item_id = %id, "Fetching item");
        let request = self
            .client
            .get(self.table_url.clone())
            .query(&[("select", "*".to_string()), ("id", eq(id))]);

        Ok(single(self.send_for_rows(request).await?))
    }

    async fn list(&self, filter: ItemFilter) -> StoreResult<Vec<Item>> {
        tracing::debug!(?filter, "Listing items");
        let mut query = vec![
            ("select", "*".to_string()),
            ("order", "created_at.desc,id.asc".to_string()),
            ("offset", filter.offset.to_string()),
            ("limit", filter.limit.to_string()),
        ];
        if let Some(owner_id) = filter.owner_id {
            query.push(("owner_id", eq(owner_id)));
        }

        let request = self.client.get(self.table_url.clone()).query(&query);
        self.send_for_rows(request).await
    }

    async fn update(&self, id: Uuid, changes: &ItemUpdate) -> StoreResult<Option<Item>> {
        tracing::debug!(item_id = %id, "Updating item");
        let request = self
            .client
            .patch(self.table_url.clone())
            .query(&[("id", eq(id))])
            .header(PREFER, RETURN_REPRESENTATION)
            .json(changes);

        Ok(single(self.send_for_rows(request).await?))
    }

    async fn delete(&self, id: Uuid) -> StoreResult<Option<Item>> {
        tracing::debug!(item_id = %id, "Deleting item");
        let request = self
            .client
            .delete(self.table_url.clone())
            .query(&[("id", eq(id))])
            .header(PREFER, RETURN_REPRESENTATION);

        Ok(single(self.send_for_rows(request).await?))
    }

    async fn ping(&self) -> StoreResult<()> {
        let request = self
            .client
            .get(self.table_url.clone())
            .query(&[("select", "id"), ("limit", "1")]);

        self.send_for_rows(request).await.map(|_| ())
    }
}

impl std::fmt::Debug for PostgrestStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgrestStore")
            .field("base_url", &self.base_url.as_str())
            .field("table_url", &self.table_url.as_str())
            .finish()
    }
}
