use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("title must not be empty".into());
        return Err(err);
    }
    Ok(())
}

/// Distinguish an explicit `null` from an absent field
fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// An item as exposed by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Item {
    /// Identifier assigned by the store
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    /// User who created the item
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Payload for `POST /items`
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct ItemCreate {
    // Missing titles fall through to validation so they surface as 422
    #[serde(default)]
    #[validate(
        custom(function = "not_blank"),
        length(max = 255, message = "title must be at most 255 characters")
    )]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 2000, message = "description must be at most 2000 characters"))]
    pub description: Option<String>,
}

impl ItemCreate {
    pub fn new(title: impl Into<String>, description: Option<String>) -> Self {
        Self {
            title: title.into(),
            description,
        }
    }
}

/// Partial update for `PUT`/`PATCH /items/{id}`; absent fields are left as they are
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct ItemUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(
        custom(function = "not_blank"),
        length(max = 255, message = "title must be at most 255 characters")
    )]
    pub title: Option<String>,
    /// `null` clears the description
    #[serde(
        default,
        deserialize_with = "explicit_null",
        skip_serializing_if = "Option::is_none"
    )]
    #[validate(length(max = 2000, message = "description must be at most 2000 characters"))]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
}

impl ItemUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none()
    }

    /// The record that results from applying this patch to `item`
    pub fn apply_to(&self, item: &Item) -> Item {
        let mut next = item.clone();
        if let Some(title) = &self.title {
            next.title = title.clone();
        }
        if let Some(description) = &self.description {
            next.description = description.clone();
        }
        next
    }
}

/// Row sent to the store on insert
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewItem {
    pub title: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
}

impl NewItem {
    pub fn from_payload(payload: ItemCreate, owner_id: Uuid) -> Self {
        Self {
            title: payload.title,
            description: payload.description,
            owner_id,
        }
    }
}

/// Page size when the caller does not send `limit`
pub const DEFAULT_LIST_LIMIT: usize = 100;

/// Query string for `GET /items`
#[derive(Debug, Clone, Serialize, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Number of items to skip
    #[serde(default)]
    pub skip: usize,
    /// Maximum number of items to return (default 100)
    #[validate(range(min = 1, message = "limit must be at least 1"))]
    pub limit: Option<usize>,
    /// Only return items owned by this user
    pub owner_id: Option<Uuid>,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: None,
            owner_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_title_deserializes_then_fails_validation() {
        let payload: ItemCreate = serde_json::from_value(json!({"description": "x"})).unwrap();
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("title"));
    }

    #[test]
    fn whitespace_title_is_blank() {
        let payload = ItemCreate::new("   ", None);
        assert!(payload.validate().is_err());
        assert!(ItemCreate::new("groceries", None).validate().is_ok());
    }

    #[test]
    fn overlong_fields_are_rejected() {
        let payload = ItemCreate::new("t".repeat(256), Some("d".repeat(2001)));
        let errors = payload.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("description"));
    }

    #[test]
    fn update_distinguishes_null_from_absent() {
        let absent: ItemUpdate = serde_json::from_value(json!({"title": "new"})).unwrap();
        assert_eq!(absent.description, None);

        let cleared: ItemUpdate = serde_json::from_value(json!({"description": null})).unwrap();
        assert_eq!(cleared.description, Some(None));
        assert!(!cleared.is_empty());

        // Only provided fields are forwarded
        assert_eq!(serde_json::to_value(&absent).unwrap(), json!({"title": "new"}));
        assert_eq!(
            serde_json::to_value(&cleared).unwrap(),
            json!({"description": null})
        );
    }

    #[test]
    fn update_rejects_blank_title_but_allows_empty_patch() {
        let blank = ItemUpdate {
            title: Some(String::new()),
            ..Default::default()
        };
        assert!(blank.validate().is_err());
        assert!(ItemUpdate::default().validate().is_ok());
        assert!(ItemUpdate::default().is_empty());
    }

    #[test]
    fn list_params_defaults() {
        let params: ListParams = serde_json::from_value(json!({})).unwrap();
        assert_eq!(params.skip, 0);
        assert_eq!(params.limit, None);
        assert!(params.owner_id.is_none());
    }

    #[test]
    fn item_ignores_extra_store_columns() {
        let item: Item = serde_json::from_value(json!({
            "id": "7f9c24e5-7a4c-4b1e-9d7e-2f1b8a1c0d11",
            "title": "first",
            "description": null,
            "owner_id": "0b6f3c1e-0000-4000-8000-000000000001",
            "created_at": "2024-05-01T10:00:00.123456+00:00",
            "updated_at": null,
            "internal_flags": 3
        }))
        .unwrap();
        assert_eq!(item.title, "first");
        assert!(item.updated_at.is_none());
    }
}
