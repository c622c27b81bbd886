pub mod item;

pub use item::{Item, ItemCreate, ItemUpdate, ListParams, NewItem, DEFAULT_LIST_LIMIT};

use validator::ValidationErrors;

use crate::error::FieldErrors;

/// Flatten validator output into one message per field
pub fn field_errors(errors: &ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let message = errs
                .first()
                .map(|e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => format!("{} is invalid ({})", field, e.code),
                })
                .unwrap_or_else(|| format!("{} is invalid", field));
            (field.to_string(), message)
        })
        .collect()
}
