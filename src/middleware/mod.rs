pub mod auth;
pub mod json;
pub mod response;

pub use auth::{jwt_auth_middleware, optional_jwt_auth_middleware};
pub use json::{ItemId, JsonBody, QueryParams};
pub use response::{ApiResponse, ApiResult};
