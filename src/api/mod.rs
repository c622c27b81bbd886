pub mod docs;

pub use docs::{openapi, ApiDoc};
