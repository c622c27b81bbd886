// handlers/mod.rs
//
// Public: `/`, `{prefix}/health`, `{prefix}/openapi.json`, `{prefix}/docs`
// Bearer token: every `/items` write, and reads unless ALLOW_ANONYMOUS_READ
pub mod health;
pub mod items;
