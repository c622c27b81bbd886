pub mod api;
pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod schemas;
pub mod services;
pub mod store;

#[cfg(test)]
pub mod testing;

pub use app::{app, AppState};
